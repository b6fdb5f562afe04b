/*!
# HSTS Preload: Matcher
*/

use crate::{
	builder::is_ip,
	Table,
};
use std::borrow::Cow;



/// # Stack Buffer Size.
///
/// Hosts up to this length are lowercased without touching the heap.
const BUF: usize = 256;



/// # Matching.
impl Table<'_> {
	#[must_use]
	/// # Is Preloaded?
	///
	/// Returns `true` if `host` is in the table, or if one of its parents is
	/// and includes subdomains.
	///
	/// Matching is case-insensitive, ignores a single trailing dot, and
	/// converts internationalized names to Punycode first. IP addresses are
	/// never preloaded.
	///
	/// ## Examples
	///
	/// ```
	/// use hsts_preload::Builder;
	///
	/// let table = Builder::from_iter([("a.b", true), ("x.y", false)])
	///     .build()
	///     .unwrap();
	///
	/// assert!(table.is_preloaded("a.b"));
	/// assert!(table.is_preloaded("Z.A.B."));
	/// assert!(table.is_preloaded("x.y"));
	/// assert!(! table.is_preloaded("z.x.y"));
	/// assert!(! table.is_preloaded("b"));
	/// ```
	pub fn is_preloaded(&self, host: &str) -> bool {
		let host = host.strip_suffix('.').unwrap_or(host);
		if is_ip(host) { return false; }

		let host = to_ascii(host);
		let mut host: &str = &host;

		// Anything to the left of the deepest possible entry can only ever
		// match as a subdomain.
		let mut truncated = false;
		let mut dots = host.bytes().filter(|b| b'.'.eq(b)).count();
		while dots > self.max_dots() {
			host = after_dot(host).unwrap_or_default();
			truncated = true;
			dots -= 1;
		}

		if host.is_empty() { return false; }

		let mut buf = [0_u8; BUF];
		let owned: String;
		host =
			if ! host.bytes().any(|b| b.is_ascii_uppercase()) { host }
			else if let Some(dst) = buf.get_mut(..host.len()) {
				dst.copy_from_slice(host.as_bytes());
				dst.make_ascii_lowercase();
				match std::str::from_utf8(dst) {
					Ok(s) => s,
					Err(_) => return false,
				}
			}
			else {
				owned = host.to_ascii_lowercase();
				&owned
			};

		loop {
			if let Some(subdomains) = self.lookup(host) {
				return subdomains || ! truncated;
			}

			match after_dot(host) {
				Some(rest) => {
					host = rest;
					truncated = true;
				},
				None => return false,
			}
		}
	}
}



#[inline]
/// # After First Dot.
///
/// Return everything after the first dot, or `None` if there isn't one.
fn after_dot(src: &str) -> Option<&str> {
	src.split_once('.').map(|(_, rest)| rest)
}

/// # To ASCII.
///
/// Punify non-ASCII hosts. Pure ASCII is passed through as-is (case is dealt
/// with separately), as is anything the IDNA conversion chokes on.
fn to_ascii(src: &str) -> Cow<'_, str> {
	if src.is_ascii() { Cow::Borrowed(src) }
	else {
		idna::domain_to_ascii(src).map_or(Cow::Borrowed(src), Cow::Owned)
	}
}
