/*!
# HSTS Preload: Builder

This module is also compiled into `build.rs`, where it crunches the bundled
preload list into the embedded table.
*/

use crate::{
	hash::murmur3,
	table::{
		OFFSET_MASK,
		Table,
	},
};
use idna::AsciiDenyList;
use std::{
	collections::BTreeMap,
	error::Error,
	fmt,
	net::IpAddr,
};



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Build Error.
///
/// These are fatal; no partial table is ever produced.
pub enum BuildError {
	/// # Name offset doesn't fit in 24 bits.
	Offset(String),

	/// # Name length doesn't fit in 8 bits.
	Length(String),

	/// # No 16-bit seed could place a bucket (holds the bucket index).
	Seed(usize),
}

impl Error for BuildError {}

impl fmt::Display for BuildError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Offset(s) => write!(f, "Name offset out of range: {s}"),
			Self::Length(s) => write!(f, "Name too long: {s}"),
			Self::Seed(n) => write!(f, "Unable to find a valid seed for bucket {n}."),
		}
	}
}



#[derive(Debug, Clone, Default)]
/// # Table Builder.
///
/// Collect `(name, include_subdomains)` pairs and crunch them into a [`Table`]
/// using the "hash, displace, and compress" algorithm described in
/// <http://cmph.sourceforge.net/papers/esa09.pdf>.
///
/// Names are trimmed, converted to lowercase Punycode, and deduplicated as
/// they're added; an entry pushed more than once includes subdomains if any of
/// the pushes said so. IP addresses and names IDNA can't make sense of are
/// skipped, since no host could ever match them.
///
/// This is meant for offline use (the embedded table is built this way by
/// the crate's build script), but works fine at runtime too.
///
/// ## Examples
///
/// ```
/// use hsts_preload::Builder;
///
/// let mut builder = Builder::new();
/// builder.push("a.b", true);
/// builder.push("x.y", false);
///
/// let table = builder.build().unwrap();
/// assert!(table.is_preloaded("a.b"));
/// assert!(table.is_preloaded("z.a.b"));
/// assert!(table.is_preloaded("x.y"));
/// assert!(! table.is_preloaded("z.x.y"));
/// assert!(! table.is_preloaded("b"));
/// ```
pub struct Builder {
	entries: BTreeMap<String, bool>,
}

impl<S: AsRef<str>> Extend<(S, bool)> for Builder {
	fn extend<I: IntoIterator<Item=(S, bool)>>(&mut self, iter: I) {
		for (name, subdomains) in iter { self.push(name.as_ref(), subdomains); }
	}
}

impl<S: AsRef<str>> FromIterator<(S, bool)> for Builder {
	fn from_iter<I: IntoIterator<Item=(S, bool)>>(iter: I) -> Self {
		let mut out = Self::new();
		out.extend(iter);
		out
	}
}

impl Builder {
	#[must_use]
	/// # New.
	pub const fn new() -> Self {
		Self { entries: BTreeMap::new() }
	}

	#[must_use]
	/// # Length.
	pub fn len(&self) -> usize { self.entries.len() }

	#[must_use]
	/// # Is Empty?
	pub fn is_empty(&self) -> bool { self.entries.is_empty() }

	/// # Push Entry.
	///
	/// Add a name to the set. Surrounding whitespace and a trailing dot are
	/// stripped, and the result converted to lowercase ASCII (Punycode for
	/// internationalized labels).
	///
	/// Returns `false` if the name was skipped for being empty, an IP address,
	/// or invalid.
	pub fn push(&mut self, name: &str, include_subdomains: bool) -> bool {
		let name = name.trim();
		let name = name.strip_suffix('.').unwrap_or(name);
		if name.is_empty() || is_ip(name) { return false; }

		let Some(name) = idna_to_ascii(name) else { return false; };
		if is_ip(&name) { return false; }

		if let Some(v) = self.entries.get_mut(&name) { *v |= include_subdomains; }
		else { self.entries.insert(name, include_subdomains); }
		true
	}

	/// # Build!
	///
	/// Crunch the entries into a [`Table`].
	///
	/// ## Errors
	///
	/// This will return an error if the names don't fit the packing budget
	/// (16 MiB in total, 255 bytes apiece), or if some bucket can't be placed
	/// with any 16-bit seed.
	#[allow(clippy::cast_possible_truncation)] // Packing caps everything well below u32.
	pub fn build(self) -> Result<Table<'static>, BuildError> {
		// Subdomain-inclusive entries go first so their names occupy a single
		// contiguous range of the blob. (The map already sorts by name.)
		let (with, without): (Vec<_>, Vec<_>) = self.entries.into_iter()
			.partition(|(_, subdomains)| *subdomains);

		let len = with.len() + without.len();
		let mut names = String::with_capacity(
			with.iter().chain(without.iter()).map(|(k, _)| k.len()).sum()
		);
		let mut keys: Vec<(String, u32)> = Vec::with_capacity(len);
		let mut include_subdomains_end: u32 = 0;
		let mut max_dots: usize = 0;
		for (name, subdomains) in with.into_iter().chain(without) {
			let packed = pack(names.len(), &name)?;
			names.push_str(&name);
			if subdomains { include_subdomains_end = names.len() as u32; }

			let dots = name.bytes().filter(|b| b'.'.eq(b)).count();
			if dots > max_dots { max_dots = dots; }

			keys.push((name, packed));
		}

		let (level0, level1) = displace(&keys)?;
		Ok(Table::from_owned(
			names,
			level0,
			level1,
			include_subdomains_end,
			max_dots as u32,
			len as u32,
		))
	}
}



/// # Displace.
///
/// Build the two hash levels from the (name, packed slot) pairs.
///
/// Keys are grouped into buckets by their seedless hash, then, biggest
/// buckets first, each bucket gets the first seed that scatters all of its
/// keys into unclaimed level-one slots.
fn displace(keys: &[(String, u32)]) -> Result<(Vec<u16>, Vec<u32>), BuildError> {
	let mut level0 = vec![0_u16; next_pow2(keys.len() / 4)];
	let mut level1 = vec![0_u32; next_pow2(keys.len())];
	let mask0 = level0.len() - 1;
	let mask1 = level1.len() - 1;

	// Sort the keys into buckets.
	let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); level0.len()];
	for (i, (k, _)) in keys.iter().enumerate() {
		buckets[murmur3(0, k.as_bytes()) as usize & mask0].push(i);
	}

	// Largest first; the sort is stable so ties keep bucket order.
	let mut buckets: Vec<(usize, Vec<usize>)> = buckets.into_iter()
		.enumerate()
		.filter(|(_, v)| ! v.is_empty())
		.collect();
	buckets.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

	let mut occupied = vec![false; level1.len()];
	let mut claimed: Vec<usize> = Vec::new();
	for (n, bucket) in buckets {
		let seed = (0..=u16::MAX)
			.find(|&seed| {
				claimed.truncate(0);
				for &i in &bucket {
					let slot = murmur3(u32::from(seed), keys[i].0.as_bytes()) as usize & mask1;
					if occupied[slot] {
						// Release whatever this attempt grabbed.
						for &slot in &claimed { occupied[slot] = false; }
						return false;
					}
					occupied[slot] = true;
					claimed.push(slot);
				}
				true
			})
			.ok_or(BuildError::Seed(n))?;

		for (&slot, &i) in claimed.iter().zip(bucket.iter()) {
			level1[slot] = keys[i].1;
		}
		level0[n] = seed;
	}

	Ok((level0, level1))
}

/// # Domain to ASCII.
///
/// Run the name through the same UTS-46 mapping hosts get at query time. This
/// lowercases ASCII too.
fn idna_to_ascii(src: &str) -> Option<String> {
	idna::domain_to_ascii_cow(src.as_bytes(), AsciiDenyList::EMPTY)
		.ok()
		.filter(|s| ! s.is_empty())
		.map(std::borrow::Cow::into_owned)
}

/// # Is IP Address?
///
/// IPv6 addresses are accepted with or without their URL brackets.
pub(crate) fn is_ip(src: &str) -> bool {
	let src = src.strip_prefix('[')
		.and_then(|s| s.strip_suffix(']'))
		.unwrap_or(src);
	src.parse::<IpAddr>().is_ok()
}

/// # Pack Slot.
///
/// Combine a name's offset and length into a single `u32`.
fn pack(offset: usize, name: &str) -> Result<u32, BuildError> {
	let offset = u32::try_from(offset)
		.ok()
		.filter(|o| o & OFFSET_MASK == *o)
		.ok_or_else(|| BuildError::Offset(name.to_owned()))?;
	let len = u8::try_from(name.len())
		.map_err(|_| BuildError::Length(name.to_owned()))?;

	Ok(offset | u32::from(len) << 24)
}

/// # Next Power of Two.
///
/// Note: zero rounds up to one.
const fn next_pow2(n: usize) -> usize {
	if n <= 1 { 1 }
	else { n.next_power_of_two() }
}



#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn t_next_pow2() {
		for (n, expected) in [(0, 1), (1, 1), (2, 2), (3, 4), (4, 4), (5, 8), (1000, 1024)] {
			assert_eq!(next_pow2(n), expected, "next_pow2({n})");
		}
	}

	#[test]
	fn t_pack() {
		assert_eq!(pack(0, "a.b"), Ok(0x0300_0000));
		assert_eq!(pack(16, "abcd"), Ok(0x0400_0010));
		assert_eq!(pack(0x00ff_ffff, "a"), Ok(0x01ff_ffff));

		let long = "a".repeat(256);
		assert_eq!(pack(0, &long), Err(BuildError::Length(long.clone())));
		assert_eq!(pack(0, &long[..255]).map(|n| n >> 24), Ok(255));
		assert_eq!(pack(0x0100_0000, "a"), Err(BuildError::Offset("a".to_owned())));
	}

	#[test]
	fn t_push() {
		let mut builder = Builder::new();
		assert!(builder.is_empty());

		assert!(builder.push(" Example.COM. ", false));
		assert!(builder.push("example.com", true));
		assert!(builder.push("example.com", false));
		assert!(! builder.push("", true));
		assert!(! builder.push(".", true));
		assert_eq!(builder.len(), 1);
		assert_eq!(builder.entries.get("example.com"), Some(&true));

		// Internationalized names are stored as Punycode.
		assert!(builder.push("φ.example", false));
		assert!(builder.push("Bücher.test", true));
		assert_eq!(builder.entries.get("xn--7xa.example"), Some(&false));
		assert_eq!(builder.entries.get("xn--bcher-kva.test"), Some(&true));
		assert!(! builder.entries.contains_key("φ.example"));

		// IPs and garbage are skipped.
		for name in ["1.0.0.1", "1.0.0.1.", "::1", "[2001:db8::1]", "\u{FFFF}.test"] {
			assert!(! builder.push(name, true), "Accepted: {name}");
		}
		assert_eq!(builder.len(), 3);
	}

	#[test]
	fn t_push_matches() {
		let table = Builder::from_iter([
			("φ.example", false),
			("Bücher.test", true),
			("1.0.0.1", false),
		])
			.build()
			.expect("Build failed.");

		assert_eq!(table.len(), 2);
		for (name, subdomains) in table.iter() {
			assert!(name.is_ascii(), "Not ASCII: {name}");
			assert!(table.is_preloaded(name), "Missing entry: {name}");
			assert_eq!(table.is_preloaded(&format!("www.{name}")), subdomains);
		}

		assert!(table.is_preloaded("φ.example"));
		assert!(table.is_preloaded("xn--7xa.example"));
		assert!(! table.is_preloaded("www.φ.example"));
		assert!(table.is_preloaded("www.bücher.test"));
		assert!(table.is_preloaded("BÜCHER.test."));
		assert_eq!(table.lookup("1.0.0.1"), None);
	}

	#[test]
	fn t_build_layout() {
		let table = Builder::from_iter([
			("x.y", false),
			("a.b", true),
			("c.d.e", true),
			("f", false),
		])
			.build()
			.expect("Build failed.");

		// Subdomain entries first, then alphabetical.
		assert_eq!(table.names(), "a.bc.d.efx.y");
		assert_eq!(table.include_subdomains_end(), 8);
		assert_eq!(table.max_dots(), 2);
		assert_eq!(table.len(), 4);
		assert_eq!(table.level0().len(), 1);
		assert_eq!(table.level1().len(), 4);

		for (name, subdomains) in [("a.b", true), ("c.d.e", true), ("f", false), ("x.y", false)] {
			assert_eq!(table.lookup(name), Some(subdomains), "Lookup failed: {name}");
		}
	}

	#[test]
	fn t_build_empty() {
		let table = Builder::new().build().expect("Build failed.");
		assert!(table.is_empty());
		assert_eq!(table.level0(), &[0]);
		assert_eq!(table.level1(), &[0]);
		assert_eq!(table.lookup("a"), None);
		assert!(! table.is_preloaded("a.b"));
	}

	#[test]
	fn t_build_many() {
		let names: Vec<String> = (0..5000_u32)
			.map(|n| format!("host{n}.example{}.test", n % 7))
			.collect();
		let table = names.iter()
			.enumerate()
			.map(|(k, v)| (v, k % 3 == 0))
			.collect::<Builder>()
			.build()
			.expect("Build failed.");

		assert_eq!(table.len(), 5000);
		assert_eq!(table.level0().len(), 2048);
		assert_eq!(table.level1().len(), 8192);
		assert_eq!(table.iter().count(), 5000);
		for (k, v) in names.iter().enumerate() {
			assert_eq!(table.lookup(v), Some(k % 3 == 0), "Lookup failed: {v}");
		}
		assert_eq!(table.lookup("host5000.example2.test"), None);
	}

	#[test]
	fn t_build_deterministic() {
		let list = || (0..1000_u32).map(|n| (format!("n{n}.example.org"), n % 2 == 0));
		let a = list().collect::<Builder>().build().expect("Build failed.");
		let b = list().collect::<Builder>().build().expect("Build failed.");
		assert_eq!(a.level0(), b.level0());
		assert_eq!(a.level1(), b.level1());
		assert_eq!(a.names(), b.names());
		assert_eq!(a, b);
	}

	#[test]
	fn t_build_too_long() {
		let long = format!("{}.test", "a".repeat(300));
		let res = Builder::from_iter([(long.as_str(), false)]).build();
		assert_eq!(res, Err(BuildError::Length(long)));
	}

	#[test]
	fn t_is_ip() {
		for (src, expected) in [
			("1.2.3.4", true),
			("255.255.255.255", true),
			("::1", true),
			("[::1]", true),
			("1.2.3", false),
			("1.2.3.4.5", false),
			("example.com", false),
			("", false),
		] {
			assert_eq!(is_ip(src), expected, "is_ip({src:?})");
		}
	}
}
