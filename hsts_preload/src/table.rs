/*!
# HSTS Preload: Table

This module is also compiled into `build.rs`.
*/

use crate::hash::murmur3;
use std::{
	borrow::Cow,
	fmt,
};



/// # Offset Mask.
///
/// The low 24 bits of a packed slot hold the name's offset into the blob; the
/// high 8 hold its length.
pub(crate) const OFFSET_MASK: u32 = 0x00ff_ffff;



#[derive(Clone, Eq, PartialEq)]
/// # Preload Table.
///
/// This is a two-level minimal perfect hash table mapping domain names to
/// their "include subdomains" policy.
///
/// The crate ships with one of these baked in (see [`is_preloaded`](crate::is_preloaded)),
/// but custom tables can be built at runtime using [`Builder`](crate::Builder).
///
/// Once constructed, a table is read-only; lookups take `&self` and never
/// allocate, so a single instance can be shared freely between threads.
pub struct Table<'a> {
	/// # Concatenated Names.
	names: Cow<'a, str>,

	/// # Bucket Seeds.
	level0: Cow<'a, [u16]>,

	/// # Packed Slots.
	level1: Cow<'a, [u32]>,

	/// # End of Include-Subdomains Names.
	include_subdomains_end: u32,

	/// # Max Dots.
	max_dots: u32,

	/// # Entry Count.
	len: u32,
}

impl fmt::Debug for Table<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Table")
			.field("len", &self.len)
			.field("level0", &self.level0.len())
			.field("level1", &self.level1.len())
			.field("include_subdomains_end", &self.include_subdomains_end)
			.field("max_dots", &self.max_dots)
			.finish_non_exhaustive()
	}
}

/// # Construction.
impl<'a> Table<'a> {
	#[must_use]
	/// # From Static Parts.
	///
	/// This is used by the generated code to wrap the embedded arrays without
	/// copying them.
	pub(crate) const fn from_static(
		names: &'a str,
		level0: &'a [u16],
		level1: &'a [u32],
		include_subdomains_end: u32,
		max_dots: u32,
		len: u32,
	) -> Self {
		Self {
			names: Cow::Borrowed(names),
			level0: Cow::Borrowed(level0),
			level1: Cow::Borrowed(level1),
			include_subdomains_end,
			max_dots,
			len,
		}
	}
}

impl Table<'static> {
	#[must_use]
	/// # From Owned Parts.
	pub(crate) fn from_owned(
		names: String,
		level0: Vec<u16>,
		level1: Vec<u32>,
		include_subdomains_end: u32,
		max_dots: u32,
		len: u32,
	) -> Self {
		Self {
			names: Cow::Owned(names),
			level0: Cow::Owned(level0),
			level1: Cow::Owned(level1),
			include_subdomains_end,
			max_dots,
			len,
		}
	}
}

/// # Getters.
impl Table<'_> {
	#[must_use]
	/// # Length.
	///
	/// Return the number of entries in the table.
	pub const fn len(&self) -> usize { self.len as usize }

	#[must_use]
	/// # Is Empty?
	pub const fn is_empty(&self) -> bool { self.len == 0 }

	#[must_use]
	/// # Max Dots.
	///
	/// Return the highest number of dots found in any single entry. Hosts with
	/// more than this are truncated before lookup.
	pub const fn max_dots(&self) -> usize { self.max_dots as usize }

	#[must_use]
	/// # Include Subdomains End.
	///
	/// Return the offset into [`Table::names`] one past the last entry that
	/// includes subdomains.
	pub const fn include_subdomains_end(&self) -> u32 { self.include_subdomains_end }

	#[must_use]
	/// # Names.
	///
	/// Return the concatenated names, ordered subdomain-inclusive first, then
	/// alphabetically.
	pub fn names(&self) -> &str { &self.names }

	#[must_use]
	/// # Level Zero.
	///
	/// Return the per-bucket seeds.
	pub fn level0(&self) -> &[u16] { &self.level0 }

	#[must_use]
	/// # Level One.
	///
	/// Return the packed `(offset, length)` slots.
	pub fn level1(&self) -> &[u32] { &self.level1 }

	/// # Entries.
	///
	/// Return an iterator over every `(name, include_subdomains)` pair in the
	/// table. Entries come back in slot order, which is effectively random.
	///
	/// ## Examples
	///
	/// ```
	/// use hsts_preload::Builder;
	///
	/// let mut builder = Builder::new();
	/// builder.push("a.b", true);
	/// builder.push("x.y", false);
	/// let table = builder.build().unwrap();
	///
	/// let mut all: Vec<_> = table.iter().collect();
	/// all.sort_unstable();
	/// assert_eq!(all, [("a.b", true), ("x.y", false)]);
	/// ```
	pub fn iter(&self) -> impl Iterator<Item=(&str, bool)> {
		let names: &str = &self.names;
		let end = self.include_subdomains_end as usize;
		self.level1.iter()
			.filter_map(move |&slot| {
				let (offset, len) = unpack(slot);
				if len == 0 { None }
				else {
					let name = names.get(offset..offset + len)?;
					Some((name, offset < end))
				}
			})
	}
}

/// # Lookup.
impl Table<'_> {
	#[must_use]
	/// # Lookup.
	///
	/// Find an exact entry for `src`, which should already be lowercase ASCII.
	/// If found, `Some(include_subdomains)` is returned, otherwise `None`.
	///
	/// Parent domains are not considered; see [`Table::is_preloaded`] for
	/// that.
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
	/// assert_eq!(table.lookup("a.b"), Some(true));
	/// assert_eq!(table.lookup("x.y"), Some(false));
	/// assert_eq!(table.lookup("z.a.b"), None);
	/// ```
	pub fn lookup(&self, src: &str) -> Option<bool> {
		let bytes = src.as_bytes();
		let mut idx = murmur3(0, bytes);

		let mask0 = self.level0.len().wrapping_sub(1);
		let seed = self.level0.get(idx as usize & mask0).copied().unwrap_or(0);
		if seed > 0 { idx = murmur3(u32::from(seed), bytes); }

		let mask1 = self.level1.len().wrapping_sub(1);
		let slot = self.level1.get(idx as usize & mask1).copied()?;
		let (offset, len) = unpack(slot);

		// Only the bytes can tell a member from a stray probe. Empty slots
		// have no length and never match.
		if 0 != len && self.names.as_bytes().get(offset..offset + len) == Some(bytes) {
			Some(self.is_subdomain_offset(offset))
		}
		else { None }
	}

	#[inline]
	/// # Offset Includes Subdomains?
	const fn is_subdomain_offset(&self, offset: usize) -> bool {
		offset < self.include_subdomains_end as usize
	}
}



#[inline]
/// # Unpack Slot.
///
/// Split a packed slot into its offset and length.
const fn unpack(slot: u32) -> (usize, usize) {
	((slot & OFFSET_MASK) as usize, (slot >> 24) as usize)
}
