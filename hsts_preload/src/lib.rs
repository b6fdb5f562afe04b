/*!
# HSTS Preload

This crate answers one question, quickly and without allocating: is a given host, or a parent domain covering its subdomains, on the [Chromium HSTS preload list](https://hstspreload.org/)?

```
use hsts_preload::is_preloaded;

// The entire .dev TLD is preloaded, subdomains and all.
assert!(is_preloaded("dev"));
assert!(is_preloaded("www.Example.DEV."));

// Plenty of things aren't.
assert!(! is_preloaded("example.com"));
assert!(! is_preloaded("127.0.0.1"));
```

Matching is case-insensitive, forgives a single trailing dot, and converts internationalized names to Punycode before lookup. IP addresses are never considered preloaded.

Note: the list is baked into this crate at build time, compressed into a two-level minimal perfect hash table. That keeps lookups cheap (a handful of hashes and one byte comparison per label), but means implementing apps can grow stale if they haven't been (re)packaged in a while.



## Custom Lists

Arbitrary lists can be crunched into a [`Table`] at runtime with the [`Builder`]:

```
use hsts_preload::Builder;

let table = Builder::from_iter([("a.b", true), ("x.y", false)])
    .build()
    .unwrap();

assert!(table.is_preloaded("a.b"));
assert!(table.is_preloaded("z.a.b"));   // Subdomains included.
assert!(table.is_preloaded("x.y"));
assert!(! table.is_preloaded("z.x.y")); // Subdomains not included.
```



## HTTP Upgrades

The [`Upgrade`] wrapper turns any [`RoundTrip`] implementation into one that quietly rewrites `http://` requests for preloaded hosts to `https://`.



## Build Environment

Out of the box, only a small excerpt of the list is bundled, enough for offline builds and docs. To embed the whole thing, set one of the following when building:

* `HSTS_PRELOAD_FETCH`: download a fresh copy of the list from Chromium's repository.
* `HSTS_PRELOAD_FILE`: load a local copy of `transport_security_state_static.json`.

And for debugging:

* `SHOW_TOTALS`: print entry and table totals (and skipped names) as build warnings.
*/

#![warn(clippy::filetype_is_file)]
#![warn(clippy::integer_division)]
#![warn(clippy::needless_borrow)]
#![warn(clippy::nursery)]
#![warn(clippy::pedantic)]
#![warn(clippy::perf)]
#![warn(clippy::suboptimal_flops)]
#![warn(clippy::unneeded_field_pattern)]
#![warn(macro_use_extern_crate)]
#![warn(missing_copy_implementations)]
#![warn(missing_debug_implementations)]
#![warn(missing_docs)]
#![warn(non_ascii_idents)]
#![warn(trivial_casts)]
#![warn(trivial_numeric_casts)]
#![warn(unreachable_pub)]
#![warn(unused_crate_dependencies)]
#![warn(unused_extern_crates)]
#![warn(unused_import_braces)]

#![allow(clippy::module_name_repetitions)]



mod builder;
mod hash;
mod matcher;
mod preloaded;
mod table;
mod transport;

pub use builder::{
	Builder,
	BuildError,
};
pub use hash::murmur3;
use preloaded::PRELOADED;
pub use table::Table;
pub use transport::{
	Request,
	RoundTrip,
	RoundTripFn,
	Upgrade,
	upgrade_url,
};



#[must_use]
/// # Is Preloaded?
///
/// Returns `true` if `host`, or a parent domain that includes its
/// subdomains, is on the embedded HSTS preload list.
///
/// See [`Table::is_preloaded`] for the details.
///
/// ## Examples
///
/// ```
/// use hsts_preload::is_preloaded;
///
/// assert!(is_preloaded("tomthorogood.net"));
/// assert!(is_preloaded("very.long.domain.name.tomthorogood.net"));
///
/// // Exact-only entries don't extend to their subdomains.
/// assert!(is_preloaded("g.co"));
/// assert!(! is_preloaded("test.g.co"));
/// ```
pub fn is_preloaded(host: &str) -> bool { PRELOADED.is_preloaded(host) }

#[must_use]
/// # Preloaded Table.
///
/// Return a reference to the embedded table.
pub fn preloaded() -> &'static Table<'static> { &PRELOADED }
