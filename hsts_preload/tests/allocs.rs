/*!
# HSTS Preload: Allocation Tests

ASCII lookups shouldn't touch the heap, no matter how the host is dressed up.
*/

use hsts_preload::{
	Builder,
	is_preloaded,
};
use std::{
	alloc::{
		GlobalAlloc,
		Layout,
		System,
	},
	cell::Cell,
	hint::black_box,
};



thread_local! {
	/// # Allocations (This Thread).
	static ALLOCS: Cell<usize> = const { Cell::new(0) };
}

/// # Counting Allocator.
struct Counter;

impl Counter {
	/// # Bump.
	fn bump() { let _res = ALLOCS.try_with(|c| c.set(c.get() + 1)); }
}

unsafe impl GlobalAlloc for Counter {
	unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
		Self::bump();
		unsafe { System.alloc(layout) }
	}

	unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
		Self::bump();
		unsafe { System.alloc_zeroed(layout) }
	}

	unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
		Self::bump();
		unsafe { System.realloc(ptr, layout, new_size) }
	}

	unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
		unsafe { System.dealloc(ptr, layout); }
	}
}

#[global_allocator]
static GLOBAL: Counter = Counter;

/// # Hosts.
///
/// Plain, shouty, dotted, too deep, and not hosts at all.
const HOSTS: [&str; 24] = [
	"very.long.domain.name.tomthorogood.net",
	"www.tomthorogood.net",
	"tomthorogood.net",
	"tmthrgd.dev",
	"dev",
	"www.example.uk",
	"example.uk",
	"uk",
	"www.example.com",
	"example.com",
	"com",
	"test.g.co",
	"www.g.co",
	"g.co",
	"WWW.TomThorogood.NET",
	"TMTHRGD.DEV.",
	"g.co.",
	"Example.COM.",
	"a.b.c.d.e.f.g.h.i.j.k.l.m.n.o.p.tomthorogood.net",
	"A.B.C.D.E.F.G.H.I.J.K.L.M.N.O.P.EXAMPLE.COM.",
	"1.0.0.1",
	"[::1]",
	".",
	"",
];

/// # Count Allocations.
///
/// Run the callback once to warm up, then return the number of allocations
/// made over ten more runs.
fn allocs<F: FnMut()>(mut cb: F) -> usize {
	cb();
	let before = ALLOCS.with(Cell::get);
	for _ in 0..10 { cb(); }
	ALLOCS.with(Cell::get) - before
}

#[test]
fn t_counter() {
	// Make sure the counter is actually counting.
	assert_eq!(allocs(|| drop(black_box(vec![1_u8]))), 10);
}

#[test]
fn t_is_preloaded_allocs() {
	let n = allocs(|| {
		for host in HOSTS { black_box(is_preloaded(black_box(host))); }
	});
	assert_eq!(n, 0, "Embedded lookups allocated.");
}

#[test]
fn t_table_allocs() {
	let table = Builder::from_iter([
		("tomthorogood.net", true),
		("dev", true),
		("g.co", false),
		("www.g.co", false),
		("login.corp.internal.example.co.nz", false),
	])
		.build()
		.expect("Build failed.");

	let n = allocs(|| {
		for host in HOSTS { black_box(table.is_preloaded(black_box(host))); }
	});
	assert_eq!(n, 0, "Custom table lookups allocated.");
}
