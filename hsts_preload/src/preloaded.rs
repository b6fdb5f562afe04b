/*!
# HSTS Preload: Embedded Table
*/

use crate::Table;

// This is compiled by `build.rs` using the template `../skel/hsts.rs.txt`. It
// brings in:
// * `static PRELOADED: Table<'static>`
// * `const NAMES: &str`
// * `static LEVEL0: [u16; _]`
// * `static LEVEL1: [u32; _]`
include!(concat!(env!("OUT_DIR"), "/hsts-preload.rs"));
