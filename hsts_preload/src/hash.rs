/*!
# HSTS Preload: Hash

This module is also compiled into `build.rs`, so it must not reference
anything else in the crate.
*/

/// # Murmur3 C1.
const C1: u32 = 0xcc9e_2d51;

/// # Murmur3 C2.
const C2: u32 = 0x1b87_3593;



#[allow(clippy::cast_possible_truncation)]
#[must_use]
/// # Murmur3 (32-bit).
///
/// Hash `src` using `seed` as the starting state.
///
/// Both table construction and lookup run every key through this, so the
/// output must never change; a table built with one version of this function
/// is garbage to any other.
pub const fn murmur3(seed: u32, src: &[u8]) -> u32 {
	let len = src.len();
	let mut h = seed;

	// Whole chunks.
	let mut i = 0;
	while i + 4 <= len {
		let k = u32::from_le_bytes([src[i], src[i + 1], src[i + 2], src[i + 3]]);
		h ^= mix(k);
		h = h.rotate_left(13).wrapping_mul(5).wrapping_add(0xe654_6b64);
		i += 4;
	}

	// Leftovers. Mixing an empty tail is a no-op.
	let mut k: u32 = 0;
	match len & 3 {
		3 => {
			k = (src[i + 2] as u32) << 16 | (src[i + 1] as u32) << 8 | src[i] as u32;
		},
		2 => {
			k = (src[i + 1] as u32) << 8 | src[i] as u32;
		},
		1 => { k = src[i] as u32; },
		_ => {},
	}
	h ^= mix(k);

	// Finalize.
	h ^= len as u32;
	h ^= h >> 16;
	h = h.wrapping_mul(0x85eb_ca6b);
	h ^= h >> 13;
	h = h.wrapping_mul(0xc2b2_ae35);
	h ^ (h >> 16)
}

#[inline]
/// # Mix Block.
const fn mix(k: u32) -> u32 {
	k.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2)
}
