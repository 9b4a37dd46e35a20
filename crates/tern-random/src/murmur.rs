//! The subset of Scala's `MurmurHash3` needed to scramble generator seeds.

/// `scala.util.hashing.MurmurHash3.arraySeed`
pub(crate) const ARRAY_SEED: u32 = 0x3c07_4a61;

const C1: u32 = 0xcc9e_2d51;
const C2: u32 = 0x1b87_3593;

fn scramble(k: u32) -> u32 {
    k.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2)
}

fn mix(h: u32, k: u32) -> u32 {
    (h ^ scramble(k))
        .rotate_left(13)
        .wrapping_mul(5)
        .wrapping_add(0xe654_6b64)
}

fn finalize(mut h: u32, len: usize) -> u32 {
    h ^= len as u32;
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^ (h >> 16)
}

/// Equivalent of `MurmurHash3.bytesHash(data, seed)`.
pub(crate) fn bytes_hash(data: &[u8], seed: u32) -> u32 {
    let mut chunks = data.chunks_exact(4);
    let mut h = seed;
    for chunk in &mut chunks {
        h = mix(h, u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    let tail = chunks.remainder();
    if !tail.is_empty() {
        let k = tail
            .iter()
            .enumerate()
            .fold(0u32, |k, (i, byte)| k ^ (u32::from(*byte) << (8 * i)));
        h ^= scramble(k);
    }
    finalize(h, data.len())
}
