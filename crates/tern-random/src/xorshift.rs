use crate::murmur;

/// An XOR-shift generator producing the same stream as Spark's
/// `org.apache.spark.util.random.XORShiftRandom` for a given seed.
#[derive(Debug, Clone)]
pub struct XorShiftRandom {
    state: i64,
}

impl XorShiftRandom {
    pub fn new(seed: i64) -> Self {
        Self {
            state: Self::hash_seed(seed),
        }
    }

    /// Spreads the seed bits with two rounds of MurmurHash3 over its
    /// big-endian bytes.
    fn hash_seed(seed: i64) -> i64 {
        let bytes = seed.to_be_bytes();
        let low = murmur::bytes_hash(&bytes, murmur::ARRAY_SEED);
        let high = murmur::bytes_hash(&bytes, low);
        (i64::from(high) << 32) | i64::from(low)
    }

    /// Same contract as `java.util.Random.next(bits)`.
    fn next_bits(&mut self, bits: u32) -> i64 {
        let mut x = self.state ^ (self.state << 21);
        x ^= ((x as u64) >> 35) as i64;
        x ^= x << 4;
        self.state = x;
        x & ((1i64 << bits) - 1)
    }

    /// Returns a uniformly distributed value in `[0.0, 1.0)`.
    pub fn next_double(&mut self) -> f64 {
        let high = self.next_bits(26) << 27;
        let low = self.next_bits(27);
        (high + low) as f64 / (1i64 << 53) as f64
    }

    pub fn next_int(&mut self) -> i32 {
        self.next_bits(32) as u32 as i32
    }
}
