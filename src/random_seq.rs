use crate::common::{Sequence, VALID_BASES};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

///
/// generate random bases of given length with the given random source
///
pub fn generate_with<R: Rng>(rng: &mut R, length: usize) -> Sequence {
    let mut seq: Sequence = Vec::with_capacity(length);
    for _ in 0..length {
        let base = VALID_BASES.choose(rng).unwrap();
        seq.push(*base);
    }
    seq
}

///
/// generate random bases of given length from seed
///
pub fn generate(length: usize, seed: u64) -> Sequence {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    generate_with(&mut rng, length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::sequence_to_string;

    #[test]
    fn random_seq() {
        let s = generate(10, 0);
        println!("{:?}", sequence_to_string(&s));
        assert_eq!(s.len(), 10);
        assert!(s.iter().all(|base| VALID_BASES.contains(base)));

        // same seed gives same bases, different seed differs
        assert_eq!(generate(50, 0), generate(50, 0));
        assert_ne!(generate(50, 0), generate(50, 11));
    }
}
