//! Celebratory one-liners attached to positive detections.

use rand::seq::SliceRandom;
use rand::Rng;

pub const PUNS: [&str; 5] = [
    "Shelf-aware decision!",
    "Receipt-ing our victory!",
    "This one\u{2019}s a total checkout.",
    "Aisle be back with more detections.",
    "We\u{2019}re bagging this as a shop!",
];

/// Uniformly random pun.
pub fn pick_pun<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    PUNS.choose(rng).copied().unwrap_or(PUNS[0])
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn pick_is_always_from_the_list() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            assert!(PUNS.contains(&pick_pun(&mut rng)));
        }
    }

    #[test]
    fn every_pun_is_reachable() {
        let mut rng = rand::thread_rng();
        let seen: HashSet<_> = (0..1_000).map(|_| pick_pun(&mut rng)).collect();
        assert_eq!(seen.len(), PUNS.len());
    }
}
