//! Coin flip for first turn.

use rand::Rng;

use crate::unit::SideId;

/// Fair 50/50 choice of the side that acts first.
pub fn coin_flip<R: Rng + ?Sized>(rng: &mut R) -> SideId {
    if rng.gen_bool(0.5) {
        SideId::Human
    } else {
        SideId::Ai
    }
}
