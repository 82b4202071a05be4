//! Attack resolution with counterattacks.
//!
//! An exchange is one attack plus an optional counterattack:
//! - Damage is rolled uniformly in the attacker's `[min, max]`.
//! - The target counters if it is a Sniper (any distance) or a Brawler
//!   adjacent to the attacker. Eligibility is fixed before damage lands, so a
//!   target killed by the attack still counters.
//! - Counter damage is rolled in `[1, 3]`.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::RejectReason;
use crate::unit::{Archetype, SideId, Unit, UnitId};

/// Inclusive counterattack damage bounds.
pub const COUNTER_DAMAGE: (u32, u32) = (1, 3);

/// Outcome of one attack exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackReport {
    /// Attacking unit.
    pub attacker: UnitId,
    /// Attacked unit.
    pub target: UnitId,
    /// Manhattan distance at the time of the attack.
    pub distance: u32,
    /// Damage rolled by the attacker.
    pub damage: u32,
    /// Counter damage, if the target countered.
    pub counter_damage: Option<u32>,
    /// Attacker HP before the exchange.
    pub attacker_hp_before: u32,
    /// Attacker HP after the exchange.
    pub attacker_hp_after: u32,
    /// Target HP before the exchange.
    pub target_hp_before: u32,
    /// Target HP after the exchange.
    pub target_hp_after: u32,
}

impl AttackReport {
    /// Target went from alive to dead in this exchange.
    #[must_use]
    pub const fn target_died(&self) -> bool {
        self.target_hp_before > 0 && self.target_hp_after == 0
    }

    /// Attacker went from alive to dead in this exchange.
    #[must_use]
    pub const fn attacker_died(&self) -> bool {
        self.attacker_hp_before > 0 && self.attacker_hp_after == 0
    }
}

/// Whether `target` strikes back when attacked from `distance`.
#[must_use]
pub const fn counters(target: Archetype, distance: u32) -> bool {
    match target {
        Archetype::Sniper => true,
        Archetype::Brawler => distance <= 1,
    }
}

/// Resolve an attack from `attacker` on `target`.
///
/// Fails if the target is dead or out of range. Sets `has_attacked` on
/// success. The per-turn attack limit is enforced by the match controller.
pub fn resolve_attack<R: Rng + ?Sized>(
    attacker: &mut Unit,
    target: &mut Unit,
    rng: &mut R,
) -> Result<AttackReport, RejectReason> {
    if !target.is_alive() {
        return Err(RejectReason::TargetDead(target.id));
    }
    let distance = attacker.distance_to(target.position);
    if distance > attacker.attack_range {
        return Err(RejectReason::TargetOutOfRange {
            distance,
            range: attacker.attack_range,
        });
    }

    let will_counter = counters(target.archetype, distance);
    let attacker_hp_before = attacker.hp;
    let target_hp_before = target.hp;

    let damage = rng.gen_range(attacker.damage_min..=attacker.damage_max);
    let counter_damage = will_counter.then(|| rng.gen_range(COUNTER_DAMAGE.0..=COUNTER_DAMAGE.1));

    target.take_damage(damage);
    if let Some(counter) = counter_damage {
        attacker.take_damage(counter);
    }
    attacker.has_attacked = true;

    tracing::debug!(
        attacker = %attacker.id,
        target = %target.id,
        distance,
        damage,
        counter = ?counter_damage,
        "Attack resolved"
    );

    Ok(AttackReport {
        attacker: attacker.id,
        target: target.id,
        distance,
        damage,
        counter_damage,
        attacker_hp_before,
        attacker_hp_after: attacker.hp,
        target_hp_before,
        target_hp_after: target.hp,
    })
}

/// Detect the special draw after an exchange.
///
/// All must hold: both participants died, neither side has a living unit
/// left, both are Snipers on opposing sides, both had exactly 1 HP before the
/// exchange, and each stood within the other's range.
#[must_use]
pub fn check_mutual_destruction(report: &AttackReport, units: &[Unit]) -> bool {
    if !(report.attacker_died() && report.target_died()) {
        return false;
    }
    if report.attacker_hp_before != 1 || report.target_hp_before != 1 {
        return false;
    }
    if SideId::ALL
        .iter()
        .any(|&side| units.iter().any(|u| u.side == side && u.is_alive()))
    {
        return false;
    }

    let find = |id: UnitId| units.iter().find(|u| u.id == id);
    let (Some(attacker), Some(target)) = (find(report.attacker), find(report.target)) else {
        return false;
    };

    attacker.archetype == Archetype::Sniper
        && target.archetype == Archetype::Sniper
        && attacker.side != target.side
        && attacker.in_attack_range(target)
        && target.in_attack_range(attacker)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::grid::GridPos;

    fn unit(id: u32, side: SideId, archetype: Archetype, x: i32, y: i32) -> Unit {
        Unit::new(UnitId(id), side, archetype, GridPos::new(x, y))
    }

    #[test]
    fn test_sniper_hits_distant_brawler_without_counter() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut sniper = unit(0, SideId::Human, Archetype::Sniper, 0, 0);
        let mut brawler = unit(1, SideId::Ai, Archetype::Brawler, 3, 4);

        let report = sniper.attack(&mut brawler, &mut rng).unwrap();
        assert_eq!(report.distance, 7);
        assert!((4..=8).contains(&report.damage));
        assert_eq!(report.counter_damage, None);
        assert_eq!(brawler.hp, 40 - report.damage);
        assert_eq!(sniper.hp, 20);
        assert!(sniper.has_attacked);
    }

    #[test]
    fn test_sniper_target_always_counters() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut attacker = unit(0, SideId::Human, Archetype::Sniper, 0, 0);
        let mut target = unit(1, SideId::Ai, Archetype::Sniper, 0, 9);

        let report = attacker.attack(&mut target, &mut rng).unwrap();
        let counter = report.counter_damage.unwrap();
        assert!((1..=3).contains(&counter));
        assert_eq!(attacker.hp, 20 - counter);
    }

    #[test]
    fn test_adjacent_brawler_counters() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut attacker = unit(0, SideId::Ai, Archetype::Brawler, 4, 4);
        let mut target = unit(1, SideId::Human, Archetype::Brawler, 4, 5);

        let report = attacker.attack(&mut target, &mut rng).unwrap();
        assert!(report.counter_damage.is_some());
        assert!((1..=6).contains(&report.damage));
    }

    #[test]
    fn test_out_of_range_rejected_without_change() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut attacker = unit(0, SideId::Ai, Archetype::Brawler, 0, 0);
        let mut target = unit(1, SideId::Human, Archetype::Sniper, 2, 0);

        let result = attacker.attack(&mut target, &mut rng);
        assert_eq!(
            result,
            Err(RejectReason::TargetOutOfRange {
                distance: 2,
                range: 1
            })
        );
        assert_eq!(target.hp, 20);
        assert!(!attacker.has_attacked);
    }

    #[test]
    fn test_dead_target_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut attacker = unit(0, SideId::Ai, Archetype::Sniper, 0, 0);
        let mut target = unit(1, SideId::Human, Archetype::Sniper, 1, 0);
        target.hp = 0;

        assert_eq!(
            attacker.attack(&mut target, &mut rng),
            Err(RejectReason::TargetDead(UnitId(1)))
        );
    }

    #[test]
    fn test_killed_target_still_counters() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut attacker = unit(0, SideId::Human, Archetype::Sniper, 0, 0);
        let mut target = unit(1, SideId::Ai, Archetype::Sniper, 5, 0);
        target.hp = 1;

        let report = attacker.attack(&mut target, &mut rng).unwrap();
        assert!(report.target_died());
        assert!(report.counter_damage.is_some());
    }

    #[test]
    fn test_damage_bounds_over_many_rolls() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..200 {
            let mut attacker = unit(0, SideId::Human, Archetype::Brawler, 0, 0);
            let mut target = unit(1, SideId::Ai, Archetype::Brawler, 1, 0);
            let report = attacker.attack(&mut target, &mut rng).unwrap();
            assert!((1..=6).contains(&report.damage));
            let counter = report.counter_damage.unwrap();
            assert!((1..=3).contains(&counter));
        }
    }

    #[test]
    fn test_mutual_destruction_two_one_hp_snipers() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut a = unit(0, SideId::Human, Archetype::Sniper, 0, 0);
        let mut b = unit(1, SideId::Ai, Archetype::Sniper, 0, 6);
        a.hp = 1;
        b.hp = 1;

        let report = a.attack(&mut b, &mut rng).unwrap();
        let mut brawler_h = unit(2, SideId::Human, Archetype::Brawler, 5, 5);
        let mut brawler_a = unit(3, SideId::Ai, Archetype::Brawler, 6, 6);
        brawler_h.hp = 0;
        brawler_a.hp = 0;

        let units = vec![a, b, brawler_h, brawler_a];
        assert!(check_mutual_destruction(&report, &units));
    }

    #[test]
    fn test_no_mutual_destruction_when_survivor_exists() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut a = unit(0, SideId::Human, Archetype::Sniper, 0, 0);
        let mut b = unit(1, SideId::Ai, Archetype::Sniper, 0, 6);
        a.hp = 1;
        b.hp = 1;

        let report = a.attack(&mut b, &mut rng).unwrap();
        let brawler = unit(2, SideId::Human, Archetype::Brawler, 5, 5);
        let units = vec![a, b, brawler];
        assert!(!check_mutual_destruction(&report, &units));
    }

    #[test]
    fn test_no_mutual_destruction_above_one_hp() {
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let mut a = unit(0, SideId::Human, Archetype::Sniper, 0, 0);
        let mut b = unit(1, SideId::Ai, Archetype::Sniper, 0, 6);
        a.hp = 1;
        b.hp = 2;
        // A 2-HP target rules out the draw whatever the rolls.
        let report = a.attack(&mut b, &mut rng).unwrap();
        let units = vec![a, b];
        assert!(!check_mutual_destruction(&report, &units));
    }
}
