//! Property-based checks for the bullet-effect expansion formula (§4.4):
//! fragmenting's child count/damage relationship and priority-ordering
//! should hold for any damage value and any rng draw, not just the fixed
//! examples the inline unit tests use.

use std::collections::HashSet;

use arena_room_core::components::entity::Team;
use arena_room_core::components::weapon::BulletEffect;
use arena_room_core::glossary::BULLET_EFFECT_EXPANSION_PRIORITY;
use arena_room_core::ids::GameId;
use arena_room_core::systems::bullet_effects::{expand_dismissed_projectile, DismissedProjectile};
use bevy::prelude::Vec2;
use proptest::prelude::*;
use rand::SeedableRng;

fn hit(damage: f32, effects: HashSet<BulletEffect>) -> DismissedProjectile {
    DismissedProjectile {
        position: Vec2::ZERO,
        velocity: Vec2::X,
        damage,
        owner_id: GameId(1),
        owner_team: Team(1),
        bullet_effects: effects,
        speed_at_dismissal: 300.0,
    }
}

proptest! {
    #[test]
    fn fragmenting_child_count_and_damage_follow_the_formula(
        damage in 0.0_f32..500.0,
        seed in any::<u64>(),
    ) {
        let mut effects = HashSet::new();
        effects.insert(BulletEffect::Fragmenting);
        let record = hit(damage, effects);
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let result = expand_dismissed_projectile(&record, 0.0, &mut rng);

        let expected_count = 3 + (damage / 15.0).floor() as u32;
        prop_assert_eq!(result.fragments.len(), expected_count as usize);
        for fragment in &result.fragments {
            prop_assert!((fragment.damage - damage * 0.4).abs() < 1e-4);
            prop_assert!(!fragment.bullet_effects.contains(&BulletEffect::Fragmenting));
        }
        // fragmenting is exclusive: no other field effect rides along.
        prop_assert_eq!(result.field_effects.len(), 1);
    }

    #[test]
    fn non_fragmenting_effects_never_exceed_the_priority_list_and_stay_ordered(
        damage in 0.0_f32..500.0,
        seed in any::<u64>(),
        include_explosive in any::<bool>(),
        include_incendiary in any::<bool>(),
        include_electric in any::<bool>(),
        include_freezing in any::<bool>(),
        include_poison in any::<bool>(),
    ) {
        let mut effects = HashSet::new();
        if include_explosive { effects.insert(BulletEffect::Explosive); }
        if include_incendiary { effects.insert(BulletEffect::Incendiary); }
        if include_electric { effects.insert(BulletEffect::Electric); }
        if include_freezing { effects.insert(BulletEffect::Freezing); }
        if include_poison { effects.insert(BulletEffect::Poison); }

        let expected_kinds: Vec<BulletEffect> = BULLET_EFFECT_EXPANSION_PRIORITY
            .iter()
            .copied()
            .filter(|e| effects.contains(e))
            .collect();

        let record = hit(damage, effects);
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let result = expand_dismissed_projectile(&record, 0.0, &mut rng);

        prop_assert_eq!(result.fragments.len(), 0);
        prop_assert_eq!(result.field_effects.len(), expected_kinds.len());
    }
}
