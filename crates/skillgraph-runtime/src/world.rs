//! Battle world state: the unit registry and its mutation surface.

use std::collections::HashMap;

use skillgraph_core::combat::{StatKind, UnitId};

use crate::model::{StatModifier, Unit};

/// All mutable state of one battle instance.
///
/// Mutation goes through [`apply_damage`](Self::apply_damage) and
/// [`apply_modifier`](Self::apply_modifier), which are what committed
/// commands call. Both tolerate vanished units; entity-lifetime races are
/// expected.
#[derive(Debug, Default)]
pub struct BattleContext {
    units: HashMap<UnitId, Unit>,
}

impl BattleContext {
    pub fn new() -> Self {
        BattleContext::default()
    }

    /// Registers a unit, replacing any previous unit with the same id.
    pub fn add_unit(&mut self, unit: Unit) {
        self.units.insert(unit.id, unit);
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Applies integer damage, floor-clamped at zero health. Non-positive
    /// amounts and unknown targets are no-ops.
    pub fn apply_damage(&mut self, target: UnitId, damage: i32) {
        if damage <= 0 {
            return;
        }
        let Some(unit) = self.units.get_mut(&target) else {
            return;
        };
        let health = unit.stats.get(StatKind::Health);
        unit.stats.set(StatKind::Health, (health - damage).max(0));
    }

    /// Applies a stat modifier. Unknown targets are a no-op.
    pub fn apply_modifier(&mut self, target: UnitId, modifier: StatModifier) {
        if let Some(unit) = self.units.get_mut(&target) {
            unit.stats.apply_modifier(modifier);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StatCollection;

    fn unit_with_health(id: u32, health: i32) -> Unit {
        Unit::new(UnitId(id), StatCollection::new().with(StatKind::Health, health))
    }

    #[test]
    fn apply_damage_subtracts_health() {
        let mut context = BattleContext::new();
        context.add_unit(unit_with_health(1, 500));
        context.apply_damage(UnitId(1), 100);
        assert_eq!(context.unit(UnitId(1)).unwrap().stats.get(StatKind::Health), 400);
    }

    #[test]
    fn apply_damage_floors_at_zero() {
        let mut context = BattleContext::new();
        context.add_unit(unit_with_health(1, 50));
        context.apply_damage(UnitId(1), 100);
        assert_eq!(context.unit(UnitId(1)).unwrap().stats.get(StatKind::Health), 0);
    }

    #[test]
    fn non_positive_damage_is_ignored() {
        let mut context = BattleContext::new();
        context.add_unit(unit_with_health(1, 500));
        context.apply_damage(UnitId(1), 0);
        context.apply_damage(UnitId(1), -25);
        assert_eq!(context.unit(UnitId(1)).unwrap().stats.get(StatKind::Health), 500);
    }

    #[test]
    fn vanished_target_is_tolerated() {
        let mut context = BattleContext::new();
        context.apply_damage(UnitId(9), 100);
        context.apply_modifier(UnitId(9), StatModifier::new(StatKind::Armor, 5));
        assert_eq!(context.unit_count(), 0);
    }

    #[test]
    fn apply_modifier_adjusts_stat() {
        let mut context = BattleContext::new();
        context.add_unit(unit_with_health(1, 100));
        context.apply_modifier(UnitId(1), StatModifier::new(StatKind::Armor, 25));
        assert_eq!(context.unit(UnitId(1)).unwrap().stats.get(StatKind::Armor), 25);
    }
}
