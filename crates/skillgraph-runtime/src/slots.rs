//! Flat per-kind slot storage for one plan execution.

use skillgraph_codegen::SlotLayout;
use skillgraph_core::combat::UnitId;

use crate::model::DamageSpec;

/// The three flat value arrays a plan's instructions address.
///
/// Rented per execution and fully cleared afterward -- no value survives
/// across events. Pooling the backing allocations is fine as long as the
/// clear between reuses stays.
#[derive(Debug, Clone)]
pub struct SlotStorage {
    pub numbers: Vec<f32>,
    pub entities: Vec<UnitId>,
    pub damage_specs: Vec<DamageSpec>,
}

impl SlotStorage {
    /// Allocates zeroed slot arrays sized to a plan's layout.
    pub fn rent(layout: SlotLayout) -> Self {
        SlotStorage {
            numbers: vec![0.0; layout.numbers as usize],
            entities: vec![UnitId::NONE; layout.entities as usize],
            damage_specs: vec![DamageSpec::default(); layout.damage_specs as usize],
        }
    }

    /// Resets every slot to its default value.
    pub fn clear(&mut self) {
        self.numbers.fill(0.0);
        self.entities.fill(UnitId::NONE);
        self.damage_specs.fill(DamageSpec::default());
    }
}
