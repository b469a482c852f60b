use std::collections::HashSet;

use crate::store::TierSlot;

/// Week-1 rank order derived from the published schedule alone.
///
/// `slots` are the week's elite tiers in ascending tier order. Two-team tiers
/// are taken in pairs and emitted A, B, A, B; a three-team tier that turns up
/// while a pair is half complete is held and emitted after the pair. Each
/// name appears once, at its first emission.
pub fn seed_order(slots: &[TierSlot]) -> Vec<String> {
    let mut emitted = Vec::new();
    let mut seen = HashSet::new();
    let mut pair: Vec<&TierSlot> = Vec::new();
    let mut held: Vec<&TierSlot> = Vec::new();

    let mut emit = |slot: &TierSlot, out: &mut Vec<String>| {
        for &label in slot.format.spec().labels {
            if let Some(name) = slot.team_at(label) {
                if seen.insert(name.trim().to_lowercase()) {
                    out.push(name.to_string());
                }
            }
        }
    };

    for slot in slots {
        match slot.format.spec().team_count() {
            2 => {
                pair.push(slot);
                if pair.len() == 2 {
                    for s in pair.drain(..) {
                        emit(s, &mut emitted);
                    }
                    for s in held.drain(..) {
                        emit(s, &mut emitted);
                    }
                }
            }
            _ if pair.is_empty() => emit(slot, &mut emitted),
            _ => held.push(slot),
        }
    }

    for s in pair.into_iter().chain(held) {
        emit(s, &mut emitted);
    }
    emitted
}
