//! Turn-over-turn field merging
//!
//! The carry-forward rule: not mentioning a field this turn means "keep the
//! previous value", not "reset to default". A field the user explicitly
//! asked to remove is force-reset to its schema default — delete wins over
//! carry-forward, and an explicit new value wins over both.

use report_agent_core::EntityMap;
use report_agent_core::Field;

/// Merge the current extraction over the prior turn's fields.
///
/// Any current value that is a sentinel ("All"/"N/A") or equals the field's
/// numeric default is overwritten by the prior value when one exists. With
/// no prior fields the current extraction passes through unchanged.
pub fn merge_entities(prior: &EntityMap, current: &EntityMap, defaults: &EntityMap) -> EntityMap {
    if prior.is_empty() {
        return current.clone();
    }

    let mut merged = EntityMap::new();
    for (field, value) in current {
        let unspecified = defaults
            .get(field)
            .map(|default| value.is_sentinel(default))
            .unwrap_or(false);
        let resolved = if unspecified {
            prior.get(field).cloned().unwrap_or_else(|| value.clone())
        } else {
            value.clone()
        };
        merged.insert(*field, resolved);
    }
    merged
}

/// Force removal-detected fields back to their schema defaults.
pub fn apply_removals(entities: &mut EntityMap, removals: &[Field], defaults: &EntityMap) {
    for field in removals {
        if let Some(default) = defaults.get(field) {
            entities.insert(*field, default.clone());
        }
    }
}
