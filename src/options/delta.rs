//! Option delta engine: overlay a sparse request onto defaults and report
//! exactly which option changed.
//!
//! Comparison runs are only meaningful when a single option differs from the
//! baseline; output directories are named after that option. More than one
//! change is a configuration error.

use crate::error::{Result, SweepError};
use crate::options::set::{OptionSet, is_truthy, values_equal};
use serde::Serialize;
use serde_json::Value;

/// One option whose effective value differs from its default.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionChange {
    pub key: String,
    /// `None` for extension keys that have no default.
    pub old: Option<Value>,
    pub new: Value,
}

/// The set of changed options, in default-key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OptionDelta {
    changes: Vec<OptionChange>,
}

impl OptionDelta {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn changes(&self) -> &[OptionChange] {
        &self.changes
    }

    /// The single change of a validated delta.
    pub fn single(&self) -> Option<&OptionChange> {
        match self.changes.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// Changed keys mapped to their new values.
    pub fn as_option_set(&self) -> OptionSet {
        self.changes
            .iter()
            .map(|c| (c.key.clone(), c.new.clone()))
            .collect()
    }
}

/// Compute the effective options without enforcing the single-change rule.
///
/// Requested values replace defaults only when truthy; requested keys without
/// a default are carried over as extensions. The delta is computed key by key
/// over the union of both maps.
pub fn overlay(requested: &OptionSet, default: &OptionSet) -> (OptionSet, OptionDelta) {
    let mut effective = OptionSet::new();
    for (key, default_value) in default.iter() {
        let value = match requested.get(key) {
            Some(v) if is_truthy(v) => v,
            _ => default_value,
        };
        effective.insert(key, value.clone());
    }
    for (key, value) in requested.iter() {
        if !default.contains_key(key) {
            effective.insert(key, value.clone());
        }
    }

    let changes = effective
        .iter()
        .filter_map(|(key, new)| {
            let old = default.get(key);
            match old {
                Some(old) if values_equal(old, new) => None,
                _ => Some(OptionChange {
                    key: key.to_string(),
                    old: old.cloned(),
                    new: new.clone(),
                }),
            }
        })
        .collect();

    (effective, OptionDelta { changes })
}

/// Resolve a requested override against the defaults.
///
/// Returns the effective option set and the delta, or
/// [`SweepError::MultipleChanges`] when more than one option differs.
pub fn resolve(requested: &OptionSet, default: &OptionSet) -> Result<(OptionSet, OptionDelta)> {
    let (effective, delta) = overlay(requested, default);
    if delta.len() > 1 {
        return Err(SweepError::MultipleChanges {
            keys: delta.changes.iter().map(|c| c.key.clone()).collect(),
        });
    }
    Ok((effective, delta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::schema::PipelineOptions;
    use serde_json::json;

    fn defaults() -> OptionSet {
        PipelineOptions::default().to_option_set().unwrap()
    }

    #[test]
    fn test_empty_request_yields_defaults() {
        let default = defaults();
        let (effective, delta) = resolve(&OptionSet::new(), &default).unwrap();
        assert_eq!(effective, default);
        assert!(delta.is_empty());
    }

    #[test]
    fn test_single_change_is_reported() {
        let default = defaults();
        let requested = OptionSet::new().with("beam_size", 10);
        let (effective, delta) = resolve(&requested, &default).unwrap();

        assert_eq!(delta.as_option_set(), OptionSet::new().with("beam_size", 10));
        let change = delta.single().unwrap();
        assert_eq!(change.old, Some(json!(5)));
        assert_eq!(effective.get("beam_size"), Some(&json!(10)));
        for (key, value) in default.iter().filter(|(k, _)| *k != "beam_size") {
            assert_eq!(effective.get(key), Some(value), "{} should be untouched", key);
        }
    }

    #[test]
    fn test_two_changes_fail() {
        let requested = OptionSet::new()
            .with("beam_size", 10)
            .with("temperature", 0.2);
        match resolve(&requested, &defaults()) {
            Err(SweepError::MultipleChanges { keys }) => {
                assert_eq!(keys, vec!["beam_size".to_string(), "temperature".to_string()]);
            }
            other => panic!("expected MultipleChanges, got {:?}", other),
        }
    }

    #[test]
    fn test_request_equal_to_default_is_not_a_change() {
        let requested = OptionSet::new().with("beam_size", 5.0).with("vad_onset", 0.5);
        let (_, delta) = resolve(&requested, &defaults()).unwrap();
        assert!(delta.is_empty());
    }

    #[test]
    fn test_falsy_request_keeps_default() {
        let requested = OptionSet::new().with("vad_offset", 0.0);
        let (effective, delta) = resolve(&requested, &defaults()).unwrap();
        assert_eq!(effective.get("vad_offset"), Some(&json!(0.363)));
        assert!(delta.is_empty());
    }

    #[test]
    fn test_extension_key_is_carried_and_counted() {
        let requested = OptionSet::new().with("hotwords", "MBC");
        let (effective, delta) = resolve(&requested, &defaults()).unwrap();
        assert_eq!(effective.get("hotwords"), Some(&json!("MBC")));
        let change = delta.single().unwrap();
        assert_eq!(change.key, "hotwords");
        assert_eq!(change.old, None);
    }

    #[test]
    fn test_delta_is_keywise_regardless_of_order() {
        // A default map in a different key order must not shift attribution.
        let default = OptionSet::new()
            .with("language", "ko")
            .with("beam_size", 5)
            .with("vad_onset", 0.5);
        let requested = OptionSet::new().with("vad_onset", 0.7);
        let (effective, delta) = resolve(&requested, &default).unwrap();
        assert_eq!(delta.single().unwrap().key, "vad_onset");
        assert_eq!(effective.keys().collect::<Vec<_>>(), vec!["language", "beam_size", "vad_onset"]);
    }

    #[test]
    fn test_overlay_reports_all_changes_without_failing() {
        let requested = OptionSet::new().with("beam_size", 10).with("best_of", 1);
        let (_, delta) = overlay(&requested, &defaults());
        assert_eq!(delta.len(), 2);
        assert!(delta.single().is_none());
    }
}
