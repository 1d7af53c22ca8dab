//! Selection resolution
//!
//! Turns a (task, tier, caller parameters) request into the concrete
//! workflow invocation: caller parameters are deep-merged over the tier
//! defaults, then floors clamp the merged result from below. Every clamp is
//! reported back so UIs can tell the caller their value was raised.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::loader::deep_merge;
use crate::mapping::TierTarget;
use crate::task::{QualityTier, TaskType};
use crate::{QualityError, Result};

/// A selection request with caller overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionRequest {
    pub task_type: TaskType,
    #[serde(default)]
    pub quality_tier: QualityTier,
    /// Caller parameters, merged over the tier defaults
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl SelectionRequest {
    /// Request with no caller overrides
    pub fn new(task_type: TaskType, quality_tier: QualityTier) -> Self {
        Self {
            task_type,
            quality_tier,
            parameters: Map::new(),
        }
    }
}

/// One floor clamp applied during resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorAdjustment {
    /// Parameter name the floor applies to
    pub parameter: String,
    /// Value the caller asked for
    pub requested: f64,
    /// Floor the value was raised to
    pub minimum: f64,
}

/// A fully resolved selection, ready to hand to a workflow runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selection {
    pub task_type: TaskType,
    pub quality_tier: QualityTier,
    /// Bundle directory resolved against the workflows root
    pub workflow_path: PathBuf,
    pub description: String,
    /// Tier defaults merged with caller overrides, floors applied
    pub parameters: Map<String, Value>,
    /// Clamps applied by floors, empty when nothing was raised
    #[serde(default)]
    pub adjustments: Vec<FloorAdjustment>,
}

/// Merge caller parameters over tier defaults and apply floors
///
/// Floors only inspect top-level keys of the merged object. A floored key
/// holding a non-numeric value is an error rather than a silent pass.
pub fn resolve_parameters(
    target: &TierTarget,
    user: &Map<String, Value>,
    floors: &BTreeMap<String, f64>,
) -> Result<(Map<String, Value>, Vec<FloorAdjustment>)> {
    let mut params = target.parameters.clone();
    for (key, overlay) in user {
        match params.get_mut(key) {
            Some(base) => deep_merge(base, overlay),
            None => {
                params.insert(key.clone(), overlay.clone());
            }
        }
    }

    let mut adjustments = Vec::new();
    for (name, minimum) in floors {
        let Some(value) = params.get_mut(name) else {
            continue;
        };

        let Some(number) = value.as_f64() else {
            return Err(QualityError::InvalidParameter {
                name: name.clone(),
                reason: format!("floor of {minimum} requires a number, got {value}"),
            });
        };

        if number < *minimum {
            adjustments.push(FloorAdjustment {
                parameter: name.clone(),
                requested: number,
                minimum: *minimum,
            });
            let clamped = clamp_value(value, *minimum);
            *value = clamped;
        }
    }

    Ok((params, adjustments))
}

/// Raise a numeric value to the floor, keeping integers integral
fn clamp_value(original: &Value, minimum: f64) -> Value {
    let was_integral = original.as_i64().is_some() || original.as_u64().is_some();
    if was_integral && minimum.fract() == 0.0 && minimum >= 0.0 && minimum <= i64::MAX as f64 {
        return Value::from(minimum as i64);
    }
    Value::from(minimum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn target_with(parameters: Value) -> TierTarget {
        let Value::Object(parameters) = parameters else {
            panic!("test parameters must be an object");
        };
        TierTarget {
            workflow_path: "image/flux_standard".to_string(),
            description: "Production stills".to_string(),
            parameters,
        }
    }

    fn floors(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries
            .iter()
            .map(|(name, min)| (name.to_string(), *min))
            .collect()
    }

    #[test]
    fn test_defaults_pass_through_untouched() {
        let target = target_with(json!({"steps": 25, "width": 1280}));
        let (params, adjustments) =
            resolve_parameters(&target, &Map::new(), &floors(&[("steps", 10.0)])).unwrap();

        assert_eq!(params["steps"], json!(25));
        assert_eq!(params["width"], json!(1280));
        assert!(adjustments.is_empty());
    }

    #[test]
    fn test_caller_overrides_win() {
        let target = target_with(json!({"steps": 25, "width": 1280}));
        let user = json!({"width": 1920, "seed": 7});
        let Value::Object(user) = user else { unreachable!() };

        let (params, _) = resolve_parameters(&target, &user, &BTreeMap::new()).unwrap();
        assert_eq!(params["steps"], json!(25));
        assert_eq!(params["width"], json!(1920));
        assert_eq!(params["seed"], json!(7));
    }

    #[test]
    fn test_nested_objects_merge_instead_of_replace() {
        let target = target_with(json!({"sampler": {"name": "euler", "cfg": 7.0}}));
        let user = json!({"sampler": {"cfg": 4.5}});
        let Value::Object(user) = user else { unreachable!() };

        let (params, _) = resolve_parameters(&target, &user, &BTreeMap::new()).unwrap();
        assert_eq!(params["sampler"]["name"], json!("euler"));
        assert_eq!(params["sampler"]["cfg"], json!(4.5));
    }

    #[test]
    fn test_floor_clamps_and_reports() {
        let target = target_with(json!({"steps": 25}));
        let user = json!({"steps": 4});
        let Value::Object(user) = user else { unreachable!() };

        let (params, adjustments) =
            resolve_parameters(&target, &user, &floors(&[("steps", 10.0)])).unwrap();

        assert_eq!(params["steps"], json!(10));
        assert_eq!(
            adjustments,
            vec![FloorAdjustment {
                parameter: "steps".to_string(),
                requested: 4.0,
                minimum: 10.0,
            }]
        );
    }

    #[test]
    fn test_floor_clamp_keeps_integer_representation() {
        let target = target_with(json!({}));
        let user = json!({"steps": 3});
        let Value::Object(user) = user else { unreachable!() };

        let (params, _) = resolve_parameters(&target, &user, &floors(&[("steps", 10.0)])).unwrap();
        assert!(params["steps"].is_i64());
        assert_eq!(params["steps"], json!(10));
    }

    #[test]
    fn test_fractional_floor_produces_float() {
        let target = target_with(json!({}));
        let user = json!({"cfg_scale": 0.5});
        let Value::Object(user) = user else { unreachable!() };

        let (params, adjustments) =
            resolve_parameters(&target, &user, &floors(&[("cfg_scale", 1.5)])).unwrap();
        assert_eq!(params["cfg_scale"], json!(1.5));
        assert_eq!(adjustments[0].requested, 0.5);
    }

    #[test]
    fn test_value_at_floor_is_not_adjusted() {
        let target = target_with(json!({}));
        let user = json!({"steps": 10});
        let Value::Object(user) = user else { unreachable!() };

        let (params, adjustments) =
            resolve_parameters(&target, &user, &floors(&[("steps", 10.0)])).unwrap();
        assert_eq!(params["steps"], json!(10));
        assert!(adjustments.is_empty());
    }

    #[test]
    fn test_floor_ignores_absent_parameter() {
        let target = target_with(json!({"width": 1280}));
        let (params, adjustments) =
            resolve_parameters(&target, &Map::new(), &floors(&[("steps", 10.0)])).unwrap();
        assert!(!params.contains_key("steps"));
        assert!(adjustments.is_empty());
    }

    #[test]
    fn test_non_numeric_floored_value_errors() {
        let target = target_with(json!({}));
        let user = json!({"steps": "lots"});
        let Value::Object(user) = user else { unreachable!() };

        let err = resolve_parameters(&target, &user, &floors(&[("steps", 10.0)])).unwrap_err();
        assert!(matches!(
            err,
            QualityError::InvalidParameter { name, .. } if name == "steps"
        ));
    }

    #[test]
    fn test_floor_applies_to_tier_default_too() {
        // A misconfigured default is clamped the same way a caller value is.
        let target = target_with(json!({"steps": 6}));
        let (params, adjustments) =
            resolve_parameters(&target, &Map::new(), &floors(&[("steps", 10.0)])).unwrap();

        assert_eq!(params["steps"], json!(10));
        assert_eq!(adjustments.len(), 1);
        assert_eq!(adjustments[0].requested, 6.0);
    }
}
