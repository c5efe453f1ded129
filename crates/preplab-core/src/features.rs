//! Derived-feature replay.
//!
//! Created features are stored as declarative records and recomputed
//! against whatever rows are currently resident. Replay runs after every
//! dataset load so engineered columns stay consistent with the data they
//! were derived from.

use serde_json::Value;

use crate::models::{CompareOp, CreatedFeature, Row};
use crate::stats::is_missing;

/// Resolve a source column against the actual row keys.
///
/// Column names picked in the UI can drift from backend casing, so an
/// exact match is tried first and a case-insensitive containment match
/// second (either direction).
fn resolve_column<'a>(rows: &'a [Row], wanted: &'a str) -> Option<String> {
    let first = rows.first()?;
    if first.contains_key(wanted) {
        return Some(wanted.to_string());
    }
    let wanted_lower = wanted.to_lowercase();
    first
        .keys()
        .find(|k| {
            let kl = k.to_lowercase();
            kl.contains(&wanted_lower) || wanted_lower.contains(&kl)
        })
        .cloned()
}

fn rule_based_cell(cell: Option<&Value>, op: CompareOp, rhs: f64) -> Value {
    // Missing or non-numeric cells flag as 0, never as null.
    let flag = cell
        .filter(|v| !is_missing(v))
        .and_then(crate::stats::to_numeric)
        .map(|lhs| op.apply(lhs, rhs))
        .unwrap_or(false);
    Value::from(if flag { 1 } else { 0 })
}

fn combined_cell(a: Option<&Value>, b: Option<&Value>) -> Value {
    let valid_a = a.filter(|v| !is_missing(v));
    let valid_b = b.filter(|v| !is_missing(v));
    match (valid_a, valid_b) {
        // Both present: the pair is expected to agree, take the first.
        (Some(v), _) => v.clone(),
        (None, Some(v)) => v.clone(),
        (None, None) => Value::Null,
    }
}

/// Compute one feature across all rows and register its column.
pub fn apply_feature(rows: &mut [Row], columns: &mut Vec<String>, feature: &CreatedFeature) {
    match feature {
        CreatedFeature::RuleBased {
            variable,
            operator,
            value,
            feature_name,
        } => {
            let Some(source) = resolve_column(rows, variable) else {
                log::warn!("rule-based feature {feature_name}: source column {variable} not found");
                return;
            };
            for row in rows.iter_mut() {
                let cell = rule_based_cell(row.get(&source), *operator, *value);
                row.insert(feature_name.clone(), cell);
            }
        }
        CreatedFeature::Combined {
            column_a,
            column_b,
            feature_name,
        } => {
            for row in rows.iter_mut() {
                let cell = combined_cell(row.get(column_a), row.get(column_b));
                row.insert(feature_name.clone(), cell);
            }
        }
    }
    let name = feature.feature_name();
    if !columns.iter().any(|c| c == name) {
        columns.push(name.to_string());
    }
}

/// Replay the whole feature record in creation order.
pub fn replay_features(rows: &mut [Row], columns: &mut Vec<String>, features: &[CreatedFeature]) {
    if features.is_empty() || rows.is_empty() {
        return;
    }
    for feature in features {
        apply_feature(rows, columns, feature);
    }
    log::debug!("replayed {} derived feature(s)", features.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows_from(values: &[Value]) -> Vec<Row> {
        values
            .iter()
            .map(|v| {
                let mut row = Row::new();
                row.insert("age".into(), v.clone());
                row
            })
            .collect()
    }

    #[test]
    fn rule_based_flags_rows() {
        let mut rows = rows_from(&[json!(70), json!(30), json!("64.5")]);
        let mut columns = vec!["age".to_string()];
        let feature = CreatedFeature::RuleBased {
            variable: "age".into(),
            operator: CompareOp::Ge,
            value: 65.0,
            feature_name: "is_senior".into(),
        };
        apply_feature(&mut rows, &mut columns, &feature);

        assert_eq!(columns, vec!["age", "is_senior"]);
        assert_eq!(rows[0]["is_senior"], json!(1));
        assert_eq!(rows[1]["is_senior"], json!(0));
        assert_eq!(rows[2]["is_senior"], json!(0));
    }

    #[test]
    fn rule_based_missing_cells_flag_zero() {
        let mut rows = rows_from(&[Value::Null, json!(""), json!("nan"), json!("abc")]);
        let mut columns = vec!["age".to_string()];
        let feature = CreatedFeature::RuleBased {
            variable: "age".into(),
            operator: CompareOp::Gt,
            value: 0.0,
            feature_name: "flag".into(),
        };
        apply_feature(&mut rows, &mut columns, &feature);
        for row in &rows {
            assert_eq!(row["flag"], json!(0));
        }
    }

    #[test]
    fn rule_based_resolves_column_case_insensitively() {
        let mut rows: Vec<Row> = vec![{
            let mut r = Row::new();
            r.insert("Heart Rate".into(), json!(120));
            r
        }];
        let mut columns = vec!["Heart Rate".to_string()];
        let feature = CreatedFeature::RuleBased {
            variable: "heart rate".into(),
            operator: CompareOp::Gt,
            value: 100.0,
            feature_name: "tachy".into(),
        };
        apply_feature(&mut rows, &mut columns, &feature);
        assert_eq!(rows[0]["tachy"], json!(1));
    }

    #[test]
    fn combined_coalesces_first_valid() {
        let mut rows: Vec<Row> = vec![
            serde_json::from_value(json!({"a": 1, "b": null})).unwrap(),
            serde_json::from_value(json!({"a": "nan", "b": 2})).unwrap(),
            serde_json::from_value(json!({"a": null, "b": ""})).unwrap(),
            serde_json::from_value(json!({"a": 3, "b": 4})).unwrap(),
        ];
        let mut columns = vec!["a".to_string(), "b".to_string()];
        let feature = CreatedFeature::Combined {
            column_a: "a".into(),
            column_b: "b".into(),
            feature_name: "ab".into(),
        };
        apply_feature(&mut rows, &mut columns, &feature);

        assert_eq!(rows[0]["ab"], json!(1));
        assert_eq!(rows[1]["ab"], json!(2));
        assert_eq!(rows[2]["ab"], Value::Null);
        assert_eq!(rows[3]["ab"], json!(3));
    }

    #[test]
    fn replay_preserves_creation_order() {
        let mut rows = rows_from(&[json!(10)]);
        let mut columns = vec!["age".to_string()];
        let features = vec![
            CreatedFeature::RuleBased {
                variable: "age".into(),
                operator: CompareOp::Gt,
                value: 5.0,
                feature_name: "gt5".into(),
            },
            // Second feature reads the first one's output.
            CreatedFeature::RuleBased {
                variable: "gt5".into(),
                operator: CompareOp::Eq,
                value: 1.0,
                feature_name: "gt5_confirmed".into(),
            },
        ];
        replay_features(&mut rows, &mut columns, &features);
        assert_eq!(rows[0]["gt5_confirmed"], json!(1));
        assert_eq!(columns, vec!["age", "gt5", "gt5_confirmed"]);
    }
}
