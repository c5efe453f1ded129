//! Data models shared between the view-model layer and the frontend.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One dataset record: column name → scalar cell value.
///
/// Rows come straight off the wire as JSON objects, so the cell type stays
/// `serde_json::Value`; coercion to numbers happens at the point of use
/// (statistics, feature replay), mirroring how the data behaves upstream.
pub type Row = serde_json::Map<String, Value>;

/// Backend reply to `POST /api/upload`.
///
/// The user's selected model type always wins over `detected_type`; the
/// detected type only feeds a soft mismatch warning.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Default)]
pub struct UploadResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub detected_type: String,
    #[serde(default)]
    pub selected_model_type: String,
    #[serde(default)]
    pub selected_model_action: String,
    #[serde(default)]
    pub file_ids: Vec<String>,
    #[serde(default)]
    pub warning: Option<String>,
    #[serde(default)]
    pub folder_structure_valid: Option<bool>,
}

impl UploadResponse {
    /// The file id the viewers operate on. Uploads are single-file today,
    /// but the descriptor carries a list on the wire.
    pub fn primary_file_id(&self) -> Option<&str> {
        self.file_ids.first().map(String::as_str)
    }

    /// Effective model type: selected wins, detection is the fallback.
    pub fn model_type(&self) -> &str {
        if self.selected_model_type.is_empty() {
            &self.detected_type
        } else {
            &self.selected_model_type
        }
    }

    /// Soft consistency check between the user's selection and the
    /// backend's detection. A mismatch is a warning, never an error.
    pub fn type_matches_detected(&self) -> bool {
        let expected: &[&str] = match self.model_type() {
            "ehr" => &["ehr", "tabular"],
            "imaging" => &["imaging"],
            "time_series" => &["time_series", "signal"],
            other => return other == self.detected_type,
        };
        expected.contains(&self.detected_type.as_str())
    }
}

/// Backend reply to `GET /api/data/{file_id}` (with or without `?full=true`).
#[derive(Clone, Debug, Deserialize, Serialize, Default)]
pub struct DataPreview {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub data: Vec<Row>,
    /// Text-file previews arrive here instead of `data`.
    #[serde(default)]
    pub preview: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    /// `[total_rows, total_cols]` of the full dataset, independent of how
    /// many rows this response actually carries.
    #[serde(default)]
    pub shape: Option<[usize; 2]>,
    #[serde(default)]
    pub frequency: Option<f64>,
    #[serde(default)]
    pub signal_columns: Option<Vec<String>>,
    #[serde(default)]
    pub extension: Option<String>,
}

impl DataPreview {
    pub fn is_tabular(&self) -> bool {
        self.kind == "tabular" || self.kind == "time_series"
    }
}

/// User classification of a column, driving chart selection.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    #[default]
    Categorical,
    Continuous,
}

/// Per-column metadata applied by the user. Kept across feature additions
/// and dataset reloads.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Default)]
pub struct VariableChange {
    #[serde(default)]
    pub variable_type: VariableType,
    #[serde(default)]
    pub transformation: Option<String>,
}

/// Mapping from column name to its user-applied metadata.
pub type VariableChanges = HashMap<String, VariableChange>;

/// Comparison operator for rule-based features.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum CompareOp {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl CompareOp {
    pub const ALL: [CompareOp; 6] = [
        CompareOp::Gt,
        CompareOp::Ge,
        CompareOp::Lt,
        CompareOp::Le,
        CompareOp::Eq,
        CompareOp::Ne,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == s)
    }

    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            CompareOp::Gt => lhs > rhs,
            CompareOp::Ge => lhs >= rhs,
            CompareOp::Lt => lhs < rhs,
            CompareOp::Le => lhs <= rhs,
            CompareOp::Eq => lhs == rhs,
            CompareOp::Ne => lhs != rhs,
        }
    }
}

/// A user-created derived column. The record is persisted and replayed in
/// order against freshly loaded rows so engineered columns survive
/// reloads and background full-dataset fetches.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CreatedFeature {
    /// 1/0 flag from a numeric comparison against a source column.
    RuleBased {
        variable: String,
        operator: CompareOp,
        value: f64,
        feature_name: String,
    },
    /// Coalesce of two columns: the first non-missing value of the pair.
    Combined {
        column_a: String,
        column_b: String,
        feature_name: String,
    },
}

impl CreatedFeature {
    pub fn feature_name(&self) -> &str {
        match self {
            CreatedFeature::RuleBased { feature_name, .. } => feature_name,
            CreatedFeature::Combined { feature_name, .. } => feature_name,
        }
    }
}

/// Payload of `GET /api/images/{id}/file/{path}`.
#[derive(Clone, Debug, Deserialize, Default, PartialEq)]
pub struct ImageFile {
    #[serde(default)]
    pub base64: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub extension: String,
}

/// Persisted image-session metadata (`imageMetadata` storage key).
#[derive(Clone, Debug, Deserialize, Serialize, Default, PartialEq)]
pub struct ImageMetadata {
    #[serde(default)]
    pub upload_id: Option<String>,
    #[serde(default)]
    pub task_type: Option<String>,
    #[serde(default)]
    pub label_type: Option<String>,
    #[serde(default)]
    pub model_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selected_type_wins_over_detected() {
        let resp = UploadResponse {
            detected_type: "tabular".into(),
            selected_model_type: "ehr".into(),
            ..Default::default()
        };
        assert_eq!(resp.model_type(), "ehr");
        assert!(resp.type_matches_detected());
    }

    #[test]
    fn mismatched_types_flagged() {
        let resp = UploadResponse {
            detected_type: "imaging".into(),
            selected_model_type: "time_series".into(),
            ..Default::default()
        };
        assert!(!resp.type_matches_detected());
    }

    #[test]
    fn created_feature_round_trips_through_tagged_json() {
        let f = CreatedFeature::RuleBased {
            variable: "age".into(),
            operator: CompareOp::Ge,
            value: 65.0,
            feature_name: "is_senior".into(),
        };
        let json = serde_json::to_string(&f).unwrap();
        assert!(json.contains("\"type\":\"rule_based\""));
        assert!(json.contains("\">=\""));
        let back: CreatedFeature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, f);
    }

    #[test]
    fn data_preview_tolerates_missing_fields() {
        let p: DataPreview = serde_json::from_str(r#"{"type":"text","preview":"hello"}"#).unwrap();
        assert_eq!(p.kind, "text");
        assert!(p.data.is_empty());
        assert_eq!(p.preview.as_deref(), Some("hello"));
    }
}
