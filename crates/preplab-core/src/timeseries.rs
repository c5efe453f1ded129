//! Time-series session: signal-column detection, sampling-frequency
//! heuristics, and the frequency/duration arithmetic behind the editor.

use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};
use crate::models::Row;
use crate::stats::to_numeric;

/// A column whose lowercased name contains any of these is treated as a
/// time index rather than a measured signal.
const TIME_WORDS: [&str; 6] = ["time", "timestamp", "date", "sample", "index", "id"];

fn looks_time_related(column: &str) -> bool {
    let lower = column.to_lowercase();
    TIME_WORDS.iter().any(|w| lower.contains(w))
}

/// Columns treated as measured signals.
///
/// Name-based exclusion first; if that empties a multi-column set, keep
/// everything but the first column (likely the index); a single column is
/// always its own signal.
pub fn detect_signal_columns(columns: &[String]) -> Vec<String> {
    let signals: Vec<String> = columns
        .iter()
        .filter(|c| !looks_time_related(c))
        .cloned()
        .collect();
    if !signals.is_empty() {
        return signals;
    }
    match columns.len() {
        0 => Vec::new(),
        1 => columns.to_vec(),
        _ => columns[1..].to_vec(),
    }
}

/// Best-effort frequency estimate from the first two samples of a
/// time-like column: `1 / (t1 - t0)` when that difference is positive and
/// numeric. This is an approximation, not a guarantee — irregular
/// sampling defeats it, and callers fall back to 1 Hz.
pub fn detect_frequency(rows: &[Row], columns: &[String]) -> Option<f64> {
    if rows.len() < 2 {
        return None;
    }
    let time_col = columns.iter().find(|c| {
        let lower = c.to_lowercase();
        lower.contains("time") || lower.contains("timestamp") || lower.contains("date")
    })?;
    let t0 = rows[0].get(time_col.as_str()).and_then(to_numeric)?;
    let t1 = rows[1].get(time_col.as_str()).and_then(to_numeric)?;
    let dt = t1 - t0;
    (dt > 0.0).then(|| 1.0 / dt)
}

pub const DEFAULT_FREQUENCY_HZ: f64 = 1.0;

/// One time-series viewing session, persisted under the `timeSeriesData`
/// storage key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeSeriesSession {
    pub frequency: f64,
    pub original_frequency: f64,
    pub sample_count: usize,
    pub signal_columns: Vec<String>,
    pub columns: Vec<String>,
    pub upload_id: Option<String>,
    pub task_type: String,
}

impl Default for TimeSeriesSession {
    fn default() -> Self {
        Self {
            frequency: DEFAULT_FREQUENCY_HZ,
            original_frequency: DEFAULT_FREQUENCY_HZ,
            sample_count: 0,
            signal_columns: Vec::new(),
            columns: Vec::new(),
            upload_id: None,
            task_type: "classification".to_string(),
        }
    }
}

impl TimeSeriesSession {
    /// Build a session from a loaded dataset. A backend-provided frequency
    /// or signal list wins over local detection.
    pub fn initialize(
        rows: &[Row],
        columns: Vec<String>,
        sample_count: usize,
        provided_frequency: Option<f64>,
        provided_signals: Option<Vec<String>>,
        upload_id: Option<String>,
        task_type: Option<String>,
    ) -> Self {
        let frequency = provided_frequency
            .filter(|f| f.is_finite() && *f > 0.0)
            .or_else(|| detect_frequency(rows, &columns))
            .unwrap_or(DEFAULT_FREQUENCY_HZ);
        let signal_columns = provided_signals
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| detect_signal_columns(&columns));
        Self {
            frequency,
            original_frequency: frequency,
            sample_count: sample_count.max(rows.len()),
            signal_columns,
            columns,
            upload_id,
            task_type: task_type.unwrap_or_else(|| "classification".to_string()),
        }
    }

    /// Recording duration in seconds at the current frequency.
    pub fn duration_secs(&self) -> f64 {
        if self.frequency > 0.0 {
            self.sample_count as f64 / self.frequency
        } else {
            0.0
        }
    }

    /// Apply a user frequency edit. Non-positive or non-finite input is a
    /// validation error and leaves the session untouched.
    pub fn set_frequency(&mut self, frequency: f64) -> Result<()> {
        if !frequency.is_finite() || frequency <= 0.0 {
            return Err(PrepError::InvalidFrequency);
        }
        self.frequency = frequency;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn time_like_columns_excluded_from_signals() {
        let columns = cols(&["timestamp", "ecg", "resp", "sample_id"]);
        assert_eq!(detect_signal_columns(&columns), cols(&["ecg", "resp"]));
    }

    #[test]
    fn all_excluded_falls_back_to_tail() {
        let columns = cols(&["time", "date", "index"]);
        assert_eq!(detect_signal_columns(&columns), cols(&["date", "index"]));
    }

    #[test]
    fn single_column_is_its_own_signal() {
        let columns = cols(&["timestamp"]);
        assert_eq!(detect_signal_columns(&columns), columns);
    }

    #[test]
    fn frequency_detected_from_first_two_samples() {
        let rows: Vec<Row> = vec![
            serde_json::from_value(json!({"time": 0.0, "v": 1})).unwrap(),
            serde_json::from_value(json!({"time": 0.004, "v": 2})).unwrap(),
        ];
        let f = detect_frequency(&rows, &cols(&["time", "v"])).unwrap();
        assert!((f - 250.0).abs() < 1e-6);
    }

    #[test]
    fn non_increasing_timestamps_yield_no_estimate() {
        let rows: Vec<Row> = vec![
            serde_json::from_value(json!({"time": 5.0})).unwrap(),
            serde_json::from_value(json!({"time": 5.0})).unwrap(),
        ];
        assert!(detect_frequency(&rows, &cols(&["time"])).is_none());
    }

    #[test]
    fn initialize_defaults_to_one_hz() {
        let session =
            TimeSeriesSession::initialize(&[], cols(&["ecg"]), 100, None, None, None, None);
        assert_eq!(session.frequency, 1.0);
        assert_eq!(session.duration_secs(), 100.0);
    }

    #[test]
    fn frequency_update_recomputes_duration() {
        let mut session = TimeSeriesSession {
            sample_count: 100,
            ..Default::default()
        };
        session.set_frequency(10.0).unwrap();
        assert_eq!(format!("{:.2}", session.duration_secs()), "10.00");
    }

    #[test]
    fn invalid_frequency_rejected_and_state_unchanged() {
        let mut session = TimeSeriesSession {
            sample_count: 100,
            frequency: 4.0,
            ..Default::default()
        };
        assert!(session.set_frequency(0.0).is_err());
        assert!(session.set_frequency(-5.0).is_err());
        assert!(session.set_frequency(f64::NAN).is_err());
        assert_eq!(session.frequency, 4.0);
    }
}
