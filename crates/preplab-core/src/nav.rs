//! The workflow navigation state machine.
//!
//! Six ordered steps; `Upload` is always reachable and every other step
//! shares one deliberately uniform precondition (see
//! [`AppData::has_dataset`]). There is no stepwise unlock: a prepared
//! dataset enables every downstream step at once, and an emptied dataset
//! collapses them all again.

use serde::{Deserialize, Serialize};

use crate::cache::AppData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Upload,
    Viewer,
    Cleaning,
    Engineering,
    Visualization,
    Training,
}

impl Step {
    pub const ALL: [Step; 6] = [
        Step::Upload,
        Step::Viewer,
        Step::Cleaning,
        Step::Engineering,
        Step::Visualization,
        Step::Training,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Step::Upload => "Upload",
            Step::Viewer => "Dataset Viewer",
            Step::Cleaning => "Data Cleaning",
            Step::Engineering => "Feature Engineering",
            Step::Visualization => "Visualization",
            Step::Training => "Model Training",
        }
    }

    pub fn is_available(self, data: &AppData) -> bool {
        matches!(self, Step::Upload) || data.has_dataset()
    }
}

/// Result of a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOutcome {
    Activated(Step),
    /// The requested step was unavailable even after re-evaluating
    /// against current data; the machine falls back to `Upload` and the
    /// shell surfaces a warning.
    FellBack { requested: Step },
}

impl NavOutcome {
    pub fn active_step(&self) -> Step {
        match self {
            NavOutcome::Activated(step) => *step,
            NavOutcome::FellBack { .. } => Step::Upload,
        }
    }

    pub fn warning(&self) -> Option<String> {
        match self {
            NavOutcome::Activated(_) => None,
            NavOutcome::FellBack { requested } => Some(format!(
                "Please upload and prepare your dataset before opening {}.",
                requested.label()
            )),
        }
    }
}

/// Resolve a navigation request against current data.
///
/// Availability is recomputed here from the live cache — this is the
/// "recompute once" on a blocked attempt; callers pass the freshest state
/// they have, so data that arrived after the buttons were drawn still
/// counts.
pub fn navigate(data: &AppData, requested: Step) -> NavOutcome {
    if requested.is_available(data) {
        NavOutcome::Activated(requested)
    } else {
        NavOutcome::FellBack { requested }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UploadResponse;
    use serde_json::json;

    fn prepared_data() -> AppData {
        let mut data = AppData::default();
        data.upload = Some(UploadResponse {
            file_ids: vec!["f1".into()],
            ..Default::default()
        });
        data.replace_dataset(
            vec![serde_json::from_value(json!({"x": 1})).unwrap()],
            vec!["x".into()],
            None,
        );
        data
    }

    #[test]
    fn only_upload_available_when_empty() {
        let data = AppData::default();
        for step in Step::ALL {
            assert_eq!(step.is_available(&data), step == Step::Upload);
        }
    }

    #[test]
    fn all_steps_open_together_after_upload() {
        let data = prepared_data();
        for step in Step::ALL {
            assert!(step.is_available(&data), "{step:?} should be available");
        }
    }

    #[test]
    fn blocked_navigation_falls_back_to_upload_with_warning() {
        let data = AppData::default();
        let outcome = navigate(&data, Step::Training);
        assert_eq!(outcome.active_step(), Step::Upload);
        let warning = outcome.warning().unwrap();
        assert!(warning.contains("Model Training"));
    }

    #[test]
    fn machine_is_reentrant_after_reset() {
        let mut data = prepared_data();
        assert_eq!(
            navigate(&data, Step::Visualization),
            NavOutcome::Activated(Step::Visualization)
        );
        data.reset();
        assert!(matches!(
            navigate(&data, Step::Visualization),
            NavOutcome::FellBack { .. }
        ));
        // And forward again once data returns.
        data.upload = Some(UploadResponse {
            file_ids: vec!["f2".into()],
            ..Default::default()
        });
        data.replace_dataset(
            vec![serde_json::from_value(json!({"y": 2})).unwrap()],
            vec!["y".into()],
            None,
        );
        assert_eq!(
            navigate(&data, Step::Visualization),
            NavOutcome::Activated(Step::Visualization)
        );
    }
}
