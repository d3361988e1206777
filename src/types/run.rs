use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::mail::ProcessedMessage;

pub type RunId = Uuid;

/// Parameters a run is created with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunParams {
    pub user_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
}

/// Result payload of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowOutput {
    pub messages: Vec<ProcessedMessage>,
}

/// Observable run state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RunStatus {
    Queued,
    Running,
    Complete { output: WorkflowOutput },
    Errored { error: String },
}

impl RunStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, RunStatus::Complete { .. } | RunStatus::Errored { .. })
    }
}

/// What run creation hands back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSnapshot {
    pub id: RunId,
    pub details: RunStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_serializes_with_tag() {
        assert_eq!(
            serde_json::to_value(RunStatus::Queued).unwrap(),
            json!({ "status": "queued" })
        );
        assert_eq!(
            serde_json::to_value(RunStatus::Errored {
                error: "boom".to_string()
            })
            .unwrap(),
            json!({ "status": "errored", "error": "boom" })
        );
        assert_eq!(
            serde_json::to_value(RunStatus::Complete {
                output: WorkflowOutput::default()
            })
            .unwrap(),
            json!({ "status": "complete", "output": { "messages": [] } })
        );
    }

    #[test]
    fn params_omit_absent_since() {
        let params = RunParams {
            user_email: "me@x.com".to_string(),
            since: None,
        };
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({ "userEmail": "me@x.com" })
        );
    }
}
