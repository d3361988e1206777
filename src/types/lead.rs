use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::mail::Message;

/// Classification outcome attached to each message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadInfo {
    pub is_lead: bool,
    pub lead_name: Option<String>,
    pub lead_email: Option<String>,
    pub lead_phone: Option<String>,
    pub wedding_venue: Option<String>,
    pub inquiry_details: Option<String>,
}

impl LeadInfo {
    /// Fixed result for messages the classifier rejects.
    pub fn not_a_lead() -> Self {
        Self::default()
    }

    /// Build from an unvalidated model object. Missing fields become `None`;
    /// non-string scalars keep their JSON text.
    pub fn from_model_object(value: &Value) -> Self {
        let field = |name: &str| -> Option<String> {
            match value.get(name)? {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            }
        };
        Self {
            is_lead: value.get("isLead").is_some_and(truthy),
            lead_name: field("leadName"),
            lead_email: field("leadEmail"),
            lead_phone: field("leadPhone"),
            wedding_venue: field("weddingVenue"),
            inquiry_details: field("inquiryDetails"),
        }
    }
}

/// Loose truthiness for model-supplied flags: `"true"` and `1` count,
/// `null`, `0`, `""` and `false` do not.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Row persisted for each positive classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub email_id: String,
    pub received_date: Option<DateTime<Utc>>,
    pub lead_name: Option<String>,
    pub lead_email: Option<String>,
    pub lead_phone: Option<String>,
    pub wedding_venue: Option<String>,
    pub inquiry_details: Option<String>,
}

impl LeadRecord {
    pub fn new(message: &Message, info: &LeadInfo) -> Self {
        let received_date = message
            .received_date_time
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));
        Self {
            email_id: message.id.clone(),
            received_date,
            lead_name: info.lead_name.clone(),
            lead_email: info.lead_email.clone(),
            lead_phone: info.lead_phone.clone(),
            wedding_venue: info.wedding_venue.clone(),
            inquiry_details: info.inquiry_details.clone(),
        }
    }
}
