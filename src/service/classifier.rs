use crate::api::workers_ai::InferenceClient;
use crate::error::LeadsError;
use crate::service::step::{StepPolicy, step};
use crate::types::inference::ChatMessage;
use crate::types::lead::LeadInfo;
use crate::types::mail::Message;
use regex::Regex;
use serde_json::Value;
use std::sync::{Arc, LazyLock};
use tracing::debug;

const CLASSIFIER_SYSTEM_PROMPT: &str =
    "You are a binary classifier. Respond with only true or false.";

const EXTRACTOR_SYSTEM_PROMPT: &str =
    "You are a JSON generator. Output only raw JSON with no additional text or formatting.";

/// First `{` through last `}`; not a parser.
static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[\s\S]*\}").expect("static regex"));

/// Two-call lead detection: a yes/no question, then field extraction.
pub struct LeadClassifier {
    inference: Arc<dyn InferenceClient>,
    policy: StepPolicy,
}

impl LeadClassifier {
    pub fn new(inference: Arc<dyn InferenceClient>, policy: StepPolicy) -> Self {
        Self { inference, policy }
    }

    pub async fn classify(&self, message: &Message) -> Result<LeadInfo, LeadsError> {
        if !self.is_lead(message).await? {
            return Ok(LeadInfo::not_a_lead());
        }
        self.extract(message).await
    }

    async fn is_lead(&self, message: &Message) -> Result<bool, LeadsError> {
        let prompt = [
            ChatMessage::system(CLASSIFIER_SYSTEM_PROMPT),
            ChatMessage::user(classification_prompt(message)),
        ];
        let inference = &self.inference;
        let prompt = &prompt;
        let answer = step(
            &format!("classify-{}", message.id),
            &self.policy,
            move || inference.run(prompt),
        )
        .await?;

        let is_lead = parse_is_lead(&answer.response);
        debug!(
            message_id = %message.id,
            from = message.sender_address().unwrap_or("<unknown>"),
            response = %answer.response,
            is_lead,
            "classified"
        );
        Ok(is_lead)
    }

    async fn extract(&self, message: &Message) -> Result<LeadInfo, LeadsError> {
        let prompt = [
            ChatMessage::system(EXTRACTOR_SYSTEM_PROMPT),
            ChatMessage::user(extraction_prompt(message)),
        ];
        let inference = &self.inference;
        let prompt = &prompt;
        let answer = step(
            &format!("extract-{}", message.id),
            &self.policy,
            move || inference.run(prompt),
        )
        .await?;

        parse_lead_json(&answer.response)
    }
}

/// Loose on purpose: any case-insensitive occurrence of "true" counts,
/// including inside words such as "untrue".
pub fn parse_is_lead(response: &str) -> bool {
    response.to_lowercase().contains("true")
}

/// Pull the JSON object out of a model response without validating its fields.
pub fn parse_lead_json(response: &str) -> Result<LeadInfo, LeadsError> {
    let Some(found) = JSON_OBJECT.find(response) else {
        return Err(LeadsError::Extraction);
    };
    let value: Value = serde_json::from_str(found.as_str()).map_err(LeadsError::JsonSyntax)?;
    Ok(LeadInfo::from_model_object(&value))
}

pub fn classification_prompt(message: &Message) -> String {
    format!(
        r#"Determine if this email is a wedding venue inquiry.

Email:
Subject: {subject}
Body: {body}

Return "true" if these conditions are met:
1. Email mentions weddings or venues
2. Contains contact information (name, email, or phone)

Return "false" for all other cases (spam, notifications, system emails, etc)."#,
        subject = message.subject(),
        body = message.body_preview,
    )
}

pub fn extraction_prompt(message: &Message) -> String {
    format!(
        r#"You must respond with ONLY a JSON object, no other text.

Email Content:
Subject: {subject}
Body: {body}

Extract these fields from the email:
- Name after "Name:" or similar
- Email after "Email:" or similar
- Phone after "Phone:" or similar
- Venue after "Venue:" or similar
- Details including budget and guest count

RESPOND WITH ONLY THIS JSON:
{{
  "isLead": true,
  "leadName": "exact name",
  "leadEmail": "exact email",
  "leadPhone": "exact phone",
  "weddingVenue": "exact venue",
  "inquiryDetails": "budget and guest details"
}}"#,
        subject = message.subject(),
        body = message.body_preview,
    )
}
