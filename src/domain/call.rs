//! Read-only view of an in-progress call, as consumed by prompt assembly.

use crate::config::WorkflowInitiate;
use crate::domain::schema::{GeneratedSchema, ServiceRecord};
use crate::error::Result;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Channel a message was exchanged on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageAction {
    Call,
    Hangup,
    Sms,
    Talk,
}

impl MessageAction {
    pub const ALL: [MessageAction; 4] = [
        MessageAction::Call,
        MessageAction::Hangup,
        MessageAction::Sms,
        MessageAction::Talk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageAction::Call => "call",
            MessageAction::Hangup => "hangup",
            MessageAction::Sms => "sms",
            MessageAction::Talk => "talk",
        }
    }
}

/// Speaking style the assistant may apply to a sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStyle {
    Cheerful,
    None,
    Sad,
}

impl MessageStyle {
    pub const ALL: [MessageStyle; 3] = [MessageStyle::Cheerful, MessageStyle::None, MessageStyle::Sad];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStyle::Cheerful => "cheerful",
            MessageStyle::None => "none",
            MessageStyle::Sad => "sad",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    Assistant,
    Human,
    Tool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub action: MessageAction,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub persona: Persona,
    #[serde(default = "default_style")]
    pub style: MessageStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang_short_code: Option<String>,
}

fn default_style() -> MessageStyle {
    MessageStyle::None
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub created_at: DateTime<Utc>,
    pub description: String,
    pub due_date_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub title: String,
}

/// Reference document that may be embedded into the chat prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Training {
    pub id: Uuid,
    pub content: String,
    pub score: f64,
    pub title: String,
}

impl Training {
    /// Fields redacted before the document is shown to the LLM.
    pub const EXCLUDED_FIELDS_FOR_LLM: [&'static str; 2] = ["id", "score"];

    pub fn to_llm_json(&self) -> Result<String> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            for field in Self::EXCLUDED_FIELDS_FOR_LLM {
                map.remove(field);
            }
        }
        Ok(serde_json::to_string(&value)?)
    }
}

/// Spoken language a call can be held in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Language {
    pub short_code: String,
    pub human_name: String,
    pub voice: String,
}

impl Language {
    pub fn new(short_code: &str, human_name: &str, voice: &str) -> Self {
        Self {
            short_code: short_code.to_string(),
            human_name: human_name.to_string(),
            voice: voice.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallState {
    pub call_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub initiate: WorkflowInitiate,
    /// Customer's number, E.164.
    pub phone_number: String,
    /// Language the call switched to; `None` keeps the configured default.
    #[serde(default)]
    pub lang_short_code: Option<String>,
    #[serde(default = "default_timezone")]
    pub timezone: Tz,
    /// Free-form inquiry data gathered so far.
    #[serde(default)]
    pub claim: Map<String, Value>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
}

fn default_timezone() -> Tz {
    Tz::UTC
}

impl CallState {
    pub fn new(initiate: WorkflowInitiate, phone_number: &str) -> Self {
        Self {
            call_id: Uuid::new_v4(),
            created_at: Utc::now(),
            initiate,
            phone_number: phone_number.to_string(),
            lang_short_code: None,
            timezone: default_timezone(),
            claim: Map::new(),
            messages: Vec::new(),
            reminders: Vec::new(),
        }
    }

    /// Active language; unknown codes fall back to the configured default.
    pub fn lang(&self) -> &Language {
        let catalog = &self.initiate.lang;
        self.lang_short_code
            .as_deref()
            .and_then(|code| catalog.find(code))
            .unwrap_or_else(|| catalog.default_lang())
    }

    pub fn tz(&self) -> Tz {
        self.timezone
    }

    /// Validates the claim blob against the service schema.
    pub fn service_record(&self, schema: &GeneratedSchema) -> Result<ServiceRecord> {
        schema.validate_map(&self.claim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkflowInitiate;
    use serde_json::json;

    #[test]
    fn test_training_redacts_excluded_fields() {
        let training = Training {
            id: Uuid::new_v4(),
            content: "Modems can be returned within 30 days.".into(),
            score: 0.87,
            title: "Returns".into(),
        };
        let rendered: Value = serde_json::from_str(&training.to_llm_json().unwrap()).unwrap();
        assert_eq!(rendered, json!({ "content": "Modems can be returned within 30 days.", "title": "Returns" }));
    }

    #[test]
    fn test_lang_falls_back_to_default() {
        let mut call = CallState::new(WorkflowInitiate::default(), "+61298765432");
        assert_eq!(call.lang().short_code, "en-US");

        call.lang_short_code = Some("fr-FR".into());
        assert_eq!(call.lang().human_name, "French");

        call.lang_short_code = Some("xx-XX".into());
        assert_eq!(call.lang().short_code, "en-US");
    }

    #[test]
    fn test_service_record_from_claim() {
        let mut call = CallState::new(WorkflowInitiate::default(), "+61298765432");
        call.claim.insert("customer_email".into(), json!("jane@example.com"));
        call.claim.insert("unrelated".into(), json!({ "nested": true }));

        let schema = call.initiate.service_schema().unwrap();
        let record = call.service_record(&schema).unwrap();
        assert!(record.get("customer_email").is_some());
        assert!(record.get("customer_name").is_none());
    }
}
