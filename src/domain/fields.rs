use crate::error::{CallCenterError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Primitive validation category of a dynamic field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SemanticType {
    Text,
    Datetime,
    Email,
    PhoneNumber,
    Boolean,
}

impl SemanticType {
    pub const ALL: [SemanticType; 5] = [
        SemanticType::Text,
        SemanticType::Datetime,
        SemanticType::Email,
        SemanticType::PhoneNumber,
        SemanticType::Boolean,
    ];

    pub fn as_tag(&self) -> &'static str {
        match self {
            SemanticType::Text => "TEXT",
            SemanticType::Datetime => "DATETIME",
            SemanticType::Email => "EMAIL",
            SemanticType::PhoneNumber => "PHONE_NUMBER",
            SemanticType::Boolean => "BOOLEAN",
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

// Both the upper case service dialect and the lower case inquiry dialect are accepted.
impl FromStr for SemanticType {
    type Err = CallCenterError;

    fn from_str(tag: &str) -> Result<Self> {
        SemanticType::ALL
            .into_iter()
            .find(|t| t.as_tag().eq_ignore_ascii_case(tag.trim()))
            .ok_or_else(|| CallCenterError::UnknownFieldType(tag.to_string()))
    }
}

/// One user-editable dynamic data field, as declared in configuration.
///
/// The type tag is kept as written so that an unknown tag surfaces as a
/// synthesis error instead of a deserialization error deep inside the config.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub type_tag: String,
}

impl FieldDescriptor {
    pub fn new(name: &str, description: &str, semantic_type: SemanticType) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            type_tag: semantic_type.as_tag().to_string(),
        }
    }

    pub fn semantic_type(&self) -> Result<SemanticType> {
        self.type_tag.parse()
    }
}

/// Descriptor list every new conversation starts with.
pub fn default_service_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("customer_name", "Customer's full name", SemanticType::Text),
        FieldDescriptor::new("customer_email", "Customer's email address", SemanticType::Email),
        FieldDescriptor::new("customer_phone", "Customer's phone number", SemanticType::PhoneNumber),
        FieldDescriptor::new("customer_address", "Address for the requested service", SemanticType::Text),
        FieldDescriptor::new("service_type", "Type of service (e.g., nbn®, mobile)", SemanticType::Text),
        FieldDescriptor::new("nbn_status", "Is the address nbn® ready?", SemanticType::Boolean),
        FieldDescriptor::new("installation_date", "Preferred installation date", SemanticType::Datetime),
        FieldDescriptor::new("additional_comments", "Additional comments or requests", SemanticType::Text),
    ]
}
