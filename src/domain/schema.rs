use crate::ai::schema_utils;
use crate::cache::SingleFlight;
use crate::domain::fields::{FieldDescriptor, SemanticType};
use crate::error::{CallCenterError, FieldViolation, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use schemars::schema::{InstanceType, RootSchema, Schema, SchemaObject, SingleOrVec};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("email pattern compiles")
});

// E.164: leading plus, country code, up to 15 digits.
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+[1-9][0-9]{6,14}$").expect("phone pattern compiles"));

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRule {
    Text,
    DateTime,
    Email,
    PhoneNumber,
    Boolean,
}

impl From<SemanticType> for FieldRule {
    fn from(semantic_type: SemanticType) -> Self {
        match semantic_type {
            SemanticType::Text => FieldRule::Text,
            SemanticType::Datetime => FieldRule::DateTime,
            SemanticType::Email => FieldRule::Email,
            SemanticType::PhoneNumber => FieldRule::PhoneNumber,
            SemanticType::Boolean => FieldRule::Boolean,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    DateTime(DateTime<FixedOffset>),
    Email(String),
    PhoneNumber(String),
    Boolean(bool),
}

impl FieldRule {
    pub fn check(&self, raw: &Value) -> std::result::Result<FieldValue, String> {
        match self {
            FieldRule::Text => raw
                .as_str()
                .map(|s| FieldValue::Text(s.to_string()))
                .ok_or_else(|| format!("expected a string, got {raw}")),
            FieldRule::DateTime => parse_datetime(raw)
                .map(FieldValue::DateTime)
                .ok_or_else(|| format!("expected a date-time, got {raw}")),
            FieldRule::Email => raw
                .as_str()
                .map(str::trim)
                .filter(|s| EMAIL_RE.is_match(s))
                .map(|s| FieldValue::Email(s.to_string()))
                .ok_or_else(|| format!("expected an email address, got {raw}")),
            FieldRule::PhoneNumber => raw
                .as_str()
                .and_then(normalize_phone_number)
                .map(FieldValue::PhoneNumber)
                .ok_or_else(|| format!("expected an international phone number, got {raw}")),
            FieldRule::Boolean => parse_bool(raw)
                .map(FieldValue::Boolean)
                .ok_or_else(|| format!("expected a boolean, got {raw}")),
        }
    }

    fn schema_object(&self) -> SchemaObject {
        let (instance_type, format) = match self {
            FieldRule::Text => (InstanceType::String, None),
            FieldRule::DateTime => (InstanceType::String, Some("date-time")),
            FieldRule::Email => (InstanceType::String, Some("email")),
            FieldRule::PhoneNumber => (InstanceType::String, Some("phone")),
            FieldRule::Boolean => (InstanceType::Boolean, None),
        };
        SchemaObject {
            instance_type: Some(SingleOrVec::Vec(vec![instance_type, InstanceType::Null])),
            format: format.map(str::to_string),
            ..Default::default()
        }
    }
}

fn parse_datetime(raw: &Value) -> Option<DateTime<FixedOffset>> {
    if let Some(secs) = raw.as_i64() {
        return DateTime::from_timestamp(secs, 0).map(|dt| dt.fixed_offset());
    }
    let text = raw.as_str()?.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt);
    }
    // Offset-less values are read as UTC.
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc().fixed_offset())
}

fn normalize_phone_number(raw: &str) -> Option<String> {
    let compact: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();
    PHONE_RE.is_match(&compact).then_some(compact)
}

fn parse_bool(raw: &Value) -> Option<bool> {
    match raw {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "on" | "1" => Some(true),
            "false" | "no" | "n" | "off" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    pub name: String,
    pub description: String,
    pub rule: FieldRule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSchema {
    name: String,
    fields: Vec<SchemaField>,
}

/// Builds the schema for `descriptors`, in declaration order.
///
/// Fails on an unknown type tag and on a repeated field name.
pub fn synthesize(name: &str, descriptors: &[FieldDescriptor]) -> Result<GeneratedSchema> {
    let mut seen = HashSet::new();
    let fields = descriptors
        .iter()
        .map(|descriptor| {
            if !seen.insert(descriptor.name.as_str()) {
                return Err(CallCenterError::DuplicateField(descriptor.name.clone()));
            }
            Ok(SchemaField {
                name: descriptor.name.clone(),
                description: descriptor.description.clone(),
                rule: descriptor.semantic_type()?.into(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    log::debug!("Synthesized schema '{}' with {} fields", name, fields.len());
    Ok(GeneratedSchema { name: name.to_string(), fields })
}

impl GeneratedSchema {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn validate(&self, data: &Value) -> Result<ServiceRecord> {
        let object = data.as_object().ok_or_else(|| {
            CallCenterError::InvalidRecord(vec![FieldViolation {
                field: self.name.clone(),
                reason: format!("expected an object, got {data}"),
            }])
        })?;
        self.validate_map(object)
    }

    pub fn validate_map(&self, object: &Map<String, Value>) -> Result<ServiceRecord> {
        let mut values = BTreeMap::new();
        let mut violations = Vec::new();

        for field in &self.fields {
            match object.get(&field.name) {
                None | Some(Value::Null) => {
                    values.insert(field.name.clone(), None);
                }
                Some(raw) => match field.rule.check(raw) {
                    Ok(value) => {
                        values.insert(field.name.clone(), Some(value));
                    }
                    Err(reason) => violations.push(FieldViolation {
                        field: field.name.clone(),
                        reason,
                    }),
                },
            }
        }

        if violations.is_empty() {
            Ok(ServiceRecord { values })
        } else {
            Err(CallCenterError::InvalidRecord(violations))
        }
    }

    pub fn json_schema(&self) -> RootSchema {
        let mut root = SchemaObject {
            instance_type: Some(InstanceType::Object.into()),
            ..Default::default()
        };
        root.metadata().title = Some(self.name.clone());

        let object = root.object();
        for field in &self.fields {
            let mut property = field.rule.schema_object();
            let metadata = property.metadata();
            if !field.description.is_empty() {
                metadata.description = Some(field.description.clone());
            }
            metadata.default = Some(Value::Null);
            object.properties.insert(field.name.clone(), Schema::Object(property));
        }

        RootSchema {
            meta_schema: None,
            schema: root,
            definitions: Default::default(),
        }
    }

    pub fn response_schema(&self) -> Result<Value> {
        schema_utils::strict_schema(self.json_schema())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ServiceRecord {
    values: BTreeMap<String, Option<FieldValue>>,
}

impl ServiceRecord {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name).and_then(Option::as_ref)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

type SchemaKey = (String, Vec<(String, String, SemanticType)>);

/// Schemas memoized by schema name and parsed descriptors, so tag spelling does not matter.
#[derive(Default)]
pub struct SchemaCache {
    schemas: SingleFlight<SchemaKey, GeneratedSchema>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_synthesize(
        &self,
        name: &str,
        descriptors: &[FieldDescriptor],
    ) -> Result<Arc<GeneratedSchema>> {
        let fields = descriptors
            .iter()
            .map(|d| Ok((d.name.clone(), d.description.clone(), d.semantic_type()?)))
            .collect::<Result<Vec<_>>>()?;
        self.schemas
            .get_or_try_init((name.to_string(), fields), || synthesize(name, descriptors))
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
