use async_trait::async_trait;
use callcenter_prompts::ai::prompts::PromptKind;
use callcenter_prompts::ai::templates::placeholders;
use callcenter_prompts::domain::call::Training;
use callcenter_prompts::{
    AppConfig, CallCenterError, CallState, PromptAssembler, SchemaCache, Translate, synthesize,
};
use chrono::{TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;
use std::thread;
use uuid::Uuid;

struct Unreachable;

#[async_trait]
impl Translate for Unreachable {
    async fn translate(&self, _text: &str, _target: &str, _source: &str) -> callcenter_prompts::Result<String> {
        Err(CallCenterError::TranslationFailed("connection refused".into()))
    }
}

fn config() -> AppConfig {
    let platform = json!({
        "mode": "openai",
        "openai": {
            "context": 128000,
            "endpoint": "https://api.openai.com/v1",
            "model": "gpt-4o-mini",
            "streaming": false,
            "api_key": "sk-test"
        }
    });
    let raw = json!({
        "conversation": {
            "initiate": {
                "agent_phone_number": "+61200000000",
                "bot_company": "Contoso Telco",
                "bot_name": "Robin",
                "bot_phone_number": "+61299999999",
                "service_fields": [
                    { "name": "plan", "description": "Chosen plan", "type": "TEXT" },
                    { "name": "contact", "description": "Email for the contract", "type": "email" },
                    { "name": "move_in", "description": "Move-in date", "type": "DATETIME" }
                ],
                "lang": {
                    "default_short_code": "en-US",
                    "availables": [
                        { "short_code": "en-US", "human_name": "English", "voice": "en-US-AvaMultilingualNeural" },
                        { "short_code": "fr-FR", "human_name": "French", "voice": "fr-FR-VivienneMultilingualNeural" }
                    ]
                }
            }
        },
        "llm": { "fast": platform.clone(), "slow": platform },
        "prompts": {
            "tts": { "ivr_language_tpl": ["Press {index} for {label}."] }
        }
    });
    AppConfig::from_json(&raw.to_string()).unwrap()
}

#[test]
fn config_to_validated_service_record() {
    let config = config();
    let mut call = CallState::new(config.conversation.initiate, "+61298765432");
    call.claim.insert("plan".into(), json!("nbn 100"));
    call.claim.insert("move_in".into(), json!("2024-08-01"));
    call.claim.insert("unrelated".into(), json!({ "noise": true }));

    let schema = call.initiate.service_schema().unwrap();
    let record = call.service_record(&schema).unwrap();
    assert_eq!(record.field_names().collect::<Vec<_>>(), vec!["contact", "move_in", "plan"]);
    assert!(record.get("contact").is_none());
    assert!(record.get("plan").is_some());

    call.claim.insert("contact".into(), json!("not an email"));
    match call.service_record(&schema).unwrap_err() {
        CallCenterError::InvalidRecord(violations) => {
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].field, "contact");
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn chat_prompt_reflects_configured_identity() {
    let call = CallState::new(config().conversation.initiate, "+61298765432");
    let instant = Utc.with_ymd_and_hms(2024, 7, 15, 12, 43, 0).unwrap();
    let trainings = vec![Training {
        id: Uuid::new_v4(),
        content: "Relocations take 5 business days.".into(),
        score: 0.9,
        title: "Relocation".into(),
    }];

    let messages = PromptAssembler::at(instant).chat_system(&call, &trainings).unwrap();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].content.starts_with("Assistant is called Robin"));
    assert!(messages[0].content.contains("company Contoso Telco"));
    assert!(messages[1].content.contains("Work for Contoso Telco"));
    assert!(messages[1].content.contains("Relocations take 5 business days."));

    let wire = serde_json::to_value(&messages).unwrap();
    assert_eq!(wire[0]["role"], "system");
    assert_eq!(wire[1]["role"], "system");
}

#[test]
fn every_llm_template_parses() {
    for kind in PromptKind::ALL {
        assert!(!placeholders(kind.name(), kind.template()).unwrap().is_empty());
    }
}

#[tokio::test]
async fn voice_prompts_survive_translation_outage() {
    let config = config();
    let mut call = CallState::new(config.conversation.initiate, "+61298765432");
    call.lang_short_code = Some("fr-FR".into());

    let menu = config.prompts.tts.ivr_language(&call, &Unreachable).await;
    assert_eq!(menu, "Press 1 for English. Press 2 for French.");

    let hello = config.prompts.tts.hello(&call, &Unreachable).await;
    assert!(hello.contains("Robin"));
    assert!(hello.contains("Contoso Telco"));
}

#[test]
fn schema_cache_synthesizes_once_under_contention() {
    let cache = Arc::new(SchemaCache::new());
    let fields = config().conversation.initiate.service_fields;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let fields = fields.clone();
            thread::spawn(move || cache.get_or_synthesize("ServiceEntryModel", &fields).unwrap())
        })
        .collect();
    let schemas: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(cache.len(), 1);
    assert!(schemas.iter().all(|s| Arc::ptr_eq(s, &schemas[0])));
    assert_eq!(*schemas[0], synthesize("ServiceEntryModel", &fields).unwrap());
}

#[test]
fn blank_voice_phrase_fails_at_load() {
    let mut raw = serde_json::to_value(config()).unwrap();
    raw["prompts"]["tts"]["error_tpl"] = json!(["   "]);
    assert!(AppConfig::from_json(&raw.to_string()).is_err());
}
