use callcenter_prompts::ai::translation::{HttpTranslator, PassthroughTranslator, Translate};
use callcenter_prompts::config::{TranslationConfig, WorkflowInitiate};
use callcenter_prompts::{AppConfig, CallState, PromptAssembler, TtsPrompts};
use dotenv::dotenv;
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::builder().filter_level(log::LevelFilter::Info).init();

    let (initiate, tts, translation) = match AppConfig::from_env() {
        Ok(config) => (config.conversation.initiate, config.prompts.tts, config.translation),
        Err(e) => {
            log::warn!("No usable configuration ({e}), running with defaults");
            (WorkflowInitiate::default(), TtsPrompts::default(), None)
        }
    };

    let translator = translator(translation)?;

    let mut call = CallState::new(initiate, "+61298765432");
    call.claim.insert("customer_name".into(), json!("Jane Doe"));
    call.claim.insert("customer_address".into(), json!("123 Main Street"));

    let schema = call.initiate.service_schema()?;
    let record = call.service_record(&schema)?;

    println!("SERVICE SCHEMA: {}", schema.name());
    println!("{}", serde_json::to_string_pretty(&schema.json_schema())?);
    println!("\nSERVICE RECORD");
    println!("{}", serde_json::to_string_pretty(&record.to_json()?)?);

    let messages = PromptAssembler::new().chat_system(&call, &[])?;
    println!("\nCHAT PROMPT");
    println!("{}", serde_json::to_string_pretty(&messages)?);

    println!("\nVOICE PROMPTS");
    println!("{}", tts.hello(&call, translator.as_ref()).await);
    println!("{}", tts.ivr_language(&call, translator.as_ref()).await);

    Ok(())
}

fn translator(config: Option<TranslationConfig>) -> callcenter_prompts::Result<Box<dyn Translate>> {
    Ok(match config {
        Some(config) => Box::new(HttpTranslator::new(config)?),
        None => Box::new(PassthroughTranslator),
    })
}
