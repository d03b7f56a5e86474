pub mod cache;
pub mod config;
pub mod error;
pub mod domain {
    pub mod call;
    pub mod fields;
    pub mod outputs;
    pub mod schema;
}
pub mod ai {
    pub mod assembler;
    pub mod client;
    pub mod prompts;
    pub mod schema_utils;
    pub mod templates;
    pub mod translation;
    pub mod tts;
}

pub use ai::assembler::{ChatMessage, PromptAssembler};
pub use ai::translation::Translate;
pub use ai::tts::TtsPrompts;
pub use config::AppConfig;
pub use domain::call::CallState;
pub use domain::fields::{FieldDescriptor, SemanticType};
pub use domain::schema::{synthesize, GeneratedSchema, SchemaCache};
pub use error::{CallCenterError, Result};
