use crate::ai::schema_utils;
use crate::error::Result;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    CaseClosed,
    ProvideServiceDetails,
    CustomerWillSendInfo,
    HighPriority,
    ProposeNewPlan,
    RequiresTechnicalSupport,
}

/// Follow-up the sales team should take once the call ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NextModel {
    #[schemars(description = "Action to take after the call, based on the conversation, for the company.")]
    pub action: NextAction,
    #[schemars(
        description = "Justification for the selected action. No more than a few sentences. Examples: \"Customer is satisfied with the explanation of the new nbn® plan. The case can be closed.\", \"Customer reported slow internet speeds. The issue has been marked as high priority for technical support.\""
    )]
    pub justification: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Satisfaction {
    High,
    Medium,
    Low,
    Terrible,
    Unknown,
}

/// Post-call synthesis of the whole conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SynthesisModel {
    #[schemars(description = "Complete summary of the call, in a few paragraphs, addressing the customer directly.")]
    pub long: String,
    #[schemars(description = "Customer satisfaction with the call.")]
    pub satisfaction: Satisfaction,
    #[schemars(description = "Short summary of the call, a single sentence, addressing the customer directly.")]
    pub short: String,
    #[schemars(description = "Suggestions to improve the handling of similar calls.")]
    pub improvement_suggestions: String,
}

/// Raw JSON Schema text embedded into prompts as the expected answer format.
pub trait PromptFormat: JsonSchema + Sized {
    fn format_schema() -> serde_json::Result<String> {
        serde_json::to_string(&schema_for!(Self))
    }

    /// Strict structured-output format handed to the client.
    fn response_schema() -> Result<Value> {
        schema_utils::strict_schema(schema_for!(Self))
    }
}

impl PromptFormat for NextModel {}
impl PromptFormat for SynthesisModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_model_parses_llm_answer() {
        let answer: NextModel = serde_json::from_str(
            r#"{"action": "propose_new_plan", "justification": "Wants more data."}"#,
        )
        .unwrap();
        assert_eq!(answer.action, NextAction::ProposeNewPlan);
    }

    #[test]
    fn test_format_schema_lists_fields() {
        let format = SynthesisModel::format_schema().unwrap();
        for field in ["long", "satisfaction", "short", "improvement_suggestions"] {
            assert!(format.contains(field), "missing {field}");
        }
        assert!(!format.contains('\n'));
    }
}
