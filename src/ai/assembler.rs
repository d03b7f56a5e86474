use crate::ai::prompts::PromptKind;
use crate::ai::templates::{collapse_lines, dedent, fill, html_escape, Slots};
use crate::domain::call::{CallState, MessageAction, MessageStyle, Training};
use crate::domain::outputs::{NextModel, PromptFormat, SynthesisModel};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Minute precision keeps prompts identical, and thus cacheable, within a minute.
const DATE_FORMAT: &str = "%a %d %b %Y, %H:%M (%Z)";

const TRAININGS_HEADING: &str = "# Internal documentation you can use";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: String) -> Self {
        Self { role: Role::System, content }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PromptAssembler {
    frozen_at: Option<DateTime<Utc>>,
}

impl PromptAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembler whose clock always reads `instant`.
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self { frozen_at: Some(instant) }
    }

    fn now(&self) -> DateTime<Utc> {
        self.frozen_at.unwrap_or_else(Utc::now)
    }

    pub fn default_system(&self, call: &CallState) -> Result<String> {
        let date = self.now().with_timezone(&call.tz()).format(DATE_FORMAT).to_string();
        let slots = Slots::new()
            .with("bot_company", call.initiate.bot_company.as_str())
            .with("bot_name", call.initiate.bot_name.as_str())
            .with("bot_phone_number", call.initiate.bot_phone_number.as_str())
            .with("date", date)
            .with("phone_number", call.phone_number.as_str());
        render(PromptKind::DefaultSystem, &slots, &[])
    }

    pub fn chat_system(&self, call: &CallState, trainings: &[Training]) -> Result<Vec<ChatMessage>> {
        let actions = MessageAction::ALL.map(|a| a.as_str()).join(", ");
        let styles = MessageStyle::ALL.map(|s| s.as_str()).join(", ");
        let slots = context_slots(call)?
            .with("actions", actions)
            .with("styles", styles);
        self.messages(call, render(PromptKind::ChatSystem, &slots, trainings)?)
    }

    pub fn sms_summary_system(&self, call: &CallState) -> Result<Vec<ChatMessage>> {
        let slots = context_slots(call)?;
        self.messages(call, render(PromptKind::SmsSummarySystem, &slots, &[])?)
    }

    pub fn synthesis_system(&self, call: &CallState) -> Result<Vec<ChatMessage>> {
        let slots = context_slots(call)?.with("format", SynthesisModel::format_schema()?);
        self.messages(call, render(PromptKind::SynthesisSystem, &slots, &[])?)
    }

    /// Prompt asking the model to annotate `text` with citations from the call.
    pub fn citations_system(&self, call: &CallState, text: &str) -> Result<Vec<ChatMessage>> {
        let slots = context_slots(call)?.with("text", text);
        self.messages(call, render(PromptKind::CitationsSystem, &slots, &[])?)
    }

    pub fn next_system(&self, call: &CallState) -> Result<Vec<ChatMessage>> {
        let slots = context_slots(call)?.with("format", NextModel::format_schema()?);
        self.messages(call, render(PromptKind::NextSystem, &slots, &[])?)
    }

    fn messages(&self, call: &CallState, system: String) -> Result<Vec<ChatMessage>> {
        Ok(vec![
            ChatMessage::system(self.default_system(call)?),
            ChatMessage::system(system),
        ])
    }
}

fn context_slots(call: &CallState) -> Result<Slots> {
    Ok(Slots::new()
        .with("bot_company", call.initiate.bot_company.as_str())
        .with("bot_name", call.initiate.bot_name.as_str())
        .with("default_lang", call.lang().human_name.as_str())
        .with("inquiry", serde_json::to_string(&call.claim)?)
        .with("messages", serde_json::to_string(&call.messages)?)
        .with("reminders", serde_json::to_string(&call.reminders)?)
        .with("task", call.initiate.task.as_str()))
}

fn render(kind: PromptKind, slots: &Slots, trainings: &[Training]) -> Result<String> {
    let mut prompt = dedent(&fill(kind.name(), kind.template(), slots)?).trim().to_string();

    if !trainings.is_empty() {
        // Escaped so the content-safety scanner treats documents as inert data.
        let documents = trainings
            .iter()
            .map(|t| Ok(format!("<documents>{}</documents>", html_escape(&t.to_llm_json()?))))
            .collect::<Result<Vec<_>>>()?;
        prompt.push_str("\n\n");
        prompt.push_str(TRAININGS_HEADING);
        prompt.push('\n');
        prompt.push_str(&documents.join("\n"));
    }

    let prompt = collapse_lines(&prompt);
    log::debug!("Assembled {} prompt ({} chars)", kind.name(), prompt.len());
    Ok(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkflowInitiate;
    use crate::domain::call::{Message, Persona, Reminder};
    use chrono::TimeZone;
    use serde_json::json;
    use uuid::Uuid;

    fn instant(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 15, h, m, s).unwrap()
    }

    fn call() -> CallState {
        let mut call = CallState::new(WorkflowInitiate::default(), "+61298765432");
        call.claim.insert("customer_name".into(), json!("Jane Doe"));
        call.messages.push(Message {
            action: MessageAction::Talk,
            content: "I moved to 123 Main Street\nand need internet.".into(),
            created_at: instant(12, 40, 0),
            persona: Persona::Human,
            style: MessageStyle::None,
            lang_short_code: None,
        });
        call.reminders.push(Reminder {
            created_at: instant(12, 41, 0),
            description: "Check nbn readiness".into(),
            due_date_time: instant(13, 0, 0),
            owner: None,
            title: "nbn".into(),
        });
        call
    }

    fn training(content: &str) -> Training {
        Training {
            id: Uuid::new_v4(),
            content: content.into(),
            score: 0.5,
            title: "Modem returns".into(),
        }
    }

    #[test]
    fn test_chat_system_is_identity_then_instructions() {
        let assembler = PromptAssembler::at(instant(12, 43, 10));
        let call = call();
        let messages = assembler.chat_system(&call, &[]).unwrap();

        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| m.role == Role::System));
        assert_eq!(messages[0].content, assembler.default_system(&call).unwrap());
        assert!(messages[0].content.starts_with("Assistant is called Amelie"));
        assert!(messages[1].content.starts_with("# Objective Assist the customer"));
        assert!(messages[1].content.contains("call, hangup, sms, talk"));
        assert!(messages[1].content.contains("cheerful, none, sad"));
        assert!(messages[1].content.contains(r#"{"customer_name":"Jane Doe"}"#));
        assert!(!messages[1].content.contains("Internal documentation"));
        for message in &messages {
            assert!(!message.content.contains('\n'));
        }
    }

    #[test]
    fn test_default_system_truncates_to_minute() {
        let call = call();
        let a = PromptAssembler::at(instant(12, 43, 1)).default_system(&call).unwrap();
        let b = PromptAssembler::at(instant(12, 43, 59)).default_system(&call).unwrap();
        let c = PromptAssembler::at(instant(12, 44, 0)).default_system(&call).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.ends_with("Today is Mon 15 Jul 2024, 12:43 (UTC)"));
    }

    #[test]
    fn test_default_system_uses_call_timezone() {
        let mut call = call();
        call.timezone = chrono_tz::Europe::Paris;
        let prompt = PromptAssembler::at(instant(12, 43, 0)).default_system(&call).unwrap();
        assert!(prompt.ends_with("Today is Mon 15 Jul 2024, 14:43 (CEST)"), "{prompt}");
        assert!(prompt.contains("The customer is calling from +61298765432"));
    }

    #[test]
    fn test_trainings_are_escaped_and_delimited() {
        let assembler = PromptAssembler::at(instant(12, 43, 0));
        let doc = training("<script>alert('x')</script> Modems & routers");
        let messages = assembler.chat_system(&call(), &[doc]).unwrap();
        let prompt = &messages[1].content;

        assert!(prompt.contains(TRAININGS_HEADING));
        assert_eq!(prompt.matches("<documents>").count(), 1);
        assert_eq!(prompt.matches("</documents>").count(), 1);

        let start = prompt.find("<documents>").unwrap() + "<documents>".len();
        let end = prompt.find("</documents>").unwrap();
        let body = &prompt[start..end];
        assert!(!body.contains('<') && !body.contains('>'));
        assert!(body.contains("&lt;script&gt;"));
        assert!(body.contains("&amp; routers"));
        assert!(!body.contains("score"));
    }

    #[test]
    fn test_every_purpose_assembles() {
        let assembler = PromptAssembler::at(instant(9, 0, 0));
        let call = call();
        let all = [
            assembler.chat_system(&call, &[training("doc")]).unwrap(),
            assembler.sms_summary_system(&call).unwrap(),
            assembler.synthesis_system(&call).unwrap(),
            assembler.citations_system(&call, "Your nbn® service is ready.").unwrap(),
            assembler.next_system(&call).unwrap(),
        ];
        for messages in &all {
            assert_eq!(messages.len(), 2);
            assert!(messages.iter().all(|m| !m.content.contains('\n')));
        }
        assert!(all[1][1].content.contains("Amelie from More."));
        assert!(all[1][1].content.contains("Check nbn readiness"));
        assert!(all[2][1].content.contains("improvement_suggestions"));
        assert!(all[3][1].content.contains("Your nbn® service is ready."));
        assert!(all[4][1].content.contains("requires_technical_support"));
    }

    #[test]
    fn test_message_history_newlines_do_not_leak() {
        let messages = PromptAssembler::at(instant(9, 0, 0)).sms_summary_system(&call()).unwrap();
        assert!(messages[1].content.contains(r"123 Main Street\nand need internet."));
    }

    #[test]
    fn test_default_lang_follows_call_language() {
        let mut call = call();
        call.lang_short_code = Some("fr-FR".into());
        let messages = PromptAssembler::at(instant(9, 0, 0)).chat_system(&call, &[]).unwrap();
        assert!(messages[1].content.contains("Answers in French"));
    }
}
