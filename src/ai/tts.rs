use crate::ai::prompts::{
    CALLTRANSFER_FAILURE_TPL, CONNECT_AGENT_TPL, END_CALL_TO_CONNECT_AGENT_TPL, ERROR_TPL, GOODBYE_TPL,
    HELLO_TPL, IVR_LANGUAGE_TPL, TIMEOUT_LOADING_TPL, TIMEOUT_SILENCE_TPL,
};
use crate::ai::templates::{dedent, escape_braces, fill, placeholders, Slots};
use crate::ai::translation::Translate;
use crate::domain::call::CallState;
use crate::error::{CallCenterError, Result};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Alternative wordings for one situation. Never empty, no blank phrase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct PhraseSet(Vec<String>);

impl TryFrom<Vec<String>> for PhraseSet {
    type Error = CallCenterError;

    fn try_from(phrases: Vec<String>) -> Result<Self> {
        if phrases.is_empty() {
            return Err(CallCenterError::ConfigError("a phrase set needs at least one phrase".into()));
        }
        if phrases.iter().any(|p| p.trim().is_empty()) {
            return Err(CallCenterError::ConfigError("a phrase set cannot contain a blank phrase".into()));
        }
        Ok(Self(phrases))
    }
}

impl From<PhraseSet> for Vec<String> {
    fn from(set: PhraseSet) -> Self {
        set.0
    }
}

impl PhraseSet {
    fn from_static(phrases: &[&str]) -> Self {
        Self(phrases.iter().map(|p| p.to_string()).collect())
    }

    /// Single phrase rendered verbatim, braces included.
    pub fn literal(text: &str) -> Self {
        Self(vec![escape_braces(text)])
    }

    pub fn phrases(&self) -> &[String] {
        &self.0
    }

    pub fn choose(&self) -> &str {
        self.0
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Situation {
    CalltransferFailure,
    ConnectAgent,
    EndCallToConnectAgent,
    Error,
    Goodbye,
    Hello,
    TimeoutSilence,
    TimeoutLoading,
    IvrLanguage,
}

impl Situation {
    const ALL: [Situation; 9] = [
        Situation::CalltransferFailure,
        Situation::ConnectAgent,
        Situation::EndCallToConnectAgent,
        Situation::Error,
        Situation::Goodbye,
        Situation::Hello,
        Situation::TimeoutSilence,
        Situation::TimeoutLoading,
        Situation::IvrLanguage,
    ];

    fn name(self) -> &'static str {
        match self {
            Situation::CalltransferFailure => "calltransfer_failure_tpl",
            Situation::ConnectAgent => "connect_agent_tpl",
            Situation::EndCallToConnectAgent => "end_call_to_connect_agent_tpl",
            Situation::Error => "error_tpl",
            Situation::Goodbye => "goodbye_tpl",
            Situation::Hello => "hello_tpl",
            Situation::TimeoutSilence => "timeout_silence_tpl",
            Situation::TimeoutLoading => "timeout_loading_tpl",
            Situation::IvrLanguage => "ivr_language_tpl",
        }
    }

    fn allowed_slots(self) -> &'static [&'static str] {
        match self {
            Situation::Goodbye => &["bot_company"],
            Situation::Hello => &["bot_company", "bot_name"],
            Situation::IvrLanguage => &["index", "label"],
            _ => &[],
        }
    }

    fn defaults(self) -> &'static [&'static str] {
        match self {
            Situation::CalltransferFailure => &CALLTRANSFER_FAILURE_TPL,
            Situation::ConnectAgent => &CONNECT_AGENT_TPL,
            Situation::EndCallToConnectAgent => &END_CALL_TO_CONNECT_AGENT_TPL,
            Situation::Error => &ERROR_TPL,
            Situation::Goodbye => &GOODBYE_TPL,
            Situation::Hello => &HELLO_TPL,
            Situation::TimeoutSilence => &TIMEOUT_SILENCE_TPL,
            Situation::TimeoutLoading => &TIMEOUT_LOADING_TPL,
            Situation::IvrLanguage => &IVR_LANGUAGE_TPL,
        }
    }
}

/// Voice prompt tables and the locale they are written in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsPrompts {
    pub tts_lang: String,
    pub calltransfer_failure_tpl: PhraseSet,
    pub connect_agent_tpl: PhraseSet,
    pub end_call_to_connect_agent_tpl: PhraseSet,
    pub error_tpl: PhraseSet,
    pub goodbye_tpl: PhraseSet,
    pub hello_tpl: PhraseSet,
    pub timeout_silence_tpl: PhraseSet,
    pub timeout_loading_tpl: PhraseSet,
    pub ivr_language_tpl: PhraseSet,
}

impl Default for TtsPrompts {
    fn default() -> Self {
        let table = |situation: Situation| PhraseSet::from_static(situation.defaults());
        Self {
            tts_lang: "en-US".to_string(),
            calltransfer_failure_tpl: table(Situation::CalltransferFailure),
            connect_agent_tpl: table(Situation::ConnectAgent),
            end_call_to_connect_agent_tpl: table(Situation::EndCallToConnectAgent),
            error_tpl: table(Situation::Error),
            goodbye_tpl: table(Situation::Goodbye),
            hello_tpl: table(Situation::Hello),
            timeout_silence_tpl: table(Situation::TimeoutSilence),
            timeout_loading_tpl: table(Situation::TimeoutLoading),
            ivr_language_tpl: table(Situation::IvrLanguage),
        }
    }
}

impl TtsPrompts {
    fn table(&self, situation: Situation) -> &PhraseSet {
        match situation {
            Situation::CalltransferFailure => &self.calltransfer_failure_tpl,
            Situation::ConnectAgent => &self.connect_agent_tpl,
            Situation::EndCallToConnectAgent => &self.end_call_to_connect_agent_tpl,
            Situation::Error => &self.error_tpl,
            Situation::Goodbye => &self.goodbye_tpl,
            Situation::Hello => &self.hello_tpl,
            Situation::TimeoutSilence => &self.timeout_silence_tpl,
            Situation::TimeoutLoading => &self.timeout_loading_tpl,
            Situation::IvrLanguage => &self.ivr_language_tpl,
        }
    }

    /// Every phrase must be non-blank and only use the slots its situation provides.
    pub fn validate(&self) -> Result<()> {
        if self.tts_lang.trim().is_empty() {
            return Err(CallCenterError::ConfigError("prompts.tts.tts_lang is empty".into()));
        }
        for situation in Situation::ALL {
            let name = situation.name();
            let allowed: BTreeSet<&str> = situation.allowed_slots().iter().copied().collect();
            for phrase in self.table(situation).phrases() {
                if phrase.trim().is_empty() {
                    return Err(CallCenterError::ConfigError(format!("prompts.tts.{name} has a blank phrase")));
                }
                if let Some(unknown) = placeholders(name, phrase)?.difference(&allowed).next() {
                    return Err(CallCenterError::ConfigError(format!(
                        "prompts.tts.{name} uses unknown placeholder '{{{unknown}}}'"
                    )));
                }
            }
        }
        Ok(())
    }

    pub async fn calltransfer_failure(&self, call: &CallState, translator: &dyn Translate) -> String {
        self.speak(Situation::CalltransferFailure, &Slots::new(), call, translator).await
    }

    pub async fn connect_agent(&self, call: &CallState, translator: &dyn Translate) -> String {
        self.speak(Situation::ConnectAgent, &Slots::new(), call, translator).await
    }

    pub async fn end_call_to_connect_agent(&self, call: &CallState, translator: &dyn Translate) -> String {
        self.speak(Situation::EndCallToConnectAgent, &Slots::new(), call, translator).await
    }

    pub async fn error(&self, call: &CallState, translator: &dyn Translate) -> String {
        self.speak(Situation::Error, &Slots::new(), call, translator).await
    }

    pub async fn goodbye(&self, call: &CallState, translator: &dyn Translate) -> String {
        let slots = Slots::new().with("bot_company", call.initiate.bot_company.as_str());
        self.speak(Situation::Goodbye, &slots, call, translator).await
    }

    pub async fn hello(&self, call: &CallState, translator: &dyn Translate) -> String {
        let slots = Slots::new()
            .with("bot_company", call.initiate.bot_company.as_str())
            .with("bot_name", call.initiate.bot_name.as_str());
        self.speak(Situation::Hello, &slots, call, translator).await
    }

    pub async fn timeout_silence(&self, call: &CallState, translator: &dyn Translate) -> String {
        self.speak(Situation::TimeoutSilence, &Slots::new(), call, translator).await
    }

    pub async fn timeout_loading(&self, call: &CallState, translator: &dyn Translate) -> String {
        self.speak(Situation::TimeoutLoading, &Slots::new(), call, translator).await
    }

    /// Language menu, one "press N" fragment per configured language, numbered from 1.
    ///
    /// An empty catalog still announces the call's active language.
    pub async fn ivr_language(&self, call: &CallState, translator: &dyn Translate) -> String {
        let availables = &call.initiate.lang.availables;
        let languages = if availables.is_empty() {
            std::slice::from_ref(call.lang())
        } else {
            availables.as_slice()
        };
        let menu = languages
            .iter()
            .enumerate()
            .map(|(i, lang)| {
                let slots = Slots::new()
                    .with("index", (i + 1).to_string())
                    .with("label", lang.human_name.as_str());
                self.compose(Situation::IvrLanguage, &slots)
            })
            .collect::<Vec<_>>()
            .join(" ");
        let menu = PhraseSet::literal(&menu);
        let text = format_phrase("ivr_language", menu.choose(), &Slots::new());
        self.translate(text, call, translator).await
    }

    async fn speak(&self, situation: Situation, slots: &Slots, call: &CallState, translator: &dyn Translate) -> String {
        let text = self.compose(situation, slots);
        self.translate(text, call, translator).await
    }

    // Never empty: a phrase that renders blank is replaced by a built-in one.
    fn compose(&self, situation: Situation, slots: &Slots) -> String {
        let name = situation.name();
        let text = format_phrase(name, self.table(situation).choose(), slots);
        if !text.is_empty() {
            return text;
        }
        log::warn!("TTS prompt {} rendered empty, using a built-in phrase", name);
        let fallback = situation.defaults().choose(&mut rand::thread_rng()).copied().unwrap_or_default();
        format_phrase(name, fallback, slots)
    }

    async fn translate(&self, initial: String, call: &CallState, translator: &dyn Translate) -> String {
        let target = &call.lang().short_code;
        match translator.translate(&initial, target, &self.tts_lang).await {
            Ok(translated) if !translated.trim().is_empty() => translated,
            Ok(_) => {
                log::warn!("Empty translation to {}, keeping original", target);
                initial
            }
            Err(e) => {
                log::warn!("Failed to translate TTS prompt to {}: {}", target, e);
                initial
            }
        }
    }
}

fn format_phrase(name: &str, phrase: &str, slots: &Slots) -> String {
    let text = fill(name, phrase, slots).unwrap_or_else(|e| {
        log::error!("Cannot format TTS prompt: {}", e);
        phrase.to_string()
    });
    dedent(&text).trim().to_string()
}
