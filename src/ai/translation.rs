use crate::config::TranslationConfig;
use crate::error::{CallCenterError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

/// Remote text translation.
#[async_trait]
pub trait Translate: Send + Sync {
    async fn translate(&self, text: &str, target_lang: &str, source_lang: &str) -> Result<String>;
}

/// Returns text untouched. Used when no translation service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTranslator;

#[async_trait]
impl Translate for PassthroughTranslator {
    async fn translate(&self, text: &str, _target_lang: &str, _source_lang: &str) -> Result<String> {
        Ok(text.to_string())
    }
}

/// Client for a Translator v3 REST endpoint.
pub struct HttpTranslator {
    client: reqwest::Client,
    config: TranslationConfig,
}

impl HttpTranslator {
    pub fn new(config: TranslationConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, config })
    }

    fn request_url(&self, target_lang: &str, source_lang: &str) -> String {
        format!(
            "{}/translate?api-version=3.0&from={}&to={}",
            self.config.endpoint.trim_end_matches('/'),
            translator_code(source_lang),
            translator_code(target_lang)
        )
    }
}

/// Maps a BCP-47 locale to the code the translator expects.
fn translator_code(locale: &str) -> &str {
    match locale {
        "zh-CN" | "zh-SG" => "zh-Hans",
        "zh-TW" | "zh-HK" => "zh-Hant",
        _ => locale.split('-').next().unwrap_or(locale),
    }
}

#[async_trait]
impl Translate for HttpTranslator {
    async fn translate(&self, text: &str, target_lang: &str, source_lang: &str) -> Result<String> {
        if translator_code(target_lang) == translator_code(source_lang) {
            return Ok(text.to_string());
        }

        let mut request = self
            .client
            .post(self.request_url(target_lang, source_lang))
            .header("Ocp-Apim-Subscription-Key", self.config.api_key.expose())
            .json(&json!([{ "Text": text }]));
        if let Some(region) = &self.config.region {
            request = request.header("Ocp-Apim-Subscription-Region", region);
        }

        let res = request.send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let err_text = res.text().await.unwrap_or_default();
            log::error!("Translator error: {}", err_text);
            return Err(CallCenterError::TranslationFailed(format!("Translator error {status}: {err_text}")));
        }

        let body: Value = res.json().await?;
        body[0]["translations"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CallCenterError::TranslationFailed("No translation returned".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiKey;

    fn translator() -> HttpTranslator {
        HttpTranslator::new(TranslationConfig {
            endpoint: "https://api.cognitive.microsofttranslator.com/".into(),
            api_key: ApiKey::new("key"),
            region: Some("australiaeast".into()),
        })
        .unwrap()
    }

    #[test]
    fn test_translator_codes() {
        assert_eq!(translator_code("fr-FR"), "fr");
        assert_eq!(translator_code("zh-CN"), "zh-Hans");
        assert_eq!(translator_code("en"), "en");
    }

    #[test]
    fn test_request_url() {
        assert_eq!(
            translator().request_url("fr-FR", "en-US"),
            "https://api.cognitive.microsofttranslator.com/translate?api-version=3.0&from=en&to=fr"
        );
    }

    #[tokio::test]
    async fn test_same_language_skips_the_service() {
        let text = translator().translate("Hello there", "en-GB", "en-US").await.unwrap();
        assert_eq!(text, "Hello there");
    }

    #[tokio::test]
    async fn test_passthrough() {
        let text = PassthroughTranslator.translate("Bonjour", "en-US", "fr-FR").await.unwrap();
        assert_eq!(text, "Bonjour");
    }
}
