//! Generative-language API client
//!
//! Speaks `POST {base}/models/{model}:generateContent` with JSON response
//! mode. One client implements every collaborator trait.

pub mod prompts;
pub mod speech;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use vaidya_common::models::{IdentificationResult, TranslationResult};

use super::collaborators::{
    AudioClip, CollaboratorError, KnowledgeChat, PlantIdentifier, RemedySuggester,
    RemedySuggestion, RemedyVerifier, SpeechSynthesizer, Translator, Verdict,
    VerificationRequest,
};
use super::data_uri;

const USER_AGENT: &str = "PharmaVaidya/0.1.0";
const RATE_LIMIT_MS: u64 = 200;
const SPEECH_VOICE: &str = "Algenib";

/// Rate limiter to enforce a minimum interval between requests
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("GenAI rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    /// Inline part from a `data:` URI
    fn media(uri: &str) -> Result<Self, CollaboratorError> {
        let (mime_type, data) = data_uri::split(uri)
            .map_err(|e| CollaboratorError::ParseError(e.to_string()))?;
        Ok(Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data: data.to_string(),
            }),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl GenerateResponse {
    fn first_parts(&self) -> &[Part] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or(&[])
    }

    fn text(&self) -> Option<String> {
        let text: String = self
            .first_parts()
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }

    fn inline_data(&self) -> Option<&InlineData> {
        self.first_parts().iter().find_map(|p| p.inline_data.as_ref())
    }
}

#[derive(Debug, Deserialize)]
struct ChatAnswer {
    answer: String,
}

/// Strip a Markdown code fence some models wrap JSON in
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, CollaboratorError> {
    serde_json::from_str(strip_code_fence(text))
        .map_err(|e| CollaboratorError::ParseError(e.to_string()))
}

/// Generative-language API client
pub struct GenAiClient {
    http_client: reqwest::Client,
    rate_limiter: Arc<RateLimiter>,
    api_key: String,
    base_url: String,
    model: String,
    speech_model: String,
}

impl GenAiClient {
    pub fn new(
        api_key: String,
        base_url: &str,
        model: &str,
        speech_model: &str,
    ) -> Result<Self, CollaboratorError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CollaboratorError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            rate_limiter: Arc::new(RateLimiter::new(RATE_LIMIT_MS)),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            speech_model: speech_model.to_string(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    async fn generate(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, CollaboratorError> {
        self.rate_limiter.wait().await;

        tracing::debug!(model = %model, "Calling generateContent");

        let response = self
            .http_client
            .post(self.endpoint(model))
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await
            .map_err(|e| CollaboratorError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status == 401 || status == 403 {
            return Err(CollaboratorError::InvalidApiKey);
        }

        if status == 429 {
            return Err(CollaboratorError::RateLimitExceeded);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            if error_text.contains("API_KEY_INVALID") {
                return Err(CollaboratorError::InvalidApiKey);
            }
            return Err(CollaboratorError::ApiError(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| CollaboratorError::ParseError(e.to_string()))
    }

    /// One user turn in JSON response mode
    async fn generate_json<T: DeserializeOwned>(
        &self,
        system: Option<&str>,
        parts: Vec<Part>,
    ) -> Result<T, CollaboratorError> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            system_instruction: system.map(|s| Content {
                role: None,
                parts: vec![Part::text(s)],
            }),
            generation_config: json!({ "responseMimeType": "application/json" }),
        };

        let response = self.generate(&self.model, &request).await?;
        let text = response.text().ok_or(CollaboratorError::EmptyResponse)?;
        parse_json(&text)
    }
}

#[async_trait]
impl PlantIdentifier for GenAiClient {
    async fn identify(
        &self,
        photo_data_uri: &str,
    ) -> Result<IdentificationResult, CollaboratorError> {
        let parts = vec![Part::text(prompts::IDENTIFICATION), Part::media(photo_data_uri)?];
        let result: IdentificationResult = self.generate_json(None, parts).await?;

        tracing::info!(
            is_plant = result.is_plant,
            scientific_name = %result.scientific_name,
            "Plant identification complete"
        );
        Ok(result)
    }
}

#[async_trait]
impl KnowledgeChat for GenAiClient {
    async fn answer(&self, query: &str) -> Result<String, CollaboratorError> {
        let parts = vec![Part::text(format!("Question: {}", query))];
        let answer: ChatAnswer = self
            .generate_json(Some(prompts::CHAT_PERSONA), parts)
            .await?;
        Ok(answer.answer)
    }
}

#[async_trait]
impl Translator for GenAiClient {
    async fn translate(
        &self,
        plant_name: &str,
        language_name: &str,
    ) -> Result<TranslationResult, CollaboratorError> {
        let parts = vec![Part::text(prompts::translation(plant_name, language_name))];
        let result: TranslationResult = self.generate_json(None, parts).await?;

        if result.is_available() {
            Ok(result)
        } else {
            Ok(TranslationResult::not_available())
        }
    }
}

#[async_trait]
impl RemedyVerifier for GenAiClient {
    async fn verify(&self, request: &VerificationRequest) -> Result<Verdict, CollaboratorError> {
        let mut parts = vec![Part::text(prompts::verification(
            &request.plant_name,
            &request.remedy_description,
            &request.language,
            request.effectiveness_rating,
            request.photo_data_uri.is_some(),
        ))];
        if let Some(photo) = &request.photo_data_uri {
            parts.push(Part::media(photo)?);
        }

        let verdict: Verdict = self.generate_json(None, parts).await?;
        tracing::info!(
            plant = %request.plant_name,
            plausible = verdict.is_plausible,
            "Remedy verification complete"
        );
        Ok(verdict)
    }
}

#[async_trait]
impl RemedySuggester for GenAiClient {
    async fn suggest(
        &self,
        plant_name: &str,
        photo_data_uri: &str,
    ) -> Result<RemedySuggestion, CollaboratorError> {
        let parts = vec![
            Part::text(prompts::suggestion(plant_name)),
            Part::media(photo_data_uri)?,
        ];
        let mut suggestion: RemedySuggestion = self.generate_json(None, parts).await?;
        suggestion.suggested_effectiveness = suggestion.suggested_effectiveness.clamp(
            vaidya_common::models::MIN_RATING,
            vaidya_common::models::MAX_RATING,
        );
        Ok(suggestion)
    }
}

#[async_trait]
impl SpeechSynthesizer for GenAiClient {
    async fn speak(&self, text: &str) -> Result<AudioClip, CollaboratorError> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part::text(text)],
            }],
            system_instruction: None,
            generation_config: json!({
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": SPEECH_VOICE } }
                }
            }),
        };

        let response = self.generate(&self.speech_model, &request).await?;
        let audio = response
            .inline_data()
            .ok_or(CollaboratorError::EmptyResponse)?;

        let pcm = STANDARD
            .decode(&audio.data)
            .map_err(|e| CollaboratorError::ParseError(e.to_string()))?;
        let media = speech::pcm_to_wav_data_uri(&pcm, speech::sample_rate_from_mime(&audio.mime_type))
            .map_err(|e| CollaboratorError::ParseError(e.to_string()))?;

        Ok(AudioClip { media })
    }
}
