//! Google Gemini `generateContent` client.

use std::time::Duration;

use {
    async_trait::async_trait,
    reqwest::Client,
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
    tracing::{debug, warn},
};

use crate::{Error, Result, TextGenerator};

const PROVIDER: &str = "gemini";

pub struct GeminiProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: Secret<String>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
    /// Thinking models mark their reasoning parts with `thought: true`.
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiProvider {
    pub fn new(api_key: &str, base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::network(PROVIDER, e))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: Secret::new(api_key.to_string()),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

/// Concatenate the visible text of the first candidate.
fn extract_text(response: GenerateResponse) -> Result<String> {
    let block_reason = response.prompt_feedback.and_then(|f| f.block_reason);
    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(Error::Empty {
            provider: PROVIDER,
            reason: block_reason.map(|r| format!("prompt blocked: {r}")),
        });
    };

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter(|p| !p.thought)
        .filter_map(|p| p.text)
        .collect();
    let text = text.trim();

    if text.is_empty() {
        let reason = candidate
            .finish_reason
            .filter(|r| !r.eq_ignore_ascii_case("STOP"))
            .map(|r| format!("finish reason: {r}"));
        return Err(Error::Empty {
            provider: PROVIDER,
            reason,
        });
    }
    Ok(text.to_string())
}

#[async_trait]
impl TextGenerator for GeminiProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            contents: [RequestContent {
                role: "user",
                parts: [RequestPart { text: prompt }],
            }],
        };

        debug!(model = %self.model, prompt_chars = prompt.chars().count(), "calling gemini");
        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::network(PROVIDER, e))?;

        let status = resp.status();
        let raw = resp
            .text()
            .await
            .map_err(|e| Error::network(PROVIDER, e))?;
        if !status.is_success() {
            warn!(status = %status, model = %self.model, "gemini request rejected");
            return Err(Error::status(PROVIDER, status.as_u16(), &raw));
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&raw).map_err(|e| Error::decode(PROVIDER, e))?;
        let text = extract_text(parsed)?;
        debug!(model = %self.model, reply_chars = text.chars().count(), "gemini replied");
        Ok(text)
    }
}
