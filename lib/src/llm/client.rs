//! Thin blocking client for the Gemini REST API.
//!
//! Endpoint: POST {endpoint}/v1beta/models/{model}:generateContent
//!
//! Generation runs with fixed settings (temperature 0.7, 16k output
//! tokens, safety filters off) so repeated discovery calls over the same
//! corpus stay comparable. Every failure mode maps to
//! `FuryError::LlmUnavailable`; callers degrade to the deterministic
//! fallback paths rather than surfacing the error.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Config;
use crate::error::{FuryError, Result};

const LLM_TIMEOUT_SECS: u64 = 120;
const MAX_OUTPUT_TOKENS: u32 = 16_384;
const TEMPERATURE: f32 = 0.7;

const SAFETY_CATEGORIES: &[&str] = &[
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

pub struct LlmClient {
    client: Client,
    url: String,
}

impl LlmClient {
    /// Build a client from config and the environment. Returns None when
    /// the API key is absent, which forces the fallback paths everywhere.
    pub fn from_config(config: &Config) -> Option<Self> {
        let api_key = config.llm_api_key()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(LLM_TIMEOUT_SECS))
            .build()
            .ok()?;

        let base = config.llm.endpoint.trim_end_matches('/');
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            base, config.llm.model, api_key
        );

        log::info!("LLM client initialized (model {})", config.llm.model);
        Some(Self { client, url })
    }

    /// Single, non-streaming generation call. Returns the concatenated
    /// text of the first candidate.
    pub fn generate(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest::new(prompt);

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .map_err(|e| FuryError::LlmUnavailable(format!("transport: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let snippet = snippet(&resp.text().unwrap_or_default());
            log::warn!("LLM call returned {}: {}", status, snippet);
            return Err(FuryError::LlmUnavailable(format!(
                "status {}: {}",
                status, snippet
            )));
        }

        let out: GenerateResponse = resp
            .json()
            .map_err(|e| FuryError::LlmUnavailable(format!("decode: {}", e)))?;

        let text: String = out
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(FuryError::LlmUnavailable("empty candidate".to_string()));
        }

        Ok(text)
    }
}

/// Remove a wrapping markdown code fence, if present
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag on the opening fence line
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn snippet(text: &str) -> String {
    let mut s = text.trim().replace('\n', " ");
    if s.len() > 200 {
        let mut cut = 200;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
    }
    s
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

impl<'a> GenerateRequest<'a> {
    fn new(prompt: &'a str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .map(|category| SafetySetting {
                    category,
                    threshold: "BLOCK_NONE",
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("{\"a\":1}", "{\"a\":1}")]
    #[case("```json\n{\"a\":1}\n```", "{\"a\":1}")]
    #[case("```\n[1,2]\n```", "[1,2]")]
    #[case("  {\"a\":1}  ", "{\"a\":1}")]
    fn test_strip_code_fences(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(strip_code_fences(input), expected);
    }

    #[test]
    fn test_request_serialization_shape() {
        let req = GenerateRequest::new("hello");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 16384);
        assert_eq!(json["safetySettings"][0]["threshold"], "BLOCK_NONE");
        assert_eq!(json["safetySettings"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_response_with_missing_candidates_decodes() {
        let out: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(out.candidates.is_empty());
    }
}
