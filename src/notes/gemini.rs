//! Gemini `generateContent` client
//!
//! API Documentation: https://ai.google.dev/api/generate-content

use super::LinerNotes;
use crate::catalog::Track;
use anyhow::Context;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

pub fn prompt(track: &Track) -> String {
    format!(
        "Analyze the song \"{}\" by \"{}\".\n\
         Provide a short, cool, retro-style 'liner note' fun fact or trivia about the song/artist (max 2 sentences).\n\
         Describe the mood in 2-3 words.\n\
         List 3 similar artists.",
        track.track_name, track.artist_name
    )
}

pub fn request_body(track: &Track) -> serde_json::Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt(track) }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "fact": { "type": "STRING" },
                    "mood": { "type": "STRING" },
                    "similarArtists": { "type": "ARRAY", "items": { "type": "STRING" } }
                },
                "required": ["fact", "mood", "similarArtists"]
            }
        }
    })
}

/// Pull the JSON notes out of the first candidate's text.
pub fn parse_response(v: serde_json::Value) -> anyhow::Result<LinerNotes> {
    let response: GenerateResponse =
        serde_json::from_value(v).context("parse generateContent json")?;
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        anyhow::bail!("no text response");
    }
    serde_json::from_str(&text).context("parse liner notes")
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(base_url: &str, model: &str, api_key: String) -> anyhow::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .context("build reqwest client")?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        })
    }

    pub async fn generate(&self, track: &Track) -> anyhow::Result<LinerNotes> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let v: serde_json::Value = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(track))
            .send()
            .await
            .context("send generateContent request")?
            .error_for_status()
            .context("generateContent http status")?
            .json()
            .await
            .context("read generateContent json")?;
        parse_response(v)
    }
}
