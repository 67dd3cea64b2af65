//! AI liner notes for a track
//!
//! Notes are decoration: a missing key or a failed request still yields
//! displayable placeholder notes.

pub mod gemini;

use crate::catalog::Track;
use crate::config::NotesConfig;
use gemini::GeminiClient;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinerNotes {
    pub fact: String,
    pub mood: String,
    #[serde(default)]
    pub similar_artists: Vec<String>,
}

impl LinerNotes {
    fn placeholder(fact: &str, mood: &str) -> Self {
        Self {
            fact: fact.to_string(),
            mood: mood.to_string(),
            similar_artists: Vec::new(),
        }
    }

    pub fn unconfigured() -> Self {
        Self::placeholder("Configure your API Key to see AI insights.", "Unknown")
    }

    pub fn unavailable() -> Self {
        Self::placeholder("Could not retrieve archival data.", "Static")
    }
}

#[derive(Debug, Clone)]
pub struct NotesClient {
    gemini: Option<GeminiClient>,
}

impl NotesClient {
    pub fn new(cfg: &NotesConfig) -> anyhow::Result<Self> {
        let gemini = match cfg.resolved_api_key() {
            Some(key) => Some(GeminiClient::new(&cfg.base_url, &cfg.model, key)?),
            None => None,
        };
        Ok(Self { gemini })
    }

    pub async fn liner_notes(&self, track: &Track) -> LinerNotes {
        let Some(gemini) = &self.gemini else {
            return LinerNotes::unconfigured();
        };
        match gemini.generate(track).await {
            Ok(notes) => notes,
            Err(e) => {
                tracing::error!("Gemini API error: {e:#}");
                LinerNotes::unavailable()
            }
        }
    }
}
