//! Provider response types and text extraction.

use serde::Deserialize;

/// Raw response from a `generateContent` call.
#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Fallback field used by some provider versions.
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Pull the first candidate's text, falling back to the legacy
    /// `output` field. Returns None when neither carries anything.
    pub fn extract_text(&self) -> Option<String> {
        let from_candidates = self.candidates.first().and_then(|c| {
            c.content.as_ref().map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
        });

        match from_candidates {
            Some(text) if !text.is_empty() => Some(text),
            _ => self.output.clone().filter(|s| !s.is_empty()),
        }
    }
}

/// Raw response from a `batchEmbedContents` call.
#[derive(Debug, Deserialize)]
pub struct BatchEmbedResponse {
    #[serde(default)]
    pub embeddings: Vec<EmbeddingValues>,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingValues {
    #[serde(default)]
    pub values: Vec<f32>,
}
