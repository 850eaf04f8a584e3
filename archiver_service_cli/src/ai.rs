use reqwest::Client;
use serde_json::json;

use crate::error::ArchiveError;

const GEMINI_MODEL: &str = "gemini-3-flash-preview";

/// Hard cap on the HTML handed to the model, in characters.
const MAX_INPUT_CHARS: usize = 100_000;

const SYSTEM_PROMPT: &str = r#"You are a strict content extractor. Analyze the provided HTML/Text.

1. Remove all advertisements, popups, sidebars, sponsored links, and navigation menus.
2. Return ONLY the main article content formatted as clean, semantic HTML (<h1>, <p>, <ul>, etc.).
3. **LANGUAGE PRESERVATION POLICY:** You must STRICTLY preserve the original language of the source text. Do NOT translate.
4. Do not summarize; keep the full original text.

Technical Constraints:
- Maintain valid <img> tags with original 'src' attributes.
- Remove dangerous HTML (scripts, iframes, tracking pixels).
- Do not include <html>, <head>, or <body> tags. Return only the inner body content."#;

/// Opaque text-in/HTML-out boilerplate remover backed by the Gemini API.
pub struct ContentCleaner {
    client: Client,
    api_key: String,
}

impl ContentCleaner {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }

    pub async fn clean_content(&self, raw_html: &str) -> Result<String, ArchiveError> {
        let input: String = raw_html.chars().take(MAX_INPUT_CHARS).collect();

        let payload = json!({
            "systemInstruction": { "parts": [{ "text": SYSTEM_PROMPT }] },
            "contents": [{ "parts": [{ "text": input }] }]
        });

        let endpoint = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            GEMINI_MODEL
        );

        let response = self
            .client
            .post(&endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await
            .map_err(|e| ArchiveError::Extraction(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ArchiveError::Extraction(format!(
                "Erro HTTP: {}",
                response.status()
            )));
        }

        let body = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| ArchiveError::Extraction(e.to_string()))?;

        let text = body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| {
                ArchiveError::Extraction("Não foi gerada resposta pela IA.".to_string())
            })?;

        Ok(strip_code_fences(text).to_string())
    }
}

/// Gemini sometimes wraps its reply in a Markdown code block.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let without_open = trimmed
        .strip_prefix("```html")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}
