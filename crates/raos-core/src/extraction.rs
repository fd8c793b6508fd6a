use crate::cache::ExtractionCache;
use crate::error::ExtractionError;
use crate::fence::strip_code_fence;
use crate::types::Extraction;
use completion_client::{ChatMessage, Completer};
use std::sync::Arc;

/// Build the single-message extraction prompt for `description`.
pub fn extraction_prompt(description: &str) -> String {
    format!(
        r#"You are a JSON-only API. Output valid JSON and nothing else: no prose, no apologies, no markdown.
You are a requirements analyst. Extract the app's behaviours in RAOS (Role, Action, Object, Supplementary) form from the user's description.

User description: "{description}"

Respond with a single JSON object of exactly this shape:
{{
  "appName": "string",
  "entities": ["string"],
  "roles": ["string"],
  "features": ["string"],
  "raos": [
    {{
      "role": "string",
      "action": "string",
      "object": "string",
      "supplementary": "string"
    }}
  ]
}}

Rules:
- role: a concrete role name such as "Admin", never a phrase like "user who manages".
- action: one specific, indivisible verb. Vague verbs such as "manage", "operate" or "process" are not allowed, and the role name is never an action.
- object: an entity or data item of the system, never a composite concept.
- supplementary: for each behaviour, a concrete boundary condition, business rule or exception case drawn from the context and common business practice. Generic placeholders are not allowed.

Output the JSON object only."#
    )
}

/// Parse a model reply (fences already stripped) into an [`Extraction`].
pub fn parse_extraction(text: &str) -> Result<Extraction, ExtractionError> {
    serde_json::from_str(text).map_err(|source| ExtractionError::InvalidJson {
        raw: text.to_string(),
        source,
    })
}

/// Stage 1: free-text description to structured RAOS data.
///
/// One completion call per cache miss. A reply that is not the expected
/// JSON fails immediately; only the client's own 429 backoff retries.
pub struct Extractor {
    completer: Arc<dyn Completer>,
    cache: Arc<dyn ExtractionCache>,
    max_tokens: u32,
}

impl Extractor {
    pub fn new(completer: Arc<dyn Completer>, cache: Arc<dyn ExtractionCache>, max_tokens: u32) -> Self {
        Self {
            completer,
            cache,
            max_tokens,
        }
    }

    pub fn cache(&self) -> &Arc<dyn ExtractionCache> {
        &self.cache
    }

    pub async fn extract(&self, description: &str) -> Result<Extraction, ExtractionError> {
        if let Some(hit) = self.cache.get(description) {
            tracing::debug!(app_name = %hit.app_name, "extraction cache hit");
            return Ok(hit);
        }

        let messages = [ChatMessage::user(extraction_prompt(description))];
        let reply = self.completer.complete(&messages, self.max_tokens).await?;
        let extraction = parse_extraction(&strip_code_fence(&reply)).inspect_err(|e| {
            tracing::warn!(error = %e, "model reply was not valid extraction JSON");
        })?;

        tracing::info!(
            app_name = %extraction.app_name,
            behaviours = extraction.raos.len(),
            "extraction complete"
        );
        self.cache.set(description, extraction.clone());
        Ok(extraction)
    }
}
