use crate::error::GenerationError;
use crate::fence::strip_code_fence;
use crate::types::Raos;
use completion_client::{ChatMessage, Completer, UpstreamError};
use std::fmt;
use std::sync::Arc;

/// Shortest markup accepted as a full document.
pub const MIN_MARKUP_LEN: usize = 100;

// ---------------------------------------------------------------------------
// Markup validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupDefect {
    TooShort(usize),
    MissingDoctype,
    UnclosedDocument,
    UnclosedBody,
}

impl fmt::Display for MarkupDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkupDefect::TooShort(len) => {
                write!(f, "markup is {len} characters, need at least {MIN_MARKUP_LEN}")
            }
            MarkupDefect::MissingDoctype => f.write_str("missing <!DOCTYPE declaration"),
            MarkupDefect::UnclosedDocument => f.write_str("missing <html> or </html>"),
            MarkupDefect::UnclosedBody => f.write_str("missing <body> or </body>"),
        }
    }
}

/// Structural check for a complete HTML document. Does not parse the markup.
pub fn validate_markup(markup: &str) -> Result<(), MarkupDefect> {
    let len = markup.chars().count();
    if len < MIN_MARKUP_LEN {
        return Err(MarkupDefect::TooShort(len));
    }
    if !markup.to_ascii_lowercase().contains("<!doctype") {
        return Err(MarkupDefect::MissingDoctype);
    }
    if !markup.contains("<html") || !markup.contains("</html>") {
        return Err(MarkupDefect::UnclosedDocument);
    }
    if !markup.contains("<body") || !markup.contains("</body>") {
        return Err(MarkupDefect::UnclosedBody);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

pub fn mockup_prompt(app_name: &str, raos: &[Raos]) -> String {
    let behaviours = serde_json::to_string_pretty(raos).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"You are a senior frontend developer. Produce a clean, responsive mock UI in English using pure HTML with inline CSS and no external libraries, based on the app behaviours below.

App Name: {app_name}

Behaviours (RAOS):
{behaviours}

Requirements:
- Group the UI by role; include every role that appears in the behaviours.
- Cover every behaviour above, plus create, view, edit and delete for every entity.
- Map each behaviour to a fitting control:
  - "create X": a form with inputs and a submit button
  - "view X": a table or list
  - "edit X": editable fields
  - "delete X": a red button
- Render each behaviour's supplementary text as a small italic note under its block.
- Modern layout: cards, padding, clear headings.
- Inline styles only: no <style> element and no classes.
- No JavaScript.
- Output only the HTML document, starting with <!DOCTYPE html>."#
    )
}

// ---------------------------------------------------------------------------
// MockupGenerator
// ---------------------------------------------------------------------------

/// Stage 2: RAOS behaviours to a single self-contained HTML page.
///
/// Each attempt is a full generate-and-validate cycle. Upstream failures
/// and invalid markup both consume an attempt.
pub struct MockupGenerator {
    completer: Arc<dyn Completer>,
    max_tokens: u32,
    max_attempts: u32,
}

impl MockupGenerator {
    pub fn new(completer: Arc<dyn Completer>, max_tokens: u32, max_attempts: u32) -> Self {
        Self {
            completer,
            max_tokens,
            max_attempts: max_attempts.max(1),
        }
    }

    pub async fn generate(&self, app_name: &str, raos: &[Raos]) -> Result<String, GenerationError> {
        let messages = [ChatMessage::user(mockup_prompt(app_name, raos))];
        let mut last_upstream: Option<UpstreamError> = None;
        let mut last_defect: Option<MarkupDefect> = None;

        for attempt in 1..=self.max_attempts {
            match self.completer.complete(&messages, self.max_tokens).await {
                Ok(reply) => {
                    let markup = strip_code_fence(&reply);
                    match validate_markup(&markup) {
                        Ok(()) => {
                            tracing::info!(app_name, attempt, bytes = markup.len(), "mockup generated");
                            return Ok(markup);
                        }
                        Err(defect) => {
                            tracing::warn!(app_name, attempt, %defect, "mockup failed validation");
                            last_defect = Some(defect);
                            last_upstream = None;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(app_name, attempt, error = %e, "mockup completion failed");
                    last_upstream = Some(e);
                    last_defect = None;
                }
            }
        }

        tracing::error!(app_name, attempts = self.max_attempts, "mockup generation exhausted");
        Err(GenerationError {
            attempts: self.max_attempts,
            upstream: last_upstream,
            defect: last_defect,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_extraction, upstream, valid_markup, ScriptedCompleter};

    fn generator(completer: Arc<ScriptedCompleter>) -> MockupGenerator {
        MockupGenerator::new(completer, 20_000, 3)
    }

    #[test]
    fn validation_rules() {
        assert!(validate_markup(&valid_markup()).is_ok());
        assert_eq!(validate_markup("<html></html>"), Err(MarkupDefect::TooShort(13)));

        let no_doctype = valid_markup().replace("<!DOCTYPE html>", "");
        assert_eq!(validate_markup(&no_doctype), Err(MarkupDefect::MissingDoctype));

        let lower = valid_markup().replace("<!DOCTYPE html>", "<!doctype html>");
        assert!(validate_markup(&lower).is_ok());

        let no_close = valid_markup().replace("</html>", "");
        assert_eq!(validate_markup(&no_close), Err(MarkupDefect::UnclosedDocument));

        let no_body = valid_markup().replace("</body>", "");
        assert_eq!(validate_markup(&no_body), Err(MarkupDefect::UnclosedBody));
    }

    #[test]
    fn prompt_lists_behaviours() {
        let e = sample_extraction();
        let p = mockup_prompt(&e.app_name, &e.raos);
        assert!(p.contains("App Name: ShopLite"));
        assert!(p.contains("\"object\": \"Product\""));
        assert!(p.contains("starting with <!DOCTYPE html>"));
    }

    #[tokio::test]
    async fn invalid_then_valid_takes_two_calls() {
        let good = format!("```html\n{}\n```", valid_markup());
        let completer = Arc::new(ScriptedCompleter::replying(&["<p>oops</p>", &good]));
        let markup = generator(Arc::clone(&completer))
            .generate("ShopLite", &sample_extraction().raos)
            .await
            .unwrap();
        assert_eq!(markup, valid_markup());
        assert_eq!(completer.calls(), 2);
        assert_eq!(completer.prompts()[0].1, 20_000);
    }

    #[tokio::test]
    async fn unclosed_body_twice_then_valid_takes_three_attempts() {
        let broken = valid_markup().replace("</body>", "");
        let completer = Arc::new(ScriptedCompleter::replying(&[&broken, &broken, &valid_markup()]));
        let markup = generator(Arc::clone(&completer))
            .generate("ShopLite", &sample_extraction().raos)
            .await
            .unwrap();
        assert_eq!(markup, valid_markup());
        assert_eq!(completer.calls(), 3);
    }

    #[tokio::test]
    async fn three_invalid_replies_exhaust_attempts() {
        let completer = Arc::new(ScriptedCompleter::replying(&["a", "b", "c", "unused"]));
        let err = generator(Arc::clone(&completer))
            .generate("ShopLite", &sample_extraction().raos)
            .await
            .unwrap_err();
        assert_eq!(err.attempts, 3);
        assert_eq!(err.defect, Some(MarkupDefect::TooShort(1)));
        assert!(err.upstream.is_none());
        assert_eq!(completer.calls(), 3);
    }

    #[tokio::test]
    async fn upstream_failures_consume_attempts() {
        let completer = Arc::new(ScriptedCompleter::new(vec![
            Err(upstream("timeout")),
            Ok(valid_markup()),
        ]));
        let markup = generator(Arc::clone(&completer))
            .generate("ShopLite", &[])
            .await
            .unwrap();
        assert_eq!(markup, valid_markup());
        assert_eq!(completer.calls(), 2);
    }

    #[tokio::test]
    async fn final_upstream_error_is_reported() {
        let completer = Arc::new(ScriptedCompleter::new(vec![
            Ok("bad".into()),
            Ok("bad".into()),
            Err(upstream("HTTP 503")),
        ]));
        let err = generator(completer).generate("ShopLite", &[]).await.unwrap_err();
        assert_eq!(err.upstream.unwrap().last_message, "HTTP 503");
        assert!(err.defect.is_none());
    }
}
