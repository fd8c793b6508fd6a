//! Test doubles shared by the unit tests in this crate.

use crate::types::{Extraction, Raos};
use async_trait::async_trait;
use completion_client::{ChatMessage, Completer, UpstreamError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

pub(crate) fn sample_extraction() -> Extraction {
    Extraction {
        app_name: "ShopLite".into(),
        entities: vec!["Product".into(), "Order".into()],
        roles: vec!["Admin".into(), "Customer".into()],
        features: vec!["Catalog".into(), "Checkout".into()],
        raos: vec![
            Raos::new("Admin", "create", "Product", "Price must be greater than zero"),
            Raos::new("Customer", "place", "Order", "Out-of-stock products cannot be ordered"),
        ],
    }
}

pub(crate) fn sample_extraction_json() -> String {
    serde_json::to_string(&sample_extraction()).unwrap()
}

pub(crate) fn valid_markup() -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<body style=\"font-family: sans-serif\">\n{}\n</body>\n</html>",
        "<div style=\"padding: 8px\">Admin: create Product</div>".repeat(3)
    )
}

pub(crate) fn upstream(msg: &str) -> UpstreamError {
    UpstreamError {
        attempts: 3,
        last_message: msg.to_string(),
    }
}

/// Replays canned completion results in order and counts calls.
#[derive(Default)]
pub(crate) struct ScriptedCompleter {
    script: Mutex<VecDeque<Result<String, UpstreamError>>>,
    calls: AtomicU32,
    prompts: Mutex<Vec<(String, u32)>>,
}

impl ScriptedCompleter {
    pub(crate) fn new(script: Vec<Result<String, UpstreamError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    pub(crate) fn replying(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompt text and max_tokens of every call so far.
    pub(crate) fn prompts(&self) -> Vec<(String, u32)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Completer for ScriptedCompleter {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.prompts.lock().unwrap().push((prompt, max_tokens));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(upstream("script exhausted")))
    }
}
