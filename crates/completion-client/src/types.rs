use serde::{Deserialize, Serialize};

// ─── Messages ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged turn of the conversation sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

// ─── Wire format ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl CompletionResponse {
    /// Trimmed text of the first choice, if the endpoint returned one.
    pub fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_lowercase_roles() {
        let messages = [ChatMessage::system("be terse"), ChatMessage::user("hi")];
        let req = CompletionRequest {
            model: "test-model",
            messages: &messages,
            temperature: 0.3,
            max_tokens: 800,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["model"], "test-model");
        assert_eq!(value["max_tokens"], 800);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["messages"][1]["content"], "hi");
    }

    #[test]
    fn response_text_is_trimmed_first_choice() {
        let json = r#"{
            "id": "gen-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "\n  {\"a\": 1}  \n"}},
                {"index": 1, "message": {"role": "assistant", "content": "ignored"}}
            ]
        }"#;
        let resp: CompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.into_text().as_deref(), Some("{\"a\": 1}"));
    }

    #[test]
    fn response_without_choices_has_no_text() {
        let resp: CompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(resp.into_text().is_none());

        let resp: CompletionResponse = serde_json::from_str(r#"{"error": "x"}"#).unwrap();
        assert!(resp.into_text().is_none());
    }
}
