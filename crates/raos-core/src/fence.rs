use regex::Regex;
use std::sync::OnceLock;

static FENCE_RE: OnceLock<Regex> = OnceLock::new();

fn fence_re() -> &'static Regex {
    FENCE_RE.get_or_init(|| Regex::new(r"(?i)\n?```(?:json|html)?\n?").unwrap())
}

/// Remove Markdown code-fence markers (plain, `json` or `html`) wherever
/// they appear, then trim.
pub fn strip_code_fence(text: &str) -> String {
    fence_re().replace_all(text, "").trim().to_string()
}
