//! Post-processing of raw model output.

use std::sync::OnceLock;

use regex::Regex;

static THINK_BLOCK: OnceLock<Regex> = OnceLock::new();
static CODE_FENCE: OnceLock<Regex> = OnceLock::new();

fn think_block() -> &'static Regex {
    THINK_BLOCK.get_or_init(|| Regex::new(r"(?s)<think>.*?</think>").expect("think pattern is valid"))
}

fn code_fence() -> &'static Regex {
    CODE_FENCE.get_or_init(|| {
        Regex::new(r"(?s)```[A-Za-z0-9_+#.-]*[ \t]*\r?\n?(.*?)```").expect("fence pattern is valid")
    })
}

/// Strips reasoning blocks and unwraps the first fenced code block.
///
/// Text without a fence is returned trimmed.
pub fn clean_response(raw: &str) -> String {
    let without_thinking = think_block().replace_all(raw, "");
    let text = without_thinking.trim();
    match code_fence().captures(text).and_then(|c| c.get(1)) {
        Some(code) => code.as_str().trim().to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_trimmed() {
        assert_eq!(clean_response("  public class FooTests {}\n"), "public class FooTests {}");
    }

    #[test]
    fn test_think_block_removed() {
        let raw = "<think>\nLet me consider the edge cases.\n</think>\npublic class FooTests {}";
        assert_eq!(clean_response(raw), "public class FooTests {}");
    }

    #[test]
    fn test_first_fence_unwrapped() {
        let raw = "Here you go:\n```csharp\npublic class FooTests {}\n```\nAnd another:\n```\nignored\n```";
        assert_eq!(clean_response(raw), "public class FooTests {}");
    }

    #[test]
    fn test_fence_without_language() {
        let raw = "```\nclass CartTest {}\n```";
        assert_eq!(clean_response(raw), "class CartTest {}");
    }

    #[test]
    fn test_only_thinking_yields_empty() {
        assert_eq!(clean_response("<think>hmm</think>   "), "");
    }
}
