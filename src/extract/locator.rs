use crate::error::ImportError;
use once_cell::sync::Lazy;
use regex::Regex;

// A fenced block holding either an array of objects or an object with at
// least one quoted key. Lazy quantifiers keep the match inside the first fence.
static CODE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)```(?:json)?\s*(\[\s*\{.*?\}\s*\]|\{\s*".*?"\s*:.*?\})\s*```"#)
        .expect("code block pattern is valid")
});

/// Find the part of an AI reply most likely to hold a JSON document.
///
/// A fenced block wins; its inner text is returned without the fences or the
/// surrounding prose. Otherwise everything from the first `{` (or, when the
/// reply has no `{` at all, the first `[`) to the end of the reply is returned.
pub fn locate_json(reply: &str) -> Result<&str, ImportError> {
    if let Some(inner) = CODE_BLOCK.captures(reply).and_then(|caps| caps.get(1)) {
        return Ok(inner.as_str());
    }

    let start = reply.find('{').or_else(|| reply.find('['));
    match start {
        Some(idx) => Ok(&reply[idx..]),
        None => Err(ImportError::NoJsonFound),
    }
}
