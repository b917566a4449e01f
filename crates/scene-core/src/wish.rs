//! Wish payloads: the prompt sent to the text-generation service and
//! the parsing of its reply.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const FALLBACK_MESSAGE: &str = "May the light of a thousand stars guide your journey.";
pub const FALLBACK_AUTHOR: &str = "Cosmic Architect";

/// A generated blessing and its attribution. Only the latest wish is
/// ever displayed; new requests overwrite, they do not accumulate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wish {
    pub message: String,
    pub author: String,
}

impl Wish {
    pub fn fallback() -> Self {
        Self {
            message: FALLBACK_MESSAGE.to_string(),
            author: FALLBACK_AUTHOR.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum WishParseError {
    #[error("malformed wish payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("wish payload missing message text")]
    Empty,
}

/// Prompt asking for a short poetic blessing as a JSON object.
pub fn wish_prompt(topic: &str) -> String {
    format!(
        "Generate a short, cosmic, and poetic wish or blessing about {topic}. \
         Keep it under 20 words. Format as JSON with 'message' and 'author' \
         (like 'The Stars' or 'The Void')."
    )
}

/// Strict parse of the service reply.
pub fn parse_wish(text: &str) -> Result<Wish, WishParseError> {
    let wish: Wish = serde_json::from_str(text)?;
    if wish.message.trim().is_empty() {
        return Err(WishParseError::Empty);
    }
    Ok(wish)
}

/// Parse, substituting the fixed fallback on any malformed reply. A
/// bad response shape is never surfaced to the user; the request path
/// handles network failures separately.
pub fn parse_wish_or_fallback(text: &str) -> Wish {
    parse_wish(text).unwrap_or_else(|e| {
        log::warn!("wish response unusable ({e}); using fallback");
        Wish::fallback()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_reply_parses() {
        let wish = parse_wish_or_fallback(r#"{"message":"Let snow soften every road.","author":"The North Wind"}"#);
        assert_eq!(wish.message, "Let snow soften every road.");
        assert_eq!(wish.author, "The North Wind");
    }

    #[test]
    fn malformed_reply_yields_exact_fallback() {
        let wish = parse_wish_or_fallback("not json at all");
        assert_eq!(wish, Wish::fallback());
        assert_eq!(wish.message, FALLBACK_MESSAGE);
        assert_eq!(wish.author, FALLBACK_AUTHOR);
    }

    #[test]
    fn empty_message_is_treated_as_malformed() {
        let wish = parse_wish_or_fallback(r#"{"message":"  ","author":"The Void"}"#);
        assert_eq!(wish, Wish::fallback());
    }

    #[test]
    fn prompt_embeds_the_topic() {
        assert!(wish_prompt("snow").contains("about snow"));
    }
}
