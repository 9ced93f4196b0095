use serde_json::Value;
use tracing::debug;

use super::ModelError;

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Pulls a JSON value out of a model reply.
///
/// Replies wrapped in a ```` ```json ```` block are parsed from the opening
/// fence up to the last closing fence; anything else is parsed whole.
pub fn extract_json(reply: &str) -> Result<Value, ModelError> {
    let Some(open) = reply.find(JSON_FENCE) else {
        debug!("no json fence in reply, parsing raw content");
        return Ok(serde_json::from_str(reply.trim())?);
    };

    let start = open + JSON_FENCE.len();
    let end = match reply.rfind(FENCE) {
        Some(end) if end > start => end,
        _ => return Err(ModelError::UnclosedFence),
    };

    Ok(serde_json::from_str(reply[start..end].trim())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_fenced_block_with_chatter() {
        let reply = "Sure! Here you go:\n```json\n[{\"word\": \"tariff\"}]\n```\nEnjoy.";
        assert_eq!(extract_json(reply).unwrap(), json!([{ "word": "tariff" }]));
    }

    #[test]
    fn parses_bare_json() {
        assert_eq!(
            extract_json("  {\"id\": \"root\"}\n").unwrap(),
            json!({ "id": "root" })
        );
    }

    #[test]
    fn unclosed_fence_is_an_error() {
        assert!(matches!(
            extract_json("```json\n[1, 2"),
            Err(ModelError::UnclosedFence)
        ));
    }

    #[test]
    fn garbage_is_a_json_error() {
        assert!(matches!(
            extract_json("I cannot help with that."),
            Err(ModelError::Json(_))
        ));
        assert!(matches!(
            extract_json("```json\nnot json\n```"),
            Err(ModelError::Json(_))
        ));
    }
}
