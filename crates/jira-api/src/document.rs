// Outgoing Atlassian Document Format (ADF) payload construction.
//
// Only the shapes this crate sends are built here: a plain-text document for
// issue descriptions and a comment body with an optional leading mention.
// Parsing or rendering rich documents is out of scope.

use serde_json::{Value, json};

use crate::types::Mention;

/// A single-paragraph plain-text document.
pub(crate) fn text_document(text: &str) -> Value {
    json!({
        "type": "doc",
        "version": 1,
        "content": [{
            "type": "paragraph",
            "content": [{ "type": "text", "text": text }],
        }],
    })
}

/// A comment body: one paragraph, optionally led by a mention node.
///
/// The mention is followed by a space so the comment reads
/// `@Display Name <text>` when rendered.
pub(crate) fn comment_document(text: &str, mention: Option<&Mention>) -> Value {
    let mut content = Vec::new();

    if let Some(user) = mention {
        content.push(json!({
            "type": "mention",
            "attrs": {
                "id": user.account_id,
                "text": format!("@{}", user.display_name),
            },
        }));
        content.push(json!({ "type": "text", "text": format!(" {text}") }));
    } else {
        content.push(json!({ "type": "text", "text": text }));
    }

    json!({
        "type": "doc",
        "version": 1,
        "content": [{ "type": "paragraph", "content": content }],
    })
}
