use mongodb::bson::Document;
use serde::Serialize;

/// Projection of a `conversations` document the probe reads back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationRecord {
    pub conversation_id: String,
    pub user_id: Option<String>,
    pub message_count: usize,
}

impl ConversationRecord {
    /// Build from a raw document. Returns `None` without a string `conversation_id`.
    ///
    /// Messages are embedded in the conversation; a missing or non-array
    /// `messages` field counts as zero.
    pub fn from_document(doc: &Document) -> Option<Self> {
        let conversation_id = doc.get_str("conversation_id").ok()?.to_string();
        let user_id = doc.get_str("user_id").ok().map(str::to_string);
        let message_count = doc.get_array("messages").map(|m| m.len()).unwrap_or(0);

        Some(Self {
            conversation_id,
            user_id,
            message_count,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionCounts {
    pub users: u64,
    pub conversations: u64,
    pub messages: u64,
}

/// Conversation created by the write step, threaded through later steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedConversation {
    pub conversation_id: String,
    pub message_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
}
