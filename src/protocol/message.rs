//! # Message Model
//!
//! The four message variants, the envelope they share, and the [`Message`] sum type
//! that carries them across the codec.
//!
//! Messages are immutable values. Nothing in this crate mutates a message after a
//! factory has built it; "editing" and "cloning" return new values.
//!
//! ## Wire Shape
//! ```text
//! { "type": "chat" | "command" | "event" | "file",
//!   "id", "timestamp", "version", "replyTo"?, "expiresAt"?, "extensions"?,
//!   ...variant fields }
//! ```

use crate::config::{DEFAULT_MAX_MESSAGE_AGE_MS, DEFAULT_PREVIEW_LENGTH};
use crate::protocol::factory::generate_id_for;
use crate::protocol::types::{
    AgentCommandType, AuthContext, Content, FileTransferStatus, JsonMap, MessageType, Sender,
    SystemEventType, Target,
};
use crate::utils::checksum::{checksum, verify_checksum};
use crate::utils::time::{current_timestamp_millis, is_older_than};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fields shared by every variant, flattened into the variant's own object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub id: String,
    /// Epoch milliseconds at creation
    pub timestamp: u64,
    /// Protocol name, see [`crate::config::PROTOCOL_NAME`]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<JsonMap>,
}

impl Envelope {
    /// Whether this envelope has expired as of `now_ms`.
    ///
    /// An explicit `expiresAt` always decides; otherwise the message expires once it
    /// is more than `max_age_ms` old.
    pub fn is_expired_at(&self, max_age_ms: u64, now_ms: u64) -> bool {
        match self.expires_at {
            Some(expires_at) => now_ms > expires_at,
            None => is_older_than(self.timestamp, max_age_ms, now_ms),
        }
    }
}

/// One prior revision of an edited chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditRecord {
    pub timestamp: u64,
    pub content: Content,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub sender: Sender,
    pub target: Target,
    pub auth: AuthContext,
    pub content: Content,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<u64>,
    /// Oldest revision first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_history: Option<Vec<EditRecord>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandBody {
    #[serde(rename = "type")]
    pub command_type: AgentCommandType,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: HistoryRole,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandContext {
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_state: Option<JsonMap>,
}

/// Instruction addressed to an agent. Carries `timeout` as data only; nothing here
/// enforces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCommand {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub agent_id: String,
    pub command: CommandBody,
    #[serde(default)]
    pub context: CommandContext,
    pub sender: Sender,
    pub auth: AuthContext,
    /// Milliseconds
    pub timeout: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemEvent {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub event_type: SystemEventType,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<Sender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Announcement of a chunked file transfer. The chunks themselves travel
/// separately as [`FileChunk`] values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTransfer {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub file_id: String,
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
    pub chunk_size: u32,
    pub total_chunks: u64,
    pub status: FileTransferStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transferred_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_chunks: Option<Vec<u64>>,
    #[serde(default)]
    pub resume_from_chunk: u64,
    pub sender: Sender,
    pub target: Target,
    pub auth: AuthContext,
}

impl FileTransfer {
    /// Number of chunks `file_size` splits into at `chunk_size`
    pub fn expected_chunks(file_size: u64, chunk_size: u32) -> u64 {
        if chunk_size == 0 {
            return 0;
        }
        file_size.div_ceil(u64::from(chunk_size))
    }
}

/// One bounded slice of a file transfer's bytes.
///
/// `data` is standard base64 in the text encoding and a raw byte string in the
/// binary encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChunk {
    pub file_id: String,
    pub chunk_index: u64,
    #[serde(with = "chunk_data")]
    pub data: Vec<u8>,
    /// Lowercase hex SHA-256 of `data`
    pub checksum: String,
    #[serde(default)]
    pub is_last: bool,
}

impl FileChunk {
    /// Build a chunk, computing its checksum
    pub fn new(file_id: impl Into<String>, chunk_index: u64, data: Vec<u8>, is_last: bool) -> Self {
        let checksum = checksum(&data);
        Self {
            file_id: file_id.into(),
            chunk_index,
            data,
            checksum,
            is_last,
        }
    }

    /// Check `data` against the carried checksum
    pub fn verify(&self) -> Result<()> {
        verify_checksum(&self.data, &self.checksum)
    }
}

/// Base64 in human-readable formats, raw bytes otherwise
mod chunk_data {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&STANDARD.encode(data))
        } else {
            serde_bytes::serialize(data, serializer)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        if deserializer.is_human_readable() {
            let encoded = String::deserialize(deserializer)?;
            STANDARD
                .decode(encoded.as_bytes())
                .map_err(|e| serde::de::Error::custom(format!("invalid base64 chunk data: {e}")))
        } else {
            serde_bytes::deserialize(deserializer)
        }
    }
}

/// Any protocol message, tagged on the wire by its `type` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    Chat(ChatMessage),
    Command(AgentCommand),
    Event(SystemEvent),
    File(FileTransfer),
}

impl Message {
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Chat(_) => MessageType::Chat,
            Message::Command(_) => MessageType::Command,
            Message::Event(_) => MessageType::Event,
            Message::File(_) => MessageType::File,
        }
    }

    pub fn envelope(&self) -> &Envelope {
        match self {
            Message::Chat(m) => &m.envelope,
            Message::Command(m) => &m.envelope,
            Message::Event(m) => &m.envelope,
            Message::File(m) => &m.envelope,
        }
    }

    fn envelope_mut(&mut self) -> &mut Envelope {
        match self {
            Message::Chat(m) => &mut m.envelope,
            Message::Command(m) => &mut m.envelope,
            Message::Event(m) => &mut m.envelope,
            Message::File(m) => &mut m.envelope,
        }
    }

    pub fn id(&self) -> &str {
        &self.envelope().id
    }

    pub fn timestamp(&self) -> u64 {
        self.envelope().timestamp
    }

    /// Sender, absent only on system events that were emitted without one
    pub fn sender(&self) -> Option<&Sender> {
        match self {
            Message::Chat(m) => Some(&m.sender),
            Message::Command(m) => Some(&m.sender),
            Message::Event(m) => m.sender.as_ref(),
            Message::File(m) => Some(&m.sender),
        }
    }

    /// Auth context; system events carry none
    pub fn auth(&self) -> Option<&AuthContext> {
        match self {
            Message::Chat(m) => Some(&m.auth),
            Message::Command(m) => Some(&m.auth),
            Message::Event(_) => None,
            Message::File(m) => Some(&m.auth),
        }
    }

    pub fn target(&self) -> Option<&Target> {
        match self {
            Message::Chat(m) => Some(&m.target),
            Message::Command(_) => None,
            Message::Event(m) => m.target.as_ref(),
            Message::File(m) => Some(&m.target),
        }
    }

    fn set_sender(&mut self, sender: Sender) {
        match self {
            Message::Chat(m) => m.sender = sender,
            Message::Command(m) => m.sender = sender,
            Message::Event(m) => m.sender = Some(sender),
            Message::File(m) => m.sender = sender,
        }
    }
}

/// Borrowed variant with the same wire shape as the owning [`Message`]
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) enum MessageRef<'a> {
    Chat(&'a ChatMessage),
    Command(&'a AgentCommand),
    Event(&'a SystemEvent),
    File(&'a FileTransfer),
}

impl From<ChatMessage> for Message {
    fn from(message: ChatMessage) -> Self {
        Message::Chat(message)
    }
}

impl From<AgentCommand> for Message {
    fn from(command: AgentCommand) -> Self {
        Message::Command(command)
    }
}

impl From<SystemEvent> for Message {
    fn from(event: SystemEvent) -> Self {
        Message::Event(event)
    }
}

impl From<FileTransfer> for Message {
    fn from(transfer: FileTransfer) -> Self {
        Message::File(transfer)
    }
}

/// Whether `message` has expired as of `now_ms`, see [`Envelope::is_expired_at`]
pub fn is_message_expired_at(message: &Message, max_age_ms: u64, now_ms: u64) -> bool {
    message.envelope().is_expired_at(max_age_ms, now_ms)
}

/// [`is_message_expired_at`] against the system clock, with a 24 hour default age
pub fn is_message_expired(message: &Message, max_age_ms: Option<u64>) -> bool {
    is_message_expired_at(
        message,
        max_age_ms.unwrap_or(DEFAULT_MAX_MESSAGE_AGE_MS),
        current_timestamp_millis(),
    )
}

/// Short display form: text truncated to `max_length` characters plus `...`,
/// anything else as `[<type>]`.
pub fn get_message_preview(message: &Message, max_length: Option<usize>) -> String {
    let max_length = max_length.unwrap_or(DEFAULT_PREVIEW_LENGTH);
    let Message::Chat(chat) = message else {
        return format!("[{}]", message.message_type());
    };

    match chat.content.as_text() {
        Some(text) => match text.char_indices().nth(max_length) {
            Some((cut, _)) => format!("{}...", &text[..cut]),
            None => text.to_string(),
        },
        None => format!("[{}]", chat.content.content_type()),
    }
}

pub fn is_reply_message(message: &Message) -> bool {
    message.envelope().reply_to.is_some()
}

/// Copy of `message` with a fresh id and timestamp, optionally re-attributed to
/// `new_sender`. Used to resend without identity confusion.
///
/// A cloned file transfer is a new transfer: its `fileId` follows the new id, so
/// chunks of the original do not assemble into the copy.
pub fn clone_message(message: &Message, new_sender: Option<Sender>) -> Message {
    let mut copy = message.clone();
    let envelope = copy.envelope_mut();
    envelope.id = generate_id_for(message.message_type());
    envelope.timestamp = current_timestamp_millis();
    if let Message::File(transfer) = &mut copy {
        transfer.file_id = transfer.envelope.id.clone();
    }
    if let Some(sender) = new_sender {
        copy.set_sender(sender);
    }
    copy
}

/// New revision of `original` carrying `new_content`.
///
/// The previous content and timestamp are appended to `editHistory`, the id is kept,
/// and `editor` becomes the sender. `original` is left untouched.
pub fn create_edited_message(
    original: &ChatMessage,
    new_content: Content,
    editor: Sender,
) -> ChatMessage {
    let now = current_timestamp_millis();
    let mut history = original.edit_history.clone().unwrap_or_default();
    history.push(EditRecord {
        timestamp: original.envelope.timestamp,
        content: original.content.clone(),
    });

    ChatMessage {
        envelope: Envelope {
            timestamp: now,
            ..original.envelope.clone()
        },
        sender: editor,
        target: original.target.clone(),
        auth: original.auth.clone(),
        content: new_content,
        edited_at: Some(now),
        edit_history: Some(history),
    }
}
