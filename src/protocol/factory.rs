//! # Factories
//!
//! Every message value in the protocol is built here, so ID, timestamp and version
//! stamping has a single source of defaults.
//!
//! Factories take their inputs by value and never mutate anything passed in.
//!
//! ## Identifiers
//! `<prefix><base36 epoch millis>-<9 random base36 chars>`, with prefixes `msg-`,
//! `cmd-`, `evt-`, `file-` and `dev-`. IDs are collision resistant, not
//! cryptographically unique.

use crate::config::{DEFAULT_COMMAND_TIMEOUT_MS, DEFAULT_PERMISSION_LEVEL, FILE_CHUNK_SIZE, PROTOCOL_NAME};
use crate::protocol::message::{
    AgentCommand, ChatMessage, CommandBody, CommandContext, Envelope, FileChunk, FileTransfer,
    HistoryEntry, SystemEvent,
};
use crate::protocol::types::{
    AgentCommandType, AudioContent, AuthContext, ChannelType, Content, ContentBody, DeviceType,
    FileContent, FileTransferStatus, ImageContent, JsonMap, MessageType, PermissionLevel,
    RichTextContent, Sender, SenderRole, SkillContent, SystemEventType, Target, VideoContent,
};
use crate::utils::time::{current_timestamp_millis, to_base36};
use rand::Rng;
use serde_json::{json, Value};

const ID_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_RANDOM_LEN: usize = 9;

/// `<base36 millis>-<random suffix>`, without a prefix
pub fn generate_id() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ID_RANDOM_LEN)
        .map(|_| char::from(ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())]))
        .collect();
    format!("{}-{suffix}", to_base36(current_timestamp_millis()))
}

pub fn generate_message_id() -> String {
    format!("msg-{}", generate_id())
}

pub fn generate_command_id() -> String {
    format!("cmd-{}", generate_id())
}

pub fn generate_event_id() -> String {
    format!("evt-{}", generate_id())
}

pub fn generate_file_id() -> String {
    format!("file-{}", generate_id())
}

pub fn generate_device_id() -> String {
    format!("dev-{}", generate_id())
}

/// Fresh ID with the prefix conventional for `message_type`
pub fn generate_id_for(message_type: MessageType) -> String {
    match message_type {
        MessageType::Chat => generate_message_id(),
        MessageType::Command => generate_command_id(),
        MessageType::Event => generate_event_id(),
        MessageType::File => generate_file_id(),
    }
}

// ---------------------------------------------------------------------------
// Senders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct SenderOptions {
    pub user_id: String,
    pub device_id: String,
    pub role: SenderRole,
    pub agent_id: Option<String>,
    pub device_type: Option<DeviceType>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

pub fn create_sender(options: SenderOptions) -> Sender {
    Sender {
        user_id: options.user_id,
        device_id: options.device_id,
        role: options.role,
        agent_id: options.agent_id,
        device_type: options.device_type,
        display_name: options.display_name,
        avatar_url: options.avatar_url,
    }
}

pub fn create_human_sender(user_id: &str, device_id: &str, display_name: Option<&str>) -> Sender {
    create_sender(SenderOptions {
        user_id: user_id.to_string(),
        device_id: device_id.to_string(),
        role: SenderRole::Human,
        display_name: display_name.map(str::to_string),
        ..SenderOptions::default()
    })
}

pub fn create_ai_sender(
    agent_id: &str,
    user_id: &str,
    device_id: &str,
    display_name: Option<&str>,
) -> Sender {
    create_sender(SenderOptions {
        user_id: user_id.to_string(),
        device_id: device_id.to_string(),
        role: SenderRole::Ai,
        agent_id: Some(agent_id.to_string()),
        display_name: display_name.map(str::to_string),
        ..SenderOptions::default()
    })
}

/// Sender for messages the platform itself emits, attributed to user `system`
pub fn create_system_sender(device_id: &str) -> Sender {
    create_sender(SenderOptions {
        user_id: String::from("system"),
        device_id: device_id.to_string(),
        role: SenderRole::System,
        display_name: Some(String::from("System")),
        ..SenderOptions::default()
    })
}

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct TargetOptions {
    pub channel_id: String,
    pub channel_type: ChannelType,
    pub thread_id: Option<String>,
    pub parent_message_id: Option<String>,
}

pub fn create_target(options: TargetOptions) -> Target {
    Target {
        channel_id: options.channel_id,
        channel_type: options.channel_type,
        thread_id: options.thread_id,
        parent_message_id: options.parent_message_id,
    }
}

fn target_of(channel_id: &str, channel_type: ChannelType) -> Target {
    create_target(TargetOptions {
        channel_id: channel_id.to_string(),
        channel_type,
        ..TargetOptions::default()
    })
}

pub fn create_direct_target(channel_id: &str) -> Target {
    target_of(channel_id, ChannelType::Direct)
}

pub fn create_group_target(channel_id: &str) -> Target {
    target_of(channel_id, ChannelType::Group)
}

pub fn create_project_target(channel_id: &str) -> Target {
    target_of(channel_id, ChannelType::Project)
}

/// Direct target pointing at `parent_message_id`, optionally inside a thread
pub fn create_reply_target(
    channel_id: &str,
    parent_message_id: &str,
    thread_id: Option<&str>,
) -> Target {
    create_target(TargetOptions {
        channel_id: channel_id.to_string(),
        channel_type: ChannelType::Direct,
        thread_id: thread_id.map(str::to_string),
        parent_message_id: Some(parent_message_id.to_string()),
    })
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

fn content_of(body: ContentBody, metadata: Option<JsonMap>) -> Content {
    Content { body, metadata }
}

pub fn create_text_content(text: &str, metadata: Option<JsonMap>) -> Content {
    content_of(ContentBody::Text(text.to_string()), metadata)
}

pub fn create_image_content(data: ImageContent, metadata: Option<JsonMap>) -> Content {
    content_of(ContentBody::Image(data), metadata)
}

pub fn create_file_content(data: FileContent, metadata: Option<JsonMap>) -> Content {
    content_of(ContentBody::File(data), metadata)
}

pub fn create_skill_content(data: SkillContent, metadata: Option<JsonMap>) -> Content {
    content_of(ContentBody::Skill(data), metadata)
}

pub fn create_audio_content(data: AudioContent, metadata: Option<JsonMap>) -> Content {
    content_of(ContentBody::Audio(data), metadata)
}

pub fn create_video_content(data: VideoContent, metadata: Option<JsonMap>) -> Content {
    content_of(ContentBody::Video(data), metadata)
}

pub fn create_rich_text_content(data: RichTextContent, metadata: Option<JsonMap>) -> Content {
    content_of(ContentBody::RichText(data), metadata)
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct AuthContextOptions {
    /// Defaults to [`DEFAULT_PERMISSION_LEVEL`] (guest)
    pub level: Option<u8>,
    pub signature: Option<String>,
    pub token: Option<String>,
    pub session_id: Option<String>,
    pub expires_at: Option<u64>,
}

pub fn create_auth_context(options: AuthContextOptions) -> AuthContext {
    AuthContext {
        level: options.level.unwrap_or(DEFAULT_PERMISSION_LEVEL),
        signature: options.signature,
        token: options.token,
        session_id: options.session_id,
        expires_at: options.expires_at,
    }
}

pub fn create_owner_auth(signature: Option<&str>, token: Option<&str>) -> AuthContext {
    create_auth_context(AuthContextOptions {
        level: Some(PermissionLevel::Owner.level()),
        signature: signature.map(str::to_string),
        token: token.map(str::to_string),
        ..AuthContextOptions::default()
    })
}

pub fn create_admin_auth(signature: Option<&str>, token: Option<&str>) -> AuthContext {
    create_auth_context(AuthContextOptions {
        level: Some(PermissionLevel::Admin.level()),
        signature: signature.map(str::to_string),
        token: token.map(str::to_string),
        ..AuthContextOptions::default()
    })
}

pub fn create_guest_auth(token: Option<&str>) -> AuthContext {
    create_auth_context(AuthContextOptions {
        level: Some(PermissionLevel::Guest.level()),
        token: token.map(str::to_string),
        ..AuthContextOptions::default()
    })
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Overrides for envelope stamping; anything left `None` gets the default
#[derive(Debug, Clone, Default)]
pub struct EnvelopeOptions {
    pub id: Option<String>,
    pub timestamp: Option<u64>,
    pub version: Option<String>,
    pub reply_to: Option<String>,
    pub expires_at: Option<u64>,
    pub extensions: Option<JsonMap>,
}

/// Envelope for a `message_type` message: generated ID, current time, running
/// protocol name
pub fn create_base_envelope(message_type: MessageType, options: EnvelopeOptions) -> Envelope {
    Envelope {
        id: options.id.unwrap_or_else(|| generate_id_for(message_type)),
        timestamp: options.timestamp.unwrap_or_else(current_timestamp_millis),
        version: options.version.unwrap_or_else(|| PROTOCOL_NAME.to_string()),
        reply_to: options.reply_to,
        expires_at: options.expires_at,
        extensions: options.extensions,
    }
}

// ---------------------------------------------------------------------------
// Chat messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ChatMessageOptions {
    pub sender: Sender,
    pub target: Target,
    pub content: Content,
    pub auth: AuthContext,
    pub envelope: EnvelopeOptions,
}

impl ChatMessageOptions {
    pub fn new(sender: Sender, target: Target, content: Content, auth: AuthContext) -> Self {
        Self {
            sender,
            target,
            content,
            auth,
            envelope: EnvelopeOptions::default(),
        }
    }

    pub fn reply_to(mut self, parent_id: Option<&str>) -> Self {
        self.envelope.reply_to = parent_id.map(str::to_string);
        self
    }
}

pub fn create_chat_message(options: ChatMessageOptions) -> ChatMessage {
    ChatMessage {
        envelope: create_base_envelope(MessageType::Chat, options.envelope),
        sender: options.sender,
        target: options.target,
        auth: options.auth,
        content: options.content,
        edited_at: None,
        edit_history: None,
    }
}

pub fn create_text_message(
    sender: Sender,
    target: Target,
    text: &str,
    auth: AuthContext,
    reply_to: Option<&str>,
) -> ChatMessage {
    create_chat_message(
        ChatMessageOptions::new(sender, target, create_text_content(text, None), auth)
            .reply_to(reply_to),
    )
}

pub fn create_image_message(
    sender: Sender,
    target: Target,
    image: ImageContent,
    auth: AuthContext,
    reply_to: Option<&str>,
) -> ChatMessage {
    create_chat_message(
        ChatMessageOptions::new(sender, target, create_image_content(image, None), auth)
            .reply_to(reply_to),
    )
}

pub fn create_file_message(
    sender: Sender,
    target: Target,
    file: FileContent,
    auth: AuthContext,
    reply_to: Option<&str>,
) -> ChatMessage {
    create_chat_message(
        ChatMessageOptions::new(sender, target, create_file_content(file, None), auth)
            .reply_to(reply_to),
    )
}

// ---------------------------------------------------------------------------
// Agent commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AgentCommandOptions {
    pub agent_id: String,
    pub command_type: AgentCommandType,
    pub payload: Value,
    pub sender: Sender,
    pub auth: AuthContext,
    /// Defaults to [`DEFAULT_COMMAND_TIMEOUT_MS`]
    pub timeout: Option<u64>,
    pub context: Option<CommandContext>,
    pub priority: Option<u8>,
    pub envelope: EnvelopeOptions,
}

impl AgentCommandOptions {
    pub fn new(
        agent_id: &str,
        command_type: AgentCommandType,
        payload: Value,
        sender: Sender,
        auth: AuthContext,
    ) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            command_type,
            payload,
            sender,
            auth,
            timeout: None,
            context: None,
            priority: None,
            envelope: EnvelopeOptions::default(),
        }
    }
}

pub fn create_agent_command(options: AgentCommandOptions) -> AgentCommand {
    AgentCommand {
        envelope: create_base_envelope(MessageType::Command, options.envelope),
        agent_id: options.agent_id,
        command: CommandBody {
            command_type: options.command_type,
            payload: options.payload,
        },
        context: options.context.unwrap_or_default(),
        sender: options.sender,
        auth: options.auth,
        timeout: options.timeout.unwrap_or(DEFAULT_COMMAND_TIMEOUT_MS),
        priority: options.priority,
    }
}

/// Chat turn for an agent; payload `{ "text": message }`
pub fn create_chat_command(
    agent_id: &str,
    message: &str,
    sender: Sender,
    auth: AuthContext,
    history: Vec<HistoryEntry>,
) -> AgentCommand {
    let mut options = AgentCommandOptions::new(
        agent_id,
        AgentCommandType::Chat,
        json!({ "text": message }),
        sender,
        auth,
    );
    options.context = Some(CommandContext {
        history,
        ..CommandContext::default()
    });
    create_agent_command(options)
}

/// Skill invocation; payload `{ "skillId", "command", "parameters" }`
pub fn create_skill_command(
    agent_id: &str,
    skill_id: &str,
    command: &str,
    parameters: JsonMap,
    sender: Sender,
    auth: AuthContext,
) -> AgentCommand {
    create_agent_command(AgentCommandOptions::new(
        agent_id,
        AgentCommandType::Skill,
        json!({ "skillId": skill_id, "command": command, "parameters": parameters }),
        sender,
        auth,
    ))
}

/// Tool invocation; payload `{ "toolName", "parameters" }`
pub fn create_tool_command(
    agent_id: &str,
    tool_name: &str,
    parameters: JsonMap,
    sender: Sender,
    auth: AuthContext,
) -> AgentCommand {
    create_agent_command(AgentCommandOptions::new(
        agent_id,
        AgentCommandType::Tool,
        json!({ "toolName": tool_name, "parameters": parameters }),
        sender,
        auth,
    ))
}

// ---------------------------------------------------------------------------
// System events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SystemEventOptions {
    pub event_type: SystemEventType,
    pub data: Value,
    pub sender: Option<Sender>,
    pub target: Option<Target>,
    pub description: Option<String>,
    pub envelope: EnvelopeOptions,
}

impl SystemEventOptions {
    pub fn new(event_type: SystemEventType, data: Value) -> Self {
        Self {
            event_type,
            data,
            sender: None,
            target: None,
            description: None,
            envelope: EnvelopeOptions::default(),
        }
    }

    pub fn target(mut self, target: Option<Target>) -> Self {
        self.target = target;
        self
    }
}

pub fn create_system_event(options: SystemEventOptions) -> SystemEvent {
    SystemEvent {
        envelope: create_base_envelope(MessageType::Event, options.envelope),
        event_type: options.event_type,
        data: options.data,
        sender: options.sender,
        target: options.target,
        description: options.description,
    }
}

/// Event data object from `(key, value)` pairs; `null` values are left out
fn event_data<const N: usize>(fields: [(&str, Value); N]) -> Value {
    let map: JsonMap = fields
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.to_string(), value))
        .collect();
    Value::Object(map)
}

fn group_event(event_type: SystemEventType, data: Value, channel_id: &str) -> SystemEvent {
    create_system_event(
        SystemEventOptions::new(event_type, data).target(Some(create_group_target(channel_id))),
    )
}

pub fn create_user_join_event(
    user_id: &str,
    channel_id: &str,
    display_name: Option<&str>,
) -> SystemEvent {
    group_event(
        SystemEventType::UserJoin,
        event_data([
            ("userId", json!(user_id)),
            ("channelId", json!(channel_id)),
            ("displayName", json!(display_name)),
        ]),
        channel_id,
    )
}

pub fn create_user_leave_event(user_id: &str, channel_id: &str, reason: Option<&str>) -> SystemEvent {
    group_event(
        SystemEventType::UserLeave,
        event_data([("userId", json!(user_id)), ("reason", json!(reason))]),
        channel_id,
    )
}

pub fn create_agent_added_event(agent_id: &str, channel_id: &str, added_by: &str) -> SystemEvent {
    group_event(
        SystemEventType::AgentAdded,
        event_data([
            ("agentId", json!(agent_id)),
            ("channelId", json!(channel_id)),
            ("addedBy", json!(added_by)),
        ]),
        channel_id,
    )
}

pub fn create_agent_removed_event(
    agent_id: &str,
    channel_id: &str,
    removed_by: Option<&str>,
) -> SystemEvent {
    group_event(
        SystemEventType::AgentRemoved,
        event_data([
            ("agentId", json!(agent_id)),
            ("channelId", json!(channel_id)),
            ("removedBy", json!(removed_by)),
        ]),
        channel_id,
    )
}

pub fn create_channel_created_event(
    channel_id: &str,
    channel_name: &str,
    created_by: &str,
) -> SystemEvent {
    group_event(
        SystemEventType::ChannelCreated,
        event_data([
            ("channelId", json!(channel_id)),
            ("channelName", json!(channel_name)),
            ("createdBy", json!(created_by)),
        ]),
        channel_id,
    )
}

/// `changes` maps each changed field to `{ "old": .., "new": .. }`
pub fn create_channel_updated_event(
    channel_id: &str,
    updated_by: &str,
    changes: JsonMap,
) -> SystemEvent {
    group_event(
        SystemEventType::ChannelUpdated,
        event_data([
            ("channelId", json!(channel_id)),
            ("updatedBy", json!(updated_by)),
            ("changes", Value::Object(changes)),
        ]),
        channel_id,
    )
}

pub fn create_channel_deleted_event(channel_id: &str, deleted_by: &str) -> SystemEvent {
    group_event(
        SystemEventType::ChannelDeleted,
        event_data([
            ("channelId", json!(channel_id)),
            ("deletedBy", json!(deleted_by)),
        ]),
        channel_id,
    )
}

pub fn create_file_uploaded_event(
    file_id: &str,
    file_name: &str,
    channel_id: &str,
    uploaded_by: &str,
) -> SystemEvent {
    group_event(
        SystemEventType::FileUploaded,
        event_data([
            ("fileId", json!(file_id)),
            ("fileName", json!(file_name)),
            ("channelId", json!(channel_id)),
            ("uploadedBy", json!(uploaded_by)),
        ]),
        channel_id,
    )
}

pub fn create_sync_started_event(device_id: &str, sync_type: &str) -> SystemEvent {
    create_system_event(SystemEventOptions::new(
        SystemEventType::SyncStarted,
        event_data([
            ("deviceId", json!(device_id)),
            ("syncType", json!(sync_type)),
            ("timestamp", json!(current_timestamp_millis())),
        ]),
    ))
}

pub fn create_sync_completed_event(
    device_id: &str,
    sync_type: &str,
    items_synced: u64,
) -> SystemEvent {
    create_system_event(SystemEventOptions::new(
        SystemEventType::SyncCompleted,
        event_data([
            ("deviceId", json!(device_id)),
            ("syncType", json!(sync_type)),
            ("itemsSynced", json!(items_synced)),
            ("timestamp", json!(current_timestamp_millis())),
        ]),
    ))
}

/// Error report for a peer, typically built from a [`crate::error::ErrorCode`]
pub fn create_error_event(
    error_code: &str,
    error_message: &str,
    original_message_id: Option<&str>,
) -> SystemEvent {
    create_system_event(SystemEventOptions::new(
        SystemEventType::Error,
        event_data([
            ("errorCode", json!(error_code)),
            ("errorMessage", json!(error_message)),
            ("originalMessageId", json!(original_message_id)),
        ]),
    ))
}

fn agent_presence_event(
    event_type: SystemEventType,
    agent_id: &str,
    channel_id: Option<&str>,
) -> SystemEvent {
    create_system_event(
        SystemEventOptions::new(
            event_type,
            event_data([
                ("agentId", json!(agent_id)),
                ("timestamp", json!(current_timestamp_millis())),
            ]),
        )
        .target(channel_id.map(create_group_target)),
    )
}

pub fn create_agent_online_event(agent_id: &str, channel_id: Option<&str>) -> SystemEvent {
    agent_presence_event(SystemEventType::AgentOnline, agent_id, channel_id)
}

pub fn create_agent_offline_event(agent_id: &str, channel_id: Option<&str>) -> SystemEvent {
    agent_presence_event(SystemEventType::AgentOffline, agent_id, channel_id)
}

/// `changes` maps each changed setting to `{ "old": .., "new": .. }`
pub fn create_settings_changed_event(user_id: &str, changes: JsonMap) -> SystemEvent {
    create_system_event(SystemEventOptions::new(
        SystemEventType::SettingsChanged,
        event_data([("userId", json!(user_id)), ("changes", Value::Object(changes))]),
    ))
}

// ---------------------------------------------------------------------------
// File transfers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FileTransferOptions {
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
    pub sender: Sender,
    pub target: Target,
    pub auth: AuthContext,
    /// Generated when absent; also becomes the envelope id
    pub file_id: Option<String>,
    /// `None` or `Some(0)` means [`FILE_CHUNK_SIZE`]
    pub chunk_size: Option<u32>,
    /// Computed from size and chunk size when absent
    pub total_chunks: Option<u64>,
    pub checksum: Option<String>,
    pub resume_from_chunk: Option<u64>,
}

impl FileTransferOptions {
    pub fn new(
        file_name: &str,
        file_size: u64,
        mime_type: &str,
        sender: Sender,
        target: Target,
        auth: AuthContext,
    ) -> Self {
        Self {
            file_name: file_name.to_string(),
            file_size,
            mime_type: mime_type.to_string(),
            sender,
            target,
            auth,
            file_id: None,
            chunk_size: None,
            total_chunks: None,
            checksum: None,
            resume_from_chunk: None,
        }
    }
}

/// New transfer in `pending` state whose envelope id is its `fileId`
pub fn create_file_transfer(options: FileTransferOptions) -> FileTransfer {
    let file_id = options.file_id.unwrap_or_else(generate_file_id);
    let chunk_size = options
        .chunk_size
        .filter(|&size| size > 0)
        .unwrap_or(FILE_CHUNK_SIZE);
    let total_chunks = options
        .total_chunks
        .unwrap_or_else(|| FileTransfer::expected_chunks(options.file_size, chunk_size));

    FileTransfer {
        envelope: create_base_envelope(
            MessageType::File,
            EnvelopeOptions {
                id: Some(file_id.clone()),
                ..EnvelopeOptions::default()
            },
        ),
        file_id,
        file_name: options.file_name,
        file_size: options.file_size,
        mime_type: options.mime_type,
        chunk_size,
        total_chunks,
        status: FileTransferStatus::Pending,
        checksum: options.checksum,
        transferred_bytes: None,
        completed_chunks: None,
        resume_from_chunk: options.resume_from_chunk.unwrap_or(0),
        sender: options.sender,
        target: options.target,
        auth: options.auth,
    }
}

/// Image transfer with MIME type `image/<extension>`, `image/png` when the name has
/// no extension
pub fn create_image_file_transfer(
    file_name: &str,
    file_size: u64,
    sender: Sender,
    target: Target,
    auth: AuthContext,
    checksum: Option<&str>,
) -> FileTransfer {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
        .unwrap_or("png")
        .to_ascii_lowercase();

    let mut options = FileTransferOptions::new(
        file_name,
        file_size,
        &format!("image/{extension}"),
        sender,
        target,
        auth,
    );
    options.checksum = checksum.map(str::to_string);
    create_file_transfer(options)
}

/// Chunk of `file_id`. The checksum is computed from `data` unless supplied.
pub fn create_file_chunk(
    file_id: &str,
    chunk_index: u64,
    data: Vec<u8>,
    checksum: Option<&str>,
    is_last: bool,
) -> FileChunk {
    let mut chunk = FileChunk::new(file_id, chunk_index, data, is_last);
    if let Some(checksum) = checksum {
        chunk.checksum = checksum.to_string();
    }
    chunk
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used)]

    use super::*;
    use crate::protocol::message::HistoryRole;

    #[test]
    fn test_id_shape() {
        let id = generate_message_id();
        let rest = id.strip_prefix("msg-").unwrap();
        let (time, random) = rest.split_once('-').unwrap();
        assert!(!time.is_empty());
        assert_eq!(random.len(), 9);
        assert!(random.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_ids_do_not_collide() {
        let ids: std::collections::HashSet<String> =
            (0..1000).map(|_| generate_event_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_sender_helpers() {
        let ai = create_ai_sender("agent-7", "u1", "d1", Some("Helper"));
        assert_eq!(ai.role, SenderRole::Ai);
        assert_eq!(ai.agent_id.as_deref(), Some("agent-7"));

        let system = create_system_sender("srv-1");
        assert_eq!(system.user_id, "system");
        assert_eq!(system.display_name.as_deref(), Some("System"));
    }

    #[test]
    fn test_reply_target() {
        let target = create_reply_target("c1", "msg-1", Some("t1"));
        assert_eq!(target.channel_type, ChannelType::Direct);
        assert_eq!(target.parent_message_id.as_deref(), Some("msg-1"));
        assert_eq!(target.thread_id.as_deref(), Some("t1"));
    }

    #[test]
    fn test_auth_defaults() {
        assert_eq!(create_auth_context(AuthContextOptions::default()).level, 20);
        assert_eq!(create_owner_auth(None, None).level, 100);
        assert_eq!(create_admin_auth(Some("sig"), None).signature.as_deref(), Some("sig"));
        assert_eq!(create_guest_auth(Some("tok")).token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_envelope_defaults_and_overrides() {
        let envelope = create_base_envelope(MessageType::Command, EnvelopeOptions::default());
        assert!(envelope.id.starts_with("cmd-"));
        assert_eq!(envelope.version, PROTOCOL_NAME);
        assert!(envelope.timestamp > 0);

        let envelope = create_base_envelope(
            MessageType::Chat,
            EnvelopeOptions {
                id: Some("fixed-id-1".into()),
                timestamp: Some(42),
                ..EnvelopeOptions::default()
            },
        );
        assert_eq!(envelope.id, "fixed-id-1");
        assert_eq!(envelope.timestamp, 42);
    }

    #[test]
    fn test_agent_command_defaults() {
        let command = create_agent_command(AgentCommandOptions::new(
            "agent-1",
            AgentCommandType::Memory,
            Value::Null,
            create_human_sender("u1", "d1", None),
            create_guest_auth(None),
        ));
        assert_eq!(command.timeout, DEFAULT_COMMAND_TIMEOUT_MS);
        assert!(command.context.history.is_empty());
        assert!(command.context.files.is_empty());
        assert!(command.context.permissions.is_empty());
    }

    #[test]
    fn test_command_payloads() {
        let sender = create_human_sender("u1", "d1", None);
        let auth = create_owner_auth(None, None);
        let history = vec![HistoryEntry {
            role: HistoryRole::User,
            content: "earlier".into(),
        }];

        let chat = create_chat_command("agent-1", "hello", sender.clone(), auth.clone(), history);
        assert_eq!(chat.command.payload, json!({ "text": "hello" }));
        assert_eq!(chat.context.history.len(), 1);

        let tool = create_tool_command("agent-1", "search", JsonMap::new(), sender.clone(), auth.clone());
        assert_eq!(tool.command.command_type, AgentCommandType::Tool);
        assert_eq!(tool.command.payload["toolName"], "search");

        let skill = create_skill_command("agent-1", "sk-1", "run", JsonMap::new(), sender, auth);
        assert_eq!(skill.command.payload["skillId"], "sk-1");
    }

    #[test]
    fn test_event_data_omits_absent_fields() {
        let event = create_user_join_event("u1", "c1", None);
        assert_eq!(event.data, json!({ "userId": "u1", "channelId": "c1" }));
        assert_eq!(event.target.unwrap().channel_type, ChannelType::Group);

        let event = create_error_event("1003", "too big", Some("msg-1"));
        assert_eq!(event.data["originalMessageId"], "msg-1");
        assert!(event.target.is_none());

        let event = create_agent_online_event("agent-1", None);
        assert!(event.target.is_none());
        assert!(event.data["timestamp"].is_u64());
    }

    #[test]
    fn test_file_transfer_defaults() {
        let transfer = create_file_transfer(FileTransferOptions {
            chunk_size: Some(0),
            ..FileTransferOptions::new(
                "a.bin",
                FILE_CHUNK_SIZE as u64 * 2 + 1,
                "application/octet-stream",
                create_human_sender("u1", "d1", None),
                create_direct_target("c1"),
                create_owner_auth(None, None),
            )
        });
        assert_eq!(transfer.envelope.id, transfer.file_id);
        assert!(transfer.file_id.starts_with("file-"));
        assert_eq!(transfer.chunk_size, FILE_CHUNK_SIZE);
        assert_eq!(transfer.total_chunks, 3);
        assert_eq!(transfer.status, FileTransferStatus::Pending);
        assert_eq!(transfer.resume_from_chunk, 0);
    }

    #[test]
    fn test_image_transfer_mime() {
        let make = |name: &str| {
            create_image_file_transfer(
                name,
                10,
                create_human_sender("u1", "d1", None),
                create_direct_target("c1"),
                create_owner_auth(None, None),
                None,
            )
            .mime_type
        };
        assert_eq!(make("photo.JPG"), "image/jpg");
        assert_eq!(make("photo"), "image/png");
        assert_eq!(make("archive.tar.gz"), "image/gz");
    }

    #[test]
    fn test_file_chunk_checksum_override() {
        let computed = create_file_chunk("file-1", 0, vec![1, 2, 3], None, true);
        assert!(computed.verify().is_ok());
        let supplied = create_file_chunk("file-1", 0, vec![1, 2, 3], Some("00"), true);
        assert_eq!(supplied.checksum, "00");
        assert!(supplied.verify().is_err());
    }
}
