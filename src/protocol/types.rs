//! Building blocks shared by every message variant: discriminant enums, sender,
//! target, auth context and the tagged content payload.

use serde::de::Error as _;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Free-form JSON object carried by extensions, metadata and event data
pub type JsonMap = Map<String, Value>;

/// Message variant discriminant, written as the `type` field of every message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Chat,
    Command,
    Event,
    File,
}

impl MessageType {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::Chat => "chat",
            MessageType::Command => "command",
            MessageType::Event => "event",
            MessageType::File => "file",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Image,
    File,
    Skill,
    Audio,
    Video,
    #[serde(rename = "richtext")]
    RichText,
}

impl ContentType {
    pub const ALL: [ContentType; 7] = [
        ContentType::Text,
        ContentType::Image,
        ContentType::File,
        ContentType::Skill,
        ContentType::Audio,
        ContentType::Video,
        ContentType::RichText,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Image => "image",
            ContentType::File => "file",
            ContentType::Skill => "skill",
            ContentType::Audio => "audio",
            ContentType::Video => "video",
            ContentType::RichText => "richtext",
        }
    }

    /// MIME type registered for this content type
    pub fn mime_type(self) -> &'static str {
        match self {
            ContentType::Text => "text/plain",
            ContentType::Image => "image/*",
            ContentType::File => "application/octet-stream",
            ContentType::Skill => "application/json",
            ContentType::Audio => "audio/*",
            ContentType::Video => "video/*",
            ContentType::RichText => "text/html",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderRole {
    #[default]
    Human,
    Ai,
    Hybrid,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    #[default]
    Direct,
    Group,
    Project,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Desktop,
    Mobile,
    Web,
    Server,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentCommandType {
    Chat,
    Skill,
    Tool,
    Memory,
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemEventType {
    UserJoin,
    UserLeave,
    AgentAdded,
    AgentRemoved,
    ChannelCreated,
    ChannelUpdated,
    ChannelDeleted,
    FileUploaded,
    SyncStarted,
    SyncCompleted,
    Error,
    AgentOnline,
    AgentOffline,
    SettingsChanged,
}

impl SystemEventType {
    pub fn as_str(self) -> &'static str {
        match self {
            SystemEventType::UserJoin => "user_join",
            SystemEventType::UserLeave => "user_leave",
            SystemEventType::AgentAdded => "agent_added",
            SystemEventType::AgentRemoved => "agent_removed",
            SystemEventType::ChannelCreated => "channel_created",
            SystemEventType::ChannelUpdated => "channel_updated",
            SystemEventType::ChannelDeleted => "channel_deleted",
            SystemEventType::FileUploaded => "file_uploaded",
            SystemEventType::SyncStarted => "sync_started",
            SystemEventType::SyncCompleted => "sync_completed",
            SystemEventType::Error => "error",
            SystemEventType::AgentOnline => "agent_online",
            SystemEventType::AgentOffline => "agent_offline",
            SystemEventType::SettingsChanged => "settings_changed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileTransferStatus {
    #[default]
    Pending,
    InProgress,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

/// Named waypoints on the 0-100 permission scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PermissionLevel {
    Guest = 20,
    ReadOnly = 40,
    Collaborator = 60,
    Admin = 80,
    Owner = 100,
}

impl PermissionLevel {
    pub fn level(self) -> u8 {
        self as u8
    }
}

impl From<PermissionLevel> for u8 {
    fn from(level: PermissionLevel) -> Self {
        level.level()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sender {
    pub user_id: String,
    pub device_id: String,
    pub role: SenderRole,
    /// Required when `role` is [`SenderRole::Ai`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<DeviceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub channel_id: String,
    #[serde(default)]
    pub channel_type: ChannelType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_message_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthContext {
    /// Permission tier, 0-100
    pub level: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}

impl AuthContext {
    /// Whether this context meets `required`
    pub fn allows(&self, required: PermissionLevel) -> bool {
        self.level >= required.level()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageContent {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContent {
    pub file_id: String,
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillContent {
    pub skill_id: String,
    pub skill_name: String,
    pub command: String,
    #[serde(default)]
    pub parameters: JsonMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioContent {
    pub url: String,
    /// Seconds
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waveform: Option<Vec<f32>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoContent {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mention {
    pub user_id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichTextContent {
    pub html: String,
    pub plain_text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mentions: Vec<Mention>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

/// Per-type payload of a chat message
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBody {
    Text(String),
    Image(ImageContent),
    File(FileContent),
    Skill(SkillContent),
    Audio(AudioContent),
    Video(VideoContent),
    RichText(RichTextContent),
}

impl ContentBody {
    pub fn content_type(&self) -> ContentType {
        match self {
            ContentBody::Text(_) => ContentType::Text,
            ContentBody::Image(_) => ContentType::Image,
            ContentBody::File(_) => ContentType::File,
            ContentBody::Skill(_) => ContentType::Skill,
            ContentBody::Audio(_) => ContentType::Audio,
            ContentBody::Video(_) => ContentType::Video,
            ContentBody::RichText(_) => ContentType::RichText,
        }
    }
}

/// Chat message content.
///
/// On the wire this is `{ "type": <ContentType>, "data": <payload>, "metadata"?: {...} }`,
/// where the shape of `data` is fixed by `type`. A `data` value that does not match
/// its `type` is rejected at decode time.
#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    pub body: ContentBody,
    pub metadata: Option<JsonMap>,
}

impl Content {
    pub fn new(body: ContentBody) -> Self {
        Self {
            body,
            metadata: None,
        }
    }

    pub fn content_type(&self) -> ContentType {
        self.body.content_type()
    }

    /// The text payload, if this is text content
    pub fn as_text(&self) -> Option<&str> {
        match &self.body {
            ContentBody::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl Serialize for Content {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.metadata.is_some() { 3 } else { 2 };
        let mut state = serializer.serialize_struct("Content", len)?;
        state.serialize_field("type", &self.content_type())?;
        match &self.body {
            ContentBody::Text(text) => state.serialize_field("data", text)?,
            ContentBody::Image(image) => state.serialize_field("data", image)?,
            ContentBody::File(file) => state.serialize_field("data", file)?,
            ContentBody::Skill(skill) => state.serialize_field("data", skill)?,
            ContentBody::Audio(audio) => state.serialize_field("data", audio)?,
            ContentBody::Video(video) => state.serialize_field("data", video)?,
            ContentBody::RichText(rich) => state.serialize_field("data", rich)?,
        }
        match &self.metadata {
            Some(metadata) => state.serialize_field("metadata", metadata)?,
            None => state.skip_field("metadata")?,
        }
        state.end()
    }
}

#[derive(Deserialize)]
struct RawContent {
    #[serde(rename = "type")]
    content_type: ContentType,
    data: Value,
    #[serde(default)]
    metadata: Option<JsonMap>,
}

impl<'de> Deserialize<'de> for Content {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawContent::deserialize(deserializer)?;
        let body = match raw.content_type {
            ContentType::Text => serde_json::from_value(raw.data).map(ContentBody::Text),
            ContentType::Image => serde_json::from_value(raw.data).map(ContentBody::Image),
            ContentType::File => serde_json::from_value(raw.data).map(ContentBody::File),
            ContentType::Skill => serde_json::from_value(raw.data).map(ContentBody::Skill),
            ContentType::Audio => serde_json::from_value(raw.data).map(ContentBody::Audio),
            ContentType::Video => serde_json::from_value(raw.data).map(ContentBody::Video),
            ContentType::RichText => serde_json::from_value(raw.data).map(ContentBody::RichText),
        }
        .map_err(|e| D::Error::custom(format!("content.data for {}: {e}", raw.content_type)))?;

        Ok(Content {
            body,
            metadata: raw.metadata,
        })
    }
}
