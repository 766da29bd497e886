//! # Validator
//!
//! Structural, size, version and permission checks run before a message is trusted.
//!
//! Validators never fail: they return a [`ValidationResult`] listing every problem
//! found as `{path, code, message}`, so callers can decide per message whether to
//! drop, NACK or surface field-level errors. Enum values and field types are already
//! guaranteed by decoding; what remains here are the rules a type cannot express
//! (non-empty IDs, ranges, chunk arithmetic, ceilings, permission tiers).
//!
//! ## Check Order
//! 1. Envelope (id, timestamp, version)
//! 2. Sender, target and auth context
//! 3. Content
//! 4. Estimated size against `max_message_size`
//! 5. Variant-specific rules
//! 6. Permission tiers, when `validate_permissions` is set

use crate::config::{
    ID_MAX_LENGTH, ID_MIN_LENGTH, MAX_CLOCK_SKEW_MS, MAX_COMMAND_TIMEOUT_MS, MAX_FILE_SIZE,
    MAX_HISTORY_MESSAGES, MAX_MESSAGE_SIZE, MAX_TEXT_LENGTH, PROTOCOL_NAME,
};
use crate::core::serialization::{estimate_size, SerializationFormat};
use crate::error::{ErrorCode, ProtocolError, Result};
use crate::protocol::message::{
    AgentCommand, ChatMessage, Envelope, FileChunk, FileTransfer, Message, MessageRef, SystemEvent,
};
use crate::protocol::types::{
    AgentCommandType, AuthContext, Content, ContentBody, PermissionLevel, Sender, SenderRole,
    SystemEventType, Target,
};
use crate::utils::time::current_timestamp_millis;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// One problem found by a validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Dotted field path, e.g. `sender.userId`; empty for the message as a whole
    pub path: String,
    pub code: ErrorCode,
    pub message: String,
}

/// Finding that does not make a message invalid
pub type ValidationWarning = ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ValidationWarning>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl ValidationResult {
    /// Convert into a `Result`, carrying every error on failure
    pub fn into_result(self) -> Result<()> {
        if self.valid {
            Ok(())
        } else {
            Err(ProtocolError::Validation(self.errors))
        }
    }

    /// Whether any error carries `code`
    pub fn has_error(&self, code: ErrorCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    fn error(&mut self, path: impl Into<String>, code: ErrorCode, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            code,
            message: message.into(),
        });
    }

    fn warning(&mut self, path: impl Into<String>, code: ErrorCode, message: impl Into<String>) {
        self.warnings.push(ValidationError {
            path: path.into(),
            code,
            message: message.into(),
        });
    }

    /// Error in strict mode, warning otherwise
    fn finding(
        &mut self,
        strict: bool,
        path: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
    ) {
        if strict {
            self.error(path, code, message);
        } else {
            self.warning(path, code, message);
        }
    }

    fn absorb(&mut self, other: ValidationResult) {
        self.valid &= other.valid;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Report identifier shape problems as errors instead of warnings
    pub strict: bool,
    /// Ceiling on the estimated text-encoded size; `None` skips the estimate
    pub max_message_size: Option<usize>,
    /// Flag auth levels below the tier the message requires
    pub validate_permissions: bool,
    /// Clock override in epoch millis; the system clock when `None`
    pub now_ms: Option<u64>,
    /// Warn about messages past `expiresAt` or older than this; `None` skips the check
    pub max_message_age_ms: Option<u64>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            strict: false,
            max_message_size: Some(MAX_MESSAGE_SIZE),
            validate_permissions: false,
            now_ms: None,
            max_message_age_ms: None,
        }
    }
}

impl ValidationOptions {
    fn now(&self) -> u64 {
        self.now_ms.unwrap_or_else(current_timestamp_millis)
    }
}

/// `[A-Za-z0-9_-]+`
fn is_identifier(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

fn is_hex_digest(value: &str) -> bool {
    value.len() == 64 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

fn check_identifier(
    result: &mut ValidationResult,
    options: &ValidationOptions,
    path: &str,
    value: &str,
) {
    if value.is_empty() {
        result.error(path, ErrorCode::ValidationMissingField, format!("{path} is required"));
    } else if !is_identifier(value) {
        result.finding(
            options.strict,
            path,
            ErrorCode::ValidationInvalidId,
            format!("{path} should contain only letters, digits, '_' and '-'"),
        );
    }
}

fn check_not_empty(result: &mut ValidationResult, path: &str, value: &str) {
    if value.is_empty() {
        result.error(path, ErrorCode::ValidationMissingField, format!("{path} is required"));
    }
}

fn check_size<T: Serialize>(result: &mut ValidationResult, options: &ValidationOptions, value: &T) {
    let Some(limit) = options.max_message_size else {
        return;
    };
    match estimate_size(value, SerializationFormat::Json) {
        Ok(size) if size > limit => result.error(
            "",
            ErrorCode::ValidationSizeExceeded,
            format!("Message size {size} bytes exceeds limit of {limit} bytes"),
        ),
        Ok(_) => {}
        Err(e) => result.error(
            "",
            ErrorCode::SerializationFailed,
            format!("Message size could not be estimated: {e}"),
        ),
    }
}

/// Envelope fields shared by every variant
pub fn validate_envelope(envelope: &Envelope, options: &ValidationOptions) -> ValidationResult {
    let mut result = ValidationResult::default();

    if envelope.id.is_empty() {
        result.error("id", ErrorCode::ValidationMissingField, "Message id is required");
    } else {
        let len = envelope.id.chars().count();
        if !(ID_MIN_LENGTH..=ID_MAX_LENGTH).contains(&len) {
            result.finding(
                options.strict,
                "id",
                ErrorCode::ValidationInvalidId,
                format!("Message id length {len} outside {ID_MIN_LENGTH}..={ID_MAX_LENGTH}"),
            );
        }
        if !is_identifier(&envelope.id) {
            result.finding(
                options.strict,
                "id",
                ErrorCode::ValidationInvalidId,
                "Message id should contain only letters, digits, '_' and '-'",
            );
        }
    }

    let now = options.now();
    let latest = now.saturating_add(MAX_CLOCK_SKEW_MS);
    if envelope.timestamp == 0 || envelope.timestamp > latest {
        result.error(
            "timestamp",
            ErrorCode::ValidationInvalidTimestamp,
            "Valid timestamp is required",
        );
    } else if let Some(max_age_ms) = options.max_message_age_ms {
        if envelope.is_expired_at(max_age_ms, now) {
            let path = if envelope.expires_at.is_some() { "expiresAt" } else { "timestamp" };
            result.warning(path, ErrorCode::ValidationInvalidTimestamp, "Message has expired");
        }
    }

    if envelope.version.is_empty() {
        result.error("version", ErrorCode::ValidationMissingField, "Protocol version is required");
    } else if envelope.version != PROTOCOL_NAME {
        result.error(
            "version",
            ErrorCode::ValidationVersionMismatch,
            format!("Protocol version {} does not match {PROTOCOL_NAME}", envelope.version),
        );
    }

    if envelope.reply_to.as_deref() == Some("") {
        result.error("replyTo", ErrorCode::ValidationMissingField, "replyTo must not be empty");
    }

    result
}

pub fn validate_sender(sender: &Sender, options: &ValidationOptions) -> ValidationResult {
    let mut result = ValidationResult::default();
    check_identifier(&mut result, options, "sender.userId", &sender.user_id);
    check_identifier(&mut result, options, "sender.deviceId", &sender.device_id);

    if sender.role == SenderRole::Ai && sender.agent_id.as_deref().unwrap_or("").is_empty() {
        result.error(
            "sender.agentId",
            ErrorCode::ValidationMissingField,
            "AI senders must carry an agentId",
        );
    }
    result
}

pub fn validate_target(target: &Target, options: &ValidationOptions) -> ValidationResult {
    let mut result = ValidationResult::default();
    check_identifier(&mut result, options, "target.channelId", &target.channel_id);

    if target.thread_id.as_deref() == Some("") {
        result.warning("target.threadId", ErrorCode::ValidationMissingField, "Empty threadId");
    }
    if target.parent_message_id.as_deref() == Some("") {
        result.warning(
            "target.parentMessageId",
            ErrorCode::ValidationMissingField,
            "Empty parentMessageId",
        );
    }
    result
}

pub fn validate_auth_context(auth: &AuthContext, _options: &ValidationOptions) -> ValidationResult {
    let mut result = ValidationResult::default();
    if auth.level > PermissionLevel::Owner.level() {
        result.error(
            "auth.level",
            ErrorCode::ValidationInvalidType,
            "Auth level must be between 0 and 100",
        );
    }
    result
}

fn check_text_length(result: &mut ValidationResult, path: &str, text: &str) {
    let len = text.chars().count();
    if len > MAX_TEXT_LENGTH {
        result.error(
            path,
            ErrorCode::ValidationSizeExceeded,
            format!("Text length {len} exceeds maximum of {MAX_TEXT_LENGTH}"),
        );
    }
}

fn check_duration(result: &mut ValidationResult, path: &str, seconds: f64) {
    if !seconds.is_finite() || seconds < 0.0 {
        result.error(path, ErrorCode::ValidationInvalidFormat, "Duration must be a non-negative number");
    }
}

/// Per-type payload rules for chat content
pub fn validate_content(content: &Content, _options: &ValidationOptions) -> ValidationResult {
    validate_content_at(content, "content")
}

fn validate_content_at(content: &Content, base: &str) -> ValidationResult {
    let mut result = ValidationResult::default();
    let data = format!("{base}.data");

    match &content.body {
        ContentBody::Text(text) => check_text_length(&mut result, &data, text),
        ContentBody::Image(image) => check_not_empty(&mut result, &format!("{data}.url"), &image.url),
        ContentBody::File(file) => {
            check_not_empty(&mut result, &format!("{data}.fileId"), &file.file_id);
            check_not_empty(&mut result, &format!("{data}.fileName"), &file.file_name);
            check_not_empty(&mut result, &format!("{data}.mimeType"), &file.mime_type);
            if file.file_size > MAX_FILE_SIZE {
                result.error(
                    format!("{data}.fileSize"),
                    ErrorCode::ValidationSizeExceeded,
                    format!("File size exceeds maximum of {MAX_FILE_SIZE} bytes"),
                );
            }
        }
        ContentBody::Skill(skill) => {
            check_not_empty(&mut result, &format!("{data}.skillId"), &skill.skill_id);
            check_not_empty(&mut result, &format!("{data}.command"), &skill.command);
        }
        ContentBody::Audio(audio) => {
            check_not_empty(&mut result, &format!("{data}.url"), &audio.url);
            check_duration(&mut result, &format!("{data}.duration"), audio.duration);
        }
        ContentBody::Video(video) => {
            check_not_empty(&mut result, &format!("{data}.url"), &video.url);
            if let Some(duration) = video.duration {
                check_duration(&mut result, &format!("{data}.duration"), duration);
            }
        }
        ContentBody::RichText(rich) => {
            check_text_length(&mut result, &format!("{data}.plainText"), &rich.plain_text);
            for (i, mention) in rich.mentions.iter().enumerate() {
                check_not_empty(&mut result, &format!("{data}.mentions[{i}].userId"), &mention.user_id);
            }
            for (i, link) in rich.links.iter().enumerate() {
                check_not_empty(&mut result, &format!("{data}.links[{i}].url"), &link.url);
            }
        }
    }
    result
}

fn check_permission(
    result: &mut ValidationResult,
    options: &ValidationOptions,
    auth: &AuthContext,
    required: PermissionLevel,
) {
    if !options.validate_permissions {
        return;
    }
    if !auth.allows(required) {
        result.error(
            "auth.level",
            ErrorCode::InsufficientLevel,
            format!("Auth level {} is below the required {}", auth.level, required.level()),
        );
    }
    if let Some(expires_at) = auth.expires_at {
        if expires_at < options.now() {
            result.error("auth.expiresAt", ErrorCode::TokenExpired, "Auth context has expired");
        }
    }
}

/// Tier an agent command of `command_type` requires
pub fn required_command_level(command_type: AgentCommandType) -> PermissionLevel {
    match command_type {
        AgentCommandType::Chat => PermissionLevel::Guest,
        AgentCommandType::Skill | AgentCommandType::Tool | AgentCommandType::Memory => {
            PermissionLevel::Collaborator
        }
        AgentCommandType::Config => PermissionLevel::Admin,
    }
}

pub fn validate_chat_message(message: &ChatMessage, options: &ValidationOptions) -> ValidationResult {
    let mut result = validate_envelope(&message.envelope, options);
    result.absorb(validate_sender(&message.sender, options));
    result.absorb(validate_target(&message.target, options));
    result.absorb(validate_auth_context(&message.auth, options));
    result.absorb(validate_content(&message.content, options));
    check_size(&mut result, options, &MessageRef::Chat(message));

    if let Some(history) = &message.edit_history {
        for (i, record) in history.iter().enumerate() {
            result.absorb(validate_content_at(&record.content, &format!("editHistory[{i}].content")));
            if record.timestamp > message.envelope.timestamp {
                result.warning(
                    format!("editHistory[{i}].timestamp"),
                    ErrorCode::ValidationInvalidTimestamp,
                    "Edit history entry is newer than the message",
                );
            }
        }
    }
    if message.edited_at.is_some() && message.edit_history.is_none() {
        result.warning("editedAt", ErrorCode::ValidationMissingField, "editedAt set without editHistory");
    }

    check_permission(&mut result, options, &message.auth, PermissionLevel::Guest);
    result
}

/// Keys each command payload is expected to carry
fn expected_payload_keys(command_type: AgentCommandType) -> &'static [&'static str] {
    match command_type {
        AgentCommandType::Chat => &["text"],
        AgentCommandType::Skill => &["skillId", "command"],
        AgentCommandType::Tool => &["toolName"],
        AgentCommandType::Memory | AgentCommandType::Config => &[],
    }
}

fn check_data_keys(result: &mut ValidationResult, base: &str, data: &Value, keys: &[&str]) {
    for key in keys {
        if !matches!(data.get(key), Some(value) if !value.is_null()) {
            result.warning(
                format!("{base}.{key}"),
                ErrorCode::ValidationMissingField,
                format!("{base}.{key} is expected"),
            );
        }
    }
}

pub fn validate_agent_command(command: &AgentCommand, options: &ValidationOptions) -> ValidationResult {
    let mut result = validate_envelope(&command.envelope, options);
    result.absorb(validate_sender(&command.sender, options));
    result.absorb(validate_auth_context(&command.auth, options));
    check_size(&mut result, options, &MessageRef::Command(command));

    if command.agent_id.is_empty() {
        result.error("agentId", ErrorCode::ValidationMissingField, "Agent ID is required for commands");
    } else if !is_identifier(&command.agent_id) {
        result.finding(
            options.strict,
            "agentId",
            ErrorCode::ValidationInvalidId,
            "agentId should contain only letters, digits, '_' and '-'",
        );
    }

    if command.timeout == 0 {
        result.error("timeout", ErrorCode::ValidationInvalidFormat, "Timeout must be positive");
    } else if command.timeout > MAX_COMMAND_TIMEOUT_MS {
        result.error(
            "timeout",
            ErrorCode::ValidationSizeExceeded,
            format!("Timeout exceeds maximum of {MAX_COMMAND_TIMEOUT_MS} ms"),
        );
    }

    if command.context.history.len() > MAX_HISTORY_MESSAGES {
        result.error(
            "context.history",
            ErrorCode::ValidationSizeExceeded,
            format!("History exceeds maximum of {MAX_HISTORY_MESSAGES} entries"),
        );
    }

    check_data_keys(
        &mut result,
        "command.payload",
        &command.command.payload,
        expected_payload_keys(command.command.command_type),
    );

    check_permission(
        &mut result,
        options,
        &command.auth,
        required_command_level(command.command.command_type),
    );
    result
}

/// Keys the data of each event type is expected to carry
pub fn required_event_fields(event_type: SystemEventType) -> &'static [&'static str] {
    match event_type {
        SystemEventType::UserJoin => &["userId", "channelId"],
        SystemEventType::UserLeave => &["userId"],
        SystemEventType::AgentAdded | SystemEventType::AgentRemoved => &["agentId", "channelId"],
        SystemEventType::ChannelCreated => &["channelId", "channelName", "createdBy"],
        SystemEventType::ChannelUpdated | SystemEventType::ChannelDeleted => &["channelId"],
        SystemEventType::FileUploaded => &["fileId", "fileName"],
        SystemEventType::SyncStarted => &["deviceId"],
        SystemEventType::SyncCompleted => &["deviceId", "itemsSynced"],
        SystemEventType::Error => &["errorCode", "errorMessage"],
        SystemEventType::AgentOnline | SystemEventType::AgentOffline => &["agentId"],
        SystemEventType::SettingsChanged => &["userId", "changes"],
    }
}

pub fn validate_system_event(event: &SystemEvent, options: &ValidationOptions) -> ValidationResult {
    let mut result = validate_envelope(&event.envelope, options);
    if let Some(sender) = &event.sender {
        result.absorb(validate_sender(sender, options));
    }
    if let Some(target) = &event.target {
        result.absorb(validate_target(target, options));
    }
    check_size(&mut result, options, &MessageRef::Event(event));

    let fields = required_event_fields(event.event_type);
    if !fields.is_empty() && !event.data.is_object() {
        result.warning("data", ErrorCode::ValidationInvalidType, "Event data should be an object");
    } else {
        check_data_keys(&mut result, "data", &event.data, fields);
    }

    if event.event_type == SystemEventType::Error {
        if let Some(code) = event.data.get("errorCode").and_then(Value::as_str) {
            if ErrorCode::from_code(code).is_none() {
                result.warning("data.errorCode", ErrorCode::ValidationInvalidType, "Unknown error code");
            }
        }
    }
    result
}

pub fn validate_file_transfer(transfer: &FileTransfer, options: &ValidationOptions) -> ValidationResult {
    let mut result = validate_envelope(&transfer.envelope, options);
    result.absorb(validate_sender(&transfer.sender, options));
    result.absorb(validate_target(&transfer.target, options));
    result.absorb(validate_auth_context(&transfer.auth, options));
    check_size(&mut result, options, &MessageRef::File(transfer));

    check_not_empty(&mut result, "fileId", &transfer.file_id);
    check_not_empty(&mut result, "fileName", &transfer.file_name);
    if transfer.mime_type.is_empty() {
        result.error("mimeType", ErrorCode::ValidationMissingField, "MIME type is required");
    } else if !transfer.mime_type.contains('/') {
        result.warning("mimeType", ErrorCode::ValidationInvalidFormat, "MIME type should be type/subtype");
    }
    if !transfer.file_id.is_empty() && transfer.envelope.id != transfer.file_id {
        result.warning("id", ErrorCode::ValidationInvalidId, "Transfer id should equal fileId");
    }

    if transfer.file_size == 0 {
        result.error("fileSize", ErrorCode::ValidationInvalidFormat, "File size must be greater than 0");
    } else if transfer.file_size > MAX_FILE_SIZE {
        result.error(
            "fileSize",
            ErrorCode::ValidationSizeExceeded,
            format!("File size exceeds maximum of {MAX_FILE_SIZE} bytes"),
        );
    }

    if transfer.chunk_size == 0 {
        result.error("chunkSize", ErrorCode::ValidationInvalidFormat, "Chunk size must be greater than 0");
    } else {
        let expected = FileTransfer::expected_chunks(transfer.file_size, transfer.chunk_size);
        if transfer.total_chunks != expected {
            result.error(
                "totalChunks",
                ErrorCode::ValidationInvalidFormat,
                format!("totalChunks is {} but fileSize/chunkSize gives {expected}", transfer.total_chunks),
            );
        }
    }

    if transfer.resume_from_chunk > transfer.total_chunks {
        result.error(
            "resumeFromChunk",
            ErrorCode::ValidationInvalidFormat,
            "resumeFromChunk is past the last chunk",
        );
    }
    if let Some(transferred) = transfer.transferred_bytes {
        if transferred > transfer.file_size {
            result.error(
                "transferredBytes",
                ErrorCode::ValidationInvalidFormat,
                "transferredBytes exceeds fileSize",
            );
        }
    }
    if let Some(completed) = &transfer.completed_chunks {
        if let Some(index) = completed.iter().find(|&&i| i >= transfer.total_chunks) {
            result.error(
                "completedChunks",
                ErrorCode::ValidationInvalidFormat,
                format!("Chunk index {index} is out of range"),
            );
        }
    }
    if let Some(checksum) = &transfer.checksum {
        if !is_hex_digest(checksum) {
            result.error(
                "checksum",
                ErrorCode::ValidationInvalidFormat,
                "Checksum must be a hex SHA-256 digest",
            );
        }
    }

    check_permission(&mut result, options, &transfer.auth, PermissionLevel::Collaborator);
    result
}

/// Checks a chunk's identity fields and its data against its checksum
pub fn validate_file_chunk(chunk: &FileChunk, options: &ValidationOptions) -> ValidationResult {
    let mut result = ValidationResult::default();
    check_identifier(&mut result, options, "fileId", &chunk.file_id);
    if !is_hex_digest(&chunk.checksum) {
        result.error("checksum", ErrorCode::ValidationInvalidFormat, "Checksum must be a hex SHA-256 digest");
    } else if chunk.verify().is_err() {
        result.error("data", ErrorCode::ChecksumMismatch, "Chunk data does not match its checksum");
    }
    result
}

/// Validate any message, dispatching to the variant's own validator
pub fn validate_message(message: &Message, options: &ValidationOptions) -> ValidationResult {
    let result = match message {
        Message::Chat(chat) => validate_chat_message(chat, options),
        Message::Command(command) => validate_agent_command(command, options),
        Message::Event(event) => validate_system_event(event, options),
        Message::File(transfer) => validate_file_transfer(transfer, options),
    };

    if !result.valid {
        debug!(
            id = %message.id(),
            message_type = %message.message_type(),
            errors = result.errors.len(),
            "message failed validation"
        );
    }
    result
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItemErrors {
    pub index: usize,
    pub errors: Vec<ValidationError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchValidationResult {
    pub valid: bool,
    pub total: usize,
    pub valid_count: usize,
    pub invalid_count: usize,
    pub errors: Vec<BatchItemErrors>,
}

/// Validate every message, reporting errors per index
pub fn validate_batch(messages: &[Message], options: &ValidationOptions) -> BatchValidationResult {
    let errors: Vec<BatchItemErrors> = messages
        .iter()
        .enumerate()
        .filter_map(|(index, message)| {
            let result = validate_message(message, options);
            (!result.valid).then_some(BatchItemErrors {
                index,
                errors: result.errors,
            })
        })
        .collect();

    BatchValidationResult {
        valid: errors.is_empty(),
        total: messages.len(),
        valid_count: messages.len() - errors.len(),
        invalid_count: errors.len(),
        errors,
    }
}

/// Escape markup-significant characters in user text.
///
/// Apply once per ingest path: `&` is left alone, so running it twice does not
/// double-escape existing entities but does escape the `/` inside them.
pub fn sanitize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            other => out.push(other),
        }
    }
    out
}

/// Copy of `content` with text payloads passed through [`sanitize_text`]
pub fn sanitize_content(content: &Content) -> Content {
    match &content.body {
        ContentBody::Text(text) => Content {
            body: ContentBody::Text(sanitize_text(text)),
            metadata: content.metadata.clone(),
        },
        _ => content.clone(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionCompatibility {
    pub compatible: bool,
    pub current_version: &'static str,
    pub message: String,
}

/// Exact-match check of a peer's protocol name against the running one
pub fn check_version_compatibility(version: &str) -> VersionCompatibility {
    if version == PROTOCOL_NAME {
        VersionCompatibility {
            compatible: true,
            current_version: PROTOCOL_NAME,
            message: String::from("Versions match"),
        }
    } else {
        VersionCompatibility {
            compatible: false,
            current_version: PROTOCOL_NAME,
            message: format!("Version mismatch: {version} vs {PROTOCOL_NAME}"),
        }
    }
}

/// [`check_version_compatibility`] as a `Result`, for callers that drop on mismatch
pub fn ensure_version_compatible(version: &str) -> Result<()> {
    if check_version_compatibility(version).compatible {
        Ok(())
    } else {
        Err(ProtocolError::UnsupportedVersion(version.to_string()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used)]

    use super::*;
    use crate::protocol::factory::{
        create_admin_auth, create_agent_command, create_ai_sender, create_direct_target,
        create_guest_auth, create_human_sender, create_text_content, create_text_message,
        create_user_join_event, AgentCommandOptions, AuthContextOptions, SenderOptions,
    };
    use crate::protocol::factory::{create_auth_context, create_sender};

    fn chat(text: &str) -> ChatMessage {
        create_text_message(
            create_human_sender("u1", "d1", None),
            create_direct_target("c1"),
            text,
            create_guest_auth(None),
            None,
        )
    }

    #[test]
    fn test_factory_message_is_valid() {
        let result = validate_chat_message(&chat("hello"), &ValidationOptions::default());
        assert!(result.valid, "{:?}", result.errors);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn test_text_length_boundary() {
        let options = ValidationOptions::default();
        let exact = "a".repeat(MAX_TEXT_LENGTH);
        assert!(validate_chat_message(&chat(&exact), &options).valid);

        let over = "a".repeat(MAX_TEXT_LENGTH + 1);
        let result = validate_chat_message(&chat(&over), &options);
        assert!(!result.valid);
        assert!(result.has_error(ErrorCode::ValidationSizeExceeded));
        assert_eq!(result.errors[0].path, "content.data");
    }

    #[test]
    fn test_text_length_counts_characters() {
        let exact = "é".repeat(MAX_TEXT_LENGTH);
        assert!(validate_chat_message(&chat(&exact), &ValidationOptions::default()).valid);
    }

    #[test]
    fn test_size_ceiling() {
        let options = ValidationOptions {
            max_message_size: Some(256),
            ..ValidationOptions::default()
        };
        let result = validate_chat_message(&chat(&"x".repeat(300)), &options);
        assert!(result.has_error(ErrorCode::ValidationSizeExceeded));

        let unlimited = ValidationOptions {
            max_message_size: None,
            ..ValidationOptions::default()
        };
        assert!(validate_chat_message(&chat(&"x".repeat(300)), &unlimited).valid);
    }

    #[test]
    fn test_version_mismatch() {
        let mut message = chat("hi");
        message.envelope.version = String::from("XSG-Protocol-v1");
        let result = validate_chat_message(&message, &ValidationOptions::default());
        assert!(result.has_error(ErrorCode::ValidationVersionMismatch));
    }

    #[test]
    fn test_timestamp_bounds() {
        let options = ValidationOptions {
            now_ms: Some(1_000_000),
            ..ValidationOptions::default()
        };
        let mut message = chat("hi");
        message.envelope.timestamp = 0;
        assert!(validate_chat_message(&message, &options).has_error(ErrorCode::ValidationInvalidTimestamp));

        message.envelope.timestamp = 1_000_000 + MAX_CLOCK_SKEW_MS;
        assert!(validate_chat_message(&message, &options).valid);

        message.envelope.timestamp += 1;
        assert!(!validate_chat_message(&message, &options).valid);
    }

    #[test]
    fn test_message_age_warning() {
        let mut message = chat("hi");
        message.envelope.timestamp = 1_000;
        let options = ValidationOptions {
            now_ms: Some(61_000),
            max_message_age_ms: Some(60_000),
            ..ValidationOptions::default()
        };
        assert!(validate_chat_message(&message, &options).warnings.is_empty());

        let later = ValidationOptions {
            now_ms: Some(61_001),
            ..options.clone()
        };
        let result = validate_chat_message(&message, &later);
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].path, "timestamp");

        // an explicit expiresAt still in the future outranks the age
        message.envelope.expires_at = Some(100_000);
        assert!(validate_chat_message(&message, &later).warnings.is_empty());
        message.envelope.expires_at = Some(50_000);
        assert_eq!(validate_chat_message(&message, &later).warnings[0].path, "expiresAt");

        let unchecked = ValidationOptions {
            max_message_age_ms: None,
            ..later
        };
        assert!(validate_chat_message(&message, &unchecked).warnings.is_empty());
    }

    #[test]
    fn test_ai_sender_needs_agent_id() {
        let sender = create_sender(SenderOptions {
            user_id: "u1".into(),
            device_id: "d1".into(),
            role: SenderRole::Ai,
            ..SenderOptions::default()
        });
        let result = validate_sender(&sender, &ValidationOptions::default());
        assert!(!result.valid);
        assert_eq!(result.errors[0].path, "sender.agentId");

        let ok = create_ai_sender("agent-1", "u1", "d1", None);
        assert!(validate_sender(&ok, &ValidationOptions::default()).valid);
    }

    #[test]
    fn test_identifier_pattern_strictness() {
        let sender = create_human_sender("user@example.com", "d1", None);
        let lenient = validate_sender(&sender, &ValidationOptions::default());
        assert!(lenient.valid);
        assert_eq!(lenient.warnings.len(), 1);

        let strict = ValidationOptions {
            strict: true,
            ..ValidationOptions::default()
        };
        let result = validate_sender(&sender, &strict);
        assert!(!result.valid);
        assert!(result.has_error(ErrorCode::ValidationInvalidId));
    }

    #[test]
    fn test_auth_level_range() {
        let auth = create_auth_context(AuthContextOptions {
            level: Some(101),
            ..AuthContextOptions::default()
        });
        assert!(!validate_auth_context(&auth, &ValidationOptions::default()).valid);
    }

    #[test]
    fn test_empty_agent_id_fails() {
        let command = create_agent_command(AgentCommandOptions::new(
            "",
            AgentCommandType::Chat,
            serde_json::json!({ "text": "hi" }),
            create_human_sender("u1", "d1", None),
            create_guest_auth(None),
        ));
        let result = validate_agent_command(&command, &ValidationOptions::default());
        assert!(!result.valid);
        assert_eq!(result.errors[0].path, "agentId");
    }

    #[test]
    fn test_command_permissions() {
        let options = ValidationOptions {
            validate_permissions: true,
            ..ValidationOptions::default()
        };
        let make = |command_type, auth| {
            create_agent_command(AgentCommandOptions::new(
                "agent-1",
                command_type,
                serde_json::json!({}),
                create_human_sender("u1", "d1", None),
                auth,
            ))
        };

        let config_as_guest = make(AgentCommandType::Config, create_guest_auth(None));
        let result = validate_agent_command(&config_as_guest, &options);
        assert!(result.has_error(ErrorCode::InsufficientLevel));

        let config_as_admin = make(AgentCommandType::Config, create_admin_auth(None, None));
        assert!(validate_agent_command(&config_as_admin, &options).valid);

        // not flagged unless asked for
        assert!(validate_agent_command(&config_as_guest, &ValidationOptions::default()).valid);
    }

    #[test]
    fn test_expired_auth_flagged() {
        let options = ValidationOptions {
            validate_permissions: true,
            now_ms: Some(crate::utils::time::current_timestamp_millis()),
            ..ValidationOptions::default()
        };
        let mut message = chat("hi");
        message.auth.expires_at = Some(1);
        assert!(validate_chat_message(&message, &options).has_error(ErrorCode::TokenExpired));
    }

    #[test]
    fn test_event_data_warnings() {
        let mut event = create_user_join_event("u1", "c1", None);
        assert!(validate_system_event(&event, &ValidationOptions::default()).warnings.is_empty());

        event.data = serde_json::json!({ "channelId": "c1" });
        let result = validate_system_event(&event, &ValidationOptions::default());
        assert!(result.valid);
        assert_eq!(result.warnings[0].path, "data.userId");
    }

    #[test]
    fn test_batch_counts() {
        let good = Message::Chat(chat("ok"));
        let mut bad_chat = chat("bad");
        bad_chat.sender.user_id.clear();
        let bad = Message::Chat(bad_chat);

        let report = validate_batch(&[good.clone(), bad, good], &ValidationOptions::default());
        assert!(!report.valid);
        assert_eq!(report.total, 3);
        assert_eq!(report.valid_count, 2);
        assert_eq!(report.invalid_count, 1);
        assert_eq!(report.errors[0].index, 1);
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(
            sanitize_text(r#"<a href="x">'hi'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#x27;hi&#x27;&lt;&#x2F;a&gt;"
        );
        assert_eq!(sanitize_text("fish & chips"), "fish & chips");

        let content = sanitize_content(&create_text_content("<b>", None));
        assert_eq!(content.as_text(), Some("&lt;b&gt;"));
    }

    #[test]
    fn test_version_gate() {
        assert!(check_version_compatibility(PROTOCOL_NAME).compatible);
        let other = check_version_compatibility("SillyChat-Protocol-v2");
        assert!(!other.compatible);
        assert_eq!(other.current_version, PROTOCOL_NAME);

        assert!(ensure_version_compatible(PROTOCOL_NAME).is_ok());
        let err = ensure_version_compatible("SillyChat-Protocol-v0").unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationVersionMismatch);
    }

    #[test]
    fn test_into_result() {
        let mut message = chat("hi");
        message.envelope.id.clear();
        let err = validate_chat_message(&message, &ValidationOptions::default())
            .into_result()
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationMissingField);
    }
}
