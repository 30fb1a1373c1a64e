use serde_json::Value;

use atelier_common::ClientId;

use crate::assets::AssetFile;

/// Fixed network throttle period in seconds. Transform diffs during a drag
/// are sent at most once per period, independent of frame rate.
pub const SEND_RATE: f32 = 1.0 / 8.0;

/// Event names on the wire. Shared between the editor, clipboard and tests
/// so transcripts stay byte-stable.
pub mod wire {
    pub const ENTITY_ADDED: &str = "entityAdded";
    pub const ENTITY_MODIFIED: &str = "entityModified";
    pub const ENTITY_REMOVED: &str = "entityRemoved";
    pub const BLUEPRINT_ADDED: &str = "blueprintAdded";
}

/// Errors surfaced by the network channel.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("upload of {size} bytes exceeds the {limit} byte limit")]
    UploadTooLarge { size: u64, limit: u64 },
    #[error("upload failed: {0}")]
    UploadFailed(String),
}

/// The network collaborator: a connected channel to the authoritative
/// server. Delivery guarantees and claim arbitration are its contract, not
/// ours; this subsystem only proposes and reacts.
pub trait NetworkChannel {
    /// Stable id for this client, assigned at connect time.
    fn client_id(&self) -> ClientId;

    /// Fire-and-forget broadcast of a named event.
    fn send(&mut self, event: &str, payload: Value);

    /// Rehost an asset file on the server. Callers reject oversized files
    /// locally against `max_upload_size` before calling.
    fn upload(&mut self, file: &AssetFile) -> Result<(), NetworkError>;

    /// Upper bound on upload payload size, in bytes.
    fn max_upload_size(&self) -> u64;
}

/// One captured outbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedMessage {
    pub event: String,
    pub payload: Value,
}

/// In-memory channel capturing traffic for tests and the CLI demo.
#[derive(Debug, Clone)]
pub struct RecordingChannel {
    id: ClientId,
    max_upload_size: u64,
    pub messages: Vec<RecordedMessage>,
    pub uploads: Vec<String>,
    /// When set, `upload` fails with this reason. Lets tests exercise the
    /// abort-on-rehost-failure path.
    pub fail_uploads: Option<String>,
}

impl RecordingChannel {
    pub fn new(id: ClientId) -> Self {
        Self {
            id,
            max_upload_size: 32 * 1024 * 1024,
            messages: Vec::new(),
            uploads: Vec::new(),
            fail_uploads: None,
        }
    }

    pub fn with_max_upload_size(mut self, limit: u64) -> Self {
        self.max_upload_size = limit;
        self
    }

    /// Messages with a given event name, for assertions.
    pub fn sent(&self, event: &str) -> Vec<&RecordedMessage> {
        self.messages.iter().filter(|m| m.event == event).collect()
    }
}

impl NetworkChannel for RecordingChannel {
    fn client_id(&self) -> ClientId {
        self.id
    }

    fn send(&mut self, event: &str, payload: Value) {
        tracing::trace!(event, "send");
        self.messages.push(RecordedMessage {
            event: event.to_string(),
            payload,
        });
    }

    fn upload(&mut self, file: &AssetFile) -> Result<(), NetworkError> {
        if let Some(reason) = &self.fail_uploads {
            return Err(NetworkError::UploadFailed(reason.clone()));
        }
        let size = file.data.len() as u64;
        if size > self.max_upload_size {
            return Err(NetworkError::UploadTooLarge {
                size,
                limit: self.max_upload_size,
            });
        }
        self.uploads.push(file.name.clone());
        Ok(())
    }

    fn max_upload_size(&self) -> u64 {
        self.max_upload_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetKind;
    use serde_json::json;

    #[test]
    fn recording_channel_captures_sends() {
        let mut channel = RecordingChannel::new(ClientId::new());
        channel.send(wire::ENTITY_MODIFIED, json!({"id": "x"}));
        channel.send(wire::ENTITY_ADDED, json!({"id": "y"}));
        assert_eq!(channel.sent(wire::ENTITY_MODIFIED).len(), 1);
        assert_eq!(channel.messages.len(), 2);
    }

    #[test]
    fn upload_respects_size_limit() {
        let mut channel = RecordingChannel::new(ClientId::new()).with_max_upload_size(4);
        let small = AssetFile {
            kind: AssetKind::Model,
            name: "s.glb".into(),
            data: vec![0; 4],
        };
        let big = AssetFile {
            kind: AssetKind::Model,
            name: "b.glb".into(),
            data: vec![0; 5],
        };
        assert!(channel.upload(&small).is_ok());
        assert!(matches!(
            channel.upload(&big),
            Err(NetworkError::UploadTooLarge { size: 5, limit: 4 })
        ));
        assert_eq!(channel.uploads, vec!["s.glb"]);
    }

    #[test]
    fn forced_upload_failure() {
        let mut channel = RecordingChannel::new(ClientId::new());
        channel.fail_uploads = Some("offline".into());
        let file = AssetFile {
            kind: AssetKind::Script,
            name: "s.js".into(),
            data: vec![1],
        };
        assert!(matches!(
            channel.upload(&file),
            Err(NetworkError::UploadFailed(_))
        ));
    }
}
