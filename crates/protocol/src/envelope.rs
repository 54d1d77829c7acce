//! Log envelopes pulled from the upstream provider.

use serde::{Deserialize, Serialize};

/// One log line as delivered by the logs provider.
///
/// `timestamp` is UNIX nanoseconds. `instance` identifies the emitting
/// process (for example `APP/2`) and is carried through to the syslog
/// process-id field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEnvelope {
    pub timestamp: i64,
    pub source_id: String,
    #[serde(default)]
    pub instance: String,
    #[serde(with = "serde_bytes_vec")]
    pub message: Vec<u8>,
}

/// Plain `Vec<u8>` as a JSON array of numbers is wasteful for log payloads;
/// envelopes carry the message as a UTF-8 string, lossy on decode.
mod serde_bytes_vec {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&String::from_utf8_lossy(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        Ok(String::deserialize(deserializer)?.into_bytes())
    }
}
