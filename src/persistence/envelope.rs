//! Versioned JSON envelope around persisted payloads

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{PersistenceError, Result};

/// Current save format version
pub const SAVE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub version: u32,
    /// Unix ms when the envelope was sealed
    pub saved_at_ms: u64,
    pub payload: T,
}

impl<T> Envelope<T> {
    pub fn new(payload: T, saved_at_ms: u64) -> Self {
        Self {
            version: SAVE_FORMAT_VERSION,
            saved_at_ms,
            payload,
        }
    }
}

impl<T: Serialize> Envelope<T> {
    /// Serialize to JSON
    pub fn seal(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Parse JSON and reject unknown versions.
    ///
    /// The version is checked before the payload is decoded, so a future
    /// format reports `VersionMismatch` instead of a field error.
    pub fn open(json: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct Header {
            version: u32,
        }

        let header: Header = serde_json::from_str(json)?;
        if header.version != SAVE_FORMAT_VERSION {
            return Err(PersistenceError::VersionMismatch {
                found: header.version,
                expected: SAVE_FORMAT_VERSION,
            });
        }
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_then_open() {
        let sealed = Envelope::new(vec![1, 2, 3], 42).seal().unwrap();
        let opened: Envelope<Vec<i32>> = Envelope::open(&sealed).unwrap();
        assert_eq!(opened.payload, vec![1, 2, 3]);
        assert_eq!(opened.saved_at_ms, 42);
        assert!(sealed.contains("\"savedAtMs\":42"));
    }

    #[test]
    fn test_future_version_rejected() {
        let json = r#"{"version":99,"savedAtMs":0,"payload":{"whatever":true}}"#;
        let err = Envelope::<Vec<i32>>::open(json).unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::VersionMismatch { found: 99, expected: 1 }
        ));
    }

    #[test]
    fn test_garbage_is_json_error() {
        let err = Envelope::<Vec<i32>>::open("not json").unwrap_err();
        assert!(matches!(err, PersistenceError::Json(_)));
    }
}
