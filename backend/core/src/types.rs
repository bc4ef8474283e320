use serde::{Deserialize, Serialize};

/// Raw upload as received from a client. Never persisted.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    pub filename: String,
}

impl UploadedImage {
    pub fn new(bytes: impl Into<Vec<u8>>, filename: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            filename: filename.into(),
        }
    }
}

/// A JPEG that fits inside the configured bounding box.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Size of the upload this image was derived from.
    pub original_size: usize,
}

impl NormalizedImage {
    pub fn mime_type(&self) -> &'static str {
        "image/jpeg"
    }
}

/// Verbatim text answer from the recognition service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionAnswer(String);

impl RecognitionAnswer {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One parsed `(count, name)` reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub count: u32,
    pub object_name: String,
}

impl Observation {
    pub fn new(count: u32, object_name: impl Into<String>) -> Self {
        Self {
            count,
            object_name: object_name.into(),
        }
    }
}

/// Persisted running tally for one object name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRecord {
    pub id: i64,
    pub count: u32,
    pub object_name: String,
}

/// Partial overwrite of a record. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_name: Option<String>,
}

impl RecordUpdate {
    pub fn count(count: u32) -> Self {
        Self {
            count: Some(count),
            object_name: None,
        }
    }

    pub fn rename(object_name: impl Into<String>) -> Self {
        Self {
            count: None,
            object_name: Some(object_name.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count.is_none() && self.object_name.is_none()
    }
}
