use thiserror::Error;

/// Failures while validating and normalizing an uploaded image.
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("invalid file type: {0:?} (allowed: jpg, jpeg, png)")]
    InvalidFileType(String),

    #[error("no file provided")]
    MissingFile,

    #[error("image decode failed: {0}")]
    Decode(String),

    #[error("image encode failed: {0}")]
    Encode(String),
}

/// Failures talking to the external recognition service.
#[derive(Debug, Error)]
pub enum RecognitionError {
    /// DNS, connect, timeout, or an upstream that reports itself unavailable.
    #[error("recognition service unavailable: {0}")]
    Unavailable(String),

    /// The service answered, but not in the expected shape.
    #[error("recognition protocol error: {0}")]
    Protocol(String),
}

/// The recognition answer did not match `INTEGER "," NAME`.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot parse recognition answer {answer:?}: {reason}")]
pub struct ParseError {
    pub answer: String,
    pub reason: String,
}

impl ParseError {
    pub fn new(answer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            reason: reason.into(),
        }
    }
}

/// Failures of the aggregate store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record {0} not found")]
    NotFound(i64),

    #[error("a record named {0:?} already exists")]
    Conflict(String),

    #[error("invalid record: {0}")]
    Invalid(String),

    #[error("storage error: {0}")]
    Backend(String),
}

/// Top-level error for one pipeline invocation or CRUD call.
#[derive(Debug, Error)]
pub enum ShelfError {
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error(transparent)]
    Recognition(#[from] RecognitionError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification used by outer surfaces (HTTP status, exit codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The caller sent something unusable.
    ClientInput,
    NotFound,
    Conflict,
    /// The recognition service could not be reached.
    UpstreamUnavailable,
    /// Contract mismatch or local failure.
    Internal,
}

impl ShelfError {
    /// Stable machine-readable name of the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            ShelfError::Preprocess(PreprocessError::InvalidFileType(_)) => "invalid_file_type",
            ShelfError::Preprocess(PreprocessError::MissingFile) => "missing_file",
            ShelfError::Preprocess(PreprocessError::Decode(_)) => "image_decode_error",
            ShelfError::Preprocess(PreprocessError::Encode(_)) => "image_encode_error",
            ShelfError::Recognition(RecognitionError::Unavailable(_)) => "recognition_unavailable",
            ShelfError::Recognition(RecognitionError::Protocol(_)) => "recognition_protocol_error",
            ShelfError::Parse(_) => "parse_error",
            ShelfError::Store(StoreError::NotFound(_)) => "not_found",
            ShelfError::Store(StoreError::Conflict(_)) => "conflict",
            ShelfError::Store(StoreError::Invalid(_)) => "invalid_record",
            ShelfError::Store(StoreError::Backend(_)) => "storage_error",
            ShelfError::Internal(_) => "internal_error",
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            ShelfError::Preprocess(PreprocessError::Encode(_)) => ErrorClass::Internal,
            ShelfError::Preprocess(_) => ErrorClass::ClientInput,
            ShelfError::Recognition(RecognitionError::Unavailable(_)) => {
                ErrorClass::UpstreamUnavailable
            }
            ShelfError::Recognition(RecognitionError::Protocol(_)) => ErrorClass::Internal,
            // An unparseable answer means the upstream broke its contract, not the caller.
            ShelfError::Parse(_) => ErrorClass::Internal,
            ShelfError::Store(StoreError::NotFound(_)) => ErrorClass::NotFound,
            ShelfError::Store(StoreError::Conflict(_)) => ErrorClass::Conflict,
            ShelfError::Store(StoreError::Invalid(_)) => ErrorClass::ClientInput,
            ShelfError::Store(StoreError::Backend(_)) | ShelfError::Internal(_) => {
                ErrorClass::Internal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let cases: Vec<(ShelfError, ErrorClass, &str)> = vec![
            (
                PreprocessError::InvalidFileType("a.gif".into()).into(),
                ErrorClass::ClientInput,
                "invalid_file_type",
            ),
            (PreprocessError::MissingFile.into(), ErrorClass::ClientInput, "missing_file"),
            (
                PreprocessError::Decode("bad".into()).into(),
                ErrorClass::ClientInput,
                "image_decode_error",
            ),
            (
                RecognitionError::Unavailable("timeout".into()).into(),
                ErrorClass::UpstreamUnavailable,
                "recognition_unavailable",
            ),
            (
                RecognitionError::Protocol("no choices".into()).into(),
                ErrorClass::Internal,
                "recognition_protocol_error",
            ),
            (
                ParseError::new("3 Banana", "missing comma").into(),
                ErrorClass::Internal,
                "parse_error",
            ),
            (StoreError::NotFound(4).into(), ErrorClass::NotFound, "not_found"),
            (StoreError::Conflict("Banana".into()).into(), ErrorClass::Conflict, "conflict"),
        ];

        for (err, class, kind) in cases {
            assert_eq!(err.class(), class, "{err}");
            assert_eq!(err.kind(), kind);
        }
    }

    #[test]
    fn test_messages_are_transparent() {
        let err: ShelfError = StoreError::NotFound(9).into();
        assert_eq!(err.to_string(), "record 9 not found");
    }
}
