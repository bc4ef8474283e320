pub mod error;
pub mod traits;
pub mod types;

pub use error::{ErrorClass, ParseError, PreprocessError, RecognitionError, ShelfError, StoreError};
pub use traits::RecognitionProvider;
pub use types::{
    AggregateRecord, NormalizedImage, Observation, RecognitionAnswer, RecordUpdate, UploadedImage,
};
