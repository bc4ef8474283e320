//! Recognition: asking a vision model what is in a normalized image, and
//! turning its short answer into an observation.

pub mod fixed;
pub mod parse;
pub mod vision;

pub use fixed::FixedRecognizer;
pub use parse::parse_answer;
pub use vision::{OpenAiVisionClient, RecognitionConfig, RECOGNITION_PROMPT};
