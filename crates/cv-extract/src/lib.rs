//! Report text → feature vector.
//!
//! External strategies (an OpenAI-compatible chat model asked for the eight
//! scores as JSON) are tried in priority order; the simulated generator at the
//! end of the chain cannot fail, so extraction always yields a vector.

pub mod assistant;
pub mod error;
pub mod extractor;
pub mod llm;
pub mod parse;
pub mod prompt;
pub mod source;

pub use assistant::Assistant;
pub use error::ExtractionError;
pub use extractor::{Extraction, FeatureExtractor};
pub use llm::{ChatClient, CompletionOptions};
pub use parse::parse_feature_reply;
pub use source::{FeatureSource, LlmFeatureSource, SimulatedFeatureSource};
