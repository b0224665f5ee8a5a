mod config;
pub mod context;
pub mod generator;

pub use config::GenerationConfig;
pub use generator::LlmClient;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("generation failed: {0}")]
    Generation(String),

    #[error("model returned an empty completion")]
    EmptyCompletion,
}
