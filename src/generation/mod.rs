//! Quiz generation pipeline: prompt rendering, the provider contract and
//! normalization of whatever the provider sends back.

pub mod client;
pub mod gemini;
pub mod normalizer;
pub mod prompt;

pub use client::{GenerationClient, GenerationOptions, RawCompletion};
pub use normalizer::{NormalizedQuestion, NormalizedQuiz, normalize};
pub use prompt::{GenerationParams, build_prompt};
