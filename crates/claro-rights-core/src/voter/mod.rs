//! Access decisions on resource nodes.
//!
//! [`ResourceVoter`] answers single-node and batch requests using an injected
//! [`RightsRepository`](crate::repository::RightsRepository) and
//! [`MaskDecoderRegistry`](crate::decoder::MaskDecoderRegistry).

mod engine;
mod types;

pub use engine::ResourceVoter;
pub use types::{AccessError, Operation, ResourceCollection, Subject, Vote, requires_collection};
