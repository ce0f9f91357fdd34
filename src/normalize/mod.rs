//! Response normalization: classify an upstream payload, then map it.
//!
//! [`detect`] decides which wire format a payload follows; [`mapper`] turns
//! each format into the canonical [`crate::model::ChatCompletionResult`] (or,
//! for orchestration upstreams, extracts the opaque passthrough value).

pub mod detect;
pub mod mapper;

pub use detect::{detect, PayloadFormat};
pub use mapper::{to_completion, to_passthrough};
