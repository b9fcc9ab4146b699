//! Domain types for the media generation orchestration layer.
//!
//! Pure request validation, job-spec resolution helpers, the job
//! status machine, and the result contract. No I/O lives here —
//! backend clients and the orchestration loops build on these types.

pub mod audio;
pub mod error;
pub mod image;
pub mod job;
pub mod result;
