//! Shared foundational types used across the Bramble build tool.
//!
//! This crate provides the type-erased [`Object`] handle that the configuration
//! model is built from, content hashing for cache entry validation, and the
//! cooperative [`CancellationToken`] checked by long-running cache sessions.

#![warn(missing_docs)]

pub mod cancel;
pub mod hash;
pub mod object;

pub use cancel::CancellationToken;
pub use hash::ContentHash;
pub use object::Object;
