//! Problem reporting for configuration cache sessions.
//!
//! This crate provides structured [`Problem`] reports with severity levels,
//! problem codes, the property path where the problem was found, and notes.
//! The thread-safe [`ProblemSink`] accumulates problems from concurrent cache
//! sessions.

#![warn(missing_docs)]

pub mod code;
pub mod problem;
pub mod severity;
pub mod sink;

pub use code::{Category, ProblemCode};
pub use problem::Problem;
pub use severity::Severity;
pub use sink::ProblemSink;
