//! Request extractors that validate input before handlers run

pub mod filename;

pub use filename::{FileSegment, RequiredFilename};
