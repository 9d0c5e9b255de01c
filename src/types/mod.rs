//! Core data types for the roast pipeline

pub mod document;
pub mod response;

pub use document::{Chunk, DocumentFormat, LoadedDocument, PageText};
pub use response::{RoastFailure, RoastMetadata, RoastRequest, RoastResult};
