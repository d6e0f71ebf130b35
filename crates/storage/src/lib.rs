#![forbid(unsafe_code)]

pub mod json;
pub mod repository;

pub use json::JsonFileStore;
pub use repository::{
    ExportBatch, ExportSink, InMemoryRepository, ProfileLookup, ResultRow, ResultSink, Storage,
    StorageError,
};
