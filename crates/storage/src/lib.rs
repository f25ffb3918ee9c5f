#![forbid(unsafe_code)]

pub mod document;
pub mod json_file;
pub mod lessons;
pub mod repository;
pub mod sqlite;

pub use json_file::JsonFileRepository;
pub use repository::{InMemoryRepository, ProgressRepository, Storage, StorageError};
