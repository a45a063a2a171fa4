//! facegate-store — persistence for the face gallery.
//!
//! A SQLite registry of gallery entries plus a filesystem area of
//! reference images. The registry row for an identity is only ever
//! written after its reference image is safely on disk.

pub mod images;
pub mod registry;

pub use images::{load_reference, remove_reference, save_reference};
pub use registry::{GalleryEntry, Registry};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("image IO error: {0}")]
    ImageIo(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid timestamp in registry: {0}")]
    BadTimestamp(String),
    #[error("identity not found: {0}")]
    IdentityNotFound(String),
}
