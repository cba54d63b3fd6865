//! Blob storage abstraction layer
//!
//! Defines the [`BlobStore`] trait used by extract archiving and folder sync, a
//! directory-backed implementation, and a factory that picks the implementation
//! from configuration.

pub mod factory;
pub mod local;
pub mod traits;

pub use factory::create_blob_store;
pub use local::LocalBlobStore;
pub use traits::{blob_name_for, normalise_blob_name, upload_file, BlobStore};
