//! Upload ingestion for ctfserver.
//!
//! This crate holds the write path of the server and the listing of what
//! has been written:
//!
//! - [`UploadValidator`] checks the declared size and the client-supplied
//!   name before anything touches disk, producing a [`SanitizedFilename`].
//! - [`UploadStore`] streams the body into the upload directory under a
//!   hard byte ceiling.
//! - [`UploadsLister`] enumerates the upload directory as records and as a
//!   numbered text list.
//!
//! Nothing here depends on HTTP types; the server crate adapts request
//! bodies into [`tokio::io::AsyncRead`] before calling [`UploadStore::store`].

mod list;
mod store;
mod validate;

pub use list::{ListError, NO_UPLOADS_MESSAGE, UploadedFileRecord, UploadsLister, UploadsListing};
pub use store::{UploadError, UploadResult, UploadStore};
pub use validate::{Rejection, SanitizedFilename, UploadValidator};
