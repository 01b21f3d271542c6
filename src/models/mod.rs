//! Data models for gradcheck.

mod document;
mod extracted;
mod output;
mod request;

pub use document::{DocumentDescriptor, DocumentType, DocumentUrls, DownloadStatus};
pub use extracted::{ExtractedFields, TytField};
pub use output::{
    status, CrossCheck, DocumentOutcome, FieldGroup, OutputField, OutputRecord, TytOutcome,
};
pub use request::{keys, RequestFields};
