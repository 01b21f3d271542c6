//! Shared utility functions.
//!
//! This module contains reusable utilities used across the codebase:
//! - `mime`: file format sniffing for downloaded attachments
//! - `text`: accent folding and whitespace normalization

mod mime;
mod text;

pub use mime::{looks_like_html, sniff_format, FileFormat};
pub use text::{accent_tolerant_pattern, collapse_whitespace, digits_only, fold_accents};
