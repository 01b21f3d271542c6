//! gradcheck - graduation request document validation.
//!
//! Decides whether the documents attached to a graduation request look like
//! what they claim to be, extracts the structured fields of the TyT exam
//! result, and assembles a complete output record even when individual
//! documents fail.

pub mod cli;
pub mod config;
pub mod dictionary;
pub mod extraction;
pub mod matching;
pub mod models;
pub mod ocr;
pub mod services;
pub mod utils;
