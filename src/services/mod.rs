//! Request-level processing built on the matching and extraction engines.

pub mod orchestrator;
pub mod plan;
pub mod status;
pub mod urls;

pub use orchestrator::{map_descriptors, DocumentOrchestrator, ProcessEvent, ProcessSummary};
pub use plan::{PriorityPlan, PriorityTier, DEFAULT_TIER_TIMEOUT};
pub use status::FetchErrorKind;
pub use urls::{extract_document_urls, DEFAULT_ACCEPTED_HOSTS};
