//! Per-request document processing.
//!
//! Runs every attached document through text extraction and dictionary
//! validation, tier by tier, and assembles the output record. Individual
//! failures never abort the request: each becomes a status value in the
//! document's own field.

use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinSet;
use tracing::Instrument;

use super::plan::{PriorityPlan, PriorityTier};
use super::urls::request_order;
use super::status::{
    extraction_failure_status, fetch_failure_status, FILE_UNAVAILABLE, INTERNAL_ERROR, TIMED_OUT,
};
use crate::dictionary::{DictionaryKey, DictionaryRepository};
use crate::extraction::FieldExtractor;
use crate::matching::Matcher;
use crate::models::{
    keys, status, CrossCheck, DocumentDescriptor, DocumentOutcome, DocumentType, DocumentUrls,
    DownloadStatus, OutputField, OutputRecord, RequestFields, TytField, TytOutcome,
};
use crate::ocr::TextExtractionService;
use crate::utils::digits_only;

/// Progress events emitted while processing a request.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    TierStarted {
        tier: usize,
        documents: usize,
    },
    DocumentCompleted {
        tier: usize,
        doc_type: DocumentType,
        status: String,
    },
    TierTimedOut {
        tier: usize,
        pending: Vec<DocumentType>,
    },
    TierCompleted {
        tier: usize,
        completed: usize,
    },
    RecordRepaired {
        fields: Vec<OutputField>,
    },
}

/// Output record plus run metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessSummary {
    pub request_id: String,
    pub record: OutputRecord,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub timed_out: Vec<DocumentType>,
    pub repaired: Vec<OutputField>,
    /// True when an unexpected panic forced the emergency record.
    pub emergency: bool,
}

#[derive(Debug, Default)]
struct RunReport {
    timed_out: Vec<DocumentType>,
    repaired: Vec<OutputField>,
}

/// Everything a document task needs. Cloned into each task.
#[derive(Clone)]
struct Pipeline {
    extractor: Arc<dyn TextExtractionService>,
    dictionaries: Arc<DictionaryRepository>,
    matcher: Arc<Matcher>,
    fields: Arc<FieldExtractor>,
    min_matches: usize,
}

impl Pipeline {
    async fn process_document(
        &self,
        doc_type: DocumentType,
        descriptor: DocumentDescriptor,
        applicant_number: &str,
    ) -> DocumentOutcome {
        if descriptor.status == DownloadStatus::Error {
            let status = fetch_failure_status(descriptor.error_detail.as_deref());
            tracing::info!(doc_type = %doc_type, "Download failed: {}", status);
            return DocumentOutcome::status(doc_type, status);
        }

        let Some(path) = descriptor.local_path else {
            tracing::warn!(doc_type = %doc_type, "Download succeeded without a local file");
            return DocumentOutcome::status(doc_type, status::manual_review(FILE_UNAVAILABLE));
        };

        let text = match self.extractor.extract(&path, doc_type).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(doc_type = %doc_type, "Text extraction failed: {}", e);
                return DocumentOutcome::status(doc_type, extraction_failure_status(&e));
            }
        };

        let dictionary = self.dictionaries.get(doc_type);
        let result = self
            .matcher
            .evaluate(&text, &dictionary.keywords, self.min_matches);
        tracing::info!(
            doc_type = %doc_type,
            valid = result.is_valid,
            matches = result.match_count,
            strategy = result.strategy.as_str(),
            "Validated document"
        );

        if !result.is_valid {
            return DocumentOutcome::status(doc_type, status::MANUAL_REVIEW);
        }
        if doc_type.is_tyt() {
            let tyt = self.tyt_outcome(&text, applicant_number);
            return DocumentOutcome::tyt(status::VALID_DOCUMENT, tyt);
        }
        DocumentOutcome::status(doc_type, status::VALID_DOCUMENT)
    }

    /// Extract TyT fields and cross-check them against the applicant.
    fn tyt_outcome(&self, text: &str, applicant_number: &str) -> TytOutcome {
        let fields = self.fields.extract(text);

        let applicant_digits = digits_only(applicant_number);
        let identity_ok = fields.is_extracted(TytField::IdentityNumber)
            && !applicant_digits.is_empty()
            && digits_only(&fields.identity_number) == applicant_digits;

        let institution_ok = fields.is_extracted(TytField::Institution) && {
            let institutions = self.dictionaries.get(DictionaryKey::Institutions);
            self.matcher
                .validate(&fields.institution, &institutions.keywords, 1)
        };

        tracing::info!(identity_ok, institution_ok, "TyT cross-checks");

        TytOutcome {
            fields,
            identity_check: CrossCheck::from_bool(identity_ok),
            institution_check: CrossCheck::from_bool(institution_ok),
        }
    }
}

/// Processes graduation requests against their attached documents.
pub struct DocumentOrchestrator {
    pipeline: Pipeline,
    plan: PriorityPlan,
    events: Option<mpsc::Sender<ProcessEvent>>,
}

impl DocumentOrchestrator {
    pub fn new(
        extractor: Arc<dyn TextExtractionService>,
        dictionaries: Arc<DictionaryRepository>,
    ) -> Self {
        Self {
            pipeline: Pipeline {
                extractor,
                dictionaries,
                matcher: Arc::new(Matcher::default()),
                fields: Arc::new(FieldExtractor::new()),
                min_matches: 1,
            },
            plan: PriorityPlan::default(),
            events: None,
        }
    }

    pub fn with_matcher(mut self, matcher: Matcher) -> Self {
        self.pipeline.matcher = Arc::new(matcher);
        self
    }

    pub fn with_field_extractor(mut self, fields: FieldExtractor) -> Self {
        self.pipeline.fields = Arc::new(fields);
        self
    }

    pub fn with_min_matches(mut self, min_matches: usize) -> Self {
        self.pipeline.min_matches = min_matches;
        self
    }

    pub fn with_plan(mut self, plan: PriorityPlan) -> Self {
        self.plan = plan;
        self
    }

    /// Send progress events to `tx`. Events that do not fit in the channel
    /// are dropped; a slow or closed receiver never blocks processing.
    pub fn with_events(mut self, tx: mpsc::Sender<ProcessEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn plan(&self) -> &PriorityPlan {
        &self.plan
    }

    /// Process one request. Never fails; always returns a complete record.
    pub async fn process(
        &self,
        request: &RequestFields,
        descriptors: &[DocumentDescriptor],
        urls: &DocumentUrls,
    ) -> OutputRecord {
        self.process_with_summary(request, descriptors, urls)
            .await
            .record
    }

    /// Like [`process`](Self::process), with timing and diagnostics.
    pub async fn process_with_summary(
        &self,
        request: &RequestFields,
        descriptors: &[DocumentDescriptor],
        urls: &DocumentUrls,
    ) -> ProcessSummary {
        let request_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let clock = Instant::now();
        let span = tracing::info_span!("process", request_id = %request_id);

        let outcome = AssertUnwindSafe(self.run(request, descriptors, urls).instrument(span.clone()))
            .catch_unwind()
            .await;

        let (record, report, emergency) = match outcome {
            Ok((record, report)) => (record, report, false),
            Err(panic) => {
                tracing::error!(
                    parent: &span,
                    "Processing panicked: {}",
                    panic_message(&panic)
                );
                (OutputRecord::emergency(request), RunReport::default(), true)
            }
        };

        ProcessSummary {
            request_id,
            record,
            started_at,
            finished_at: Utc::now(),
            duration_ms: clock.elapsed().as_millis() as u64,
            timed_out: report.timed_out,
            repaired: report.repaired,
            emergency,
        }
    }

    async fn run(
        &self,
        request: &RequestFields,
        descriptors: &[DocumentDescriptor],
        urls: &DocumentUrls,
    ) -> (OutputRecord, RunReport) {
        tracing::info!(
            descriptors = descriptors.len(),
            attached = urls.len(),
            "Processing request {}",
            request.text(keys::ID)
        );

        let mut record = OutputRecord::new(request);
        let mut report = RunReport::default();
        let mut documents = map_descriptors(descriptors, urls);
        let applicant_number = request.text(keys::ID_NUMBER);

        for (index, tier) in self.plan.tiers().iter().enumerate() {
            let tier_number = index + 1;
            let (outcomes, timed_out) = self
                .run_tier(tier_number, tier, &mut documents, &applicant_number)
                .await;
            for outcome in &outcomes {
                record.apply(outcome);
            }
            report.timed_out.extend(timed_out);
        }

        let violations = record.integrity_violations();
        if !violations.is_empty() {
            tracing::warn!(fields = ?violations, "Output record incomplete, repairing");
            report.repaired = record.repair();
            self.emit(ProcessEvent::RecordRepaired {
                fields: report.repaired.clone(),
            });
        }

        (record, report)
    }

    /// Run one tier and return its patches plus the types that ran out of time.
    async fn run_tier(
        &self,
        tier_number: usize,
        tier: &PriorityTier,
        documents: &mut HashMap<DocumentType, DocumentDescriptor>,
        applicant_number: &str,
    ) -> (Vec<DocumentOutcome>, Vec<DocumentType>) {
        let mut outcomes = Vec::with_capacity(tier.types.len());
        let mut pending: HashSet<DocumentType> = HashSet::new();
        let mut set = JoinSet::new();

        for &doc_type in &tier.types {
            let Some(descriptor) = documents.remove(&doc_type) else {
                outcomes.push(DocumentOutcome::status(doc_type, status::NOT_ATTACHED));
                continue;
            };

            pending.insert(doc_type);
            let pipeline = self.pipeline.clone();
            let applicant_number = applicant_number.to_string();
            set.spawn(
                async move {
                    let task = pipeline.process_document(doc_type, descriptor, &applicant_number);
                    match AssertUnwindSafe(task).catch_unwind().await {
                        Ok(outcome) => outcome,
                        Err(panic) => {
                            tracing::error!(
                                doc_type = %doc_type,
                                "Document task panicked: {}",
                                panic_message(&panic)
                            );
                            DocumentOutcome::status(doc_type, status::manual_review(INTERNAL_ERROR))
                        }
                    }
                }
                .in_current_span(),
            );
        }

        self.emit(ProcessEvent::TierStarted {
            tier: tier_number,
            documents: pending.len(),
        });

        let deadline = tokio::time::Instant::now() + tier.timeout;
        let mut expired = false;

        loop {
            match tokio::time::timeout_at(deadline, set.join_next()).await {
                Ok(Some(Ok(outcome))) => {
                    pending.remove(&outcome.doc_type());
                    self.emit(ProcessEvent::DocumentCompleted {
                        tier: tier_number,
                        doc_type: outcome.doc_type(),
                        status: outcome.status_value().to_string(),
                    });
                    outcomes.push(outcome);
                }
                Ok(Some(Err(e))) => {
                    tracing::error!(tier = tier_number, "Document task failed to join: {}", e);
                }
                Ok(None) => break,
                Err(_) => {
                    expired = true;
                    set.abort_all();
                    break;
                }
            }
        }

        let mut leftover: Vec<DocumentType> = pending.into_iter().collect();
        leftover.sort();

        let timed_out = if expired {
            tracing::warn!(
                tier = tier_number,
                pending = ?leftover,
                "Tier timed out after {:?}",
                tier.timeout
            );
            self.emit(ProcessEvent::TierTimedOut {
                tier: tier_number,
                pending: leftover.clone(),
            });
            let value = status::manual_review(TIMED_OUT);
            outcomes.extend(
                leftover
                    .iter()
                    .map(|&t| DocumentOutcome::status(t, value.clone())),
            );
            leftover
        } else {
            // Tasks that vanished without an outcome (aborted from outside).
            let value = status::manual_review(INTERNAL_ERROR);
            outcomes.extend(
                leftover
                    .iter()
                    .map(|&t| DocumentOutcome::status(t, value.clone())),
            );
            Vec::new()
        };

        tracing::info!(tier = tier_number, completed = outcomes.len(), "Tier finished");
        self.emit(ProcessEvent::TierCompleted {
            tier: tier_number,
            completed: outcomes.len(),
        });

        (outcomes, timed_out)
    }

    /// Events never wait for the receiver; a full or closed channel drops them.
    fn emit(&self, event: ProcessEvent) {
        let Some(tx) = &self.events else {
            return;
        };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                tracing::debug!(?event, "Event channel full, dropping event");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!("Event channel closed, dropping event");
            }
        }
    }
}

/// Assign each descriptor to the first type whose URL matches, in the order
/// the link fields appear on a request. Descriptors matching no URL are
/// ignored.
pub fn map_descriptors(
    descriptors: &[DocumentDescriptor],
    urls: &DocumentUrls,
) -> HashMap<DocumentType, DocumentDescriptor> {
    let mut map = HashMap::new();
    for descriptor in descriptors {
        let owner = request_order()
            .find(|t| urls.get(t).map(String::as_str) == Some(descriptor.original_url.as_str()));
        match owner {
            Some(doc_type) => {
                map.insert(doc_type, descriptor.clone());
            }
            None => {
                tracing::debug!(url = %descriptor.original_url, "Descriptor matches no document type");
            }
        }
    }
    map
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
