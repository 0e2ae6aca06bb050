//! Batch orchestration: manifest in, ordered outcomes out
//!
//! Entries are processed one at a time. Inside an entry the source fetches
//! run concurrently; every upstream request and the graph write go through
//! one [`RequestGate`] built for the run. A failing entry never affects the
//! next one.

pub mod writer;

pub use writer::*;

use std::sync::Arc;

use imcite_domain::{BatchReport, Field, ItemCreationOutcome, ItemStatus, ManifestEntry};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::error::{BatchError, PipelineError, Result};
use crate::http::Transport;
use crate::journals::{JournalError, JournalIndex, SparqlJournalIndex};
use crate::merge::merge;
use crate::resolver::{IdConverterClient, IdentifierResolver};
use crate::retry::{retry_while, RetryPolicy};
use crate::sources::SourceFetcher;
use crate::statements::{build, BuildContext};
use crate::throttle::RequestGate;

/// Runs manifests through resolve → fetch → merge → build → create
pub struct BatchRunner<T: ?Sized, W: ?Sized> {
    transport: Arc<T>,
    writer: Arc<W>,
    config: PipelineConfig,
}

/// Per-run pipeline stages sharing one gate
struct Stages<T: ?Sized> {
    resolver: IdentifierResolver<IdConverterClient<T>>,
    fetcher: SourceFetcher<T>,
    journals: SparqlJournalIndex<T>,
    gate: RequestGate,
}

impl<T, W> BatchRunner<T, W>
where
    T: Transport + ?Sized,
    W: GraphWriter + ?Sized,
{
    pub fn new(transport: Arc<T>, writer: Arc<W>, config: PipelineConfig) -> Self {
        Self {
            transport,
            writer,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run a manifest with a throttle built from the configuration.
    ///
    /// Fails only when the configuration is invalid or the throttle cannot
    /// be created; every per-entry problem becomes that entry's outcome.
    pub async fn run(
        &self,
        entries: &[ManifestEntry<W::Statement>],
        cancel: &CancellationToken,
    ) -> std::result::Result<BatchReport<W::Statement>, BatchError> {
        self.config.validate()?;
        let gate = RequestGate::from_config(&self.config.throttle)
            .map_err(|e| BatchError::ResourceExhausted(e.to_string()))?;
        Ok(self.run_with_gate(entries, gate, cancel).await)
    }

    /// Run a manifest with an externally built gate
    pub async fn run_with_gate(
        &self,
        entries: &[ManifestEntry<W::Statement>],
        gate: RequestGate,
        cancel: &CancellationToken,
    ) -> BatchReport<W::Statement> {
        let run_id = Uuid::new_v4();
        let stages = self.stages(gate);

        tracing::info!(run_id = %run_id, entries = entries.len(), "batch run started");

        let mut outcomes = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::warn!(
                    run_id = %run_id,
                    remaining = entries.len() - index,
                    "batch run cancelled"
                );
                outcomes.extend(
                    entries[index..]
                        .iter()
                        .cloned()
                        .map(ItemCreationOutcome::not_attempted),
                );
                break;
            }

            let outcome = match self.process_item(entry, &stages).await {
                Ok(entity_id) => {
                    tracing::info!(run_id = %run_id, index, entry = %entry.describe(), entity_id = %entity_id, "item created");
                    ItemCreationOutcome::created(entry.clone(), entity_id)
                }
                Err(e) => {
                    let status = e.item_status();
                    tracing::warn!(run_id = %run_id, index, entry = %entry.describe(), status = status.as_str(), error = %e, "item not created");
                    match status {
                        ItemStatus::Skipped => {
                            ItemCreationOutcome::skipped(entry.clone(), e.detail())
                        }
                        _ => ItemCreationOutcome::failed(entry.clone(), e.detail()),
                    }
                }
            };
            outcomes.push(outcome);
        }

        let report = BatchReport { outcomes };
        let counts = report.counts();
        tracing::info!(
            run_id = %run_id,
            created = counts.created,
            skipped = counts.skipped,
            failed = counts.failed,
            not_attempted = counts.not_attempted,
            "batch run finished"
        );
        report
    }

    fn stages(&self, gate: RequestGate) -> Stages<T> {
        let idconv = IdConverterClient::new(self.transport.clone(), gate.clone(), &self.config);
        Stages {
            resolver: IdentifierResolver::new(Arc::new(idconv), RetryPolicy::from(&self.config.retry)),
            fetcher: SourceFetcher::new(self.transport.clone(), gate.clone(), &self.config),
            journals: SparqlJournalIndex::new(self.transport.clone(), gate.clone(), &self.config),
            gate,
        }
    }

    async fn process_item(
        &self,
        entry: &ManifestEntry<W::Statement>,
        stages: &Stages<T>,
    ) -> Result<String> {
        let resolved = stages.resolver.resolve(&entry.identifiers()).await?;
        let records = stages.fetcher.fetch_all(&resolved.values()).await;
        let record = merge(&resolved, &records)?;

        let context = BuildContext {
            journal_item: self.journal_item(record.text(Field::Issn), stages).await,
            default_language: self.config.statements.default_language.clone(),
        };
        let item = build(&record, &context, entry.extra_statements.clone())?;

        let _permit = stages
            .gate
            .acquire()
            .await
            .map_err(|e| PipelineError::SubmissionFailed(e.to_string()))?;
        let entity_id = self.writer.create(item).await?;
        Ok(entity_id)
    }

    /// Journal item for the merged ISSN; any failure leaves it out
    async fn journal_item(&self, issn: Option<&str>, stages: &Stages<T>) -> Option<String> {
        if !self.config.statements.resolve_journals {
            return None;
        }
        let issn = issn?;
        let journals = &stages.journals;
        let result = retry_while(
            &RetryPolicy::from(&self.config.retry),
            "journal index",
            move || journals.journal_for_issn(issn),
            |result: &std::result::Result<Option<String>, JournalError>| {
                matches!(result, Err(e) if e.is_transient())
            },
        )
        .await;

        match result {
            Ok(Some(item)) => Some(item),
            Ok(None) => {
                tracing::debug!(issn, "no unique journal item");
                None
            }
            Err(e) => {
                tracing::warn!(issn, error = %e, "journal lookup failed");
                None
            }
        }
    }
}
