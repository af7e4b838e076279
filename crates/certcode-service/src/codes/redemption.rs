//! Atomic redemption and certificate rendering.
//!
//! A redemption first claims the code with a single compare-and-set on the
//! store, then renders the certificate. The claim is never undone: when
//! rendering fails the code stays used with a pending artifact, and
//! [`RedemptionProcessor::retry_render`] finishes the job later.
//!
//! At most one render per code runs at a time. Retries and recovery that
//! reach a code whose render is still running wait for that render instead
//! of starting another.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use futures::stream::{self, StreamExt};
use serde::Serialize;

use certcode_core::{ArtifactRef, ArtifactStatus, Code, CodeError, CodeRecord, RedemptionRequest};
use certcode_store::CodeStore;

use crate::render::{CertificateRenderer, RenderError, RenderJob};

/// How many pending artifacts are rendered at once during recovery.
const RECOVERY_CONCURRENCY: usize = 4;

/// A running render, awaitable by every caller interested in its outcome.
type InFlightRender = Shared<BoxFuture<'static, Result<ArtifactRef, CodeError>>>;

/// Outcome of a pending-artifact recovery run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecoveryReport {
    /// Artifacts rendered and finalized.
    pub rendered: usize,
    /// Artifacts that failed to render again.
    pub failed: usize,
}

/// Claims codes and has their certificates rendered.
#[derive(Clone)]
pub struct RedemptionProcessor {
    store: Arc<dyn CodeStore>,
    renderer: Arc<dyn CertificateRenderer>,
    render_timeout: Duration,
    in_flight: Arc<DashMap<Code, InFlightRender>>,
}

impl RedemptionProcessor {
    /// Create a processor.
    #[must_use]
    pub fn new(
        store: Arc<dyn CodeStore>,
        renderer: Arc<dyn CertificateRenderer>,
        render_timeout: Duration,
    ) -> Self {
        Self {
            store,
            renderer,
            render_timeout,
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// Number of renders currently running.
    #[must_use]
    pub fn renders_in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Redeem a code.
    ///
    /// Of any number of concurrent calls for the same code, at most one gets
    /// past the claim; the others fail with `AlreadyUsed` and render nothing.
    ///
    /// # Errors
    ///
    /// - `CodeError::NotFound` / `CodeError::AlreadyUsed` if the claim fails.
    /// - `CodeError::RenderingFailure` if the code was claimed but the
    ///   certificate could not be rendered. The code stays used.
    /// - `CodeError::Storage` if the store fails.
    pub async fn redeem(&self, request: RedemptionRequest) -> Result<ArtifactRef, CodeError> {
        let reserved = ArtifactRef::reserved_for(&request.code);

        let record = self
            .store
            .compare_and_set_used(&request.code, &request.redeemer, &reserved, Utc::now())
            .map_err(|e| {
                let err = CodeError::from(e);
                tracing::debug!(code = %request.code, error = %err, "Redemption rejected");
                err
            })?;

        tracing::info!(code = %record.code, category = %record.category, "Code claimed");

        self.render_claimed(&record).await
    }

    /// Render the certificate of an already claimed code again.
    ///
    /// Keyed by code and checked against the redeemer's email; the claim
    /// itself is not repeated. If the artifact was rendered before, its
    /// reference is returned without rendering.
    ///
    /// # Errors
    ///
    /// - `CodeError::NotFound` for unknown codes or a mismatching email.
    /// - `CodeError::NotRedeemed` if the code was never claimed.
    /// - `CodeError::RenderingFailure` if rendering fails again.
    pub async fn retry_render(&self, code: &str, email: &str) -> Result<ArtifactRef, CodeError> {
        let code = Code::parse(code.trim())?;
        let record = self.store.get(&code)?;
        let redemption = record.redemption.as_ref().ok_or(CodeError::NotRedeemed)?;

        if !redemption.redeemer.matches_email(email) {
            tracing::debug!(code = %code, "Render retry rejected: email mismatch");
            return Err(CodeError::NotFound);
        }

        if redemption.artifact_status == ArtifactStatus::Rendered {
            return Ok(redemption.artifact_ref.clone());
        }

        tracing::info!(code = %code, "Retrying certificate render");
        self.render_claimed(&record).await
    }

    /// Retry rendering for up to `limit` claimed codes with pending artifacts.
    ///
    /// # Errors
    ///
    /// Returns `CodeError::Storage` if the pending codes cannot be listed.
    /// Individual render failures are counted, not returned.
    pub async fn recover_pending(&self, limit: usize) -> Result<RecoveryReport, CodeError> {
        let pending = self.store.pending_artifacts(limit)?;
        if pending.is_empty() {
            return Ok(RecoveryReport::default());
        }

        tracing::info!(count = pending.len(), "Recovering pending certificates");

        let results: Vec<_> = stream::iter(pending)
            .map(|record| async move { self.render_claimed(&record).await })
            .buffer_unordered(RECOVERY_CONCURRENCY)
            .collect()
            .await;

        let rendered = results.iter().filter(|r| r.is_ok()).count();
        let report = RecoveryReport {
            rendered,
            failed: results.len() - rendered,
        };

        tracing::info!(
            rendered = report.rendered,
            failed = report.failed,
            "Pending certificate recovery finished"
        );

        Ok(report)
    }

    /// Render and finalize on a detached task, or join the render already
    /// running for the same code.
    ///
    /// If the caller stops waiting, the task still runs to completion and
    /// finalizes the artifact; on failure the record stays pending.
    async fn render_claimed(&self, record: &CodeRecord) -> Result<ArtifactRef, CodeError> {
        let job = RenderJob::from_record(record).ok_or(CodeError::NotRedeemed)?;

        let render = match self.in_flight.entry(job.code.clone()) {
            Entry::Occupied(entry) => {
                tracing::debug!(code = %job.code, "Joining certificate render in progress");
                entry.get().clone()
            }
            Entry::Vacant(slot) => {
                // A render that finished after `record` was read has already
                // finalized before leaving the table.
                if let Some(artifact) = self.rendered_artifact(&job.code)? {
                    return Ok(artifact);
                }
                let render = self.spawn_render(job).shared();
                slot.insert(render.clone());
                render
            }
        };

        render.await
    }

    fn rendered_artifact(&self, code: &Code) -> Result<Option<ArtifactRef>, CodeError> {
        let record = self.store.get(code)?;
        Ok(record
            .redemption
            .filter(|r| r.artifact_status == ArtifactStatus::Rendered)
            .map(|r| r.artifact_ref))
    }

    /// Spawn the render task. The task leaves the in-flight table itself,
    /// after finalizing, so it is released even when nobody awaits it.
    fn spawn_render(&self, job: RenderJob) -> BoxFuture<'static, Result<ArtifactRef, CodeError>> {
        let code = job.code.clone();
        let in_flight = Arc::clone(&self.in_flight);
        let task = tokio::spawn({
            let code = code.clone();
            let in_flight = Arc::clone(&in_flight);
            let store = Arc::clone(&self.store);
            let renderer = Arc::clone(&self.renderer);
            let timeout = self.render_timeout;
            async move {
                let result = render_and_finalize(store, renderer, job, timeout).await;
                in_flight.remove(&code);
                result
            }
        });

        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => {
                    in_flight.remove(&code);
                    Err(CodeError::RenderingFailure(format!("render task failed: {e}")))
                }
            }
        }
        .boxed()
    }
}

async fn render_and_finalize(
    store: Arc<dyn CodeStore>,
    renderer: Arc<dyn CertificateRenderer>,
    job: RenderJob,
    timeout: Duration,
) -> Result<ArtifactRef, CodeError> {
    let rendered = match tokio::time::timeout(timeout, renderer.render(&job)).await {
        Ok(result) => result,
        Err(_) => Err(RenderError::Timeout(timeout.as_secs())),
    };

    let artifact = rendered.map_err(|e| {
        tracing::warn!(
            code = %job.code,
            error = %e,
            "Certificate rendering failed, code stays claimed"
        );
        CodeError::RenderingFailure(e.to_string())
    })?;

    store.finalize_artifact(&job.code, &artifact, Utc::now())?;

    tracing::info!(code = %job.code, artifact = %artifact, "Certificate finalized");

    Ok(artifact)
}
