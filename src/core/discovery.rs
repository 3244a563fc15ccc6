use futures::stream::{self, StreamExt};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::core::compatibility::CompatibilityEvaluator;
use crate::core::ports::{ProfileStore, StoreError};
use crate::models::UserProfile;

/// Errors that abort candidate discovery
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Acting user profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Candidate discovery unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),

    #[error("Candidate discovery cancelled")]
    Cancelled,
}

/// Result of a discovery run
#[derive(Debug, Clone)]
pub struct DiscoveryOutcome {
    /// Compatible, not yet decided candidates in no particular order
    pub candidates: Vec<UserProfile>,
    /// Profiles returned by the store
    pub total_candidates: usize,
    /// Profiles skipped because the acting user already decided on them
    pub excluded: usize,
}

/// Candidate discovery orchestrator
///
/// # Pipeline Stages
/// 1. Load the acting user and their decision history
/// 2. Query every other profile from the store
/// 3. Drop candidates the acting user already liked or disliked
/// 4. Evaluate the rest concurrently and keep the matches
#[derive(Clone)]
pub struct DiscoveryPipeline {
    store: Arc<dyn ProfileStore>,
    evaluator: CompatibilityEvaluator,
}

impl DiscoveryPipeline {
    pub fn new(store: Arc<dyn ProfileStore>, evaluator: CompatibilityEvaluator) -> Self {
        Self { store, evaluator }
    }

    pub fn evaluator(&self) -> &CompatibilityEvaluator {
        &self.evaluator
    }

    /// Find match candidates for `acting_user_id`
    ///
    /// Either the complete filtered list or an error is returned, never a
    /// partial list. Cancelling `cancel` drops all in-flight evaluations.
    pub async fn discover_candidates(
        &self,
        acting_user_id: &str,
        cancel: &CancellationToken,
    ) -> Result<DiscoveryOutcome, DiscoveryError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Discovery for user {} cancelled", acting_user_id);
                Err(DiscoveryError::Cancelled)
            }
            outcome = self.run(acting_user_id) => outcome,
        }
    }

    /// Load the acting user, mapping store failures onto discovery errors
    pub async fn load_acting_user(&self, acting_user_id: &str) -> Result<UserProfile, DiscoveryError> {
        match self.store.get(acting_user_id).await {
            Ok(profile) => Ok(profile),
            Err(StoreError::NotFound(_)) => {
                Err(DiscoveryError::ProfileNotFound(acting_user_id.to_string()))
            }
            Err(e) => Err(DiscoveryError::StoreUnavailable(e)),
        }
    }

    async fn run(&self, acting_user_id: &str) -> Result<DiscoveryOutcome, DiscoveryError> {
        let acting_user = self.load_acting_user(acting_user_id).await?;

        let candidates = self
            .store
            .query_all_except(acting_user_id)
            .await
            .map_err(|e| {
                tracing::error!("Failed to query candidates for {}: {}", acting_user_id, e);
                DiscoveryError::StoreUnavailable(e)
            })?;

        let total_candidates = candidates.len();
        let decided = acting_user.decided_ids();

        let (undecided, decided_candidates): (Vec<UserProfile>, Vec<UserProfile>) = candidates
            .into_iter()
            .filter(|candidate| candidate.id != acting_user.id)
            .partition(|candidate| !decided.contains(candidate.id.as_str()));
        let excluded = decided_candidates.len();

        tracing::debug!(
            "Evaluating {} candidates for {} ({} already decided)",
            undecided.len(),
            acting_user_id,
            excluded
        );

        let evaluator = &self.evaluator;
        let acting_user = &acting_user;
        let concurrency = evaluator.options().max_concurrent_evaluations.max(1);

        let candidates: Vec<UserProfile> = stream::iter(undecided)
            .map(|candidate| async move {
                let matched = evaluator.is_match(acting_user, &candidate).await;
                matched.then_some(candidate)
            })
            .buffer_unordered(concurrency)
            .filter_map(|candidate| async move { candidate })
            .collect()
            .await;

        tracing::info!(
            "Discovered {} candidates for user {} (from {} profiles, {} excluded)",
            candidates.len(),
            acting_user_id,
            total_candidates,
            excluded
        );

        Ok(DiscoveryOutcome {
            candidates,
            total_candidates,
            excluded,
        })
    }
}

impl std::fmt::Debug for DiscoveryPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryPipeline")
            .field("evaluator", &self.evaluator)
            .finish_non_exhaustive()
    }
}
