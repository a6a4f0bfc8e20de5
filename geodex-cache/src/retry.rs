//! Re-enrichment retry scheduling.
//!
//! A pure decision over the enrichment metadata embedded in the record:
//! no scheduler-side state, so the policy survives restarts with the data.

use chrono::{DateTime, Utc};

use geodex_core::{EnrichmentMetadata, RetryPolicy};

/// Decides whether an incomplete record is due for another enrichment run.
#[derive(Debug, Clone, Default)]
pub struct RetryScheduler {
    policy: RetryPolicy,
}

impl RetryScheduler {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Whether a retry should run at `now`.
    ///
    /// Ceiling first: once `retry_count` reaches the maximum the record is
    /// permanently incomplete until manual invalidation. A record with no
    /// recorded attempt (including one whose persisted timestamp failed to
    /// parse) always retries - the policy fails open.
    pub fn should_retry(&self, metadata: &EnrichmentMetadata, now: DateTime<Utc>) -> bool {
        if metadata.retry_count >= self.policy.max_retries {
            return false;
        }
        let Some(last_attempt) = metadata.last_attempt else {
            return true;
        };
        now >= last_attempt + self.policy.backoff_for(metadata.retry_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn metadata(retry_count: u32, last_attempt: Option<DateTime<Utc>>) -> EnrichmentMetadata {
        EnrichmentMetadata {
            last_attempt,
            retry_count,
            discovered_count: 0,
            discovery_success: false,
        }
    }

    #[test]
    fn test_never_attempted_retries_immediately() {
        let scheduler = RetryScheduler::default();
        assert!(scheduler.should_retry(&metadata(0, None), Utc::now()));
    }

    #[test]
    fn test_ceiling_blocks_retries() {
        let scheduler = RetryScheduler::default();
        let now = Utc::now();
        // Even with an ancient last attempt, the ceiling wins.
        let old = now - Duration::days(365);
        assert!(!scheduler.should_retry(&metadata(3, Some(old)), now));
        assert!(!scheduler.should_retry(&metadata(10, None), now));
    }

    #[test]
    fn test_backoff_boundaries() {
        let scheduler = RetryScheduler::default();
        let last = Utc::now();
        let schedule = [(0u32, 5i64), (1, 30), (2, 120)];

        for (count, minutes) in schedule {
            let meta = metadata(count, Some(last));
            // Just inside the window: blocked.
            assert!(
                !scheduler.should_retry(&meta, last + Duration::minutes(minutes) - Duration::seconds(1)),
                "retry_count={count} should be blocked inside the window"
            );
            // Exactly at the boundary: due.
            assert!(
                scheduler.should_retry(&meta, last + Duration::minutes(minutes)),
                "retry_count={count} should be due at the boundary"
            );
        }
    }

    #[test]
    fn test_at_last_attempt_instant_is_blocked() {
        let scheduler = RetryScheduler::default();
        let last = Utc::now();
        assert!(!scheduler.should_retry(&metadata(0, Some(last)), last));
    }
}
