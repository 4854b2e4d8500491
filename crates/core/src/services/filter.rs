//! Duplicate and bot filtering for incoming submissions.

use collexo_common::{AppError, AppResult};
use collexo_db::repositories::FormResponseRepository;

/// Why a submission was turned away by the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    DuplicateSubmission,
}

impl From<RejectReason> for AppError {
    fn from(reason: RejectReason) -> Self {
        match reason {
            RejectReason::DuplicateSubmission => Self::DuplicateSubmission,
        }
    }
}

/// Decision of [`SubmissionFilter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Continue with field processing.
    Proceed,
    /// Report success but store nothing.
    SilentAccept,
    /// Refuse the submission.
    Reject(RejectReason),
}

/// Filters out repeat submitters and honeypot hits.
#[derive(Clone)]
pub struct SubmissionFilter {
    response_repo: FormResponseRepository,
}

impl SubmissionFilter {
    /// Create a new submission filter.
    #[must_use]
    pub const fn new(response_repo: FormResponseRepository) -> Self {
        Self { response_repo }
    }

    /// Classify a submission before its fields are looked at.
    ///
    /// A filled honeypot wins over everything and skips the lookup.
    pub async fn check(
        &self,
        form_id: &str,
        submitter_email: &str,
        honeypot_value: Option<&str>,
    ) -> AppResult<Verdict> {
        if honeypot_value.is_some_and(|v| !v.is_empty()) {
            return Ok(Verdict::SilentAccept);
        }

        if self.response_repo.exists(form_id, submitter_email).await? {
            return Ok(Verdict::Reject(RejectReason::DuplicateSubmission));
        }

        Ok(Verdict::Proceed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn filter_with_count(count: i64) -> SubmissionFilter {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(count))
                }]])
                .into_connection(),
        );
        SubmissionFilter::new(FormResponseRepository::new(db))
    }

    #[tokio::test]
    async fn test_duplicate_is_rejected() {
        let filter = filter_with_count(1);
        let verdict = filter.check("5", "a@b.com", None).await.unwrap();
        assert_eq!(verdict, Verdict::Reject(RejectReason::DuplicateSubmission));
    }

    #[tokio::test]
    async fn test_first_submission_proceeds() {
        let filter = filter_with_count(0);
        let verdict = filter.check("5", "a@b.com", Some("")).await.unwrap();
        assert_eq!(verdict, Verdict::Proceed);
    }

    #[tokio::test]
    async fn test_honeypot_skips_lookup() {
        // No query results queued: a lookup would fail.
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let filter = SubmissionFilter::new(FormResponseRepository::new(db));

        let verdict = filter.check("5", "a@b.com", Some("filled")).await.unwrap();
        assert_eq!(verdict, Verdict::SilentAccept);
    }
}
