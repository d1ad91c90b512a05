use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::types::{Approval, ApprovalStatus, Run};
use crate::error::StoreError;

/// Result of a conditional status update.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusTransition {
    /// The status matched and was replaced; carries the updated approval.
    Applied(Approval),
    /// Another caller got there first; carries the status actually found.
    Stale(ApprovalStatus),
    Missing,
}

/// Persistence for approvals and runs.
///
/// `compare_and_set_status` must be atomic: of any number of concurrent
/// callers moving the same approval out of `from`, exactly one observes
/// [`StatusTransition::Applied`].
#[async_trait]
pub trait ApprovalStore: Send + Sync {
    async fn insert_approval(&self, approval: Approval) -> Result<(), StoreError>;

    async fn get_approval(&self, id: Uuid) -> Result<Option<Approval>, StoreError>;

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        from: ApprovalStatus,
        to: ApprovalStatus,
    ) -> Result<StatusTransition, StoreError>;

    async fn insert_run(&self, run: Run) -> Result<(), StoreError>;

    async fn get_run(&self, id: Uuid) -> Result<Option<Run>, StoreError>;

    async fn runs_for_approval(&self, approval_id: Uuid) -> Result<Vec<Run>, StoreError>;
}

#[derive(Default)]
struct Tables {
    approvals: HashMap<Uuid, Approval>,
    runs: HashMap<Uuid, Run>,
}

/// Process-local store. State is lost on restart.
#[derive(Default)]
pub struct InMemoryApprovalStore {
    inner: Mutex<Tables>,
}

impl InMemoryApprovalStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend(anyhow::anyhow!("approval store lock poisoned")))
    }
}

#[async_trait]
impl ApprovalStore for InMemoryApprovalStore {
    async fn insert_approval(&self, approval: Approval) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if tables.approvals.contains_key(&approval.id) {
            return Err(StoreError::Duplicate(approval.id.to_string()));
        }
        tables.approvals.insert(approval.id, approval);
        Ok(())
    }

    async fn get_approval(&self, id: Uuid) -> Result<Option<Approval>, StoreError> {
        Ok(self.lock()?.approvals.get(&id).cloned())
    }

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        from: ApprovalStatus,
        to: ApprovalStatus,
    ) -> Result<StatusTransition, StoreError> {
        let mut tables = self.lock()?;
        let Some(approval) = tables.approvals.get_mut(&id) else {
            return Ok(StatusTransition::Missing);
        };
        if approval.status != from {
            return Ok(StatusTransition::Stale(approval.status));
        }
        approval.status = to;
        Ok(StatusTransition::Applied(approval.clone()))
    }

    async fn insert_run(&self, run: Run) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if tables.runs.contains_key(&run.id) {
            return Err(StoreError::Duplicate(run.id.to_string()));
        }
        tables.runs.insert(run.id, run);
        Ok(())
    }

    async fn get_run(&self, id: Uuid) -> Result<Option<Run>, StoreError> {
        Ok(self.lock()?.runs.get(&id).cloned())
    }

    async fn runs_for_approval(&self, approval_id: Uuid) -> Result<Vec<Run>, StoreError> {
        let mut runs: Vec<Run> = self
            .lock()?
            .runs
            .values()
            .filter(|r| r.approval_id == approval_id)
            .cloned()
            .collect();
        runs.sort_by_key(|r| r.created_at);
        Ok(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ExecutionResult;

    #[tokio::test]
    async fn test_compare_and_set_applies_once() {
        let store = InMemoryApprovalStore::new();
        let approval = Approval::new("m", "ls", "/s");
        let id = approval.id;
        store.insert_approval(approval).await.unwrap();

        let first = store
            .compare_and_set_status(id, ApprovalStatus::Pending, ApprovalStatus::Executed)
            .await
            .unwrap();
        assert!(matches!(first, StatusTransition::Applied(ref a) if a.status == ApprovalStatus::Executed));

        let second = store
            .compare_and_set_status(id, ApprovalStatus::Pending, ApprovalStatus::Rejected)
            .await
            .unwrap();
        assert_eq!(second, StatusTransition::Stale(ApprovalStatus::Executed));
    }

    #[tokio::test]
    async fn test_missing_approval() {
        let store = InMemoryApprovalStore::new();
        let result = store
            .compare_and_set_status(Uuid::new_v4(), ApprovalStatus::Pending, ApprovalStatus::Executed)
            .await
            .unwrap();
        assert_eq!(result, StatusTransition::Missing);
        assert!(store.get_approval(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let store = InMemoryApprovalStore::new();
        let approval = Approval::new("m", "ls", "/s");
        store.insert_approval(approval.clone()).await.unwrap();
        assert!(matches!(
            store.insert_approval(approval).await,
            Err(StoreError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_runs_listed_per_approval() {
        let store = InMemoryApprovalStore::new();
        let approval = Approval::new("m", "ls", "/s");
        let run = Run::record(&approval, ExecutionResult::completed(0, "x".into(), "".into()));
        let other = Run::record(
            &Approval::new("m", "ls", "/s"),
            ExecutionResult::completed(1, "".into(), "y".into()),
        );
        store.insert_run(run.clone()).await.unwrap();
        store.insert_run(other).await.unwrap();

        assert_eq!(store.runs_for_approval(approval.id).await.unwrap(), vec![run.clone()]);
        assert_eq!(store.get_run(run.id).await.unwrap(), Some(run));
    }
}
