use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use uuid::Uuid;

use super::store::{ApprovalStore, StatusTransition};
use super::types::{Approval, ApprovalStatus, Run};
use crate::error::ApprovalError;
use crate::executor::CommandExecutor;

/// Drives approvals from `pending` to a terminal status.
///
/// Execution is single-shot: the store's compare-and-set claims the approval
/// before the executor runs, so concurrent callers for the same id see
/// exactly one success and conflicts for everyone else.
#[derive(Clone)]
pub struct ApprovalService {
    store: Arc<dyn ApprovalStore>,
    executor: Arc<dyn CommandExecutor>,
    timeout: Duration,
}

impl ApprovalService {
    pub fn new(
        store: Arc<dyn ApprovalStore>,
        executor: Arc<dyn CommandExecutor>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            executor,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn create(
        &self,
        message: &str,
        command: &str,
        cwd: impl Into<PathBuf>,
    ) -> Result<Approval, ApprovalError> {
        let approval = Approval::new(message, command, cwd);
        self.store.insert_approval(approval.clone()).await?;
        info!(
            approval_id = %approval.id,
            command = %approval.proposed_command,
            cwd = %approval.cwd.display(),
            "approval created"
        );
        Ok(approval)
    }

    pub async fn get(&self, id: Uuid) -> Result<Approval, ApprovalError> {
        self.store
            .get_approval(id)
            .await?
            .ok_or(ApprovalError::NotFound)
    }

    pub async fn get_run(&self, id: Uuid) -> Result<Run, ApprovalError> {
        self.store.get_run(id).await?.ok_or(ApprovalError::RunNotFound)
    }

    pub async fn runs_for(&self, approval_id: Uuid) -> Result<Vec<Run>, ApprovalError> {
        Ok(self.store.runs_for_approval(approval_id).await?)
    }

    /// Runs the approved command and records its outcome.
    pub async fn execute(&self, id: Uuid) -> Result<Run, ApprovalError> {
        let approval = self
            .transition(id, ApprovalStatus::Executed)
            .await?;

        info!(
            approval_id = %id,
            command = %approval.proposed_command,
            cwd = %approval.cwd.display(),
            "executing approved command"
        );

        // once claimed, the run must be recorded even if the caller goes away
        let store = Arc::clone(&self.store);
        let executor = Arc::clone(&self.executor);
        let timeout = self.timeout;
        let task = tokio::spawn(async move {
            let result = executor
                .execute(&approval.proposed_command, &approval.cwd, timeout)
                .await;
            let run = Run::record(&approval, result);
            store.insert_run(run.clone()).await.map(|()| run)
        });

        let run = match task.await {
            Ok(Ok(run)) => run,
            Ok(Err(e)) => {
                error!(approval_id = %id, error = %e, "failed to persist run");
                return Err(e.into());
            }
            Err(e) => {
                error!(approval_id = %id, error = %e, "execution task failed");
                return Err(ApprovalError::Execution(e.to_string()));
            }
        };
        info!(
            approval_id = %id,
            run_id = %run.id,
            returncode = run.returncode,
            ok = run.ok,
            "run recorded"
        );
        Ok(run)
    }

    pub async fn reject(&self, id: Uuid) -> Result<Approval, ApprovalError> {
        let approval = self.transition(id, ApprovalStatus::Rejected).await?;
        info!(approval_id = %id, "approval rejected");
        Ok(approval)
    }

    async fn transition(&self, id: Uuid, to: ApprovalStatus) -> Result<Approval, ApprovalError> {
        match self
            .store
            .compare_and_set_status(id, ApprovalStatus::Pending, to)
            .await?
        {
            StatusTransition::Applied(approval) => Ok(approval),
            StatusTransition::Stale(status) => {
                warn!(approval_id = %id, %status, requested = %to, "approval already processed");
                Err(ApprovalError::Conflict { status })
            }
            StatusTransition::Missing => Err(ApprovalError::NotFound),
        }
    }
}
