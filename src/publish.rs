//! Landing the manifest change as a pull request
//!
//! Publishing is a fixed sequence of steps. The first two always run; the
//! last three only run when a second identity is available to approve the
//! pull request. A failing step stops the sequence and nothing is rolled back.

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::github::HostingApi;
use crate::models::DelaySettings;

/// The local checkout the manifest was written into
#[async_trait]
pub trait WorkingTree: Send + Sync {
    /// Whether anything differs from the checked out commit
    async fn has_changes(&self) -> Result<bool>;

    /// Commit all changes on a new branch and push it
    async fn push_branch(&self, branch: &str, message: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStep {
    PushBranch,
    OpenPullRequest,
    Approve,
    Merge,
    DeleteBranch,
}

impl PublishStep {
    /// The step after this one; `auto_merge` enables the approval tail
    pub fn next(self, auto_merge: bool) -> Option<Self> {
        match self {
            PublishStep::PushBranch => Some(PublishStep::OpenPullRequest),
            PublishStep::OpenPullRequest if auto_merge => Some(PublishStep::Approve),
            PublishStep::OpenPullRequest => None,
            PublishStep::Approve => Some(PublishStep::Merge),
            PublishStep::Merge => Some(PublishStep::DeleteBranch),
            PublishStep::DeleteBranch => None,
        }
    }
}

/// How long to wait before a step, giving the hosting API time to catch up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DelayPolicy {
    pub before_approve: Duration,
    pub before_merge: Duration,
    pub before_delete_branch: Duration,
}

impl DelayPolicy {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn before(&self, step: PublishStep) -> Duration {
        match step {
            PublishStep::Approve => self.before_approve,
            PublishStep::Merge => self.before_merge,
            PublishStep::DeleteBranch => self.before_delete_branch,
            PublishStep::PushBranch | PublishStep::OpenPullRequest => Duration::ZERO,
        }
    }
}

impl From<DelaySettings> for DelayPolicy {
    fn from(delays: DelaySettings) -> Self {
        Self {
            before_approve: Duration::from_millis(delays.approve_ms),
            before_merge: Duration::from_millis(delays.merge_ms),
            before_delete_branch: Duration::from_millis(delays.delete_branch_ms),
        }
    }
}

/// What to publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishPlan {
    pub branch: String,
    pub base: String,
    /// Used as commit message, pull request title and squash commit title
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub pull_request: u64,
    pub completed: Vec<PublishStep>,
}

impl PublishReport {
    pub fn merged(&self) -> bool {
        self.completed.contains(&PublishStep::Merge)
    }
}

pub struct Publisher<'a> {
    tree: &'a dyn WorkingTree,
    api: &'a dyn HostingApi,
    approver: Option<&'a dyn HostingApi>,
    delays: DelayPolicy,
}

impl<'a> Publisher<'a> {
    pub fn new(tree: &'a dyn WorkingTree, api: &'a dyn HostingApi) -> Self {
        Self {
            tree,
            api,
            approver: None,
            delays: DelayPolicy::none(),
        }
    }

    /// Approve with a second identity, then merge and clean up
    pub fn with_approver(mut self, approver: Option<&'a dyn HostingApi>) -> Self {
        self.approver = approver;
        self
    }

    pub fn with_delays(mut self, delays: DelayPolicy) -> Self {
        self.delays = delays;
        self
    }

    /// The steps this publisher will run, in order
    pub fn steps(&self) -> Vec<PublishStep> {
        let auto_merge = self.approver.is_some();
        std::iter::successors(Some(PublishStep::PushBranch), |step| step.next(auto_merge))
            .collect()
    }

    pub async fn publish(&self, plan: &PublishPlan) -> Result<PublishReport> {
        let mut pull_request = 0;
        let mut completed = Vec::new();

        for step in self.steps() {
            let delay = self.delays.before(step);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match step {
                PublishStep::PushBranch => {
                    info!("Pushing to {}.", plan.branch);
                    self.tree.push_branch(&plan.branch, &plan.message).await?;
                }
                PublishStep::OpenPullRequest => {
                    info!("Creating Pull request");
                    pull_request = self
                        .api
                        .create_pull_request(&plan.message, &plan.branch, &plan.base)
                        .await?;
                }
                PublishStep::Approve => {
                    info!("Approve Pull request");
                    if let Some(approver) = self.approver {
                        approver.approve_pull_request(pull_request).await?;
                    }
                }
                PublishStep::Merge => {
                    info!("Merge Pull request");
                    self.api
                        .merge_pull_request(pull_request, &plan.message)
                        .await?;
                }
                PublishStep::DeleteBranch => {
                    info!("Delete branch: {}.", plan.branch);
                    self.api
                        .delete_ref(&format!("heads/{}", plan.branch))
                        .await?;
                }
            }
            completed.push(step);
        }

        Ok(PublishReport {
            pull_request,
            completed,
        })
    }
}
