use crate::domain::{
    identity::Identity,
    message::CommitMessage,
    run::{RunOutcome, RunReport, RunState},
    trigger::Trigger,
};
use crate::error::{CoreError, Result};
use crate::ports::{Clock, GitPort};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Settings a run needs besides its ports
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub identity: Identity,
    pub remote: String,
    /// Branch that must be checked out; `None` accepts whatever HEAD points at
    pub branch: Option<String>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            identity: Identity::default(),
            remote: "origin".to_string(),
            branch: None,
        }
    }
}

/// Drives one run: checkout, identity, change detection, conditional
/// commit and push. Every failure is fatal and nothing is retried.
pub struct AutoCommitter {
    git: Arc<dyn GitPort>,
    clock: Arc<dyn Clock>,
    settings: RunSettings,
}

impl AutoCommitter {
    pub fn new(git: Arc<dyn GitPort>, clock: Arc<dyn Clock>, settings: RunSettings) -> Self {
        Self {
            git,
            clock,
            settings,
        }
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Run once. The trigger is reported but does not influence the run.
    pub fn run(&self, trigger: Trigger) -> Result<RunReport> {
        let started_at = self.clock.now();
        info!("Starting auto-commit run (trigger: {})", trigger);

        let mut state = RunState::Start;
        match self.drive(&mut state) {
            Ok(outcome) => {
                let report = RunReport {
                    trigger,
                    started_at,
                    outcome,
                };
                info!("Run finished in state {:?}: {}", state, report);
                Ok(report)
            }
            Err(e) => {
                state = state.fail();
                error!("Run finished in state {:?}: {}", state, e.detailed());
                Err(e)
            }
        }
    }

    fn drive(&self, state: &mut RunState) -> Result<RunOutcome> {
        self.git
            .prepare()
            .map_err(|source| CoreError::CheckoutFailed { source })?;

        debug!("Configuring identity {}", self.settings.identity);
        self.git
            .configure_identity(&self.settings.identity)
            .map_err(|source| CoreError::IdentityFailed { source })?;

        let changes_exist = self.detect_changes()?;
        *state = state.staged(changes_exist)?;

        if !changes_exist {
            info!("Staged tree matches HEAD, nothing to commit");
            *state = state.no_changes()?;
            return Ok(RunOutcome::NoChanges);
        }

        let outcome = self.commit_and_push()?;
        *state = state.commit_pushed()?;
        Ok(outcome)
    }

    fn detect_changes(&self) -> Result<bool> {
        self.git
            .stage_all()
            .map_err(|source| CoreError::StagingFailed { source })?;
        let changes_exist = self
            .git
            .has_staged_changes()
            .map_err(|source| CoreError::StagingFailed { source })?;
        debug!("changes_exist = {}", changes_exist);
        Ok(changes_exist)
    }

    fn commit_and_push(&self) -> Result<RunOutcome> {
        let branch = self
            .git
            .current_branch()
            .map_err(|source| CoreError::CommitFailed { source })?;
        if let Some(expected) = &self.settings.branch {
            if *expected != branch {
                return Err(CoreError::CommitFailed {
                    source: anyhow::anyhow!(
                        "checked out branch '{}' is not the configured branch '{}'",
                        branch,
                        expected
                    ),
                });
            }
        }

        let message = CommitMessage::at(self.clock.now());
        let commit_id = self
            .git
            .commit(&self.settings.identity, &message)
            .map_err(|source| CoreError::CommitFailed { source })?;
        info!("Created commit {:.8}: {}", commit_id, message);

        let remote = self.settings.remote.clone();
        self.git
            .push(&remote, &branch)
            .map_err(|source| CoreError::PushFailed {
                remote: remote.clone(),
                branch: branch.clone(),
                source,
            })?;
        info!("Pushed {} to {}", branch, remote);

        Ok(RunOutcome::CommitPushed {
            commit_id,
            message,
            remote,
            branch,
        })
    }
}
