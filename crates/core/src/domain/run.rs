use super::{message::CommitMessage, trigger::Trigger};
use crate::error::{CoreError, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Progress of a single run.
///
/// `Start -> ChangesStaged -> {NoChanges | CommitPushed | Failure}`.
/// Terminal states accept no further transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Start,
    ChangesStaged { changes_exist: bool },
    NoChanges,
    CommitPushed,
    Failure,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::NoChanges | RunState::CommitPushed | RunState::Failure
        )
    }

    /// Record the change detector's verdict
    pub fn staged(self, changes_exist: bool) -> Result<Self> {
        match self {
            RunState::Start => Ok(RunState::ChangesStaged { changes_exist }),
            from => Err(CoreError::InvalidTransition {
                from,
                reason: "changes can only be staged once, at the start of a run".to_string(),
            }),
        }
    }

    /// Close a run whose staged tree matched HEAD
    pub fn no_changes(self) -> Result<Self> {
        match self {
            RunState::ChangesStaged {
                changes_exist: false,
            } => Ok(RunState::NoChanges),
            from => Err(CoreError::InvalidTransition {
                from,
                reason: "only a run with nothing staged can end without a commit".to_string(),
            }),
        }
    }

    /// Close a run after its commit reached the remote
    pub fn commit_pushed(self) -> Result<Self> {
        match self {
            RunState::ChangesStaged {
                changes_exist: true,
            } => Ok(RunState::CommitPushed),
            from => Err(CoreError::InvalidTransition {
                from,
                reason: "a commit is only pushed when staged changes exist".to_string(),
            }),
        }
    }

    /// Any non-terminal state may fail
    pub fn fail(self) -> Self {
        if self.is_terminal() {
            self
        } else {
            RunState::Failure
        }
    }
}

/// Successful end of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// Staged tree matched HEAD; nothing committed or pushed
    NoChanges,
    /// One commit created and pushed
    CommitPushed {
        commit_id: String,
        message: CommitMessage,
        remote: String,
        branch: String,
    },
}

/// Result of one completed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub trigger: Trigger,
    pub started_at: NaiveDateTime,
    pub outcome: RunOutcome,
}

impl RunReport {
    pub fn committed(&self) -> bool {
        matches!(self.outcome, RunOutcome::CommitPushed { .. })
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.outcome {
            RunOutcome::NoChanges => write!(f, "[{}] no changes to commit", self.trigger),
            RunOutcome::CommitPushed {
                commit_id,
                remote,
                branch,
                ..
            } => write!(
                f,
                "[{}] pushed {:.8} to {}/{}",
                self.trigger, commit_id, remote, branch
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_path_reaches_no_changes() {
        let state = RunState::Start.staged(false).unwrap();
        assert_eq!(state, RunState::ChangesStaged { changes_exist: false });
        let state = state.no_changes().unwrap();
        assert!(state.is_terminal());
    }

    #[test]
    fn test_dirty_path_reaches_commit_pushed() {
        let state = RunState::Start.staged(true).unwrap().commit_pushed().unwrap();
        assert_eq!(state, RunState::CommitPushed);
        assert!(state.is_terminal());
    }

    #[test]
    fn test_gate_is_enforced() {
        let clean = RunState::Start.staged(false).unwrap();
        assert!(matches!(
            clean.commit_pushed(),
            Err(CoreError::InvalidTransition { .. })
        ));

        let dirty = RunState::Start.staged(true).unwrap();
        assert!(dirty.no_changes().is_err());
    }

    #[test]
    fn test_terminal_states_reject_transitions() {
        for terminal in [RunState::NoChanges, RunState::CommitPushed, RunState::Failure] {
            assert!(terminal.staged(true).is_err());
            assert!(terminal.no_changes().is_err());
            assert!(terminal.commit_pushed().is_err());
            assert_eq!(terminal.fail(), terminal);
        }
    }

    #[test]
    fn test_fail_from_non_terminal() {
        assert_eq!(RunState::Start.fail(), RunState::Failure);
        assert_eq!(
            RunState::ChangesStaged { changes_exist: true }.fail(),
            RunState::Failure
        );
    }
}
