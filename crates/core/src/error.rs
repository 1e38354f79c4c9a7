use crate::domain::run::RunState;
use thiserror::Error;

/// Core run errors. Every variant is fatal for the run it occurs in.
///
/// `Display` names the failed step only; the git-level cause is the
/// error's source. Use [`CoreError::detailed`] to print both.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Checkout failed")]
    CheckoutFailed { source: anyhow::Error },

    #[error("Identity configuration failed")]
    IdentityFailed { source: anyhow::Error },

    #[error("Staging failed")]
    StagingFailed { source: anyhow::Error },

    #[error("Commit failed")]
    CommitFailed { source: anyhow::Error },

    #[error("Push to {remote}/{branch} failed")]
    PushFailed {
        remote: String,
        branch: String,
        source: anyhow::Error,
    },

    #[error("Invalid run transition from {from:?}: {reason}")]
    InvalidTransition { from: RunState, reason: String },
}

impl CoreError {
    /// The failed step followed by every cause, joined with `": "`
    pub fn detailed(&self) -> String {
        let mut message = self.to_string();
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            message.push_str(": ");
            message.push_str(&err.to_string());
            cause = err.source();
        }
        message
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
