use crate::domain::{identity::Identity, message::CommitMessage};
use anyhow::Result;

/// Port for the version-control operations a run needs.
///
/// An implementation is bound to one working tree.
pub trait GitPort: Send + Sync {
    /// Make the working tree available with full history (clone if needed)
    fn prepare(&self) -> Result<()>;

    /// Set `user.name` / `user.email` for the repository
    fn configure_identity(&self, identity: &Identity) -> Result<()>;

    /// Stage every added, modified and removed path
    fn stage_all(&self) -> Result<()>;

    /// Whether the staged tree differs from HEAD
    fn has_staged_changes(&self) -> Result<bool>;

    /// Name of the branch HEAD points at
    fn current_branch(&self) -> Result<String>;

    /// Commit the staged tree on the current branch, returning the new commit id
    fn commit(&self, identity: &Identity, message: &CommitMessage) -> Result<String>;

    /// Fast-forward push `branch` to `remote`
    fn push(&self, remote: &str, branch: &str) -> Result<()>;
}
