use anyhow::{bail, Context, Result};
use autocommit_core::ports::GitPort;
use autocommit_core::{CommitMessage, Identity};
use git2::{
    build::RepoBuilder, Cred, CredentialType, ErrorCode, FetchOptions, Index, IndexAddOption,
    IndexEntry, IndexMatchedPath, IndexTime, PushOptions, RemoteCallbacks, Repository as GitRepository, Signature,
};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// HTTPS user name paired with a token
const TOKEN_USER: &str = "x-access-token";

/// libgit2 re-invokes the credential callback after a rejected attempt
const MAX_CREDENTIAL_ATTEMPTS: u32 = 3;

/// Index mode of a commit embedded from another repository
const GITLINK_MODE: u32 = 0o160000;

/// Git adapter that implements GitPort using git2, bound to one working tree
pub struct GitAdapter {
    workdir: PathBuf,
    clone_url: Option<String>,
    token_env: String,
}

impl GitAdapter {
    pub fn new<P: AsRef<Path>>(workdir: P) -> Self {
        Self {
            workdir: workdir.as_ref().to_path_buf(),
            clone_url: None,
            token_env: crate::config::DEFAULT_TOKEN_ENV.to_string(),
        }
    }

    /// Clone `url` into the working tree when it holds no repository
    pub fn with_clone_url(mut self, url: Option<String>) -> Self {
        self.clone_url = url;
        self
    }

    /// Environment variable the push token is read from
    pub fn with_token_env(mut self, name: impl Into<String>) -> Self {
        self.token_env = name.into();
        self
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn open_repo(&self) -> Result<GitRepository> {
        GitRepository::open(&self.workdir).with_context(|| {
            format!(
                "Failed to open git repository at {}",
                self.workdir.display()
            )
        })
    }

    fn callbacks<'a>(&self) -> RemoteCallbacks<'a> {
        let token = std::env::var(&self.token_env).ok().filter(|t| !t.is_empty());
        let mut attempts = 0;

        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(move |url, username_from_url, allowed| {
            attempts += 1;
            if attempts > MAX_CREDENTIAL_ATTEMPTS {
                return Err(git2::Error::from_str("authentication failed"));
            }

            if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
                if let Some(token) = &token {
                    return Cred::userpass_plaintext(TOKEN_USER, token);
                }
            }
            if allowed.contains(CredentialType::SSH_KEY) {
                return Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"));
            }
            if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
                let config = git2::Config::open_default()?;
                return Cred::credential_helper(&config, url, username_from_url);
            }
            Cred::default()
        });
        callbacks
    }

    /// Record the nested repository at `path` as a gitlink pointing at its
    /// HEAD, the way `git add` embeds a repository. Skipped when it has no
    /// commit yet.
    fn stage_gitlink(&self, index: &mut Index, path: &Path) -> Result<()> {
        let Some(name) = path.to_str().map(|p| p.trim_end_matches('/')) else {
            warn!("Skipping nested repository with non UTF-8 path {}", path.display());
            return Ok(());
        };
        let nested_path = self.workdir.join(name);
        let nested = GitRepository::open(&nested_path).with_context(|| {
            format!("Failed to open nested repository {}", nested_path.display())
        })?;
        let Some(id) = nested.head().ok().and_then(|head| head.target()) else {
            warn!("Skipping nested repository {} without a commit", name);
            return Ok(());
        };

        debug!("Staging nested repository {} at {}", name, id);
        index
            .add(&IndexEntry {
                ctime: IndexTime::new(0, 0),
                mtime: IndexTime::new(0, 0),
                dev: 0,
                ino: 0,
                mode: GITLINK_MODE,
                uid: 0,
                gid: 0,
                file_size: 0,
                id,
                flags: 0,
                flags_extended: 0,
                path: name.as_bytes().to_vec(),
            })
            .with_context(|| format!("Failed to stage nested repository {}", name))
    }

    fn clone_into_workdir(&self, url: &str) -> Result<()> {
        info!("Cloning {} into {}", url, self.workdir.display());

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(self.callbacks());

        RepoBuilder::new()
            .fetch_options(fetch_options)
            .clone(url, &self.workdir)
            .with_context(|| format!("Failed to clone {}", url))?;
        Ok(())
    }
}

impl GitPort for GitAdapter {
    fn prepare(&self) -> Result<()> {
        match GitRepository::open(&self.workdir) {
            Ok(git_repo) => {
                if git_repo.is_bare() {
                    bail!(
                        "Repository at {} is bare and has no working tree",
                        self.workdir.display()
                    );
                }
                if git_repo.is_shallow() {
                    bail!(
                        "Repository at {} is a shallow clone; full history is required",
                        self.workdir.display()
                    );
                }
                debug!("Using existing checkout at {}", self.workdir.display());
                Ok(())
            }
            Err(e) if e.code() == ErrorCode::NotFound => match &self.clone_url {
                Some(url) => self.clone_into_workdir(url),
                None => bail!(
                    "No git repository at {} and no clone URL configured",
                    self.workdir.display()
                ),
            },
            Err(e) => Err(e).with_context(|| {
                format!(
                    "Failed to open git repository at {}",
                    self.workdir.display()
                )
            }),
        }
    }

    fn configure_identity(&self, identity: &Identity) -> Result<()> {
        let git_repo = self.open_repo()?;
        let mut config = git_repo.config().context("Failed to open repository config")?;

        config
            .set_str("user.name", &identity.name)
            .context("Failed to set user.name")?;
        config
            .set_str("user.email", &identity.email)
            .context("Failed to set user.email")?;
        Ok(())
    }

    fn stage_all(&self) -> Result<()> {
        let git_repo = self.open_repo()?;
        let mut index = git_repo.index().context("Failed to read index")?;

        // libgit2 cannot add a nested repository as a plain directory, so
        // those are set aside here and recorded as gitlinks below
        let mut nested = Vec::new();
        let mut skip_nested = |path: &Path, _: &[u8]| -> i32 {
            if self.workdir.join(path).join(".git").exists() {
                nested.push(path.to_path_buf());
                1
            } else {
                0
            }
        };

        // add_all picks up new and modified paths, update_all drops removed ones
        index
            .add_all(
                ["*"],
                IndexAddOption::DEFAULT,
                Some(&mut skip_nested as &mut IndexMatchedPath),
            )
            .context("Failed to stage working tree")?;
        index
            .update_all(["*"], Some(&mut skip_nested as &mut IndexMatchedPath))
            .context("Failed to stage removed paths")?;

        nested.sort();
        nested.dedup();
        for path in &nested {
            self.stage_gitlink(&mut index, path)?;
        }

        index.write().context("Failed to write index")?;
        Ok(())
    }

    fn has_staged_changes(&self) -> Result<bool> {
        let git_repo = self.open_repo()?;
        let index = git_repo.index().context("Failed to read index")?;

        let head_tree = match git_repo.head() {
            Ok(head) => Some(head.peel_to_tree().context("Failed to read HEAD tree")?),
            Err(e) if e.code() == ErrorCode::UnbornBranch => None,
            Err(e) => return Err(e).context("Failed to resolve HEAD"),
        };

        let Some(head_tree) = head_tree else {
            // Unborn branch: anything staged is new
            return Ok(!index.is_empty());
        };

        let diff = git_repo
            .diff_tree_to_index(Some(&head_tree), Some(&index), None)
            .context("Failed to diff index against HEAD")?;
        Ok(diff.deltas().count() > 0)
    }

    fn current_branch(&self) -> Result<String> {
        let git_repo = self.open_repo()?;
        let head = git_repo.head();

        match head {
            Ok(head) => {
                if !head.is_branch() {
                    bail!("HEAD is detached; cannot determine the branch to push");
                }
                head.shorthand()
                    .map(|s| s.to_string())
                    .context("Branch name is not valid UTF-8")
            }
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                let head = git_repo.find_reference("HEAD")?;
                let target = head
                    .symbolic_target()
                    .context("HEAD is not a symbolic reference")?;
                Ok(target.trim_start_matches("refs/heads/").to_string())
            }
            Err(e) => Err(e).context("Failed to resolve HEAD"),
        }
    }

    fn commit(&self, identity: &Identity, message: &CommitMessage) -> Result<String> {
        let git_repo = self.open_repo()?;
        let signature = Signature::now(&identity.name, &identity.email)
            .context("Failed to build commit signature")?;

        let mut index = git_repo.index().context("Failed to read index")?;
        let tree_id = index.write_tree().context("Failed to write tree")?;
        let tree = git_repo.find_tree(tree_id)?;

        let parent = match git_repo.head() {
            Ok(head) => Some(head.peel_to_commit().context("Failed to read HEAD commit")?),
            Err(e) if e.code() == ErrorCode::UnbornBranch => None,
            Err(e) => return Err(e).context("Failed to resolve HEAD"),
        };

        if let Some(parent) = &parent {
            if parent.tree_id() == tree_id {
                bail!("Nothing to commit: staged tree matches HEAD");
            }
        }

        let parents: Vec<&git2::Commit> = parent.iter().collect();
        let oid = git_repo
            .commit(
                Some("HEAD"),
                &signature,
                &signature,
                message.as_str(),
                &tree,
                &parents,
            )
            .context("Failed to create commit")?;

        Ok(oid.to_string())
    }

    fn push(&self, remote: &str, branch: &str) -> Result<()> {
        let git_repo = self.open_repo()?;
        let mut remote_obj = git_repo
            .find_remote(remote)
            .with_context(|| format!("Remote '{}' not found", remote))?;

        let rejected: RefCell<Option<String>> = RefCell::new(None);
        let mut callbacks = self.callbacks();
        callbacks.push_update_reference(|refname, status| {
            if let Some(status) = status {
                *rejected.borrow_mut() = Some(format!("{}: {}", refname, status));
            }
            Ok(())
        });

        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);

        let refspec = format!("refs/heads/{0}:refs/heads/{0}", branch);
        remote_obj
            .push(&[refspec.as_str()], Some(&mut push_options))
            .with_context(|| format!("Failed to push {} to {}", branch, remote))?;

        let rejection = rejected.borrow_mut().take();
        if let Some(reason) = rejection {
            warn!("Remote rejected update: {}", reason);
            bail!("Remote rejected {}", reason);
        }
        Ok(())
    }
}
