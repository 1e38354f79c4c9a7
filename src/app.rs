use autocommit_core::ports::SystemClock;
use autocommit_core::AutoCommitter;
use std::sync::Arc;

use crate::config::Config;
use crate::git::GitAdapter;

/// Build the git adapter described by `config`
pub fn git_adapter(config: &Config) -> GitAdapter {
    GitAdapter::new(config.resolved_repo_path())
        .with_clone_url(config.clone_url.clone())
        .with_token_env(config.token_env.clone())
}

/// Build a committer backed by git2 and the system clock
pub fn build_committer(config: &Config) -> AutoCommitter {
    AutoCommitter::new(
        Arc::new(git_adapter(config)),
        Arc::new(SystemClock),
        config.run_settings(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_build_committer_uses_config_settings() {
        let config = Config {
            repo_path: PathBuf::from("/srv/data"),
            remote: "upstream".to_string(),
            branch: Some("main".to_string()),
            ..Config::default()
        };

        let adapter = git_adapter(&config);
        assert_eq!(adapter.workdir(), PathBuf::from("/srv/data").as_path());

        let committer = build_committer(&config);
        assert_eq!(committer.settings(), &config.run_settings());
    }
}
