//! Local git operations, run through the `git` binary

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::process::Command;
use tracing::debug;

use crate::config::{Committer, RepoCoordinates};
use crate::error::{Result, SyncError};
use crate::publish::WorkingTree;

/// A checkout of the site repository
pub struct Git {
    dir: PathBuf,
    committer: Option<Committer>,
    /// Masked out of any error output
    secret: Option<SecretString>,
}

impl Git {
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            committer: None,
            secret: None,
        }
    }

    pub fn with_committer(mut self, committer: Option<Committer>) -> Self {
        self.committer = committer;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Fail early when git is not installed
    pub fn ensure_available() -> Result<PathBuf> {
        which::which("git").map_err(|e| SyncError::Git {
            command: "lookup".to_string(),
            stderr: e.to_string(),
        })
    }

    /// Clone `repo` at `branch` into `dir`, authenticating with `token`
    pub async fn clone_repo(
        github_web: &str,
        repo: &RepoCoordinates,
        branch: &str,
        token: &SecretString,
        dir: &Path,
    ) -> Result<Self> {
        let url = authenticated_url(github_web, repo, token);
        let secret = SecretString::from(token.expose_secret().to_string());
        Self::clone_from(&url, branch, dir, Some(secret)).await
    }

    /// Clone `url` at `branch` into `dir`.
    ///
    /// A relative `dir` is resolved against the current directory before git
    /// runs, so [`Git::dir`] always names the checkout.
    pub async fn clone_from(
        url: &str,
        branch: &str,
        dir: &Path,
        secret: Option<SecretString>,
    ) -> Result<Self> {
        let dir = std::path::absolute(dir).map_err(|e| SyncError::io(dir, e))?;
        let parent = dir.parent().unwrap_or(&dir).to_path_buf();
        std::fs::create_dir_all(&parent).map_err(|e| SyncError::io(&parent, e))?;

        let git = Self {
            dir,
            committer: None,
            secret,
        };
        let target = git.dir.to_string_lossy().into_owned();
        git.run_in(
            &parent,
            &["clone", "--branch", branch, "--single-branch", url, &target],
        )
        .await?;
        Ok(git)
    }

    /// Whether the working tree differs from HEAD, untracked files included
    pub async fn has_changes(&self) -> Result<bool> {
        let status = self.run(&["status", "--porcelain"]).await?;
        Ok(!status.trim().is_empty())
    }

    pub async fn create_branch(&self, branch: &str) -> Result<()> {
        self.run(&["checkout", "-b", branch]).await?;
        Ok(())
    }

    /// Stage everything and commit
    pub async fn commit_all(&self, message: &str) -> Result<()> {
        self.run(&["add", "--all"]).await?;

        let mut args: Vec<String> = Vec::new();
        if let Some(committer) = &self.committer {
            args.push("-c".to_string());
            args.push(format!("user.name={}", committer.name));
            args.push("-c".to_string());
            args.push(format!("user.email={}", committer.email));
        }
        args.extend(["commit", "--message", message].map(str::to_string));

        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(&args).await?;
        Ok(())
    }

    pub async fn push(&self, branch: &str) -> Result<()> {
        self.run(&["push", "--set-upstream", "origin", branch]).await?;
        Ok(())
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        self.run_in(&self.dir, args).await
    }

    async fn run_in(&self, cwd: &Path, args: &[&str]) -> Result<String> {
        let command = self.redact(&args.join(" "));
        debug!("git {command}");

        let output = Command::new("git")
            .args(args)
            .current_dir(cwd)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .await
            .map_err(|e| SyncError::Git {
                command: command.clone(),
                stderr: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SyncError::Git {
                command,
                stderr: self.redact(stderr.trim()),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn redact(&self, text: &str) -> String {
        match &self.secret {
            Some(secret) if !secret.expose_secret().is_empty() => {
                text.replace(secret.expose_secret(), "***")
            }
            _ => text.to_string(),
        }
    }
}

#[async_trait]
impl WorkingTree for Git {
    async fn has_changes(&self) -> Result<bool> {
        Git::has_changes(self).await
    }

    async fn push_branch(&self, branch: &str, message: &str) -> Result<()> {
        self.create_branch(branch).await?;
        self.commit_all(message).await?;
        self.push(branch).await
    }
}

/// HTTPS remote carrying the token as credentials
pub fn authenticated_url(github_web: &str, repo: &RepoCoordinates, token: &SecretString) -> String {
    let base = github_web.trim_end_matches('/');
    let (scheme, host) = base.split_once("://").unwrap_or(("https", base));
    format!(
        "{scheme}://x-access-token:{}@{host}/{}/{}.git",
        token.expose_secret(),
        repo.owner,
        repo.name
    )
}
