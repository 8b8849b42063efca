use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use composer_sync::config::{Committer, Credentials, RepoCoordinates, branch_from_ref};
use composer_sync::git::Git;
use composer_sync::github::{GitHubClient, HostingApi};
use composer_sync::models::Settings;
use composer_sync::orchestrator::{Orchestrator, Remote, RunSummary};
use composer_sync::registry::HttpProbe;

/// Where fresh clones of the site repository go
const CLONES_DIR: &str = "clones";

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Use an existing checkout instead of cloning the repository
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// GitHub token used for lookups, issues and the pull request
    #[arg(long, env = "INPUT_GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Second token that approves the pull request so it can be merged
    #[arg(long, env = "INPUT_APPROVAL_GITHUB_TOKEN", hide_env_values = true)]
    pub approval_token: Option<String>,

    #[arg(long, env = "INPUT_COMMITTER_USERNAME")]
    pub committer_name: Option<String>,

    #[arg(long, env = "INPUT_COMMITTER_EMAIL")]
    pub committer_email: Option<String>,

    /// Site repository as owner/repo
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: Option<String>,

    /// Ref of the target branch, e.g. refs/heads/main
    #[arg(long = "ref", env = "GITHUB_REF")]
    pub git_ref: Option<String>,
}

impl RunArgs {
    fn committer(&self) -> Option<Committer> {
        let name = self.committer_name.as_deref().filter(|s| !s.is_empty())?;
        let email = self.committer_email.as_deref().filter(|s| !s.is_empty())?;
        Some(Committer {
            name: name.to_string(),
            email: email.to_string(),
        })
    }
}

pub async fn run_command(args: RunArgs, settings: &Settings) -> Result<()> {
    let repo = args
        .repository
        .as_deref()
        .context("No repository given (set GITHUB_REPOSITORY or --repository)")?;
    let repo = RepoCoordinates::parse(repo)?;
    let git_ref = args
        .git_ref
        .as_deref()
        .context("No target branch given (set GITHUB_REF or --ref)")?;
    let base_branch = branch_from_ref(git_ref)?;
    let credentials = Credentials::new(
        args.token.clone().unwrap_or_default(),
        args.approval_token.clone(),
    )?;

    Git::ensure_available()?;
    let git = match &args.dir {
        Some(dir) => Git::open(dir),
        None => {
            let dir = PathBuf::from(CLONES_DIR).join(&repo.name);
            info!("Cloning {repo} ({base_branch}) into {}", dir.display());
            Git::clone_repo(
                &settings.endpoints.github_web,
                &repo,
                &base_branch,
                &credentials.token,
                &dir,
            )
            .await
            .with_context(|| format!("Failed to clone {repo}"))?
        }
    }
    .with_committer(args.committer());

    let probe = HttpProbe::new(settings, &credentials.token)?;
    let api = GitHubClient::new(
        &settings.endpoints.github_api,
        repo.clone(),
        &credentials.token,
    )?;
    let approver = credentials
        .approval_token
        .as_ref()
        .map(|token| GitHubClient::new(&settings.endpoints.github_api, repo.clone(), token))
        .transpose()?;

    let remote = Remote {
        api: &api,
        approver: approver.as_ref().map(|client| client as &dyn HostingApi),
        base_branch,
    };

    let name = repo.to_string();
    let summary = Orchestrator::new(git.dir(), &name, settings, &probe)
        .run(&git, &remote)
        .await?;

    let output_file = std::env::var_os("GITHUB_OUTPUT").map(PathBuf::from);
    write_github_outputs(output_file.as_deref(), &action_outputs(&summary))
}

/// `name=value` pairs reported back to the workflow
fn action_outputs(summary: &RunSummary) -> Vec<(&'static str, String)> {
    let mut outputs = Vec::new();
    if let Some(report) = &summary.publish {
        outputs.push(("pull_request", report.pull_request.to_string()));
    }
    outputs.push(("failed_plugins", summary.failed.join(",")));
    outputs
}

/// Append to the `$GITHUB_OUTPUT` file, or print when not running in Actions
fn write_github_outputs(file: Option<&Path>, outputs: &[(&str, String)]) -> Result<()> {
    let Some(path) = file else {
        for (name, value) in outputs {
            println!("{name}={value}");
        }
        return Ok(());
    };

    let mut file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open $GITHUB_OUTPUT file {}", path.display()))?;
    for (name, value) in outputs {
        writeln!(file, "{name}={value}")?;
    }
    Ok(())
}
