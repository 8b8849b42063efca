use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use secrecy::SecretString;
use tracing::{info, warn};

use composer_sync::manifest::store;
use composer_sync::models::Settings;
use composer_sync::orchestrator::build_manifest;
use composer_sync::registry::HttpProbe;

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Site root containing wp-content/
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Project name for a new composer.json (owner/repo)
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub name: Option<String>,

    /// Print the manifest instead of writing it
    #[arg(long)]
    pub dry_run: bool,

    /// GitHub token for internal plugin lookups
    #[arg(long, env = "INPUT_GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

pub async fn generate_command(args: GenerateArgs, settings: &Settings) -> Result<()> {
    let name = args
        .name
        .clone()
        .unwrap_or_else(|| super::default_project_name(&args.dir, settings));
    let token = SecretString::from(args.token.unwrap_or_default());
    let probe = HttpProbe::new(settings, &token)?;

    let run = build_manifest(&args.dir, &name, settings, &probe).await?;
    for plugin in &run.outcome.failed {
        warn!("Failed getting plugin for Composer: {plugin}");
    }

    if args.dry_run {
        println!("{}", store::render(&run.outcome.manifest)?);
    } else {
        let path = store::store(&args.dir, &run.outcome.manifest)?;
        info!("Wrote {}", path.display());
    }

    Ok(())
}
