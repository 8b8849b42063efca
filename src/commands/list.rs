use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use secrecy::SecretString;

use composer_sync::manifest::{BuildMode, PluginReport, PluginStatus};
use composer_sync::models::Settings;
use composer_sync::orchestrator::build_manifest;
use composer_sync::registry::{Classification, HttpProbe};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Site root containing wp-content/
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// GitHub token for internal plugin lookups
    #[arg(long, env = "INPUT_GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

pub async fn list_command(args: ListArgs, settings: &Settings) -> Result<()> {
    let token = SecretString::from(args.token.unwrap_or_default());
    let probe = HttpProbe::new(settings, &token)?;
    let name = super::default_project_name(&args.dir, settings);

    let run = build_manifest(&args.dir, &name, settings, &probe).await?;

    let source = match run.mode {
        BuildMode::Update => "existing composer.json",
        BuildMode::Generate => "no composer.json",
    };
    println!("Plugins in {} ({source}):\n", args.dir.display());

    if run.outcome.report.is_empty() {
        println!("  (none)");
    }
    for entry in &run.outcome.report {
        println!("  {}", describe(entry));
    }

    if !run.outcome.failed.is_empty() {
        println!(
            "\n{} unresolved: {}",
            run.outcome.failed.len(),
            run.outcome.failed.join(", ")
        );
    }

    Ok(())
}

fn describe(entry: &PluginReport) -> String {
    let status = match &entry.status {
        PluginStatus::Ignored => "ignored".dimmed(),
        PluginStatus::Present(package) => format!("required as {package}").as_str().blue(),
        PluginStatus::Classified(Classification::Internal) => "internal".green(),
        PluginStatus::Classified(Classification::Public) => "public".cyan(),
        PluginStatus::Classified(unresolved) => unresolved.to_string().as_str().red(),
    };
    format!("{:<40} {status}", entry.plugin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use composer_sync::registry::UnresolvedReason;

    #[test]
    fn test_describe_plain() {
        colored::control::set_override(false);

        let entry = PluginReport {
            plugin: "akismet".to_string(),
            status: PluginStatus::Present("wpackagist-plugin/akismet".to_string()),
        };
        assert!(describe(&entry).ends_with("required as wpackagist-plugin/akismet"));

        let entry = PluginReport {
            plugin: "mystery".to_string(),
            status: PluginStatus::Classified(Classification::Unresolved(
                UnresolvedReason::NotFound,
            )),
        };
        assert!(describe(&entry).starts_with("mystery "));
        assert!(describe(&entry).ends_with("not found"));
    }
}
