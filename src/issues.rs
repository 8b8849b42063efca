//! One GitHub issue per plugin that could not be resolved

use minijinja::{Environment, UndefinedBehavior, context};
use tracing::info;

use crate::defaults::ISSUE_BODY_TEMPLATE;
use crate::error::{Result, SyncError};
use crate::github::{HostingApi, NewIssue};
use crate::models::IssueSettings;

pub struct IssueFiler<'a> {
    env: Environment<'a>,
    labels: Vec<String>,
}

impl<'a> IssueFiler<'a> {
    pub fn new(settings: &'a IssueSettings) -> Result<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);

        let body = settings.body.as_deref().unwrap_or(ISSUE_BODY_TEMPLATE);
        env.add_template("title", &settings.title)
            .map_err(|source| template_error("issue title", source))?;
        env.add_template("body", body)
            .map_err(|source| template_error("issue body", source))?;

        Ok(Self {
            env,
            labels: settings.labels.clone(),
        })
    }

    /// The issue describing `plugin`
    pub fn issue_for(&self, plugin: &str) -> Result<NewIssue> {
        let render = |name: &str| {
            self.env
                .get_template(name)
                .and_then(|template| template.render(context! { plugin }))
                .map_err(|source| template_error(&format!("issue {name}"), source))
        };

        Ok(NewIssue {
            title: render("title")?,
            body: render("body")?,
            labels: self.labels.clone(),
        })
    }

    /// File an issue for each plugin unless one with the same title is open.
    ///
    /// Returns the titles of the issues that were created.
    pub async fn file(&self, api: &dyn HostingApi, plugins: &[String]) -> Result<Vec<String>> {
        if plugins.is_empty() {
            return Ok(Vec::new());
        }

        let mut open: Vec<String> = api
            .list_issues()
            .await?
            .into_iter()
            .map(|issue| issue.title)
            .collect();
        let mut created = Vec::new();

        for plugin in plugins {
            let issue = self.issue_for(plugin)?;
            if open.contains(&issue.title) {
                info!("Issue already open: {}", issue.title);
                continue;
            }

            api.create_issue(&issue).await?;
            open.push(issue.title.clone());
            created.push(issue.title);
        }

        Ok(created)
    }
}

fn template_error(name: &str, source: minijinja::Error) -> SyncError {
    SyncError::Template {
        name: name.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::DEFAULT_SETTINGS;
    use crate::publish::fake::FakeHosting;

    #[test]
    fn test_default_issue_text() {
        let filer = IssueFiler::new(&DEFAULT_SETTINGS.issues).unwrap();
        let issue = filer.issue_for("custom-thing").unwrap();

        assert_eq!(issue.title, "Failed getting plugin for Composer: custom-thing");
        assert!(issue.body.starts_with("Failed getting plugin for Composer: **custom-thing**."));
        assert!(issue.body.contains("`extra.ignore`"));
        assert_eq!(issue.labels, vec!["plugins"]);
    }

    #[test]
    fn test_custom_templates() {
        let settings = IssueSettings {
            title: "Composer: {{ plugin | upper }}".to_string(),
            body: Some("Check {{ plugin }}".to_string()),
            labels: vec![],
        };
        let filer = IssueFiler::new(&settings).unwrap();
        let issue = filer.issue_for("seo").unwrap();
        assert_eq!(issue.title, "Composer: SEO");
        assert_eq!(issue.body, "Check seo");
    }

    #[test]
    fn test_bad_template_is_reported() {
        let settings = IssueSettings {
            title: "{{ plugin".to_string(),
            body: None,
            labels: vec![],
        };
        let err = IssueFiler::new(&settings).err().unwrap();
        assert!(matches!(err, SyncError::Template { .. }));
    }

    #[test]
    fn test_undefined_variable_is_reported() {
        let settings = IssueSettings {
            title: "{{ plugins }}".to_string(),
            body: None,
            labels: vec![],
        };
        let filer = IssueFiler::new(&settings).unwrap();
        assert!(filer.issue_for("x").is_err());
    }

    #[tokio::test]
    async fn test_file_skips_existing_titles() {
        let api = FakeHosting::named("gh")
            .with_issue("Failed getting plugin for Composer: old-plugin");
        let filer = IssueFiler::new(&DEFAULT_SETTINGS.issues).unwrap();
        let plugins = vec!["old-plugin".to_string(), "new-plugin".to_string()];

        let created = filer.file(&api, &plugins).await.unwrap();

        assert_eq!(created, vec!["Failed getting plugin for Composer: new-plugin"]);
        assert_eq!(
            api.calls(),
            vec![
                "gh:list_issues",
                "gh:create_issue Failed getting plugin for Composer: new-plugin",
            ]
        );
    }

    #[tokio::test]
    async fn test_file_twice_is_idempotent() {
        let api = FakeHosting::named("gh");
        let filer = IssueFiler::new(&DEFAULT_SETTINGS.issues).unwrap();
        let plugins = vec!["a".to_string(), "a".to_string()];

        assert_eq!(filer.file(&api, &plugins).await.unwrap().len(), 1);
        assert!(filer.file(&api, &plugins).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_nothing_to_file() {
        let api = FakeHosting::named("gh");
        let filer = IssueFiler::new(&DEFAULT_SETTINGS.issues).unwrap();
        assert!(filer.file(&api, &[]).await.unwrap().is_empty());
        assert!(api.calls().is_empty());
    }
}
