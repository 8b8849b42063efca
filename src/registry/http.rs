//! HTTP implementation of [`PluginProbe`]

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::redirect::Policy;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use super::{PluginProbe, PublicProbe};
use crate::error::{Result, SyncError};
use crate::models::Settings;

const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Looks plugins up on GitHub (internal) and wordpress.org (public)
#[derive(Debug, Clone)]
pub struct HttpProbe {
    github: reqwest::Client,
    wordpress: reqwest::Client,
    github_api: String,
    wordpress_org: String,
    organization: String,
}

impl HttpProbe {
    pub fn new(settings: &Settings, token: &SecretString) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| SyncError::Config(format!("invalid token header value: {e}")))?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );

        let github = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(crate::USER_AGENT)
            .timeout(PROBE_TIMEOUT)
            .build()
            .map_err(|e| SyncError::Config(format!("failed to build HTTP client: {e}")))?;

        // Redirects are the answer we are looking for, so never follow them
        let wordpress = reqwest::Client::builder()
            .redirect(Policy::none())
            .user_agent(crate::USER_AGENT)
            .timeout(PROBE_TIMEOUT)
            .build()
            .map_err(|e| SyncError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            github,
            wordpress,
            github_api: settings.endpoints.github_api.trim_end_matches('/').to_string(),
            wordpress_org: settings
                .endpoints
                .wordpress_org
                .trim_end_matches('/')
                .to_string(),
            organization: settings.organization.clone(),
        })
    }
}

#[async_trait]
impl PluginProbe for HttpProbe {
    async fn probe_internal(&self, plugin: &str) -> bool {
        let url = format!("{}/repos/{}/{plugin}", self.github_api, self.organization);
        match self.github.get(&url).send().await {
            Ok(response) => {
                debug!(status = %response.status(), "GET {url}");
                response.status().is_success()
            }
            Err(e) => {
                let error = SyncError::Probe {
                    plugin: plugin.to_string(),
                    message: e.to_string(),
                };
                warn!("{error}; treating as not internal");
                false
            }
        }
    }

    async fn probe_public(&self, plugin: &str) -> PublicProbe {
        let url = format!("{}/plugins/{plugin}/", self.wordpress_org);
        let response = match self.wordpress.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                let error = SyncError::Probe {
                    plugin: plugin.to_string(),
                    message: e.to_string(),
                };
                warn!("{error}");
                return PublicProbe::Failed;
            }
        };

        let status = response.status();
        debug!(status = %status, "GET {url}");

        if status.is_success() {
            PublicProbe::Found
        } else if status.is_redirection() {
            PublicProbe::Redirected
        } else if status == reqwest::StatusCode::NOT_FOUND {
            PublicProbe::Missing
        } else {
            warn!("wordpress.org answered {status} for plugin {plugin}");
            PublicProbe::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::DEFAULT_SETTINGS;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn probe_for(server: &MockServer) -> HttpProbe {
        let mut settings = DEFAULT_SETTINGS.clone();
        settings.endpoints.github_api = server.uri();
        settings.endpoints.wordpress_org = server.uri();
        HttpProbe::new(&settings, &SecretString::from("test-token".to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_internal_probe_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/designcontainer/acme-widget"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        assert!(probe_for(&server).probe_internal("acme-widget").await);
    }

    #[tokio::test]
    async fn test_internal_probe_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/designcontainer/akismet"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        assert!(!probe_for(&server).probe_internal("akismet").await);
    }

    #[tokio::test]
    async fn test_internal_probe_transport_error_is_false() {
        let mut settings = DEFAULT_SETTINGS.clone();
        // Nothing listens on port 9 locally
        settings.endpoints.github_api = "http://127.0.0.1:9".to_string();
        let probe = HttpProbe::new(&settings, &SecretString::from("t".to_string())).unwrap();
        assert!(!probe.probe_internal("anything").await);
    }

    #[tokio::test]
    async fn test_public_probe_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/plugins/akismet/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        assert_eq!(
            probe_for(&server).probe_public("akismet").await,
            PublicProbe::Found
        );
    }

    #[tokio::test]
    async fn test_public_probe_redirect_is_not_followed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/plugins/made-up/"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", "/plugins/search/made-up/"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/plugins/search/made-up/"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        assert_eq!(
            probe_for(&server).probe_public("made-up").await,
            PublicProbe::Redirected
        );
    }

    #[tokio::test]
    async fn test_public_probe_distinguishes_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/plugins/missing/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/plugins/broken/"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let probe = probe_for(&server);
        assert_eq!(probe.probe_public("missing").await, PublicProbe::Missing);
        assert_eq!(probe.probe_public("broken").await, PublicProbe::Failed);
    }
}
