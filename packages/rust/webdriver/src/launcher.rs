//! Starting sessions on a WebDriver endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, instrument};
use url::Url;

use nbshelf_discovery::{LaunchOptions, SessionLauncher};
use nbshelf_shared::{NbshelfError, Result};

use crate::protocol::{Envelope, NewSession, WireError, chrome_capabilities};
use crate::session::WebDriverSession;

/// Session creation can include a cold browser start.
const NEW_SESSION_TIMEOUT: Duration = Duration::from_secs(60);

/// Launches Chrome sessions through a WebDriver server (e.g. chromedriver).
#[derive(Debug, Clone)]
pub struct WebDriverLauncher {
    endpoint: Url,
    client: Client,
}

impl WebDriverLauncher {
    /// Create a launcher for `endpoint` (e.g. `http://localhost:9515`).
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| NbshelfError::config(format!("invalid webdriver url '{endpoint}': {e}")))?;

        let client = Client::builder()
            .timeout(NEW_SESSION_TIMEOUT)
            .build()
            .map_err(|e| NbshelfError::Session(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { endpoint, client })
    }

    fn endpoint_str(&self) -> &str {
        self.endpoint.as_str().trim_end_matches('/')
    }
}

#[async_trait]
impl SessionLauncher for WebDriverLauncher {
    type Driver = WebDriverSession;

    #[instrument(skip_all, fields(endpoint = %self.endpoint, headless = opts.headless))]
    async fn launch(&self, opts: &LaunchOptions) -> Result<WebDriverSession> {
        let url = format!("{}/session", self.endpoint_str());
        let body = chrome_capabilities(opts.headless, opts.user_data_dir.as_deref());

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                NbshelfError::Session(format!(
                    "cannot reach webdriver at {}: {e}. Is chromedriver running?",
                    self.endpoint
                ))
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| NbshelfError::Session(format!("{url}: failed to read body: {e}")))?;

        if !status.is_success() {
            let err = WireError::from_body(status.as_u16(), &text);
            return Err(NbshelfError::Session(format!("session not created: {err}")));
        }

        let session: Envelope<NewSession> = serde_json::from_str(&text)
            .map_err(|e| NbshelfError::Session(format!("unexpected new-session response: {e}")))?;

        info!(session_id = %session.value.session_id, "browser session started");
        Ok(WebDriverSession::new(
            self.client.clone(),
            self.endpoint_str(),
            &session.value.session_id,
        ))
    }
}
