//! A live WebDriver session implementing [`PageDriver`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use nbshelf_discovery::{ElementHandle, PageDriver, WaitUntil};
use nbshelf_shared::{NbshelfError, Result};

use crate::protocol::{Envelope, WireError, element_id};

/// How often URL and ready-state waits re-check the page.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// One browser session on a WebDriver endpoint.
///
/// Dropping a session that was never closed deletes it on the endpoint, so
/// a panic or a cancelled run does not leave the browser behind.
pub struct WebDriverSession {
    client: Client,
    /// `<endpoint>/session/<id>`
    base: String,
    closed: bool,
}

/// A request failure, kept apart from [`NbshelfError`] until the caller
/// knows whether it means "missing" or "broken".
enum CallError {
    Wire(WireError),
    Transport(String),
}

impl CallError {
    fn into_driver(self, context: &str) -> NbshelfError {
        match self {
            Self::Wire(e) => NbshelfError::driver(format!("{context}: {e}")),
            Self::Transport(e) => NbshelfError::driver(format!("{context}: {e}")),
        }
    }
}

impl WebDriverSession {
    pub(crate) fn new(client: Client, endpoint: &str, session_id: &str) -> Self {
        Self {
            client,
            base: format!("{}/session/{session_id}", endpoint.trim_end_matches('/')),
            closed: false,
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> std::result::Result<T, CallError> {
        if self.closed {
            return Err(CallError::Transport("session already closed".into()));
        }

        let url = format!("{}{path}", self.base);
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CallError::Transport(format!("{url}: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CallError::Transport(format!("{url}: failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(CallError::Wire(WireError::from_body(status.as_u16(), &text)));
        }

        serde_json::from_str::<Envelope<T>>(&text)
            .map(|env| env.value)
            .map_err(|e| CallError::Transport(format!("{url}: unexpected response: {e}")))
    }

    async fn set_page_load_timeout(&self, timeout: Duration) -> Result<()> {
        self.call::<Value>(
            Method::POST,
            "/timeouts",
            Some(json!({ "pageLoad": timeout.as_millis() as u64 })),
        )
        .await
        .map(|_| ())
        .map_err(|e| e.into_driver("set timeouts"))
    }

    async fn ready_state(&self) -> Result<String> {
        let value = self
            .call::<Value>(
                Method::POST,
                "/execute/sync",
                Some(json!({ "script": "return document.readyState;", "args": [] })),
            )
            .await
            .map_err(|e| e.into_driver("readyState"))?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    fn element_path(element: &ElementHandle, suffix: &str) -> String {
        format!("/element/{}{suffix}", element.0)
    }
}

#[async_trait]
impl PageDriver for WebDriverSession {
    #[instrument(skip(self, timeout))]
    async fn goto(&mut self, url: &str, wait: WaitUntil, timeout: Duration) -> Result<()> {
        self.set_page_load_timeout(timeout).await?;

        let started = Instant::now();
        self.call::<Value>(Method::POST, "/url", Some(json!({ "url": url })))
            .await
            .map_err(|e| match e {
                CallError::Wire(w) if w.is_timeout() => {
                    NbshelfError::Navigation(format!("{url}: page load timed out after {timeout:?}"))
                }
                CallError::Wire(w) => NbshelfError::Navigation(format!("{url}: {w}")),
                CallError::Transport(t) => NbshelfError::Navigation(t),
            })?;

        if wait == WaitUntil::Load {
            while self.ready_state().await? != "complete" {
                if started.elapsed() >= timeout {
                    return Err(NbshelfError::Navigation(format!(
                        "{url}: load event not reached after {timeout:?}"
                    )));
                }
                tokio::time::sleep(WAIT_POLL_INTERVAL).await;
            }
        }

        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "navigation complete");
        Ok(())
    }

    async fn evaluate(&mut self, script: &str, args: Vec<Value>) -> Result<Value> {
        self.call(
            Method::POST,
            "/execute/sync",
            Some(json!({ "script": script, "args": args })),
        )
        .await
        .map_err(|e| e.into_driver("execute script"))
    }

    async fn query(&mut self, selector: &str) -> Result<Option<ElementHandle>> {
        let result = self
            .call::<Value>(
                Method::POST,
                "/element",
                Some(json!({ "using": "css selector", "value": selector })),
            )
            .await;

        match result {
            Ok(value) => element_id(&value)
                .map(|id| Some(ElementHandle(id)))
                .ok_or_else(|| NbshelfError::driver(format!("{selector}: malformed element reference"))),
            Err(CallError::Wire(w)) if w.is_no_such_element() => Ok(None),
            Err(e) => Err(e.into_driver(selector)),
        }
    }

    async fn click(&mut self, element: &ElementHandle) -> Result<()> {
        self.call::<Value>(
            Method::POST,
            &Self::element_path(element, "/click"),
            Some(json!({})),
        )
        .await
        .map(|_| ())
        .map_err(|e| e.into_driver("click"))
    }

    async fn element_text(&mut self, element: &ElementHandle) -> Result<String> {
        self.call(Method::GET, &Self::element_path(element, "/text"), None)
            .await
            .map_err(|e| e.into_driver("element text"))
    }

    async fn element_value(&mut self, element: &ElementHandle) -> Result<Option<String>> {
        let value: Value = self
            .call(Method::GET, &Self::element_path(element, "/property/value"), None)
            .await
            .map_err(|e| e.into_driver("element value"))?;
        Ok(value.as_str().map(String::from))
    }

    async fn type_text(&mut self, element: &ElementHandle, text: &str) -> Result<()> {
        self.call::<Value>(
            Method::POST,
            &Self::element_path(element, "/value"),
            Some(json!({ "text": text })),
        )
        .await
        .map(|_| ())
        .map_err(|e| e.into_driver("send keys"))
    }

    async fn current_url(&mut self) -> Result<String> {
        self.call(Method::GET, "/url", None)
            .await
            .map_err(|e| e.into_driver("current url"))
    }

    async fn wait_for_url(&mut self, pattern: &str, timeout: Duration) -> Result<bool> {
        let started = Instant::now();
        loop {
            if self.current_url().await?.contains(pattern) {
                return Ok(true);
            }
            if started.elapsed() >= timeout {
                return Ok(false);
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL).await;
        }
    }

    async fn title(&mut self) -> Result<String> {
        self.call(Method::GET, "/title", None)
            .await
            .map_err(|e| e.into_driver("title"))
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let result = self.call::<Value>(Method::DELETE, "", None).await;
        self.closed = true;
        match result {
            Ok(_) => {
                debug!(session = %self.base, "session closed");
                Ok(())
            }
            Err(e) => {
                warn!(session = %self.base, "session close failed");
                Err(match e {
                    CallError::Wire(w) => NbshelfError::Session(w.to_string()),
                    CallError::Transport(t) => NbshelfError::Session(t),
                })
            }
        }
    }
}

impl Drop for WebDriverSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let Ok(handle) = Handle::try_current() else {
            warn!(session = %self.base, "session dropped outside a runtime, browser left running");
            return;
        };
        warn!(session = %self.base, "session dropped without close, deleting it");

        let request = self.client.delete(&self.base).send();
        match handle.runtime_flavor() {
            RuntimeFlavor::MultiThread => {
                if let Err(e) = tokio::task::block_in_place(|| handle.block_on(request)) {
                    warn!(error = %e, "session delete on drop failed");
                }
            }
            // A current-thread runtime cannot block here; the delete runs
            // once the runtime gets back to its task queue.
            _ => {
                handle.spawn(async move {
                    if let Err(e) = request.await {
                        warn!(error = %e, "session delete on drop failed");
                    }
                });
            }
        }
    }
}
