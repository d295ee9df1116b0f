//! Page-automation capability consumed by discovery, titles and answering.
//!
//! Implementations own one browser session. Every component receives the
//! driver explicitly; nothing holds it globally.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use nbshelf_shared::Result;

/// The Enter key in WebDriver key-input encoding; [`PageDriver::type_text`]
/// presses it when it appears in the text.
pub const ENTER_KEY: &str = "\u{E007}";

/// Page-load condition for [`PageDriver::goto`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitUntil {
    /// DOM parsed; scripts may still be rendering.
    #[default]
    DomContentLoaded,
    /// Full load event.
    Load,
}

/// Opaque reference to an element found by [`PageDriver::query`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub String);

/// Launch-time browser options.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    /// Chrome profile directory holding the signed-in session.
    pub user_data_dir: Option<String>,
}

/// One live browser session.
#[async_trait]
pub trait PageDriver: Send {
    /// Navigate and wait for `wait`, failing after `timeout`.
    async fn goto(&mut self, url: &str, wait: WaitUntil, timeout: Duration) -> Result<()>;

    /// Run `script` as a function body in the page. Arguments are exposed
    /// as `arguments[0..]`; the body's `return` value comes back as JSON.
    async fn evaluate(&mut self, script: &str, args: Vec<Value>) -> Result<Value>;

    /// First element matching a CSS selector, if any.
    async fn query(&mut self, selector: &str) -> Result<Option<ElementHandle>>;

    async fn click(&mut self, element: &ElementHandle) -> Result<()>;

    /// Rendered text of an element.
    async fn element_text(&mut self, element: &ElementHandle) -> Result<String>;

    /// `value` property of an input-like element.
    async fn element_value(&mut self, element: &ElementHandle) -> Result<Option<String>>;

    /// Send keystrokes to an element.
    async fn type_text(&mut self, element: &ElementHandle, text: &str) -> Result<()>;

    async fn current_url(&mut self) -> Result<String>;

    /// Wait until the current URL contains `pattern`. `Ok(false)` on timeout.
    async fn wait_for_url(&mut self, pattern: &str, timeout: Duration) -> Result<bool>;

    /// Document title.
    async fn title(&mut self) -> Result<String>;

    /// End the session. Further calls fail.
    async fn close(&mut self) -> Result<()>;
}

/// Starts browser sessions.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    type Driver: PageDriver;

    /// Start a session. Failure here is fatal to the whole batch.
    async fn launch(&self, opts: &LaunchOptions) -> Result<Self::Driver>;
}
