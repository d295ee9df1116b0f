//! W3C WebDriver wire types.

use serde::Deserialize;
use serde_json::{Value, json};

/// Key under which WebDriver returns element references.
pub(crate) const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Chrome flags that keep the automated browser looking like a normal one.
pub(crate) const BASE_CHROME_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--no-first-run",
    "--no-default-browser-check",
];

/// Extra flags for a window-less browser.
pub(crate) const HEADLESS_CHROME_ARGS: &[&str] = &["--headless=new", "--disable-gpu"];

pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Every WebDriver response wraps its payload in `value`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub value: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NewSession {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// Error payload (`value.error`, `value.message`).
#[derive(Debug, Deserialize)]
pub(crate) struct WireError {
    pub error: String,
    #[serde(default)]
    pub message: String,
}

impl WireError {
    /// Parse an error body; falls back to the raw text.
    pub(crate) fn from_body(status: u16, body: &str) -> Self {
        serde_json::from_str::<Envelope<WireError>>(body)
            .map(|e| e.value)
            .unwrap_or_else(|_| WireError {
                error: format!("http {status}"),
                message: body.chars().take(200).collect(),
            })
    }

    pub(crate) fn is_no_such_element(&self) -> bool {
        self.error == "no such element"
    }

    pub(crate) fn is_timeout(&self) -> bool {
        self.error == "timeout"
    }
}

impl std::fmt::Display for WireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.error)
        } else {
            write!(f, "{}: {}", self.error, self.message)
        }
    }
}

/// Capabilities for a new Chrome session.
pub(crate) fn chrome_capabilities(headless: bool, user_data_dir: Option<&str>) -> Value {
    let mut args: Vec<String> = BASE_CHROME_ARGS.iter().map(|a| a.to_string()).collect();
    if headless {
        args.extend(HEADLESS_CHROME_ARGS.iter().map(|a| a.to_string()));
    }
    if let Some(dir) = user_data_dir {
        args.push(format!("--user-data-dir={dir}"));
    }
    args.push(format!("--user-agent={USER_AGENT}"));

    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "pageLoadStrategy": "eager",
                "goog:chromeOptions": {
                    "args": args,
                    "excludeSwitches": ["enable-automation"],
                }
            }
        }
    })
}

/// Pull the element id out of an element reference object.
pub(crate) fn element_id(value: &Value) -> Option<String> {
    value.get(ELEMENT_KEY)?.as_str().map(String::from)
}
