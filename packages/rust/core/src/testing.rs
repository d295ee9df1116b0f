//! In-memory collaborators for core tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use nbshelf_discovery::{Clock, ElementHandle, LaunchOptions, PageDriver, SessionLauncher, WaitUntil};
use nbshelf_shared::{NbshelfError, Result};

use crate::answer::QuestionAnswerer;

/// Records sleeps instead of sleeping.
#[derive(Debug, Default)]
pub(crate) struct FakeClock {
    pub(crate) sleeps: Mutex<Vec<Duration>>,
}

impl FakeClock {
    pub(crate) fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for FakeClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// Page driver backed by maps. A script called with a title in `links`
/// "clicks" that row and lands on its URL; every other evaluation pops from
/// a queue, falling back to `Value::Null` once it runs dry.
#[derive(Debug, Default)]
pub(crate) struct FakeDriver {
    pub(crate) url: String,
    pub(crate) visited: Vec<String>,
    pub(crate) failing_urls: HashSet<String>,
    pub(crate) titles: HashMap<String, String>,
    pub(crate) present: HashSet<String>,
    pub(crate) links: HashMap<String, String>,
    pub(crate) evaluations: VecDeque<Value>,
    pub(crate) typed: Vec<String>,
    pub(crate) closes: Arc<AtomicUsize>,
}

#[async_trait]
impl PageDriver for FakeDriver {
    async fn goto(&mut self, url: &str, _wait: WaitUntil, _timeout: Duration) -> Result<()> {
        self.visited.push(url.to_string());
        if self.failing_urls.contains(url) {
            return Err(NbshelfError::Navigation(format!("{url}: net::ERR_FAILED")));
        }
        self.url = url.to_string();
        Ok(())
    }

    async fn evaluate(&mut self, _script: &str, args: Vec<Value>) -> Result<Value> {
        let target = args
            .first()
            .and_then(Value::as_str)
            .and_then(|title| self.links.get(title))
            .cloned();
        if let Some(url) = target {
            self.url = url;
            return Ok(Value::Bool(true));
        }
        Ok(self.evaluations.pop_front().unwrap_or(Value::Null))
    }

    async fn query(&mut self, selector: &str) -> Result<Option<ElementHandle>> {
        Ok(self
            .present
            .contains(selector)
            .then(|| ElementHandle(selector.to_string())))
    }

    async fn click(&mut self, _element: &ElementHandle) -> Result<()> {
        Ok(())
    }

    async fn element_text(&mut self, _element: &ElementHandle) -> Result<String> {
        Ok(String::new())
    }

    async fn element_value(&mut self, _element: &ElementHandle) -> Result<Option<String>> {
        Ok(None)
    }

    async fn type_text(&mut self, _element: &ElementHandle, text: &str) -> Result<()> {
        self.typed.push(text.to_string());
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String> {
        Ok(self.url.clone())
    }

    async fn wait_for_url(&mut self, pattern: &str, _timeout: Duration) -> Result<bool> {
        Ok(self.url.contains(pattern))
    }

    async fn title(&mut self) -> Result<String> {
        Ok(self.titles.get(&self.url).cloned().unwrap_or_default())
    }

    async fn close(&mut self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out one prepared [`FakeDriver`], or fails to launch.
#[derive(Debug, Default)]
pub(crate) struct FakeLauncher {
    pub(crate) driver: Mutex<Option<FakeDriver>>,
    pub(crate) closes: Arc<AtomicUsize>,
}

impl FakeLauncher {
    pub(crate) fn with_driver(mut driver: FakeDriver) -> Self {
        let closes = Arc::new(AtomicUsize::new(0));
        driver.closes = Arc::clone(&closes);
        Self {
            driver: Mutex::new(Some(driver)),
            closes,
        }
    }

    pub(crate) fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionLauncher for FakeLauncher {
    type Driver = FakeDriver;

    async fn launch(&self, _opts: &LaunchOptions) -> Result<FakeDriver> {
        self.driver
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| NbshelfError::Session("chrome not reachable".into()))
    }
}

/// Answers keyed by notebook URL; unknown URLs fail.
#[derive(Debug, Default)]
pub(crate) struct FakeAnswerer {
    pub(crate) answers: HashMap<String, Result<String>>,
    pub(crate) asked: Vec<(String, String)>,
}

impl FakeAnswerer {
    pub(crate) fn answer(mut self, url: &str, text: &str) -> Self {
        self.answers.insert(url.to_string(), Ok(text.to_string()));
        self
    }

    pub(crate) fn fail(mut self, url: &str) -> Self {
        self.answers
            .insert(url.to_string(), Err(NbshelfError::Enrichment("browser crashed".into())));
        self
    }
}

#[async_trait]
impl QuestionAnswerer for FakeAnswerer {
    async fn ask(&mut self, question: &str, url: &str) -> Result<String> {
        self.asked.push((question.to_string(), url.to_string()));
        match self.answers.get(url) {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err(e)) => Err(NbshelfError::Enrichment(e.to_string())),
            None => Err(NbshelfError::Enrichment(format!("no answer for {url}"))),
        }
    }
}
