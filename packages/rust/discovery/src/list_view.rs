//! Typed queries against the notebook list page.
//!
//! The discovery algorithms only ever talk to the list through
//! [`ListView`]; [`DriverListView`] is the one place that knows the
//! page markup.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use nbshelf_shared::{DiscoveryConfig, NbshelfError, Result};

use crate::driver::{PageDriver, WaitUntil};

/// Read and click operations on the notebook list.
#[async_trait]
pub trait ListView: Send {
    /// Navigate to the list root.
    async fn open(&mut self) -> Result<()>;

    /// Number of rendered table cells; zero while the SPA is still hydrating.
    async fn count_rows(&mut self) -> Result<usize>;

    /// Number of non-empty first-column cells.
    async fn count_title_cells(&mut self) -> Result<usize>;

    /// Trimmed text of every cell, row by row. Rows without cells are skipped.
    async fn row_texts(&mut self) -> Result<Vec<Vec<String>>>;

    /// Click the first first-column cell whose trimmed text equals `title`.
    /// `Ok(false)` when no such cell is rendered.
    async fn click_row_by_title(&mut self, title: &str) -> Result<bool>;

    /// Wait for the browser to land on a notebook page and return its URL.
    /// `Ok(None)` on timeout.
    async fn await_detail_url(&mut self) -> Result<Option<String>>;
}

const COUNT_CELLS_JS: &str =
    "return document.querySelectorAll('project-table tr td, table tr td').length;";

const COUNT_TITLE_CELLS_JS: &str = r#"
const cells = document.querySelectorAll('project-table tr td:first-child, table tr td:first-child');
return Array.from(cells).map(c => c.textContent.trim()).filter(t => t.length > 0).length;
"#;

const ROW_TEXTS_JS: &str = r#"
const rows = document.querySelectorAll('project-table tr, table tr');
const out = [];
for (const row of rows) {
    const cells = row.querySelectorAll('td');
    if (cells.length === 0) continue;
    out.push(Array.from(cells).map(td => td.textContent.trim()));
}
return out;
"#;

const CLICK_ROW_JS: &str = r#"
const title = arguments[0];
const cells = document.querySelectorAll('project-table tr td:first-child, table tr td:first-child');
for (const cell of cells) {
    if (cell.textContent.trim() === title) {
        cell.click();
        return true;
    }
}
return false;
"#;

/// [`ListView`] over a live [`PageDriver`].
pub struct DriverListView<'a, D: PageDriver> {
    driver: &'a mut D,
    config: DiscoveryConfig,
}

impl<'a, D: PageDriver> DriverListView<'a, D> {
    pub fn new(driver: &'a mut D, config: DiscoveryConfig) -> Self {
        Self { driver, config }
    }
}

#[async_trait]
impl<D: PageDriver> ListView for DriverListView<'_, D> {
    async fn open(&mut self) -> Result<()> {
        self.driver
            .goto(
                &self.config.home_url,
                WaitUntil::DomContentLoaded,
                self.config.page_load_timeout,
            )
            .await
    }

    async fn count_rows(&mut self) -> Result<usize> {
        let value = self.driver.evaluate(COUNT_CELLS_JS, Vec::new()).await?;
        as_count(&value)
    }

    async fn count_title_cells(&mut self) -> Result<usize> {
        let value = self.driver.evaluate(COUNT_TITLE_CELLS_JS, Vec::new()).await?;
        as_count(&value)
    }

    async fn row_texts(&mut self) -> Result<Vec<Vec<String>>> {
        let value = self.driver.evaluate(ROW_TEXTS_JS, Vec::new()).await?;
        serde_json::from_value(value)
            .map_err(|e| NbshelfError::driver(format!("unexpected row payload: {e}")))
    }

    async fn click_row_by_title(&mut self, title: &str) -> Result<bool> {
        let value = self
            .driver
            .evaluate(CLICK_ROW_JS, vec![json!(title)])
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn await_detail_url(&mut self) -> Result<Option<String>> {
        let landed = self
            .driver
            .wait_for_url(&self.config.detail_url_pattern, self.config.detail_url_timeout)
            .await?;
        if !landed {
            debug!(pattern = %self.config.detail_url_pattern, "no notebook page before timeout");
            return Ok(None);
        }
        self.driver.current_url().await.map(Some)
    }
}

fn as_count(value: &Value) -> Result<usize> {
    value
        .as_u64()
        .map(|n| n as usize)
        .ok_or_else(|| NbshelfError::driver(format!("expected a count, got {value}")))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::time::Duration;

    use super::*;
    use crate::driver::ElementHandle;

    /// Scripted [`PageDriver`]: queued `evaluate` results, fixed title/URL.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedDriver {
        pub(crate) evaluations: VecDeque<Result<Value>>,
        pub(crate) scripts: Vec<(String, Vec<Value>)>,
        pub(crate) visited: Vec<String>,
        pub(crate) url: String,
        pub(crate) url_lands: bool,
        pub(crate) title: String,
        pub(crate) elements: Vec<(String, String, Option<String>)>,
        pub(crate) goto_fails: bool,
        pub(crate) closed: bool,
    }

    #[async_trait]
    impl PageDriver for ScriptedDriver {
        async fn goto(&mut self, url: &str, _wait: WaitUntil, _timeout: Duration) -> Result<()> {
            if self.goto_fails {
                return Err(NbshelfError::Navigation(format!("{url}: net::ERR_FAILED")));
            }
            self.visited.push(url.to_string());
            Ok(())
        }

        async fn evaluate(&mut self, script: &str, args: Vec<Value>) -> Result<Value> {
            self.scripts.push((script.to_string(), args));
            self.evaluations
                .pop_front()
                .unwrap_or_else(|| Err(NbshelfError::driver("no scripted result")))
        }

        async fn query(&mut self, selector: &str) -> Result<Option<ElementHandle>> {
            Ok(self
                .elements
                .iter()
                .find(|(sel, _, _)| sel == selector)
                .map(|(sel, _, _)| ElementHandle(sel.clone())))
        }

        async fn click(&mut self, _element: &ElementHandle) -> Result<()> {
            Ok(())
        }

        async fn element_text(&mut self, element: &ElementHandle) -> Result<String> {
            self.elements
                .iter()
                .find(|(sel, _, _)| *sel == element.0)
                .map(|(_, text, _)| text.clone())
                .ok_or_else(|| NbshelfError::driver("stale element"))
        }

        async fn element_value(&mut self, element: &ElementHandle) -> Result<Option<String>> {
            Ok(self
                .elements
                .iter()
                .find(|(sel, _, _)| *sel == element.0)
                .and_then(|(_, _, value)| value.clone()))
        }

        async fn type_text(&mut self, _element: &ElementHandle, _text: &str) -> Result<()> {
            Ok(())
        }

        async fn current_url(&mut self) -> Result<String> {
            Ok(self.url.clone())
        }

        async fn wait_for_url(&mut self, pattern: &str, _timeout: Duration) -> Result<bool> {
            Ok(self.url_lands && self.url.contains(pattern))
        }

        async fn title(&mut self) -> Result<String> {
            Ok(self.title.clone())
        }

        async fn close(&mut self) -> Result<()> {
            self.closed = true;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedDriver;
    use super::*;

    #[tokio::test]
    async fn open_navigates_to_home() {
        let mut driver = ScriptedDriver::default();
        let mut view = DriverListView::new(&mut driver, DiscoveryConfig::default());
        view.open().await.unwrap();
        drop(view);
        assert_eq!(driver.visited, vec!["https://notebooklm.google.com/".to_string()]);
    }

    #[tokio::test]
    async fn row_texts_decodes_nested_arrays() {
        let mut driver = ScriptedDriver::default();
        driver
            .evaluations
            .push_back(Ok(json!([["Rust Notes", "4 sources", "Mar 1, 2025"], ["..."]])));
        let mut view = DriverListView::new(&mut driver, DiscoveryConfig::default());

        let rows = view.row_texts().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][1], "4 sources");
    }

    #[tokio::test]
    async fn malformed_count_is_a_driver_error() {
        let mut driver = ScriptedDriver::default();
        driver.evaluations.push_back(Ok(json!("lots")));
        let mut view = DriverListView::new(&mut driver, DiscoveryConfig::default());

        let err = view.count_rows().await.unwrap_err();
        assert!(matches!(err, NbshelfError::Driver(_)));
    }

    #[tokio::test]
    async fn click_passes_title_argument() {
        let mut driver = ScriptedDriver::default();
        driver.evaluations.push_back(Ok(json!(true)));
        let mut view = DriverListView::new(&mut driver, DiscoveryConfig::default());

        assert!(view.click_row_by_title("Rust Notes").await.unwrap());
        drop(view);
        assert_eq!(driver.scripts[0].1, vec![json!("Rust Notes")]);
    }

    #[tokio::test]
    async fn detail_url_none_on_timeout() {
        let mut driver = ScriptedDriver {
            url: "https://notebooklm.google.com/".into(),
            ..Default::default()
        };
        let mut view = DriverListView::new(&mut driver, DiscoveryConfig::default());
        assert_eq!(view.await_detail_url().await.unwrap(), None);
    }

    #[tokio::test]
    async fn detail_url_returned_when_landed() {
        let mut driver = ScriptedDriver {
            url: "https://notebooklm.google.com/notebook/abc".into(),
            url_lands: true,
            ..Default::default()
        };
        let mut view = DriverListView::new(&mut driver, DiscoveryConfig::default());
        assert_eq!(
            view.await_detail_url().await.unwrap().as_deref(),
            Some("https://notebooklm.google.com/notebook/abc")
        );
    }
}
