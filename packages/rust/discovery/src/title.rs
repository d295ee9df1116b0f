//! Reading a notebook's authoritative title from its own page.

use tracing::{debug, instrument};

use nbshelf_shared::{Result, TitleConfig};

use crate::driver::{PageDriver, WaitUntil};
use crate::poll::Clock;

/// Tab titles look like `"<notebook> - NotebookLM"`.
pub const TITLE_SUFFIX: &str = " - NotebookLM";

/// Tab title shown before a notebook has loaded.
pub const PLACEHOLDER_TITLE: &str = "NotebookLM";

/// Title-bearing elements tried when the tab title is unusable.
/// The chat input is deliberately not among them.
pub const FALLBACK_TITLE_SELECTORS: &[&str] = &[
    r#"div[class*="notebook-title"]"#,
    r#"input[aria-label*="title"]"#,
];

/// Open `url` and read the notebook title.
///
/// Navigation failure is returned as an error; an unreadable title is
/// `Ok(None)`. Read-only: callers decide what to do with mismatches.
#[instrument(skip(driver, clock, config))]
pub async fn check_title<D: PageDriver + ?Sized>(
    driver: &mut D,
    clock: &dyn Clock,
    url: &str,
    config: &TitleConfig,
) -> Result<Option<String>> {
    driver
        .goto(url, WaitUntil::DomContentLoaded, config.page_load_timeout)
        .await?;
    clock.sleep(config.settle).await;

    let page_title = driver.title().await.unwrap_or_default();
    if let Some(title) = title_from_tab(&page_title) {
        return Ok(Some(title));
    }

    for selector in FALLBACK_TITLE_SELECTORS {
        match probe_element(driver, selector).await {
            Ok(Some(title)) => return Ok(Some(title)),
            Ok(None) => {}
            Err(e) => debug!(selector, error = %e, "title probe failed"),
        }
    }

    Ok(None)
}

/// Strip the product suffix, or accept a bare non-placeholder title.
fn title_from_tab(page_title: &str) -> Option<String> {
    let trimmed = page_title.trim();
    if let Some(stripped) = trimmed.strip_suffix(TITLE_SUFFIX.trim_start()) {
        let title = stripped.trim();
        return (!title.is_empty()).then(|| title.to_string());
    }
    if !trimmed.is_empty() && trimmed != PLACEHOLDER_TITLE {
        return Some(trimmed.to_string());
    }
    None
}

async fn probe_element<D: PageDriver + ?Sized>(
    driver: &mut D,
    selector: &str,
) -> Result<Option<String>> {
    let Some(element) = driver.query(selector).await? else {
        return Ok(None);
    };

    let value = match driver.element_value(&element).await? {
        Some(v) if !v.trim().is_empty() => v,
        _ => driver.element_text(&element).await?,
    };

    let value = value.trim();
    Ok((value.chars().count() > 2).then(|| value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list_view::testing::ScriptedDriver;
    use crate::poll::testing::FakeClock;

    fn driver_with_title(title: &str) -> ScriptedDriver {
        ScriptedDriver {
            title: title.into(),
            ..Default::default()
        }
    }

    #[test]
    fn tab_title_rules() {
        assert_eq!(title_from_tab("Rust Notes - NotebookLM").as_deref(), Some("Rust Notes"));
        assert_eq!(title_from_tab("Untitled notebook").as_deref(), Some("Untitled notebook"));
        assert_eq!(title_from_tab("NotebookLM"), None);
        assert_eq!(title_from_tab("  "), None);
        assert_eq!(title_from_tab(" - NotebookLM"), None);
    }

    #[tokio::test]
    async fn reads_suffixed_tab_title_after_settle() {
        let mut driver = driver_with_title("ML Papers - NotebookLM");
        let clock = FakeClock::default();
        let config = TitleConfig::from(&nbshelf_shared::AppConfig::default());

        let title = check_title(&mut driver, &clock, "https://x/notebook/a", &config)
            .await
            .unwrap();

        assert_eq!(title.as_deref(), Some("ML Papers"));
        assert_eq!(driver.visited, vec!["https://x/notebook/a".to_string()]);
        assert_eq!(clock.total(), config.settle);
    }

    #[tokio::test]
    async fn falls_back_to_title_elements() {
        let mut driver = driver_with_title("NotebookLM");
        driver.elements = vec![
            (FALLBACK_TITLE_SELECTORS[0].into(), "ab".into(), None),
            (FALLBACK_TITLE_SELECTORS[1].into(), String::new(), Some(" Deep Work ".into())),
        ];
        let clock = FakeClock::default();
        let config = TitleConfig::from(&nbshelf_shared::AppConfig::default());

        let title = check_title(&mut driver, &clock, "https://x/notebook/a", &config)
            .await
            .unwrap();
        assert_eq!(title.as_deref(), Some("Deep Work"));
    }

    #[tokio::test]
    async fn none_when_nothing_found() {
        let mut driver = driver_with_title("");
        let clock = FakeClock::default();
        let config = TitleConfig::from(&nbshelf_shared::AppConfig::default());

        let title = check_title(&mut driver, &clock, "https://x/notebook/a", &config)
            .await
            .unwrap();
        assert_eq!(title, None);
    }

    #[tokio::test]
    async fn navigation_failure_is_an_error() {
        let mut driver = ScriptedDriver {
            goto_fails: true,
            ..Default::default()
        };
        let clock = FakeClock::default();
        let config = TitleConfig::from(&nbshelf_shared::AppConfig::default());

        assert!(
            check_title(&mut driver, &clock, "https://x/notebook/a", &config)
                .await
                .is_err()
        );
    }
}
