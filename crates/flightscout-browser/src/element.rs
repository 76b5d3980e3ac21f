use crate::driver::{Key, NativeElement, Query};
use crate::{Error, Result};
use std::time::Duration;
use tokio::time::{Instant, sleep};

const SLOW_KEY_GAP: Duration = Duration::from_millis(100);

/// A located element with chainable actions.
///
/// Actions return the handle so steps read as one chain:
///
/// ```ignore
/// locator.by_id("leave1").await?
///     .clear().await?
///     .type_text("12/21/2026").await?
///     .press_tab().await?;
/// ```
///
/// An *absent* handle stands in for an optional element that did not
/// render; every action on it does nothing and succeeds.
pub struct ElementHandle {
    inner: Option<Box<dyn NativeElement>>,
    query: Query,
    poll_interval: Duration,
}

impl ElementHandle {
    pub(crate) fn present(
        element: Box<dyn NativeElement>,
        query: Query,
        poll_interval: Duration,
    ) -> Self {
        Self {
            inner: Some(element),
            query,
            poll_interval,
        }
    }

    pub(crate) fn absent(query: Query) -> Self {
        Self {
            inner: None,
            query,
            poll_interval: Duration::ZERO,
        }
    }

    pub fn is_present(&self) -> bool {
        self.inner.is_some()
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub async fn click(&self) -> Result<&Self> {
        if let Some(el) = &self.inner {
            el.click().await?;
        }
        Ok(self)
    }

    pub async fn clear(&self) -> Result<&Self> {
        if let Some(el) = &self.inner {
            el.clear().await?;
        }
        Ok(self)
    }

    pub async fn type_text(&self, text: &str) -> Result<&Self> {
        if let Some(el) = &self.inner {
            el.type_text(text).await?;
        }
        Ok(self)
    }

    /// Type one character at a time, for inputs whose autocomplete drops
    /// fast keystrokes
    pub async fn type_slowly(&self, text: &str) -> Result<&Self> {
        if let Some(el) = &self.inner {
            let mut buf = [0u8; 4];
            for ch in text.chars() {
                el.type_text(ch.encode_utf8(&mut buf)).await?;
                sleep(SLOW_KEY_GAP).await;
            }
        }
        Ok(self)
    }

    pub async fn press_tab(&self) -> Result<&Self> {
        if let Some(el) = &self.inner {
            el.press_key(Key::Tab).await?;
        }
        Ok(self)
    }

    pub async fn press_enter(&self) -> Result<&Self> {
        if let Some(el) = &self.inner {
            el.press_key(Key::Enter).await?;
        }
        Ok(self)
    }

    pub async fn select_option(&self, value: &str) -> Result<&Self> {
        if let Some(el) = &self.inner {
            el.select_option(value).await?;
        }
        Ok(self)
    }

    pub async fn submit(&self) -> Result<&Self> {
        if let Some(el) = &self.inner {
            el.submit().await?;
        }
        Ok(self)
    }

    /// Fixed delay, for pages that react to input asynchronously
    pub async fn pause(&self, delay: Duration) -> Result<&Self> {
        if self.inner.is_some() {
            sleep(delay).await;
        }
        Ok(self)
    }

    /// Click only if the checked state differs from `on`
    pub async fn toggle_to(&self, on: bool) -> Result<&Self> {
        if let Some(el) = &self.inner
            && el.is_selected().await? != on
        {
            el.click().await?;
        }
        Ok(self)
    }

    /// Poll until the element is displayed.
    ///
    /// Fails with `WorkflowTimeout` if it stays hidden for `timeout`; acting
    /// on a hidden element would otherwise silently do nothing.
    pub async fn wait_until_visible(&self, timeout: Duration) -> Result<&Self> {
        let Some(el) = &self.inner else {
            return Ok(self);
        };

        let started = Instant::now();
        loop {
            if el.is_displayed().await? {
                return Ok(self);
            }
            let waited = started.elapsed();
            if waited >= timeout {
                return Err(Error::timeout(
                    format!("{} to become visible", self.query),
                    waited,
                ));
            }
            sleep(self.poll_interval.min(timeout - waited)).await;
        }
    }

    /// Poll until the element is hidden, e.g. a "still searching" banner
    pub async fn wait_until_hidden(&self, timeout: Duration) -> Result<&Self> {
        let Some(el) = &self.inner else {
            return Ok(self);
        };

        let started = Instant::now();
        loop {
            if !el.is_displayed().await? {
                return Ok(self);
            }
            let waited = started.elapsed();
            if waited >= timeout {
                return Err(Error::timeout(
                    format!("{} to disappear", self.query),
                    waited,
                ));
            }
            sleep(self.poll_interval.min(timeout - waited)).await;
        }
    }

    pub async fn is_displayed(&self) -> Result<bool> {
        match &self.inner {
            Some(el) => el.is_displayed().await,
            None => Ok(false),
        }
    }

    /// Visible text; empty for an absent element
    pub async fn read_text(&self) -> Result<String> {
        match &self.inner {
            Some(el) => el.text().await,
            None => Ok(String::new()),
        }
    }

    /// Current form value; empty for an absent element
    pub async fn current_value(&self) -> Result<String> {
        match &self.inner {
            Some(el) => el.value().await,
            None => Ok(String::new()),
        }
    }
}

impl std::fmt::Debug for ElementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementHandle")
            .field("query", &self.query)
            .field("present", &self.is_present())
            .finish()
    }
}
