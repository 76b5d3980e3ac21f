use crate::driver::{Driver, Key, NativeElement, Query};
use crate::{Error, Result};
use async_trait::async_trait;
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::{Page, ScreenshotParams};
use serde_json::Value;
use std::path::Path;

const CLEAR_JS: &str = r#"function() {
    this.value = '';
    this.dispatchEvent(new Event('input', { bubbles: true }));
}"#;

const SUBMIT_JS: &str = r#"function() {
    const form = this.tagName === 'FORM' ? this : this.form;
    if (!form) { throw new Error('element is not inside a form'); }
    form.submit();
}"#;

const DISPLAYED_JS: &str = r#"function() {
    const style = window.getComputedStyle(this);
    const rendered = !!(this.offsetWidth || this.offsetHeight || this.getClientRects().length);
    return rendered && style.visibility !== 'hidden' && style.display !== 'none';
}"#;

const SELECTED_JS: &str = r#"function() {
    return !!(this.checked || this.selected);
}"#;

/// `Driver` over a Chrome DevTools page
#[derive(Clone)]
pub struct ChromiumDriver {
    page: Page,
}

impl ChromiumDriver {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Every match of `query`; empty when the page has none. Only errors
    /// that mean "no such node" count as a miss, anything else (a closed
    /// connection, a crashed tab) is passed on.
    async fn lookup(&self, query: &Query) -> Result<Vec<Element>> {
        let found = match query {
            Query::Css(selector) => self.page.find_elements(selector.as_str()).await,
            _ => match query.to_xpath() {
                Some(xpath) => self.page.find_xpaths(xpath).await,
                None => Ok(Vec::new()),
            },
        };

        match found {
            Ok(elements) => Ok(elements),
            Err(e) if is_missing_node(&e) => {
                tracing::trace!("No match for {}: {}", query, e);
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Chrome reports an empty XPath search as an invalid result range, and a
/// node that detached between search and describe as an unknown id
const MISSING_NODE_MESSAGES: &[&str] = &[
    "Invalid search result range",
    "No search session with given id found",
    "Could not find node with given id",
    "No node with given id found",
];

fn is_missing_node(err: &CdpError) -> bool {
    match err {
        CdpError::NotFound => true,
        CdpError::Chrome(e) => MISSING_NODE_MESSAGES.iter().any(|m| e.message.contains(m)),
        _ => false,
    }
}

#[async_trait]
impl Driver for ChromiumDriver {
    async fn navigate(&self, url: &str) -> Result<()> {
        tracing::debug!("Navigating to {}", url);
        self.page.goto(url).await?;
        Ok(())
    }

    async fn find(&self, query: &Query) -> Result<Box<dyn NativeElement>> {
        self.lookup(query)
            .await?
            .into_iter()
            .next()
            .map(|element| Box::new(ChromiumElement::new(element)) as Box<dyn NativeElement>)
            .ok_or_else(|| Error::ElementNotFound(query.to_string()))
    }

    async fn find_all(&self, query: &Query) -> Result<Vec<Box<dyn NativeElement>>> {
        Ok(self
            .lookup(query)
            .await?
            .into_iter()
            .map(|el| Box::new(ChromiumElement::new(el)) as Box<dyn NativeElement>)
            .collect())
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        let params = ScreenshotParams::builder().full_page(true).build();
        self.page.save_screenshot(params, path).await?;
        tracing::debug!("Saved screenshot to {}", path.display());
        Ok(())
    }
}

/// `NativeElement` over a CDP DOM node
pub struct ChromiumElement {
    element: Element,
}

impl ChromiumElement {
    pub fn new(element: Element) -> Self {
        Self { element }
    }

    async fn call(&self, function: &str) -> Result<Option<Value>> {
        let returns = self.element.call_js_fn(function, false).await?;
        if let Some(details) = returns.exception_details {
            return Err(Error::Script(details.text));
        }
        Ok(returns.result.value)
    }

    async fn call_bool(&self, function: &str) -> Result<bool> {
        Ok(self
            .call(function)
            .await?
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }
}

#[async_trait]
impl NativeElement for ChromiumElement {
    async fn click(&self) -> Result<()> {
        self.element.click().await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.call(CLEAR_JS).await?;
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<()> {
        self.element.focus().await?;
        self.element.type_str(text).await?;
        Ok(())
    }

    async fn press_key(&self, key: Key) -> Result<()> {
        self.element.focus().await?;
        self.element.press_key(key.as_str()).await?;
        Ok(())
    }

    async fn select_option(&self, value: &str) -> Result<()> {
        let value = serde_json::to_string(value)?;
        let function = format!(
            r#"function() {{
    const wanted = {value};
    const option = Array.from(this.options || []).find(o => o.value === wanted);
    if (!option) {{ throw new Error('no option with value ' + wanted); }}
    this.value = wanted;
    this.dispatchEvent(new Event('change', {{ bubbles: true }}));
}}"#
        );
        self.call(&function).await?;
        Ok(())
    }

    async fn submit(&self) -> Result<()> {
        self.call(SUBMIT_JS).await?;
        Ok(())
    }

    async fn is_displayed(&self) -> Result<bool> {
        self.call_bool(DISPLAYED_JS).await
    }

    async fn is_selected(&self) -> Result<bool> {
        self.call_bool(SELECTED_JS).await
    }

    async fn text(&self) -> Result<String> {
        Ok(self.element.inner_text().await?.unwrap_or_default())
    }

    async fn value(&self) -> Result<String> {
        let value = self.element.property("value").await?;
        Ok(match value {
            Some(Value::String(s)) => s,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        })
    }
}
