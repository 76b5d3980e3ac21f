use crate::Result;
use async_trait::async_trait;
use std::fmt;
use std::path::Path;

/// How to find an element on the page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Query {
    Id(String),
    Name(String),
    XPath(String),
    Css(String),
}

impl Query {
    pub fn id(id: impl Into<String>) -> Self {
        Query::Id(id.into())
    }

    pub fn name(name: impl Into<String>) -> Self {
        Query::Name(name.into())
    }

    pub fn xpath(xpath: impl Into<String>) -> Self {
        Query::XPath(xpath.into())
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Query::Css(selector.into())
    }

    /// XPath equivalent of the query; `None` for CSS selectors.
    ///
    /// Ids go through XPath because real-world ids often contain dots and
    /// other characters that would need CSS escaping.
    pub fn to_xpath(&self) -> Option<String> {
        match self {
            Query::Id(id) => Some(format!("//*[@id={}]", xpath_literal(id))),
            Query::Name(name) => Some(format!("//*[@name={}]", xpath_literal(name))),
            Query::XPath(xpath) => Some(xpath.clone()),
            Query::Css(_) => None,
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Id(id) => write!(f, "id={}", id),
            Query::Name(name) => write!(f, "name={}", name),
            Query::XPath(xpath) => write!(f, "xpath={}", xpath),
            Query::Css(selector) => write!(f, "css={}", selector),
        }
    }
}

/// Quote a string as an XPath 1.0 literal
fn xpath_literal(value: &str) -> String {
    if !value.contains('"') {
        format!("\"{}\"", value)
    } else if !value.contains('\'') {
        format!("'{}'", value)
    } else {
        let parts: Vec<String> = value.split('"').map(|p| format!("\"{}\"", p)).collect();
        format!("concat({})", parts.join(", '\"', "))
    }
}

/// Keys scrapers send besides plain text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Tab,
    Enter,
}

impl Key {
    pub fn as_str(&self) -> &'static str {
        match self {
            Key::Tab => "Tab",
            Key::Enter => "Enter",
        }
    }
}

/// The capabilities the core needs from a driven browser page
#[async_trait]
pub trait Driver: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Find one element; `Error::ElementNotFound` when nothing matches
    async fn find(&self, query: &Query) -> Result<Box<dyn NativeElement>>;

    /// Find every matching element, possibly none
    async fn find_all(&self, query: &Query) -> Result<Vec<Box<dyn NativeElement>>>;

    async fn screenshot(&self, path: &Path) -> Result<()>;
}

/// The handful of element operations scrapers use
#[async_trait]
pub trait NativeElement: Send + Sync {
    async fn click(&self) -> Result<()>;
    async fn clear(&self) -> Result<()>;
    async fn type_text(&self, text: &str) -> Result<()>;
    async fn press_key(&self, key: Key) -> Result<()>;
    /// Select the `<option>` of a `<select>` whose value is `value`
    async fn select_option(&self, value: &str) -> Result<()>;
    /// Submit the form the element is (or belongs to)
    async fn submit(&self) -> Result<()>;
    async fn is_displayed(&self) -> Result<bool>;
    /// Checked state of checkboxes/radios, selected state of options
    async fn is_selected(&self) -> Result<bool>;
    async fn text(&self) -> Result<String>;
    async fn value(&self) -> Result<String>;
}
