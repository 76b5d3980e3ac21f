//! Scripted in-memory driver for tests.

use crate::driver::{Driver, Key, NativeElement, Query};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug)]
struct ElementState {
    text: String,
    value: String,
    displayed: bool,
    hidden_polls: u32,
    selected: bool,
    checkable: bool,
    clicks: u32,
    keys: Vec<Key>,
    typed_chunks: u32,
    submits: u32,
    selected_option: Option<String>,
}

/// An element whose state tests can script and inspect
#[derive(Debug, Clone)]
pub struct FakeElement {
    state: Arc<Mutex<ElementState>>,
}

impl Default for FakeElement {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeElement {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ElementState {
                text: String::new(),
                value: String::new(),
                displayed: true,
                hidden_polls: 0,
                selected: false,
                checkable: false,
                clicks: 0,
                keys: Vec::new(),
                typed_chunks: 0,
                submits: 0,
                selected_option: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ElementState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.lock().text = text.into();
        self
    }

    pub fn with_value(self, value: impl Into<String>) -> Self {
        self.lock().value = value.into();
        self
    }

    /// Clicking flips the checked state
    pub fn checkbox(self, checked: bool) -> Self {
        {
            let mut state = self.lock();
            state.checkable = true;
            state.selected = checked;
        }
        self
    }

    pub fn hidden(self) -> Self {
        self.lock().displayed = false;
        self
    }

    /// Report hidden for the first `polls` visibility checks
    pub fn visible_after(self, polls: u32) -> Self {
        self.lock().hidden_polls = polls;
        self
    }

    pub fn set_displayed(&self, displayed: bool) {
        self.lock().displayed = displayed;
    }

    pub fn value_now(&self) -> String {
        self.lock().value.clone()
    }

    pub fn selected_now(&self) -> bool {
        self.lock().selected
    }

    pub fn clicks(&self) -> u32 {
        self.lock().clicks
    }

    pub fn keys(&self) -> Vec<Key> {
        self.lock().keys.clone()
    }

    pub fn typed_chunks(&self) -> u32 {
        self.lock().typed_chunks
    }

    pub fn submits(&self) -> u32 {
        self.lock().submits
    }

    pub fn selected_option(&self) -> Option<String> {
        self.lock().selected_option.clone()
    }
}

#[async_trait]
impl NativeElement for FakeElement {
    async fn click(&self) -> Result<()> {
        let mut state = self.lock();
        state.clicks += 1;
        if state.checkable {
            state.selected = !state.selected;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.lock().value.clear();
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<()> {
        let mut state = self.lock();
        state.value.push_str(text);
        state.typed_chunks += 1;
        Ok(())
    }

    async fn press_key(&self, key: Key) -> Result<()> {
        self.lock().keys.push(key);
        Ok(())
    }

    async fn select_option(&self, value: &str) -> Result<()> {
        let mut state = self.lock();
        state.selected_option = Some(value.to_string());
        state.value = value.to_string();
        Ok(())
    }

    async fn submit(&self) -> Result<()> {
        self.lock().submits += 1;
        Ok(())
    }

    async fn is_displayed(&self) -> Result<bool> {
        let mut state = self.lock();
        if state.hidden_polls > 0 {
            state.hidden_polls -= 1;
            return Ok(false);
        }
        Ok(state.displayed)
    }

    async fn is_selected(&self) -> Result<bool> {
        Ok(self.lock().selected)
    }

    async fn text(&self) -> Result<String> {
        Ok(self.lock().text.clone())
    }

    async fn value(&self) -> Result<String> {
        Ok(self.lock().value.clone())
    }
}

#[derive(Debug, Default)]
struct DriverState {
    elements: HashMap<Query, Vec<FakeElement>>,
    missing_polls: HashMap<Query, u32>,
    finds: HashMap<Query, u32>,
    visits: Vec<String>,
    screenshots: Vec<PathBuf>,
    navigation_error: Option<String>,
    lookup_error: Option<String>,
}

/// A page made of scripted elements keyed by the exact query that finds them
#[derive(Debug, Clone, Default)]
pub struct FakeDriver {
    state: Arc<Mutex<DriverState>>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, DriverState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn with_element(self, query: Query, element: FakeElement) -> Self {
        self.lock().elements.entry(query).or_default().push(element);
        self
    }

    pub fn with_elements(self, query: Query, elements: Vec<FakeElement>) -> Self {
        self.lock().elements.entry(query).or_default().extend(elements);
        self
    }

    /// Make `query` come up empty for its first `polls` lookups
    pub fn appears_after(self, query: Query, polls: u32) -> Self {
        self.lock().missing_polls.insert(query, polls);
        self
    }

    pub fn failing_navigation(self, message: impl Into<String>) -> Self {
        self.lock().navigation_error = Some(message.into());
        self
    }

    /// Every lookup fails as if the browser connection had dropped
    pub fn failing_lookups(self, message: impl Into<String>) -> Self {
        self.lock().lookup_error = Some(message.into());
        self
    }

    pub fn finds(&self, query: &Query) -> u32 {
        self.lock().finds.get(query).copied().unwrap_or(0)
    }

    pub fn visits(&self) -> Vec<String> {
        self.lock().visits.clone()
    }

    pub fn screenshots(&self) -> Vec<PathBuf> {
        self.lock().screenshots.clone()
    }

    fn lookup(&self, query: &Query) -> Result<Vec<FakeElement>> {
        let mut state = self.lock();
        *state.finds.entry(query.clone()).or_default() += 1;
        if let Some(message) = &state.lookup_error {
            return Err(Error::Cdp(message.clone()));
        }
        if let Some(remaining) = state.missing_polls.get_mut(query)
            && *remaining > 0
        {
            *remaining -= 1;
            return Ok(Vec::new());
        }
        Ok(state.elements.get(query).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl Driver for FakeDriver {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.lock();
        state.visits.push(url.to_string());
        match &state.navigation_error {
            Some(message) => Err(Error::Browser(message.clone())),
            None => Ok(()),
        }
    }

    async fn find(&self, query: &Query) -> Result<Box<dyn NativeElement>> {
        self.lookup(query)?
            .into_iter()
            .next()
            .map(|el| Box::new(el) as Box<dyn NativeElement>)
            .ok_or_else(|| Error::ElementNotFound(query.to_string()))
    }

    async fn find_all(&self, query: &Query) -> Result<Vec<Box<dyn NativeElement>>> {
        Ok(self
            .lookup(query)?
            .into_iter()
            .map(|el| Box::new(el) as Box<dyn NativeElement>)
            .collect())
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        self.lock().screenshots.push(path.to_path_buf());
        Ok(())
    }
}
