use crate::{Error, Result, SourceScraper, airlines};
use std::collections::BTreeMap;

/// Scrapers by source id
pub struct SourceRegistry {
    scrapers: BTreeMap<&'static str, Box<dyn SourceScraper>>,
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SourceRegistry {
    pub fn empty() -> Self {
        Self {
            scrapers: BTreeMap::new(),
        }
    }

    /// Registry holding every built-in airline
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for scraper in airlines::builtin() {
            registry.register(scraper);
        }
        registry
    }

    /// Add a scraper, replacing any registered under the same id
    pub fn register(&mut self, scraper: Box<dyn SourceScraper>) {
        let id = scraper.id();
        if self.scrapers.insert(id, scraper).is_some() {
            tracing::warn!("Replaced scraper registered as {}", id);
        }
    }

    pub fn get(&self, id: &str) -> Result<&dyn SourceScraper> {
        self.scrapers
            .get(id)
            .map(|s| s.as_ref())
            .ok_or_else(|| Error::UnknownSource(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.scrapers.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.scrapers.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn SourceScraper> {
        self.scrapers.values().map(|s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.scrapers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scrapers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FareScope;

    #[test]
    fn test_builtin_registry() {
        let registry = SourceRegistry::builtin();
        assert_eq!(
            registry.ids().collect::<Vec<_>>(),
            vec!["aa", "bing", "delta", "southwest", "united", "virginamerica"]
        );
        assert_eq!(registry.get("united").unwrap().scope(), FareScope::Month);
        assert_eq!(registry.get("aa").unwrap().scope(), FareScope::Window(3));
        assert_eq!(registry.get("delta").unwrap().options(), &["nearby"]);
    }

    #[test]
    fn test_unknown_source() {
        let registry = SourceRegistry::builtin();
        let err = registry.get("jetblue").err().unwrap();
        assert!(matches!(err, Error::UnknownSource(ref id) if id == "jetblue"));
        assert!(!registry.contains("jetblue"));
    }
}
