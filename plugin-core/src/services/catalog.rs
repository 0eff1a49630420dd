use crate::model::product::AnalogEntry;

/// Looks up products similar to the one being analyzed.
pub trait CatalogSearch: Send + Sync {
    fn find_similar(&self, categories: &[String], composition: &str) -> Vec<AnalogEntry>;
}

/// Deterministic stand-in that fabricates one analog per leading category.
#[derive(Debug, Clone)]
pub struct StubCatalog {
    pub max_results: usize,
    pub search_url: String,
}

impl Default for StubCatalog {
    fn default() -> Self {
        StubCatalog {
            max_results: 3,
            search_url: "https://www.ozon.ru/search?text=".to_string(),
        }
    }
}

impl CatalogSearch for StubCatalog {
    fn find_similar(&self, categories: &[String], _composition: &str) -> Vec<AnalogEntry> {
        categories
            .iter()
            .take(self.max_results)
            .enumerate()
            .map(|(i, category)| AnalogEntry {
                name: format!("Analog in category {category}"),
                price: format!("{} ₽", 1000 + i * 200),
                url: format!("{}{}", self.search_url, category),
                similarity: format!("{}%", 80usize.saturating_sub(i * 10)),
            })
            .collect()
    }
}
