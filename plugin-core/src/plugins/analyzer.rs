use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::{str_param, Plugin};
use crate::error::PluginError;
use crate::model::product::AnalysisResult;
use crate::parsers::product_page::{MarkupExtractor, PageExtractor};
use crate::protocol::{Method, Params};
use crate::services::catalog::{CatalogSearch, StubCatalog};
use crate::services::fingerprint::page_digest;
use crate::services::scoring;

pub const DEFAULT_PRODUCT_URL_PREFIX: &str = "https://www.ozon.ru/product/";

const NOT_A_PRODUCT_PAGE: &str =
    "This is not an Ozon product page. Open a product page to analyze it.";

/// Compares a product page's marketing description with its composition and
/// suggests similar products.
pub struct OzonAnalyzer {
    extractor: Box<dyn PageExtractor>,
    catalog: Box<dyn CatalogSearch>,
    product_url_prefix: String,
}

impl Default for OzonAnalyzer {
    fn default() -> Self {
        OzonAnalyzer::new(
            Box::new(MarkupExtractor),
            Box::new(StubCatalog::default()),
            DEFAULT_PRODUCT_URL_PREFIX,
        )
    }
}

impl OzonAnalyzer {
    pub fn new(
        extractor: Box<dyn PageExtractor>,
        catalog: Box<dyn CatalogSearch>,
        product_url_prefix: impl Into<String>,
    ) -> Self {
        OzonAnalyzer {
            extractor,
            catalog,
            product_url_prefix: product_url_prefix.into(),
        }
    }

    /// A page counts as a product page when its locator starts with the
    /// product URL prefix. The locator is `page_url` when the caller sends it,
    /// otherwise the markup itself, which hosts prefix with the page address.
    pub fn is_product_page(&self, page_url: Option<&str>, page_html: &str) -> bool {
        page_url
            .unwrap_or(page_html)
            .starts_with(&self.product_url_prefix)
    }

    fn analyze_product(&self, params: &Params) -> Result<Value, PluginError> {
        let page_html = str_param(params, "page_html").unwrap_or("");
        if page_html.is_empty() {
            return Err(PluginError::InvalidParams("page HTML not provided".into()));
        }

        let page_url = str_param(params, "page_url");
        let digest = page_digest(page_html);
        debug!(page = %digest, bytes = page_html.len(), url = ?page_url, "analyzing page");

        if !self.is_product_page(page_url, page_html) {
            info!(page = %digest, "not a product page");
            return Ok(json!({ "message": NOT_A_PRODUCT_PAGE }));
        }

        let page = self
            .extractor
            .extract(page_html)
            .map_err(|e| PluginError::Analysis(e.to_string()))?;
        let analysis = scoring::score(&page.description, &page.composition);
        if !analysis.is_available() {
            warn!(page = %digest, "description or composition missing, not scored");
        }
        let analogs = self.catalog.find_similar(&page.categories, &page.composition);

        info!(
            page = %digest,
            categories = page.categories.len(),
            score = analysis.score,
            analogs = analogs.len(),
            "product analyzed"
        );

        let result = AnalysisResult::new(page, analysis, analogs);
        serde_json::to_value(result).map_err(|e| PluginError::Analysis(e.to_string()))
    }
}

impl Plugin for OzonAnalyzer {
    fn name(&self) -> &'static str {
        "ozon-analyzer"
    }

    fn methods(&self) -> &'static [Method] {
        &[Method::AnalyzeProduct]
    }

    fn handle(&self, method: Method, params: &Params) -> Result<Value, PluginError> {
        match method {
            Method::AnalyzeProduct => self.analyze_product(params),
            other => Err(PluginError::MethodNotFound(other.as_str().to_string())),
        }
    }
}
