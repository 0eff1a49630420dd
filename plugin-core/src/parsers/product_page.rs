//! Pulls breadcrumb categories and the description/composition sections out
//! of a marketplace product page.
//!
//! This is a tolerant scanner, not an HTML parser: it walks tags with regular
//! expressions and balances nesting for the one element name it is following.
//! Malformed markup degrades to empty fields rather than failing.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::model::product::ProductPage;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("cannot build matcher for <{tag}>: {source}")]
    TagPattern {
        tag: String,
        #[source]
        source: regex::Error,
    },
}

/// Turns page markup into the text sections the analyzer needs.
pub trait PageExtractor: Send + Sync {
    fn extract(&self, html: &str) -> Result<ProductPage, ExtractError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupExtractor;

impl PageExtractor for MarkupExtractor {
    fn extract(&self, html: &str) -> Result<ProductPage, ExtractError> {
        let (description, composition) = description_and_composition(html)?;
        Ok(ProductPage {
            categories: categories(html)?,
            description,
            composition,
        })
    }
}

const DESCRIPTION_HEADINGS: [&str; 2] = ["описание", "description"];
const COMPOSITION_HEADINGS: [&str; 4] = [
    "состав",
    "характеристики",
    "composition",
    "characteristics",
];

static BREADCRUMBS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<[a-z][a-z0-9-]*\b[^>]*\bdata-widget\s*=\s*["']breadCrumbs["'][^>]*>"#)
        .expect("breadcrumbs pattern is valid")
});

static SECTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<[a-z][a-z0-9-]*\b[^>]*\bid\s*=\s*["']section-description["'][^>]*>"#)
        .expect("section pattern is valid")
});

static ANCHOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<a\b[^>]*>").expect("anchor pattern is valid"));

static HREF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("href pattern is valid")
});

static SPAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<span\b[^>]*>").expect("span pattern is valid"));

static H2_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<h2\b[^>]*>(.*?)</h2\s*>").expect("h2 pattern is valid"));

static DIV_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<div\b[^>]*>").expect("div pattern is valid"));

static TAG_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<([A-Za-z][A-Za-z0-9-]*)").expect("tag name pattern is valid"));

static ANY_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->|<[^>]*>").expect("tag pattern is valid"));

static SCRIPT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
        .expect("script pattern is valid")
});

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Labels of breadcrumb links that point at a category, in document order.
pub fn categories(html: &str) -> Result<Vec<String>, ExtractError> {
    let Some(open) = BREADCRUMBS_RE.find(html) else {
        return Ok(Vec::new());
    };
    let crumbs = element_inner(html, open.start())?;

    let mut out = Vec::new();
    for anchor in ANCHOR_RE.find_iter(crumbs) {
        let href = HREF_RE
            .captures(anchor.as_str())
            .and_then(|c| c.get(1).or_else(|| c.get(2)))
            .map(|m| m.as_str())
            .unwrap_or("");
        if !href.contains("/category/") {
            continue;
        }

        let link = element_inner(crumbs, anchor.start())?;
        if let Some(span) = SPAN_RE.find(link) {
            out.push(text_content(element_inner(link, span.start())?));
        }
    }

    Ok(out)
}

/// Description and composition text. Later sections of the same role
/// replace earlier ones.
pub fn description_and_composition(html: &str) -> Result<(String, String), ExtractError> {
    let mut description = String::new();
    let mut composition = String::new();

    for open in SECTION_RE.find_iter(html) {
        let section = element_inner(html, open.start())?;

        let Some(h2) = H2_RE.captures(section) else {
            continue;
        };
        let heading = text_content(h2.get(1).map(|m| m.as_str()).unwrap_or("")).to_lowercase();
        let after_heading = &section[h2.get(0).map(|m| m.end()).unwrap_or(0)..];

        let body = match DIV_RE.find(after_heading) {
            Some(div) => Some(text_content(element_inner(after_heading, div.start())?)),
            None => None,
        };

        if DESCRIPTION_HEADINGS.iter().any(|h| heading.contains(h)) {
            if let Some(text) = body {
                description = text;
            }
        } else if COMPOSITION_HEADINGS.iter().any(|h| heading.contains(h)) {
            if let Some(text) = body {
                composition = text;
            }
        }
    }

    Ok((description, composition))
}

/// Markup between the opening tag starting at `open_start` and its matching
/// close tag. An unclosed element runs to the end of `html`.
fn element_inner(html: &str, open_start: usize) -> Result<&str, ExtractError> {
    let rest = &html[open_start..];
    let Some(name) = TAG_NAME_RE.captures(rest).and_then(|c| c.get(1)) else {
        return Ok("");
    };
    let Some(open_len) = rest.find('>') else {
        return Ok("");
    };
    if rest[..open_len].ends_with('/') {
        return Ok("");
    }

    let body_start = open_start + open_len + 1;
    let body = &html[body_start..];

    let pattern = format!(r"(?i)<(/?){}\b[^>]*?(/?)>", regex::escape(name.as_str()));
    let tag_re = Regex::new(&pattern).map_err(|source| ExtractError::TagPattern {
        tag: name.as_str().to_string(),
        source,
    })?;

    let mut depth = 1usize;
    for caps in tag_re.captures_iter(body) {
        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        let self_closing = caps.get(2).is_some_and(|m| !m.as_str().is_empty());
        if closing {
            depth -= 1;
            if depth == 0 {
                let end = caps.get(0).map(|m| m.start()).unwrap_or(body.len());
                return Ok(&body[..end]);
            }
        } else if !self_closing {
            depth += 1;
        }
    }

    Ok(body)
}

/// Visible text of a fragment: tags dropped, common entities decoded,
/// whitespace collapsed.
pub fn text_content(fragment: &str) -> String {
    let without_scripts = SCRIPT_RE.replace_all(fragment, " ");
    let without_tags = ANY_TAG_RE.replace_all(&without_scripts, " ");
    let decoded = decode_entities(&without_tags);
    WHITESPACE_RE.replace_all(&decoded, " ").trim().to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
