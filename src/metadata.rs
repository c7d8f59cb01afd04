//! Page metadata extraction
//!
//! Pure pattern-matching over raw HTML, no DOM parse. Precedence: social-card
//! (Open Graph) tags override the generic `<title>` / description meta tags;
//! within a field the first occurrence wins; absent fields stay empty.

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub url: String,
}

/// True when the meta tag carries `attr="value"` (either quote style)
fn has_attr(tag: &str, attr: &str, value: &str) -> bool {
    tag.contains(&format!("{attr}=\"{value}\"")) || tag.contains(&format!("{attr}='{value}'"))
}

/// Extract title, description, image and canonical url from an HTML document
pub fn extract(html: &str) -> PageMetadata {
    let mut meta = PageMetadata::default();

    let title_re = Regex::new(r"(?i)<title[^>]*>([^<]+)</title>").expect("static regex");
    if let Some(captures) = title_re.captures(html) {
        meta.title = captures[1].trim().to_string();
    }

    let tag_re = Regex::new(r"(?i)<meta[^>]*>").expect("static regex");
    let content_re = Regex::new(r#"(?i)content=["']([^"']+)["']"#).expect("static regex");

    let mut og_title = false;
    let mut og_description = false;
    let mut generic_description = String::new();

    for tag_match in tag_re.find_iter(html) {
        let tag = tag_match.as_str();
        let Some(content) = content_re.captures(tag).map(|c| c[1].to_string()) else {
            continue;
        };

        if has_attr(tag, "property", "og:title") && !og_title {
            meta.title = content;
            og_title = true;
        } else if has_attr(tag, "property", "og:description") && !og_description {
            meta.description = content;
            og_description = true;
        } else if has_attr(tag, "name", "description") && generic_description.is_empty() {
            generic_description = content;
        } else if has_attr(tag, "property", "og:image") && meta.image.is_empty() {
            meta.image = content;
        } else if has_attr(tag, "property", "og:url") && meta.url.is_empty() {
            meta.url = content;
        }
    }

    if !og_description && !generic_description.is_empty() {
        meta.description = generic_description;
    }

    meta
}
