//! Predictive search grouping.
//!
//! Shopify returns typeahead hits per resource type. The dropdown shows them
//! as sections in a fixed order, dropping empty ones, and every link carries
//! Shopify's `trackingParameters` so search analytics attribute the click.

use crate::shopify::types::{Image, PredictiveSearchResult};
use crate::views::ImageView;

/// Results per resource type in the typeahead.
pub const PREDICTIVE_SEARCH_LIMIT: i64 = 10;

/// Section of the predictive search dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Queries,
    Products,
    Collections,
    Pages,
    Articles,
}

impl SectionKind {
    /// Heading shown above the section.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Queries => "Suggestions",
            Self::Products => "Products",
            Self::Collections => "Collections",
            Self::Pages => "Pages",
            Self::Articles => "Articles",
        }
    }

    /// Stable identifier used in CSS classes.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queries => "queries",
            Self::Products => "products",
            Self::Collections => "collections",
            Self::Pages => "pages",
            Self::Articles => "articles",
        }
    }
}

/// One link in the dropdown.
#[derive(Debug, Clone)]
pub struct PredictiveItem {
    pub title: String,
    pub url: String,
    pub image: Option<ImageView>,
    pub price: Option<String>,
}

/// A non-empty group of items.
#[derive(Debug, Clone)]
pub struct PredictiveSection {
    pub kind: SectionKind,
    pub items: Vec<PredictiveItem>,
}

/// Grouped typeahead results for a term.
#[derive(Debug, Clone)]
pub struct PredictiveResults {
    pub term: String,
    pub sections: Vec<PredictiveSection>,
    pub total: usize,
}

impl PredictiveResults {
    /// Results for an empty term: nothing to show and nothing fetched.
    #[must_use]
    pub fn empty(term: &str) -> Self {
        Self {
            term: term.to_owned(),
            sections: Vec::new(),
            total: 0,
        }
    }

    /// Group an API response into sections.
    #[must_use]
    pub fn from_api(term: &str, result: PredictiveSearchResult) -> Self {
        let link =
            |base: String, tracking: Option<&str>| url_with_tracking_params(&base, tracking, term);
        let thumb =
            |image: Option<&Image>, title: &str| image.map(|i| ImageView::sized(i, title, 96));

        let queries = result
            .queries
            .iter()
            .map(|q| PredictiveItem {
                title: q.text.clone(),
                url: url_with_tracking_params("/search", q.tracking_parameters.as_deref(), &q.text),
                image: None,
                price: None,
            })
            .collect();

        let products = result
            .products
            .iter()
            .map(|p| {
                let variant = p.selected_or_first_available_variant.as_ref();
                PredictiveItem {
                    title: p.title.clone(),
                    url: link(format!("/products/{}", p.handle), p.tracking_parameters.as_deref()),
                    image: thumb(variant.and_then(|v| v.image.as_ref()), &p.title),
                    price: variant.map(|v| v.price.display()),
                }
            })
            .collect();

        let collections = result
            .collections
            .iter()
            .map(|c| PredictiveItem {
                title: c.title.clone(),
                url: link(format!("/collections/{}", c.handle), c.tracking_parameters.as_deref()),
                image: thumb(c.image.as_ref(), &c.title),
                price: None,
            })
            .collect();

        let pages = result
            .pages
            .iter()
            .map(|p| PredictiveItem {
                title: p.title.clone(),
                url: link(format!("/pages/{}", p.handle), p.tracking_parameters.as_deref()),
                image: None,
                price: None,
            })
            .collect();

        let articles = result
            .articles
            .iter()
            .map(|a| PredictiveItem {
                title: a.title.clone(),
                url: link(a.blog.article_url(&a.handle), a.tracking_parameters.as_deref()),
                image: thumb(a.image.as_ref(), &a.title),
                price: None,
            })
            .collect();

        let groups: [(SectionKind, Vec<PredictiveItem>); 5] = [
            (SectionKind::Queries, queries),
            (SectionKind::Products, products),
            (SectionKind::Collections, collections),
            (SectionKind::Pages, pages),
            (SectionKind::Articles, articles),
        ];
        let sections: Vec<PredictiveSection> = groups
            .into_iter()
            .filter(|(_, items)| !items.is_empty())
            .map(|(kind, items)| PredictiveSection { kind, items })
            .collect();

        Self {
            term: term.to_owned(),
            total: sections.iter().map(|s| s.items.len()).sum(),
            sections,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Append Shopify's tracking parameters and the search term to a URL.
///
/// `{base}?{tracking}&q={term}`; without tracking parameters just
/// `{base}?q={term}`.
#[must_use]
pub fn url_with_tracking_params(base: &str, tracking: Option<&str>, term: &str) -> String {
    let term = urlencoding::encode(term);
    match tracking.filter(|t| !t.is_empty()) {
        Some(tracking) => format!("{base}?{tracking}&q={term}"),
        None => format!("{base}?q={term}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn result(json: serde_json::Value) -> PredictiveSearchResult {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_url_with_tracking_params() {
        assert_eq!(
            url_with_tracking_params("/products/box", Some("_pos=1&_sid=abc&_ss=r"), "nova box"),
            "/products/box?_pos=1&_sid=abc&_ss=r&q=nova%20box"
        );
        assert_eq!(
            url_with_tracking_params("/pages/about", None, "about"),
            "/pages/about?q=about"
        );
    }

    #[test]
    fn test_sections_in_fixed_order_without_empty_groups() {
        let results = PredictiveResults::from_api(
            "nova",
            result(serde_json::json!({
                "articles": [{
                    "id": "gid://shopify/Article/1", "handle": "launch", "title": "Launch notes",
                    "blog": { "handle": "news" }, "image": null, "trackingParameters": "_pos=1"
                }],
                "collections": [],
                "pages": null,
                "products": [{
                    "id": "gid://shopify/Product/1", "handle": "nova-box", "title": "Nova Box",
                    "trackingParameters": "_pos=1&_ss=r",
                    "selectedOrFirstAvailableVariant": {
                        "id": "gid://shopify/ProductVariant/1", "title": "Default Title",
                        "availableForSale": true,
                        "price": { "amount": "49.0", "currencyCode": "USD" },
                        "selectedOptions": [], "image": null
                    }
                }],
                "queries": [{ "text": "nova box", "styledText": "<b>nova</b> box", "trackingParameters": null }]
            })),
        );

        let kinds: Vec<SectionKind> = results.sections.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![SectionKind::Queries, SectionKind::Products, SectionKind::Articles]
        );
        assert_eq!(results.total, 3);

        let product = results.sections.get(1).unwrap().items.first().unwrap();
        assert_eq!(product.url, "/products/nova-box?_pos=1&_ss=r&q=nova");
        assert_eq!(product.price.as_deref(), Some("$49.00"));

        let article = results.sections.get(2).unwrap().items.first().unwrap();
        assert_eq!(article.url, "/blogs/news/launch?_pos=1&q=nova");

        let suggestion = results.sections.first().unwrap().items.first().unwrap();
        assert_eq!(suggestion.url, "/search?q=nova%20box");
    }

    #[test]
    fn test_empty_response() {
        let results = PredictiveResults::from_api("zzz", PredictiveSearchResult::default());
        assert!(results.is_empty());
        assert!(results.sections.is_empty());
        assert!(PredictiveResults::empty("").is_empty());
    }
}
