//! Product option and variant selection.
//!
//! The product page keeps the selected variant in the URL
//! (`/products/{handle}?Color=Blue&Size=M`) so option pickers are plain
//! links and every combination is shareable.

use url::form_urlencoded;

use crate::shopify::types::{Product, ProductOption, ProductVariant, SelectedOption};

/// One value of a product option, as rendered in the picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionValueState {
    pub value: String,
    pub selected: bool,
    /// Some available variant has this value together with the other selections.
    pub available: bool,
    pub url: String,
}

/// A product option with the state of each of its values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionState {
    pub name: String,
    pub values: Vec<OptionValueState>,
}

/// Product URL selecting the given options.
///
/// Names keep their first position; a later duplicate overwrites the value.
#[must_use]
pub fn variant_url(handle: &str, selected: &[SelectedOption]) -> String {
    let mut pairs: Vec<(&str, &str)> = Vec::with_capacity(selected.len());
    for option in selected {
        match pairs.iter_mut().find(|(name, _)| *name == option.name) {
            Some(pair) => pair.1 = option.value.as_str(),
            None => pairs.push((option.name.as_str(), option.value.as_str())),
        }
    }

    if pairs.is_empty() {
        return format!("/products/{handle}");
    }

    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    format!("/products/{handle}?{query}")
}

/// Keep only query pairs naming one of the product's options.
#[must_use]
pub fn selected_options_from_query(
    query: &[(String, String)],
    options: &[ProductOption],
) -> Vec<SelectedOption> {
    query
        .iter()
        .filter(|(name, _)| options.iter().any(|o| &o.name == name))
        .map(|(name, value)| SelectedOption::new(name, value))
        .collect()
}

fn matches(variant: &ProductVariant, selected: &[SelectedOption]) -> bool {
    selected
        .iter()
        .all(|s| variant.selected_options.iter().any(|o| o == s))
}

/// The variant for a selection.
///
/// Exact match on every selected option, else the first available variant,
/// else the first variant.
#[must_use]
pub fn find_variant<'a>(
    variants: &'a [ProductVariant],
    selected: &[SelectedOption],
) -> Option<&'a ProductVariant> {
    (!selected.is_empty())
        .then(|| variants.iter().find(|v| matches(v, selected)))
        .flatten()
        .or_else(|| variants.iter().find(|v| v.available_for_sale))
        .or_else(|| variants.first())
}

/// Picker state for every option value given the current selection.
#[must_use]
pub fn option_value_states(product: &Product, selected: &[SelectedOption]) -> Vec<OptionState> {
    product
        .options
        .iter()
        .map(|option| OptionState {
            name: option.name.clone(),
            values: option
                .values
                .iter()
                .map(|value| {
                    let candidate = with_option(selected, &option.name, value);
                    OptionValueState {
                        value: value.clone(),
                        selected: selected
                            .iter()
                            .any(|s| s.name == option.name && &s.value == value),
                        available: product
                            .variants
                            .iter()
                            .any(|v| v.available_for_sale && matches(v, &candidate)),
                        url: variant_url(&product.handle, &candidate),
                    }
                })
                .collect(),
        })
        .collect()
}

/// `selected` with `name` set to `value`, appended if absent.
fn with_option(selected: &[SelectedOption], name: &str, value: &str) -> Vec<SelectedOption> {
    let mut out: Vec<SelectedOption> = selected.to_vec();
    match out.iter_mut().find(|s| s.name == name) {
        Some(existing) => value.clone_into(&mut existing.value),
        None => out.push(SelectedOption::new(name, value)),
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::shopify::types::{Money, PriceRange};

    fn money() -> Money {
        Money {
            amount: "10.0".to_string(),
            currency_code: "USD".to_string(),
        }
    }

    fn variant(id: &str, color: &str, size: &str, available: bool) -> ProductVariant {
        ProductVariant {
            id: format!("gid://shopify/ProductVariant/{id}"),
            title: format!("{color} / {size}"),
            available_for_sale: available,
            sku: None,
            price: money(),
            compare_at_price: None,
            selected_options: vec![
                SelectedOption::new("Color", color),
                SelectedOption::new("Size", size),
            ],
            image: None,
        }
    }

    fn product() -> Product {
        Product {
            id: "gid://shopify/Product/1".to_string(),
            handle: "nova-tee".to_string(),
            title: "Nova Tee".to_string(),
            description: String::new(),
            description_html: String::new(),
            available_for_sale: true,
            vendor: String::new(),
            tags: vec![],
            seo: None,
            price_range: PriceRange {
                min_variant_price: money(),
                max_variant_price: money(),
            },
            compare_at_price_range: None,
            featured_image: None,
            images: vec![],
            options: vec![
                ProductOption {
                    name: "Color".to_string(),
                    values: vec!["Blue".to_string(), "Red".to_string()],
                },
                ProductOption {
                    name: "Size".to_string(),
                    values: vec!["S".to_string(), "M".to_string()],
                },
            ],
            variants: vec![
                variant("1", "Blue", "S", false),
                variant("2", "Blue", "M", true),
                variant("3", "Red", "S", true),
                variant("4", "Red", "M", false),
            ],
            selected_or_first_available_variant: None,
        }
    }

    #[test]
    fn test_variant_url() {
        assert_eq!(variant_url("nova-tee", &[]), "/products/nova-tee");
        assert_eq!(
            variant_url(
                "nova-tee",
                &[
                    SelectedOption::new("Color", "Sky Blue"),
                    SelectedOption::new("Size", "M"),
                    SelectedOption::new("Color", "Red"),
                ]
            ),
            "/products/nova-tee?Color=Red&Size=M"
        );
        assert_eq!(
            variant_url("nova-tee", &[SelectedOption::new("Color", "Sky Blue")]),
            "/products/nova-tee?Color=Sky+Blue"
        );
    }

    #[test]
    fn test_selected_options_from_query_ignores_unknown() {
        let query = vec![
            ("Color".to_string(), "Red".to_string()),
            ("utm_source".to_string(), "mail".to_string()),
        ];
        let selected = selected_options_from_query(&query, &product().options);
        assert_eq!(selected, vec![SelectedOption::new("Color", "Red")]);
    }

    #[test]
    fn test_find_variant() {
        let product = product();
        let exact = find_variant(
            &product.variants,
            &[
                SelectedOption::new("Color", "Red"),
                SelectedOption::new("Size", "M"),
            ],
        )
        .unwrap();
        assert!(exact.id.ends_with("/4"));

        // No selection: first available
        assert!(find_variant(&product.variants, &[]).unwrap().id.ends_with("/2"));

        // Unknown value: falls back to first available
        let fallback =
            find_variant(&product.variants, &[SelectedOption::new("Color", "Green")]).unwrap();
        assert!(fallback.id.ends_with("/2"));

        assert!(find_variant(&[], &[]).is_none());
    }

    #[test]
    fn test_find_variant_all_sold_out_returns_first() {
        let variants = vec![variant("7", "Blue", "S", false), variant("8", "Red", "S", false)];
        assert!(find_variant(&variants, &[]).unwrap().id.ends_with("/7"));
    }

    #[test]
    fn test_option_value_states() {
        let product = product();
        let selected = vec![
            SelectedOption::new("Color", "Blue"),
            SelectedOption::new("Size", "M"),
        ];
        let states = option_value_states(&product, &selected);

        let color = states.first().unwrap();
        let blue = color.values.first().unwrap();
        let red = color.values.get(1).unwrap();
        assert!(blue.selected && blue.available);
        // Red / M is sold out
        assert!(!red.selected && !red.available);
        assert_eq!(red.url, "/products/nova-tee?Color=Red&Size=M");

        let size = states.get(1).unwrap();
        let small = size.values.first().unwrap();
        // Blue / S is sold out
        assert!(!small.available);
        assert_eq!(small.url, "/products/nova-tee?Color=Blue&Size=S");
    }
}
