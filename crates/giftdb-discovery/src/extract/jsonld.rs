//! schema.org `Product` extraction from `<script type="application/ld+json">`
//! blocks.

use std::sync::LazyLock;

use giftdb_core::{Price, ProductRecord};
use regex::Regex;
use serde_json::Value;

use super::html::clean_text;
use crate::allowlist::retailer_label;

static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("valid json-ld script regex")
});

static NULL: Value = Value::Null;

/// Extract the first titled `Product` node found in the page's JSON-LD.
///
/// Blocks that fail to parse are skipped; later blocks are still examined.
/// Returns `None` when no Product node carries a non-empty name.
#[must_use]
pub fn extract_product_jsonld(html: &str, page_url: &str) -> Option<ProductRecord> {
    for cap in SCRIPT_RE.captures_iter(html) {
        let raw = cap.get(1).map_or("", |m| m.as_str()).trim();
        if raw.is_empty() {
            continue;
        }
        let value: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(url = page_url, error = %e, "skipping malformed JSON-LD block");
                continue;
            }
        };

        let mut products = Vec::new();
        collect_product_nodes(&value, &mut products);

        if let Some(record) = products
            .into_iter()
            .find_map(|node| product_node_to_record(node, page_url))
        {
            return Some(record);
        }
    }
    None
}

/// Walk arrays, `@graph` containers, and nested objects collecting every
/// node whose `@type` is or includes `Product`.
fn collect_product_nodes<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            if is_product_type(map.get("@type")) {
                out.push(value);
                return;
            }
            for child in map.values() {
                collect_product_nodes(child, out);
            }
        }
        Value::Array(items) => {
            for child in items {
                collect_product_nodes(child, out);
            }
        }
        _ => {}
    }
}

fn is_product_type(node_type: Option<&Value>) -> bool {
    match node_type {
        Some(Value::String(s)) => type_is_product(s),
        Some(Value::Array(values)) => values.iter().filter_map(Value::as_str).any(type_is_product),
        _ => false,
    }
}

fn type_is_product(s: &str) -> bool {
    let s = s.trim();
    let s = s.rsplit('/').next().unwrap_or(s);
    s.eq_ignore_ascii_case("Product")
}

fn product_node_to_record(node: &Value, page_url: &str) -> Option<ProductRecord> {
    let title = node
        .get("name")
        .and_then(Value::as_str)
        .map(clean_text)
        .filter(|t| !t.is_empty())?;

    let mut record = ProductRecord::for_url(page_url);
    record.title = Some(title);
    record.price = node.get("offers").and_then(offer_price);
    record.brand = node.get("brand").and_then(name_of);
    record.model = node.get("model").and_then(name_of);
    record.category = node
        .get("category")
        .and_then(first_string)
        .map(|c| clean_text(&c))
        .filter(|c| !c.is_empty());
    record.image_url = node.get("image").and_then(image_url);
    record.retailer = node
        .get("isPartOf")
        .or_else(|| node.get("publisher"))
        .or_else(|| node.get("offers").and_then(|o| first_item(o).get("seller")))
        .and_then(name_of)
        .or_else(|| retailer_label(page_url));

    Some(record)
}

/// First element of an array, or the value itself.
fn first_item(value: &Value) -> &Value {
    match value {
        Value::Array(items) => items.first().unwrap_or(&NULL),
        other => other,
    }
}

fn first_string(value: &Value) -> Option<String> {
    match first_item(value) {
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// A plain string, or an object's `name`.
fn name_of(value: &Value) -> Option<String> {
    let value = first_item(value);
    let raw = match value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get("name").and_then(Value::as_str),
        _ => None,
    }?;
    let cleaned = clean_text(raw);
    (!cleaned.is_empty()).then_some(cleaned)
}

/// `image` may be a URL string, a list of them, or an `ImageObject`.
fn image_url(value: &Value) -> Option<String> {
    match first_item(value) {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(map) => map
            .get("url")
            .or_else(|| map.get("contentUrl"))
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

/// Offers may be one object or a list; the price may be flat (`price`,
/// `lowPrice`) or nested under `priceSpecification`.
fn offer_price(offers: &Value) -> Option<Price> {
    let offer = first_item(offers);
    offer
        .get("price")
        .or_else(|| offer.get("lowPrice"))
        .and_then(price_value)
        .or_else(|| {
            offer
                .get("priceSpecification")
                .map(first_item)
                .and_then(|spec| spec.get("price"))
                .and_then(price_value)
        })
}

fn price_value(value: &Value) -> Option<Price> {
    match value {
        Value::Number(n) => Price::parse(&n.to_string()),
        Value::String(s) => Price::parse(s),
        _ => None,
    }
}
