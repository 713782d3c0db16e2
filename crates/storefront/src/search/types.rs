//! Wire types of the product search API.
//!
//! The API is loose about numbers: ids arrive as strings or integers and
//! counters sometimes as floats, so every field tolerates absence, `null`
//! and either representation.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use sml_market_core::types::money::as_number;

/// A product returned by the search API.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub code: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "lenient_decimal",
        serialize_with = "as_number::serialize"
    )]
    pub price: Decimal,
    #[serde(default, deserialize_with = "lenient_string")]
    pub unit: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub supplier_code: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub img_url: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub similarity_score: f64,
    #[serde(
        default,
        deserialize_with = "lenient_decimal",
        serialize_with = "as_number::serialize"
    )]
    pub sale_price: Decimal,
    #[serde(default, deserialize_with = "lenient_string")]
    pub premium_word: String,
    #[serde(
        default,
        deserialize_with = "lenient_decimal",
        serialize_with = "as_number::serialize"
    )]
    pub discount_price: Decimal,
    #[serde(
        default,
        deserialize_with = "lenient_decimal",
        serialize_with = "as_number::serialize"
    )]
    pub discount_percent: Decimal,
    #[serde(
        default,
        deserialize_with = "lenient_decimal",
        serialize_with = "as_number::serialize"
    )]
    pub final_price: Decimal,
    #[serde(
        default,
        deserialize_with = "lenient_decimal",
        serialize_with = "as_number::serialize"
    )]
    pub sold_qty: Decimal,
    #[serde(
        default,
        deserialize_with = "lenient_decimal",
        serialize_with = "as_number::serialize"
    )]
    pub multi_packing: Decimal,
    #[serde(default, deserialize_with = "lenient_string")]
    pub multi_packing_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub barcodes: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub barcode: String,
    #[serde(
        default,
        deserialize_with = "lenient_decimal",
        serialize_with = "as_number::serialize"
    )]
    pub qty_available: Decimal,
    #[serde(
        default,
        deserialize_with = "lenient_decimal",
        serialize_with = "as_number::serialize"
    )]
    pub balance_qty: Decimal,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub search_priority: f64,
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub products: Vec<Product>,
    pub total_count: u64,
    pub query: String,
    /// Server-side search time as reported by the API.
    pub duration: f64,
}

/// Request body of `POST /v1/search-by-vector`.
#[derive(Debug, Serialize)]
pub(super) struct SearchRequest<'a> {
    pub query: &'a str,
    pub limit: u32,
    pub offset: u32,
}

/// Response envelope of `POST /v1/search-by-vector`.
#[derive(Debug, Deserialize)]
pub(super) struct SearchEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<SearchData>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchData {
    #[serde(default, deserialize_with = "lenient_products")]
    pub data: Vec<Product>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total_count: u64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub query: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub duration: f64,
}

impl From<SearchData> for SearchPage {
    fn from(data: SearchData) -> Self {
        Self {
            products: data.data,
            total_count: data.total_count,
            query: data.query,
            duration: data.duration,
        }
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

fn lenient_decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        // Going through the JSON text keeps 12.1 as 12.1 rather than its
        // nearest binary double.
        Value::Number(n) => n.to_string().parse().unwrap_or_else(|_| {
            n.as_f64()
                .and_then(|f| Decimal::try_from(f).ok())
                .unwrap_or_default()
        }),
        _ => Decimal::ZERO,
    })
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0.0,
    })
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    })
}

fn lenient_products<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Product>, D::Error> {
    Ok(Option::<Vec<Product>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_product_tolerates_loose_types() {
        let product: Product = serde_json::from_value(json!({
            "id": 1042,
            "code": "BRK-001",
            "name": "Brake pad",
            "price": 12.1,
            "unit": null,
            "qty_available": "15",
            "similarity_score": 0.87,
            "search_priority": 2
        }))
        .unwrap();

        assert_eq!(product.id, "1042");
        assert_eq!(product.price, Decimal::new(121, 1));
        assert_eq!(product.unit, "");
        assert_eq!(product.qty_available, Decimal::from(15));
        assert!((product.similarity_score - 0.87).abs() < f64::EPSILON);
        assert_eq!(product.final_price, Decimal::ZERO);
    }

    #[test]
    fn test_envelope_with_null_data() {
        let envelope: SearchEnvelope = serde_json::from_value(json!({
            "success": true,
            "data": { "data": null, "total_count": 0, "query": "x", "duration": 1.5 },
            "message": "ok"
        }))
        .unwrap();

        let page = SearchPage::from(envelope.data.unwrap());
        assert!(page.products.is_empty());
        assert_eq!(page.query, "x");
    }
}
