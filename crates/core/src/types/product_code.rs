//! URL-safe encoding of product codes.
//!
//! Supplier product codes contain characters such as `/`, `#` and `+` that
//! break URL paths, so product links carry the code as unpadded URL-safe
//! base64 of its UTF-8 bytes.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Longest product code accepted in links.
pub const MAX_PRODUCT_CODE_LENGTH: usize = 200;

/// Errors that can occur when decoding a product code.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductCodeError {
    /// The encoded value is empty.
    #[error("encoded product code is empty")]
    Empty,
    /// Not valid URL-safe base64.
    #[error("invalid product code encoding: {0}")]
    Encoding(String),
    /// Decoded bytes are not UTF-8.
    #[error("product code is not valid UTF-8")]
    Utf8,
}

/// Encode a product code for use as a URL path segment.
///
/// ```
/// use sml_market_core::{decode_product_code, encode_product_code};
///
/// let encoded = encode_product_code("BRK/01#A+");
/// assert!(!encoded.contains('/'));
/// assert_eq!(decode_product_code(&encoded).unwrap(), "BRK/01#A+");
/// ```
#[must_use]
pub fn encode_product_code(code: &str) -> String {
    URL_SAFE_NO_PAD.encode(code.as_bytes())
}

/// Decode a product code produced by [`encode_product_code`].
///
/// Trailing `=` padding is tolerated.
///
/// # Errors
///
/// Returns a [`ProductCodeError`] if the input is empty, not URL-safe base64,
/// or does not decode to UTF-8.
pub fn decode_product_code(encoded: &str) -> Result<String, ProductCodeError> {
    let trimmed = encoded.trim().trim_end_matches('=');
    if trimmed.is_empty() {
        return Err(ProductCodeError::Empty);
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(trimmed)
        .map_err(|e| ProductCodeError::Encoding(e.to_string()))?;
    String::from_utf8(bytes).map_err(|_| ProductCodeError::Utf8)
}

/// Turn a product link segment back into a product code.
///
/// Segments that are not valid encodings are taken as the plain code, so
/// links written before codes were encoded still resolve.
///
/// ```
/// use sml_market_core::{encode_product_code, resolve_product_code};
///
/// let encoded = encode_product_code("BRK/01#A");
/// assert_eq!(resolve_product_code(&encoded).unwrap(), "BRK/01#A");
/// assert_eq!(resolve_product_code("OIL-5W30").unwrap(), "OIL-5W30");
/// ```
///
/// # Errors
///
/// Returns [`ProductCodeError::Empty`] for a blank segment.
pub fn resolve_product_code(segment: &str) -> Result<String, ProductCodeError> {
    match decode_product_code(segment) {
        Ok(code) => Ok(code),
        Err(ProductCodeError::Empty) => Err(ProductCodeError::Empty),
        Err(ProductCodeError::Encoding(_) | ProductCodeError::Utf8) => {
            Ok(segment.trim().to_owned())
        }
    }
}

/// Whether a product code can be linked to.
#[must_use]
pub fn is_valid_product_code(code: &str) -> bool {
    !code.is_empty() && code.chars().count() <= MAX_PRODUCT_CODE_LENGTH
}

/// Storefront path of a product page.
#[must_use]
pub fn product_path(code: &str) -> String {
    format!("/product/{}", encode_product_code(code))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_special_characters() {
        for code in ["A/B", "#12", "1+1", "ผ้าเบรค/หน้า", "a b?c=d&e"] {
            let encoded = encode_product_code(code);
            assert!(
                encoded
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
                "{encoded}"
            );
            assert_eq!(decode_product_code(&encoded).unwrap(), code);
        }
    }

    #[test]
    fn test_padding_tolerated() {
        let encoded = format!("{}==", encode_product_code("AB"));
        assert_eq!(decode_product_code(&encoded).unwrap(), "AB");
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(decode_product_code(""), Err(ProductCodeError::Empty));
        assert!(matches!(
            decode_product_code("not base64!"),
            Err(ProductCodeError::Encoding(_))
        ));
        // 0xFF 0xFE is not UTF-8
        assert_eq!(decode_product_code("__4"), Err(ProductCodeError::Utf8));
    }

    #[test]
    fn test_plain_codes_resolve_to_themselves() {
        assert_eq!(resolve_product_code("BRK-002").unwrap(), "BRK-002");
        assert_eq!(resolve_product_code("OIL-5W30").unwrap(), "OIL-5W30");
        assert_eq!(resolve_product_code(" A#1 ").unwrap(), "A#1");
        assert_eq!(resolve_product_code("  "), Err(ProductCodeError::Empty));

        let encoded = encode_product_code("BRK/001#A");
        assert_eq!(resolve_product_code(&encoded).unwrap(), "BRK/001#A");
    }

    #[test]
    fn test_validity() {
        assert!(is_valid_product_code("BRK-001"));
        assert!(!is_valid_product_code(""));
        assert!(is_valid_product_code(&"x".repeat(200)));
        assert!(!is_valid_product_code(&"x".repeat(201)));
    }

    #[test]
    fn test_product_path() {
        assert_eq!(product_path("AB"), "/product/QUI");
    }

    proptest! {
        #[test]
        fn prop_roundtrip(code in "\\PC{1,64}") {
            let encoded = encode_product_code(&code);
            prop_assert_eq!(decode_product_code(&encoded).unwrap(), code);
        }
    }
}
