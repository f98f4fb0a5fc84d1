//! Canonical product record and its reference identifier.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// A validated product reference.
///
/// Non-empty after trimming. Uniqueness within one run's output is
/// enforced by the parser pipeline, not here.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Reference(String);

impl Reference {
    pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ModelError::InvalidReference(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The canonical, format-agnostic representation of one catalog item.
///
/// Built by a parser strategy from a single raw row or element group
/// and never mutated afterwards. Fields outside the fixed canonical
/// set land in `attributes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub reference: Reference,
    pub name: String,
    pub brand: Option<String>,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl Product {
    /// Assembles a product, rejecting negative prices.
    pub fn new(
        reference: Reference,
        name: impl Into<String>,
        brand: Option<String>,
        price: Decimal,
        attributes: BTreeMap<String, String>,
    ) -> Result<Self, ModelError> {
        if price.is_sign_negative() && !price.is_zero() {
            return Err(ModelError::NegativePrice(
                price.to_string(),
                reference.as_str().to_string(),
            ));
        }
        Ok(Self {
            reference,
            name: name.into(),
            brand,
            price,
            attributes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(value: &str) -> Reference {
        Reference::new(value).unwrap()
    }

    #[test]
    fn reference_trims_input() {
        assert_eq!(reference("  AB-123  ").as_str(), "AB-123");
    }

    #[test]
    fn reference_rejects_blank() {
        assert!(matches!(
            Reference::new("   "),
            Err(ModelError::InvalidReference(_))
        ));
    }

    #[test]
    fn product_rejects_negative_price() {
        let result = Product::new(
            reference("AB-123"),
            "Raccord laiton",
            None,
            Decimal::new(-399, 2),
            BTreeMap::new(),
        );
        assert!(matches!(result, Err(ModelError::NegativePrice(..))));
    }

    #[test]
    fn product_allows_zero_price() {
        let product = Product::new(
            reference("AB-123"),
            "Echantillon",
            None,
            Decimal::ZERO,
            BTreeMap::new(),
        )
        .unwrap();
        assert!(product.price.is_zero());
    }

    #[test]
    fn product_serde_round_trip() {
        let mut attributes = BTreeMap::new();
        attributes.insert("ean".to_string(), "3250610000017".to_string());
        let product = Product::new(
            reference("AB-123"),
            "Raccord laiton 12mm",
            Some("Comap".to_string()),
            Decimal::new(399, 2),
            attributes,
        )
        .unwrap();

        let json = serde_json::to_string(&product).unwrap();
        let round: Product = serde_json::from_str(&json).unwrap();
        assert_eq!(round, product);
    }
}
