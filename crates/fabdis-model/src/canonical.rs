//! Canonical field names shared across schema versions.
//!
//! Every parser strategy rewrites vendor headers into these names
//! before row assembly. Source columns that map to none of them are
//! carried through as free-form product attributes.

/// Canonical product reference field.
pub const REFERENCE: &str = "reference";

/// Canonical product designation field.
pub const NAME: &str = "name";

/// Canonical brand field.
pub const BRAND: &str = "brand";

/// Canonical net price field.
pub const PRICE: &str = "price";

/// Fields that must be present and normalizable for a row to yield a
/// [`Product`](crate::Product).
pub const REQUIRED_FIELDS: [&str; 3] = [REFERENCE, NAME, PRICE];

/// All fixed canonical fields, in output order.
pub const ALL_FIELDS: [&str; 4] = [REFERENCE, NAME, BRAND, PRICE];

/// Returns true if `field` is one of the fixed canonical fields.
pub fn is_canonical(field: &str) -> bool {
    ALL_FIELDS.contains(&field)
}

/// Returns true if `field` must be present for a row to be accepted.
pub fn is_required(field: &str) -> bool {
    REQUIRED_FIELDS.contains(&field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brand_is_optional() {
        assert!(is_canonical(BRAND));
        assert!(!is_required(BRAND));
    }

    #[test]
    fn required_fields_are_canonical() {
        for field in REQUIRED_FIELDS {
            assert!(is_canonical(field));
        }
    }
}
