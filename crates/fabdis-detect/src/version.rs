//! Schema version and vendor dialect fingerprinting.
//!
//! Fingerprints are declarative data, not code branches: each one
//! lists required and optional [`Signal`]s over the structural
//! skeleton. Signals are evaluated against the default rule set's
//! alias tables, so a renamed tab ("ArticlesFabdis") still satisfies
//! the canonical sheet signal it aliases.
//!
//! Match policy, deterministic by construction: fingerprints are
//! tried in decreasing specificity; among equal specificity, the most
//! recently registered entry wins. The first fingerprint whose
//! required signals all hold is the match; its confidence is
//! `0.5 + 0.5 * (matched optional / total optional)`, or 1.0 when it
//! declares no optional signals. No full match means
//! `SchemaVersion::Unknown` at zero confidence, which is a result the
//! caller branches on, never an error.

use fabdis_model::{Confidence, SchemaVersion};
use fabdis_rules::{RuleSet, engine};

use crate::skeleton::{SheetSkeleton, StructuralSkeleton};

/// One observable property of a structural skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Some tab resolves to this canonical sheet via the rule set.
    SheetAliasOf(&'static str),
    /// The primary header row binds this canonical field.
    ColumnAliasOf(&'static str),
    /// A tab carries exactly this raw name (vendor dialects).
    RawSheetNamed(&'static str),
    /// The primary header row carries exactly this raw header.
    RawColumnNamed(&'static str),
    /// Markup root element has this local name.
    RootElement(&'static str),
    /// Markup namespace URI contains this fragment.
    NamespaceContains(&'static str),
    /// Markup root has an immediate child with this local name.
    ChildElement(&'static str),
}

/// A version fingerprint: all `required` signals must hold; matched
/// `optional` signals only raise confidence.
#[derive(Debug, Clone, Copy)]
pub struct Fingerprint {
    pub version: SchemaVersion,
    pub specificity: u8,
    pub required: &'static [Signal],
    pub optional: &'static [Signal],
}

/// A vendor dialect fingerprint, checked within a matched version.
#[derive(Debug, Clone, Copy)]
pub struct VendorFingerprint {
    pub vendor: &'static str,
    pub required: &'static [Signal],
}

/// Registered version fingerprints, oldest first. Registration order
/// breaks specificity ties in favor of the later entry.
const FINGERPRINTS: &[Fingerprint] = &[
    // FAB-DIS 2.1: one implicit product table.
    Fingerprint {
        version: SchemaVersion::V2_1,
        specificity: 2,
        required: &[
            Signal::ColumnAliasOf("reference"),
            Signal::ColumnAliasOf("name"),
            Signal::ColumnAliasOf("price"),
        ],
        optional: &[
            Signal::SheetAliasOf("produits"),
            Signal::ColumnAliasOf("brand"),
        ],
    },
    // FAB-DIS 2.2: multi-tab workbook.
    Fingerprint {
        version: SchemaVersion::V2_2,
        specificity: 3,
        required: &[
            Signal::SheetAliasOf("produits"),
            Signal::SheetAliasOf("tarifs"),
            Signal::SheetAliasOf("marques"),
        ],
        optional: &[
            Signal::ColumnAliasOf("reference"),
            Signal::ColumnAliasOf("name"),
        ],
    },
    // FAB-DIS 3.x: XML with an XSD-referencing namespace.
    Fingerprint {
        version: SchemaVersion::V3_0,
        specificity: 3,
        required: &[Signal::NamespaceContains("xsd")],
        optional: &[
            Signal::RootElement("fabdis"),
            Signal::ChildElement("produit"),
        ],
    },
];

/// Vendor dialects, recognized as a second pass inside the matched
/// version. Dialect applicability is expressed through raw-name
/// signals that only that vendor's exports carry.
const VENDOR_FINGERPRINTS: &[VendorFingerprint] = &[
    VendorFingerprint {
        vendor: "cedeo",
        required: &[Signal::RawSheetNamed("Articles CEDEO")],
    },
    VendorFingerprint {
        vendor: "cedeo",
        required: &[Signal::RawColumnNamed("Réf. CEDEO")],
    },
];

/// Outcome of version detection.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionMatch {
    pub version: SchemaVersion,
    pub vendor_hint: Option<String>,
    pub confidence: Confidence,
}

impl VersionMatch {
    fn unknown() -> Self {
        Self {
            version: SchemaVersion::Unknown,
            vendor_hint: None,
            confidence: Confidence::ZERO,
        }
    }
}

/// Classifies the logical schema version of a skeleton.
pub fn detect_version(skeleton: &StructuralSkeleton, rules: &RuleSet) -> VersionMatch {
    let mut order: Vec<usize> = (0..FINGERPRINTS.len()).collect();
    // Decreasing specificity; later registration wins ties.
    order.sort_by(|a, b| {
        FINGERPRINTS[*b]
            .specificity
            .cmp(&FINGERPRINTS[*a].specificity)
            .then(b.cmp(a))
    });

    for index in order {
        let fingerprint = &FINGERPRINTS[index];
        if !fingerprint
            .required
            .iter()
            .all(|signal| evaluate(signal, skeleton, rules))
        {
            continue;
        }

        let matched_optional = fingerprint
            .optional
            .iter()
            .filter(|signal| evaluate(signal, skeleton, rules))
            .count();
        let confidence = if fingerprint.optional.is_empty() {
            Confidence::FULL
        } else {
            Confidence::new(0.5 + 0.5 * matched_optional as f32 / fingerprint.optional.len() as f32)
        };

        let vendor_hint = detect_vendor(skeleton, rules);
        tracing::debug!(
            version = %fingerprint.version,
            confidence = %confidence,
            vendor = vendor_hint.as_deref().unwrap_or("-"),
            "fingerprint matched"
        );

        return VersionMatch {
            version: fingerprint.version,
            vendor_hint,
            confidence,
        };
    }

    tracing::debug!("no fingerprint fully matched, version unknown");
    VersionMatch::unknown()
}

fn detect_vendor(skeleton: &StructuralSkeleton, rules: &RuleSet) -> Option<String> {
    VENDOR_FINGERPRINTS
        .iter()
        .find(|fingerprint| {
            fingerprint
                .required
                .iter()
                .all(|signal| evaluate(signal, skeleton, rules))
        })
        .map(|fingerprint| fingerprint.vendor.to_string())
}

/// Headers the column signals are evaluated against: the
/// produits-aliased tab when one exists, otherwise the first tab;
/// the header row for delimited text; child names for markup.
fn primary_headers<'a>(
    skeleton: &'a StructuralSkeleton,
    rules: &RuleSet,
) -> Option<&'a [String]> {
    match skeleton {
        StructuralSkeleton::Spreadsheet { sheets } => sheets
            .iter()
            .find(|sheet| engine::canonical_sheet(&sheet.name, rules) == Some("produits"))
            .or(sheets.first())
            .map(|sheet| sheet.headers.as_slice()),
        StructuralSkeleton::Delimited { headers, .. } => Some(headers.as_slice()),
        StructuralSkeleton::Markup { children, .. } => Some(children.as_slice()),
    }
}

fn sheets(skeleton: &StructuralSkeleton) -> &[SheetSkeleton] {
    match skeleton {
        StructuralSkeleton::Spreadsheet { sheets } => sheets,
        _ => &[],
    }
}

fn evaluate(signal: &Signal, skeleton: &StructuralSkeleton, rules: &RuleSet) -> bool {
    match signal {
        Signal::SheetAliasOf(canonical) => sheets(skeleton)
            .iter()
            .any(|sheet| engine::canonical_sheet(&sheet.name, rules) == Some(*canonical)),
        Signal::ColumnAliasOf(field) => primary_headers(skeleton, rules)
            .is_some_and(|headers| {
                headers
                    .iter()
                    .any(|header| engine::canonical_column(header, rules) == Some(*field))
            }),
        Signal::RawSheetNamed(name) => sheets(skeleton)
            .iter()
            .any(|sheet| engine::fold_key(&sheet.name) == engine::fold_key(name)),
        Signal::RawColumnNamed(name) => primary_headers(skeleton, rules)
            .is_some_and(|headers| {
                headers
                    .iter()
                    .any(|header| engine::fold_key(header) == engine::fold_key(name))
            }),
        Signal::RootElement(name) => matches!(
            skeleton,
            StructuralSkeleton::Markup { root, .. } if root.eq_ignore_ascii_case(name)
        ),
        Signal::NamespaceContains(fragment) => matches!(
            skeleton,
            StructuralSkeleton::Markup { namespace: Some(uri), .. }
                if uri.to_ascii_lowercase().contains(&fragment.to_ascii_lowercase())
        ),
        Signal::ChildElement(name) => matches!(
            skeleton,
            StructuralSkeleton::Markup { children, .. }
                if children.iter().any(|child| child.eq_ignore_ascii_case(name))
        ),
    }
}
