//! The closed catalog of purchasable document bundles.
//!
//! This table is the security boundary for checkout: the set of purchasable
//! document ids and their storage object paths is server-owned and can never
//! be overridden by request payload content. Item ids arriving from the
//! client are only ever used as lookup keys into this table; storage paths
//! are never assembled from client input.

use rust_decimal::Decimal;
use serde::Serialize;

/// A purchasable document bundle.
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    /// Stable catalog key, referenced by the marketing site's cart.
    pub id: &'static str,
    /// Canonical display title.
    pub title: &'static str,
    /// List price in cents.
    pub unit_price_cents: i64,
    /// Object path inside the storage bucket. Server-owned, never derived
    /// from client input.
    pub object_path: &'static str,
}

impl CatalogEntry {
    /// List price as a decimal dollar amount.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        Decimal::new(self.unit_price_cents, 2)
    }
}

/// Every document bundle and licensing guide the firm sells.
///
/// Versioned object paths: re-uploading a revised bundle gets a new path and
/// a new catalog revision, so links issued for past orders keep resolving.
pub const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        id: "gdpr-readiness",
        title: "GDPR Readiness Bundle",
        unit_price_cents: 45_000,
        object_path: "bundles/gdpr-readiness-v4.zip",
    },
    CatalogEntry {
        id: "soc2-policy-pack",
        title: "SOC 2 Policy Pack",
        unit_price_cents: 50_000,
        object_path: "bundles/soc2-policy-pack-v2.zip",
    },
    CatalogEntry {
        id: "iso27001-toolkit",
        title: "ISO 27001 Documentation Toolkit",
        unit_price_cents: 85_000,
        object_path: "bundles/iso27001-toolkit-v3.zip",
    },
    CatalogEntry {
        id: "hipaa-essentials",
        title: "HIPAA Essentials Bundle",
        unit_price_cents: 35_000,
        object_path: "bundles/hipaa-essentials-v2.zip",
    },
    CatalogEntry {
        id: "pci-saq-workbook",
        title: "PCI DSS SAQ Workbook",
        unit_price_cents: 27_500,
        object_path: "bundles/pci-saq-workbook-v1.zip",
    },
    CatalogEntry {
        id: "aml-program-template",
        title: "AML/KYC Program Template",
        unit_price_cents: 60_000,
        object_path: "bundles/aml-program-template-v2.zip",
    },
    CatalogEntry {
        id: "privacy-impact-kit",
        title: "Privacy Impact Assessment Kit",
        unit_price_cents: 22_500,
        object_path: "bundles/privacy-impact-kit-v1.zip",
    },
    CatalogEntry {
        id: "incident-response-playbook",
        title: "Incident Response Playbook",
        unit_price_cents: 30_000,
        object_path: "bundles/incident-response-playbook-v3.zip",
    },
    CatalogEntry {
        id: "vendor-dd-checklist",
        title: "Vendor Due Diligence Checklist",
        unit_price_cents: 15_000,
        object_path: "bundles/vendor-dd-checklist-v1.zip",
    },
    CatalogEntry {
        id: "msb-license-guide",
        title: "MSB Licensing Application Guide",
        unit_price_cents: 75_000,
        object_path: "bundles/msb-license-guide-v2.zip",
    },
];

/// Look up a catalog entry by id.
#[must_use]
pub fn find(id: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|entry| entry.id == id)
}

/// Whether an id is purchasable.
#[must_use]
pub fn contains(id: &str) -> bool {
    find(id).is_some()
}

/// Public view of a catalog entry, served by `GET /api/catalog`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogListing {
    pub id: &'static str,
    pub title: &'static str,
    pub price: Decimal,
}

/// The catalog as served to the marketing site.
#[must_use]
pub fn listings() -> Vec<CatalogListing> {
    CATALOG
        .iter()
        .map(|entry| CatalogListing {
            id: entry.id,
            title: entry.title,
            price: entry.unit_price(),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_find_known_id() {
        let entry = find("soc2-policy-pack").unwrap();
        assert_eq!(entry.title, "SOC 2 Policy Pack");
        assert_eq!(entry.unit_price(), Decimal::new(50_000, 2));
    }

    #[test]
    fn test_find_unknown_id() {
        assert!(find("not-a-product").is_none());
        assert!(!contains("../../../etc/passwd"));
    }

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<&str> = CATALOG.iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), CATALOG.len());
    }

    #[test]
    fn test_object_paths_stay_inside_bucket() {
        for entry in CATALOG {
            assert!(!entry.object_path.contains(".."), "{}", entry.id);
            assert!(!entry.object_path.starts_with('/'), "{}", entry.id);
        }
    }

    #[test]
    fn test_listings_cover_catalog() {
        assert_eq!(listings().len(), CATALOG.len());
    }
}
