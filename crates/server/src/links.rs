//! Document link issuance.
//!
//! For every purchased item, resolve its catalog id to the server-owned
//! object path and request a time-boxed signed URL. Issuance is a total
//! function over the cart: the output always has one link per input item, in
//! input order. A signing failure for one item must not abort the checkout
//! and must not drop that item from the receipt; it becomes a visibly
//! unavailable link the customer can claim by replying to the email.

use rust_decimal::Decimal;

use crate::catalog;
use crate::services::storage::SignedUrlProvider;
use crate::validation::CartItem;

/// Lifetime of issued download links.
pub const LINK_TTL_HOURS: i64 = 48;

/// Lifetime of issued download links, in seconds, as passed to the signer.
#[allow(clippy::cast_sign_loss)]
pub const LINK_TTL_SECONDS: u64 = (LINK_TTL_HOURS * 60 * 60) as u64;

/// Outcome of signing one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignedLink {
    /// A working time-boxed download URL.
    Available(String),
    /// Signing failed; the customer claims this document via email instead.
    Unavailable,
}

impl SignedLink {
    /// The URL, if one was issued.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Available(url) => Some(url),
            Self::Unavailable => None,
        }
    }

    /// Whether a URL was issued.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// One entry of the customer's receipt: never persisted, only embedded into
/// the confirmation email and discarded.
#[derive(Debug, Clone)]
pub struct DocumentLink {
    pub title: String,
    pub price: Decimal,
    pub link: SignedLink,
}

/// Issue one link per cart item, in order.
///
/// Items have already passed validation, so every id resolves in the
/// catalog; a miss here means the catalog changed mid-request and is treated
/// like any other signing failure.
pub async fn issue_links<P: SignedUrlProvider>(
    provider: &P,
    items: &[CartItem],
) -> Vec<DocumentLink> {
    let mut links = Vec::with_capacity(items.len());

    for item in items {
        let link = match catalog::find(&item.id) {
            Some(entry) => {
                match provider
                    .create_signed_url(entry.object_path, LINK_TTL_SECONDS)
                    .await
                {
                    Ok(url) => SignedLink::Available(url),
                    Err(e) => {
                        tracing::warn!(
                            document_id = %item.id,
                            error = %e,
                            "Signed URL request failed, issuing unavailable link"
                        );
                        SignedLink::Unavailable
                    }
                }
            }
            None => {
                tracing::warn!(document_id = %item.id, "Document vanished from catalog");
                SignedLink::Unavailable
            }
        };

        links.push(DocumentLink {
            title: item.title.clone(),
            price: item.subtotal(),
            link,
        });
    }

    links
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::services::storage::StorageError;

    /// Stub signer that fails for object paths listed in `failing`.
    struct StubSigner {
        failing: Vec<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl StubSigner {
        fn new(failing: Vec<&'static str>) -> Self {
            Self {
                failing,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl SignedUrlProvider for StubSigner {
        async fn create_signed_url(
            &self,
            object_path: &str,
            ttl_seconds: u64,
        ) -> Result<String, StorageError> {
            self.calls.lock().unwrap().push(object_path.to_string());
            assert_eq!(ttl_seconds, LINK_TTL_SECONDS);

            if self.failing.contains(&object_path) {
                Err(StorageError::Api {
                    status: 503,
                    message: "backend unavailable".to_string(),
                })
            } else {
                Ok(format!("https://storage.test/signed/{object_path}"))
            }
        }
    }

    fn item(id: &str, title: &str, price: i64) -> CartItem {
        CartItem {
            id: id.to_string(),
            title: title.to_string(),
            unit_price: Decimal::from(price),
            quantity: 1,
        }
    }

    #[tokio::test]
    async fn test_one_link_per_item_in_order() {
        let signer = StubSigner::new(vec![]);
        let items = vec![
            item("soc2-policy-pack", "SOC 2 Policy Pack", 500),
            item("hipaa-essentials", "HIPAA Essentials Bundle", 350),
        ];

        let links = issue_links(&signer, &items).await;

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].title, "SOC 2 Policy Pack");
        assert_eq!(links[1].title, "HIPAA Essentials Bundle");
        assert!(links.iter().all(|l| l.link.is_available()));
    }

    #[tokio::test]
    async fn test_single_failure_does_not_shrink_list() {
        // soc2 resolves to bundles/soc2-policy-pack-v2.zip
        let signer = StubSigner::new(vec!["bundles/soc2-policy-pack-v2.zip"]);
        let items = vec![
            item("gdpr-readiness", "GDPR Readiness Bundle", 450),
            item("soc2-policy-pack", "SOC 2 Policy Pack", 500),
            item("hipaa-essentials", "HIPAA Essentials Bundle", 350),
        ];

        let links = issue_links(&signer, &items).await;

        assert_eq!(links.len(), 3);
        assert!(links[0].link.is_available());
        assert_eq!(links[1].link, SignedLink::Unavailable);
        assert!(links[2].link.is_available());
        // The failed item still appears on the receipt under its title.
        assert_eq!(links[1].title, "SOC 2 Policy Pack");
    }

    #[tokio::test]
    async fn test_paths_come_from_catalog_not_client() {
        let signer = StubSigner::new(vec![]);
        let items = vec![item("soc2-policy-pack", "Renamed By Client", 500)];

        let _ = issue_links(&signer, &items).await;

        let calls = signer.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), ["bundles/soc2-policy-pack-v2.zip"]);
    }

    #[tokio::test]
    async fn test_price_is_line_subtotal() {
        let signer = StubSigner::new(vec![]);
        let mut cart_item = item("hipaa-essentials", "HIPAA Essentials Bundle", 350);
        cart_item.quantity = 2;

        let links = issue_links(&signer, &[cart_item]).await;
        assert_eq!(links[0].price, Decimal::from(700));
    }

    #[tokio::test]
    async fn test_empty_cart_yields_empty_links() {
        let signer = StubSigner::new(vec![]);
        let links = issue_links(&signer, &[]).await;
        assert!(links.is_empty());
    }
}
