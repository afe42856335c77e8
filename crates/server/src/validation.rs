//! Checkout payload validation.
//!
//! Validation is accumulating, not fail-fast: every field is checked and the
//! caller gets a map of field name to reason, so the storefront can surface
//! all problems at once. The output type [`CheckoutRequest`] is fully typed;
//! code downstream of [`validate`] never re-checks bounds.
//!
//! The document-id whitelist check is a security boundary. Titles and prices
//! are caller-supplied (and denormalized into the order record as the
//! customer saw them), but the set of purchasable identifiers comes from
//! [`crate::catalog`] alone. The rejection reason never says more than
//! "unknown document id", to avoid aiding catalog enumeration.

use std::collections::BTreeMap;
use std::fmt;

use meridian_core::Email;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog;

/// Maximum length of the customer name.
pub const MAX_NAME_LENGTH: usize = 120;
/// Maximum length of the optional organization name.
pub const MAX_COMPANY_LENGTH: usize = 160;
/// Maximum length of an item display title.
pub const MAX_TITLE_LENGTH: usize = 200;
/// Maximum number of items per checkout.
pub const MAX_ITEMS: usize = 25;
/// Maximum unit price in dollars.
pub const MAX_UNIT_PRICE_DOLLARS: i64 = 10_000;
/// Maximum quantity per line item.
pub const MAX_QUANTITY: i64 = 100;

/// Raw checkout submission as deserialized from the request body.
///
/// Every field defaults so that missing fields become validation errors
/// rather than deserialization rejections.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub items: Vec<CartItemForm>,
}

/// Raw cart line as submitted by the client.
#[derive(Debug, Deserialize)]
pub struct CartItemForm {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub quantity: i64,
}

/// A validated checkout request.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub name: String,
    pub email: Email,
    pub company: Option<String>,
    pub items: Vec<CartItem>,
}

impl CheckoutRequest {
    /// Sum of all item subtotals.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::subtotal).sum()
    }
}

/// A validated cart line. The id is known to be in the catalog; price and
/// quantity are within bounds.
#[derive(Debug, Clone)]
pub struct CartItem {
    pub id: String,
    pub title: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl CartItem {
    /// `unit_price * quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Field-keyed validation failures.
///
/// Serializes as a JSON object of field name to human-readable reason,
/// e.g. `{"email": "Please enter a valid email address.", "items[0].id":
/// "Unknown document id."}`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    fn insert(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| reason.into());
    }

    /// Whether any field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failed fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The reason recorded for a field, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.keys().map(String::as_str).collect();
        write!(f, "{} invalid field(s): {}", self.0.len(), fields.join(", "))
    }
}

/// Validate a checkout submission.
///
/// # Errors
///
/// Returns the accumulated field-to-reason map if any check fails.
pub fn validate(form: CheckoutForm) -> Result<CheckoutRequest, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let name = form.name.trim().to_string();
    if name.is_empty() {
        errors.insert("name", "Name is required.");
    } else if name.len() > MAX_NAME_LENGTH {
        errors.insert(
            "name",
            format!("Name must be at most {MAX_NAME_LENGTH} characters."),
        );
    }

    let email = match Email::parse(&form.email) {
        Ok(email) => Some(email),
        Err(_) => {
            errors.insert("email", "Please enter a valid email address.");
            None
        }
    };

    let company = match form.company {
        Some(raw) => {
            let trimmed = raw.trim().to_string();
            if trimmed.len() > MAX_COMPANY_LENGTH {
                errors.insert(
                    "company",
                    format!("Company must be at most {MAX_COMPANY_LENGTH} characters."),
                );
            }
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        }
        None => None,
    };

    if form.items.is_empty() {
        errors.insert("items", "Your cart is empty.");
    } else if form.items.len() > MAX_ITEMS {
        errors.insert(
            "items",
            format!("A checkout may contain at most {MAX_ITEMS} items."),
        );
    }

    let mut items = Vec::with_capacity(form.items.len());
    for (index, item) in form.items.iter().enumerate() {
        items.extend(validate_item(index, item, &mut errors));
    }

    match email {
        // A failed email parse always recorded an error, so `errors` is
        // non-empty whenever `email` is None.
        Some(email) if errors.is_empty() => Ok(CheckoutRequest {
            name,
            email,
            company,
            items,
        }),
        _ => Err(errors),
    }
}

/// Validate a single cart line, recording failures under `items[N].field`.
fn validate_item(
    index: usize,
    item: &CartItemForm,
    errors: &mut ValidationErrors,
) -> Option<CartItem> {
    let mut ok = true;

    // Membership in the server-side catalog, never the client's claim.
    // The reason is deliberately vague.
    if !catalog::contains(&item.id) {
        errors.insert(format!("items[{index}].id"), "Unknown document id.");
        ok = false;
    }

    let title = item.title.trim().to_string();
    if title.is_empty() || title.len() > MAX_TITLE_LENGTH {
        errors.insert(
            format!("items[{index}].title"),
            format!("Title must be between 1 and {MAX_TITLE_LENGTH} characters."),
        );
        ok = false;
    }

    if item.price < Decimal::ZERO || item.price > Decimal::from(MAX_UNIT_PRICE_DOLLARS) {
        errors.insert(
            format!("items[{index}].price"),
            format!("Price must be between 0 and {MAX_UNIT_PRICE_DOLLARS}."),
        );
        ok = false;
    }

    if item.quantity < 1 || item.quantity > MAX_QUANTITY {
        errors.insert(
            format!("items[{index}].quantity"),
            format!("Quantity must be between 1 and {MAX_QUANTITY}."),
        );
        ok = false;
    }

    if !ok {
        return None;
    }

    let quantity = u32::try_from(item.quantity).ok()?;

    Some(CartItem {
        id: item.id.clone(),
        title,
        unit_price: item.price,
        quantity,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_item() -> CartItemForm {
        CartItemForm {
            id: "soc2-policy-pack".to_string(),
            title: "SOC 2 Policy Pack".to_string(),
            price: Decimal::from(500),
            quantity: 1,
        }
    }

    fn valid_form() -> CheckoutForm {
        CheckoutForm {
            name: "Ada Engineer".to_string(),
            email: "ada@example.com".to_string(),
            company: Some("Example Labs".to_string()),
            items: vec![valid_item()],
        }
    }

    #[test]
    fn test_valid_form_passes() {
        let request = validate(valid_form()).unwrap();
        assert_eq!(request.name, "Ada Engineer");
        assert_eq!(request.email.as_str(), "ada@example.com");
        assert_eq!(request.company.as_deref(), Some("Example Labs"));
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.total(), Decimal::from(500));
    }

    #[test]
    fn test_total_sums_subtotals() {
        let mut form = valid_form();
        form.items = vec![
            CartItemForm {
                id: "soc2-policy-pack".to_string(),
                title: "SOC 2 Policy Pack".to_string(),
                price: Decimal::from(500),
                quantity: 1,
            },
            CartItemForm {
                id: "hipaa-essentials".to_string(),
                title: "HIPAA Essentials Bundle".to_string(),
                price: Decimal::from(175),
                quantity: 2,
            },
        ];

        let request = validate(form).unwrap();
        assert_eq!(request.total(), Decimal::from(850));
    }

    #[test]
    fn test_errors_accumulate_across_fields() {
        let form = CheckoutForm {
            name: String::new(),
            email: "not-an-email".to_string(),
            company: None,
            items: vec![],
        };

        let errors = validate(form).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.get("name").is_some());
        assert!(errors.get("email").is_some());
        assert!(errors.get("items").is_some());
    }

    #[test]
    fn test_unknown_document_id_rejected() {
        // Well-formed price and title do not rescue a bad id.
        let mut form = valid_form();
        form.items = vec![CartItemForm {
            id: "definitely-not-in-catalog".to_string(),
            title: "Looks Legit".to_string(),
            price: Decimal::from(10),
            quantity: 1,
        }];

        let errors = validate(form).unwrap_err();
        assert_eq!(errors.get("items[0].id"), Some("Unknown document id."));
    }

    #[test]
    fn test_path_shaped_id_rejected() {
        let mut form = valid_form();
        form.items = vec![CartItemForm {
            id: "../secrets/master.zip".to_string(),
            ..valid_item()
        }];

        let errors = validate(form).unwrap_err();
        assert!(errors.get("items[0].id").is_some());
    }

    #[test]
    fn test_price_bounds() {
        let mut form = valid_form();
        form.items[0].price = Decimal::from(-1);
        assert!(validate(form).unwrap_err().get("items[0].price").is_some());

        let mut form = valid_form();
        form.items[0].price = Decimal::from(10_001);
        assert!(validate(form).unwrap_err().get("items[0].price").is_some());

        let mut form = valid_form();
        form.items[0].price = Decimal::ZERO;
        assert!(validate(form).is_ok());
    }

    #[test]
    fn test_quantity_bounds() {
        let mut form = valid_form();
        form.items[0].quantity = 0;
        assert!(
            validate(form)
                .unwrap_err()
                .get("items[0].quantity")
                .is_some()
        );

        let mut form = valid_form();
        form.items[0].quantity = 101;
        assert!(
            validate(form)
                .unwrap_err()
                .get("items[0].quantity")
                .is_some()
        );
    }

    #[test]
    fn test_too_many_items() {
        let mut form = valid_form();
        form.items = (0..=MAX_ITEMS).map(|_| valid_item()).collect();

        let errors = validate(form).unwrap_err();
        assert!(errors.get("items").is_some());
    }

    #[test]
    fn test_name_length_bound() {
        let mut form = valid_form();
        form.name = "x".repeat(MAX_NAME_LENGTH + 1);
        assert!(validate(form).unwrap_err().get("name").is_some());
    }

    #[test]
    fn test_blank_company_becomes_none() {
        let mut form = valid_form();
        form.company = Some("   ".to_string());
        let request = validate(form).unwrap();
        assert!(request.company.is_none());
    }

    #[test]
    fn test_errors_serialize_as_object() {
        let form = CheckoutForm {
            name: String::new(),
            email: String::new(),
            company: None,
            items: vec![],
        };

        let errors = validate(form).unwrap_err();
        let json = serde_json::to_value(&errors).unwrap();
        assert!(json.is_object());
        assert!(json.get("name").is_some());
    }
}
