//! Order confirmation email delivery.
//!
//! Uses SMTP via lettre with askama HTML templates. The confirmation lists
//! every purchased document, including ones whose signed URL could not be
//! issued (visibly marked, so the customer knows to claim them by reply).
//! A delivery failure is fatal to the checkout request as a whole.

use askama::Template;
use chrono::{DateTime, Utc};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use meridian_core::{Email, OrderReference};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;
use crate::links::DocumentLink;

/// Template view of one receipt line.
struct LinkView {
    title: String,
    price: String,
    available: bool,
    url: String,
}

/// HTML template for the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    name: &'a str,
    reference: &'a str,
    total: String,
    expires_at: String,
    links: Vec<LinkView>,
}

/// Plain text template for the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    name: &'a str,
    reference: &'a str,
    total: String,
    expires_at: String,
    links: Vec<LinkView>,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum MailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Transactional email sender for order confirmations.
#[derive(Clone)]
pub struct Mailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl Mailer {
    /// Create a new mailer from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send the order confirmation with every document link.
    ///
    /// # Errors
    ///
    /// Returns error if a template fails to render or the message cannot be
    /// dispatched. The caller treats either as fatal to the checkout.
    pub async fn send_order_confirmation(
        &self,
        name: &str,
        to: &Email,
        reference: &OrderReference,
        total: Decimal,
        expires_at: DateTime<Utc>,
        links: &[DocumentLink],
    ) -> Result<(), MailError> {
        let total = format_currency(total);
        let expires_at = expires_at.format("%B %d, %Y %H:%M UTC").to_string();

        let html = OrderConfirmationHtml {
            name,
            reference: reference.as_str(),
            total: total.clone(),
            expires_at: expires_at.clone(),
            links: link_views(links),
        }
        .render()?;

        let text = OrderConfirmationText {
            name,
            reference: reference.as_str(),
            total,
            expires_at,
            links: link_views(links),
        }
        .render()?;

        let subject = format!("Your Meridian Compliance documents ({reference})");
        self.send_multipart_email(to.as_str(), &subject, &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), MailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| MailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| MailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(subject = %subject, "Confirmation email sent");
        Ok(())
    }
}

/// Build template views, keeping unavailable links on the receipt.
fn link_views(links: &[DocumentLink]) -> Vec<LinkView> {
    links
        .iter()
        .map(|link| LinkView {
            title: link.title.clone(),
            price: format_currency(link.price),
            available: link.link.is_available(),
            url: link.link.url().unwrap_or_default().to_string(),
        })
        .collect()
}

/// Format a decimal dollar amount, e.g. `$850.00`.
fn format_currency(amount: Decimal) -> String {
    format!("${amount:.2}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::links::SignedLink;

    use super::*;

    fn sample_links() -> Vec<DocumentLink> {
        vec![
            DocumentLink {
                title: "SOC 2 Policy Pack".to_string(),
                price: Decimal::from(500),
                link: SignedLink::Available("https://storage.test/signed/soc2".to_string()),
            },
            DocumentLink {
                title: "HIPAA Essentials Bundle".to_string(),
                price: Decimal::from(350),
                link: SignedLink::Unavailable,
            },
        ]
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(Decimal::from(850)), "$850.00");
        assert_eq!(format_currency(Decimal::new(12_345, 2)), "$123.45");
    }

    #[test]
    fn test_html_template_lists_every_link() {
        let html = OrderConfirmationHtml {
            name: "Ada",
            reference: "MER-2025-A1B2C3",
            total: "$850.00".to_string(),
            expires_at: "August 08, 2026 12:00 UTC".to_string(),
            links: link_views(&sample_links()),
        }
        .render()
        .unwrap();

        assert!(html.contains("MER-2025-A1B2C3"));
        assert!(html.contains("SOC 2 Policy Pack"));
        assert!(html.contains("https://storage.test/signed/soc2"));
        // The unavailable item still appears, flagged rather than dropped.
        assert!(html.contains("HIPAA Essentials Bundle"));
        assert!(html.contains("temporarily unavailable"));
        assert!(html.contains("$850.00"));
    }

    #[test]
    fn test_text_template_marks_unavailable() {
        let text = OrderConfirmationText {
            name: "Ada",
            reference: "MER-2025-A1B2C3",
            total: "$850.00".to_string(),
            expires_at: "August 08, 2026 12:00 UTC".to_string(),
            links: link_views(&sample_links()),
        }
        .render()
        .unwrap();

        assert!(text.contains("SOC 2 Policy Pack"));
        assert!(text.contains("HIPAA Essentials Bundle"));
        assert!(text.contains("temporarily unavailable"));
    }
}
