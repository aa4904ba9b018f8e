//! Email service for verification links.
//!
//! Uses SMTP via lettre for delivery with Askama templates. Without SMTP
//! configuration the link is written to the log instead, which is enough for
//! local development.

use askama::Template;
use chrono::{Datelike, Utc};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;
use url::Url;

use ticketwave_core::Email;

use super::auth::jwt::VERIFICATION_TTL_HOURS;
use crate::config::EmailConfig;

/// HTML template for the verification email.
#[derive(Template)]
#[template(path = "email/verify_email.html")]
struct VerifyEmailHtml<'a> {
    name: &'a str,
    verify_url: &'a str,
    expires_in_hours: i64,
    year: i32,
}

/// Plain text template for the verification email.
#[derive(Template)]
#[template(path = "email/verify_email.txt")]
struct VerifyEmailText<'a> {
    name: &'a str,
    verify_url: &'a str,
    expires_in_hours: i64,
    year: i32,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
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

    /// The site base URL cannot form a link.
    #[error("Invalid base URL: {0}")]
    BaseUrl(#[from] url::ParseError),
}

#[derive(Clone)]
struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: Option<Mailer>,
    base_url: Url,
}

impl EmailService {
    /// Create a new email service.
    ///
    /// `config` of `None` logs links instead of sending them.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is invalid or the SMTP relay cannot be set up.
    pub fn new(config: Option<&EmailConfig>, base_url: &str) -> Result<Self, EmailError> {
        let mailer = config
            .map(|config| -> Result<Mailer, SmtpError> {
                let credentials = Credentials::new(
                    config.smtp_username.clone(),
                    config.smtp_password.expose_secret().to_string(),
                );

                let transport =
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
                        .port(config.smtp_port)
                        .credentials(credentials)
                        .build();

                Ok(Mailer {
                    transport,
                    from_address: config.from_address.clone(),
                })
            })
            .transpose()?;

        Ok(Self {
            mailer,
            base_url: Url::parse(base_url)?,
        })
    }

    /// Whether messages are actually delivered.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.mailer.is_some()
    }

    /// Link the user follows to verify their email.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::BaseUrl` if the link cannot be built.
    pub fn verification_url(&self, token: &str) -> Result<Url, EmailError> {
        let mut url = self.base_url.join("/verify-email")?;
        url.query_pairs_mut().append_pair("token", token);
        Ok(url)
    }

    /// Send the verification link for a new or unverified account.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_verification(
        &self,
        to: &Email,
        name: &str,
        token: &str,
    ) -> Result<(), EmailError> {
        let url = self.verification_url(token)?;

        let Some(mailer) = &self.mailer else {
            tracing::info!(to = %to, url = %url, "SMTP not configured, verification link logged");
            return Ok(());
        };

        let year = Utc::now().year();
        let html = VerifyEmailHtml {
            name,
            verify_url: url.as_str(),
            expires_in_hours: VERIFICATION_TTL_HOURS,
            year,
        }
        .render()?;
        let text = VerifyEmailText {
            name,
            verify_url: url.as_str(),
            expires_in_hours: VERIFICATION_TTL_HOURS,
            year,
        }
        .render()?;

        mailer
            .send_multipart_email(to.as_str(), "Verify your email for TicketWave", &text, &html)
            .await
    }
}

impl Mailer {
    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
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

        self.transport.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_url() {
        let service = EmailService::new(None, "https://tickets.example.com/app").expect("valid");
        let url = service.verification_url("a.b-c_d").expect("builds");
        assert_eq!(
            url.as_str(),
            "https://tickets.example.com/verify-email?token=a.b-c_d"
        );
        assert!(!service.is_configured());
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(matches!(
            EmailService::new(None, "not a url"),
            Err(EmailError::BaseUrl(_))
        ));
    }

    #[test]
    fn test_templates_render_link() {
        let html = VerifyEmailHtml {
            name: "Jane",
            verify_url: "https://x.test/verify-email?token=t",
            expires_in_hours: 24,
            year: 2025,
        }
        .render()
        .expect("renders");
        assert!(html.contains("Jane"));
        assert!(html.contains("verify-email?token=t"));

        let text = VerifyEmailText {
            name: "",
            verify_url: "https://x.test/verify-email?token=t",
            expires_in_hours: 24,
            year: 2025,
        }
        .render()
        .expect("renders");
        assert!(text.starts_with("Thanks for signing up!"));
        assert!(text.contains("24 hours"));
    }

    #[tokio::test]
    async fn test_unconfigured_send_succeeds() {
        let service = EmailService::new(None, "http://localhost:3000").expect("valid");
        let to = Email::parse("jane@x.com").expect("valid");
        assert!(service.send_verification(&to, "Jane", "tok").await.is_ok());
    }
}
