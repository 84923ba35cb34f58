//! SMTP delivery for reports and password-reset links
//!
//! Configured entirely from environment variables:
//!
//! - `TALLY_SMTP_HOST`: SMTP relay hostname (unset = mail disabled)
//! - `TALLY_SMTP_USER` / `TALLY_SMTP_PASS`: relay credentials
//! - `TALLY_SMTP_FROM`: sender address (defaults to the user)

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{info, warn};

use crate::error::{Error, Result};

pub struct Mailer {
    transport: SmtpTransport,
    from: Mailbox,
    host: String,
}

impl Mailer {
    /// Build a mailer from environment variables.
    ///
    /// Returns None when mail is not configured; callers treat that as
    /// "mail disabled", not an error.
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("TALLY_SMTP_HOST").ok()?;
        let user = std::env::var("TALLY_SMTP_USER").ok()?;
        let pass = std::env::var("TALLY_SMTP_PASS").ok()?;
        let from = std::env::var("TALLY_SMTP_FROM").unwrap_or_else(|_| user.clone());

        let from: Mailbox = match from.parse() {
            Ok(mb) => mb,
            Err(e) => {
                warn!("Invalid TALLY_SMTP_FROM address: {}", e);
                return None;
            }
        };

        let transport = match SmtpTransport::relay(&host) {
            Ok(builder) => builder.credentials(Credentials::new(user, pass)).build(),
            Err(e) => {
                warn!("Failed to configure SMTP relay {}: {}", host, e);
                return None;
            }
        };

        Some(Self {
            transport,
            from,
            host,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn parse_recipient(email: &str) -> Result<Mailbox> {
        email
            .parse()
            .map_err(|e| Error::Mail(format!("Invalid recipient address {}: {}", email, e)))
    }

    /// Email a monthly report PDF to a user
    pub fn send_monthly_report(
        &self,
        to: &str,
        month_name: &str,
        year: i32,
        pdf: Vec<u8>,
    ) -> Result<()> {
        let attachment = Attachment::new(format!(
            "Financial_Report_{}_{}.pdf",
            month_name, year
        ))
        .body(pdf, ContentType::parse("application/pdf").unwrap());

        let message = Message::builder()
            .from(self.from.clone())
            .to(Self::parse_recipient(to)?)
            .subject(format!("Monthly Financial Report - {} {}", month_name, year))
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(format!(
                        "Please find your monthly financial report for {} {} attached.",
                        month_name, year
                    )))
                    .singlepart(attachment),
            )
            .map_err(|e| Error::Mail(format!("Failed to build report email: {}", e)))?;

        self.transport
            .send(&message)
            .map_err(|e| Error::Mail(format!("Failed to send report to {}: {}", to, e)))?;

        info!(recipient = to, "Monthly report email sent");
        Ok(())
    }

    /// Email a password-reset link. The link expires after an hour; the
    /// wording reflects that.
    pub fn send_password_reset(&self, to: &str, reset_url: &str) -> Result<()> {
        let body = format!(
            "We received a request to reset the password for your Tally account.\n\n\
             Open the link below to choose a new password. The link expires in 1 hour.\n\n\
             {}\n\n\
             If you didn't request this reset, you can ignore this email and your \
             password will remain unchanged.\n",
            reset_url
        );

        let message = Message::builder()
            .from(self.from.clone())
            .to(Self::parse_recipient(to)?)
            .subject("Password Reset Request - Tally")
            .singlepart(SinglePart::plain(body))
            .map_err(|e| Error::Mail(format!("Failed to build reset email: {}", e)))?;

        self.transport
            .send(&message)
            .map_err(|e| Error::Mail(format!("Failed to send reset email to {}: {}", to, e)))?;

        info!(recipient = to, "Password reset email sent");
        Ok(())
    }
}
