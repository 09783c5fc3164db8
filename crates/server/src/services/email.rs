//! Outgoing email: SMTP transport, templates and message assembly.
//!
//! The transport is built per request from the stored [`SmtpSettings`] so a
//! settings change takes effect on the next send. Bodies are rendered with
//! Askama and sent as `multipart/alternative` (plain text + HTML).

use askama::Template;
use chrono::{Datelike, Utc};
use lettre::{
    Address, AsyncSmtpTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{
        Error as SmtpError,
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
};
use secrecy::ExposeSecret;
use thiserror::Error;
use uuid::Uuid;

use semecall_core::Email;

use crate::config::BrandingConfig;
use crate::models::{ContactMessage, SmtpSettings};

/// Subject used when the admin leaves it empty.
pub const DEFAULT_REPLY_SUBJECT: &str = "Re: Your contact message";

/// The quoted original shown under a reply.
pub struct QuotedOriginal<'a> {
    name: String,
    company: Option<&'a str>,
    message: &'a str,
}

impl<'a> From<&'a ContactMessage> for QuotedOriginal<'a> {
    fn from(message: &'a ContactMessage) -> Self {
        Self {
            name: message.full_name(),
            company: message.company.as_deref().filter(|c| !c.is_empty()),
            message: &message.message,
        }
    }
}

/// HTML template for an admin reply.
#[derive(Template)]
#[template(path = "email/reply.html")]
struct ReplyEmailHtml<'a> {
    branding: &'a BrandingConfig,
    reply_html: &'a str,
    original: Option<QuotedOriginal<'a>>,
    year: i32,
}

/// Plain text template for an admin reply.
#[derive(Template)]
#[template(path = "email/reply.txt")]
struct ReplyEmailText<'a> {
    branding: &'a BrandingConfig,
    reply_text: &'a str,
    original: Option<QuotedOriginal<'a>>,
    year: i32,
}

/// HTML template for the SMTP probe.
#[derive(Template)]
#[template(path = "email/smtp_test.html")]
struct SmtpTestEmailHtml<'a> {
    brand_name: &'a str,
    host: &'a str,
    port: u16,
    from_email: &'a str,
}

/// Plain text template for the SMTP probe.
#[derive(Template)]
#[template(path = "email/smtp_test.txt")]
struct SmtpTestEmailText<'a> {
    brand_name: &'a str,
    host: &'a str,
    port: u16,
    from_email: &'a str,
}

/// Errors that can occur when preparing or sending email.
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

    /// The server answered but did not accept the connection.
    #[error("SMTP server did not accept the connection")]
    ConnectionRejected,
}

/// A rendered email, ready to be addressed.
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Render a reply. `reply_html` is inserted into the HTML body unescaped;
/// the quoted original is escaped.
///
/// # Errors
///
/// Returns `EmailError::Template` if rendering fails.
pub fn render_reply(
    branding: &BrandingConfig,
    subject: Option<&str>,
    reply_html: &str,
    original: Option<&ContactMessage>,
) -> Result<RenderedEmail, EmailError> {
    let year = Utc::now().year();
    let reply_text = html_to_text(reply_html);

    let html = ReplyEmailHtml {
        branding,
        reply_html,
        original: original.map(QuotedOriginal::from),
        year,
    }
    .render()?;
    let text = ReplyEmailText {
        branding,
        reply_text: &reply_text,
        original: original.map(QuotedOriginal::from),
        year,
    }
    .render()?;

    let subject = subject
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_REPLY_SUBJECT);

    Ok(RenderedEmail {
        subject: subject.to_owned(),
        text,
        html,
    })
}

/// Render the SMTP connectivity probe.
///
/// # Errors
///
/// Returns `EmailError::Template` if rendering fails.
pub fn render_smtp_test(
    branding: &BrandingConfig,
    settings: &SmtpSettings,
) -> Result<RenderedEmail, EmailError> {
    let html = SmtpTestEmailHtml {
        brand_name: &branding.name,
        host: &settings.host,
        port: settings.port,
        from_email: settings.from_email.as_str(),
    }
    .render()?;
    let text = SmtpTestEmailText {
        brand_name: &branding.name,
        host: &settings.host,
        port: settings.port,
        from_email: settings.from_email.as_str(),
    }
    .render()?;

    Ok(RenderedEmail {
        subject: format!("SMTP Test - {} Admin", branding.name),
        text,
        html,
    })
}

/// Sender mailbox: `"From Name" <from@example.com>`, or the bare address
/// when no name is configured.
///
/// # Errors
///
/// Returns `EmailError::InvalidAddress` if the stored address is not
/// accepted by the mail builder.
pub fn sender_mailbox(settings: &SmtpSettings) -> Result<Mailbox, EmailError> {
    let address: Address = settings
        .from_email
        .as_str()
        .parse()
        .map_err(|_| EmailError::InvalidAddress(settings.from_email.to_string()))?;
    let name = settings
        .from_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(ToOwned::to_owned);
    Ok(Mailbox::new(name, address))
}

/// Assemble a message and return it with its generated `Message-ID`.
///
/// # Errors
///
/// Returns `EmailError::InvalidAddress` or `EmailError::MessageBuild` if the
/// message cannot be assembled.
pub fn build_message(
    settings: &SmtpSettings,
    to: &Email,
    email: RenderedEmail,
) -> Result<(Message, String), EmailError> {
    let to: Mailbox = to
        .as_str()
        .parse()
        .map_err(|_| EmailError::InvalidAddress(to.to_string()))?;
    let message_id = format!("<{}@{}>", Uuid::new_v4(), settings.from_email.domain());

    let message = Message::builder()
        .from(sender_mailbox(settings)?)
        .to(to)
        .subject(email.subject)
        .message_id(Some(message_id.clone()))
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(email.text),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(email.html),
                ),
        )?;

    Ok((message, message_id))
}

/// SMTP transport configured from the stored settings.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Build a transport. `secure` selects implicit TLS (SMTPS); otherwise
    /// the connection is upgraded with STARTTLS when the server offers it.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::Smtp` if the TLS parameters cannot be built.
    pub fn from_settings(settings: &SmtpSettings) -> Result<Self, EmailError> {
        let tls_params = TlsParameters::new(settings.host.clone())?;
        let tls = if settings.secure {
            Tls::Wrapper(tls_params)
        } else {
            Tls::Opportunistic(tls_params)
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
            .port(settings.port)
            .tls(tls);

        if !settings.user.is_empty() {
            builder = builder.credentials(Credentials::new(
                settings.user.clone(),
                settings.password.expose_secret().to_owned(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }

    /// The underlying transport, for dispatch.
    #[must_use]
    pub const fn transport(&self) -> &AsyncSmtpTransport<Tokio1Executor> {
        &self.transport
    }

    /// Open a connection and run the SMTP handshake (including auth)
    /// without sending anything.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::Smtp` if the server is unreachable or rejects
    /// the handshake.
    pub async fn test_connection(&self) -> Result<(), EmailError> {
        if self.transport.test_connection().await? {
            Ok(())
        } else {
            Err(EmailError::ConnectionRejected)
        }
    }
}

/// Crude HTML-to-text conversion for the plain-text alternative.
///
/// Block-level closing tags and `<br>` become newlines, all other tags are
/// dropped, and the common entities are decoded.
fn html_to_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut tag = String::new();
    let mut in_tag = false;

    for c in html.chars() {
        match (in_tag, c) {
            (false, '<') => {
                in_tag = true;
                tag.clear();
            }
            (true, '>') => {
                in_tag = false;
                if is_line_break_tag(&tag) {
                    text.push('\n');
                }
            }
            (true, c) => tag.push(c),
            (false, c) => text.push(c),
        }
    }
    // Unterminated tag: keep it as text.
    if in_tag {
        text.push('<');
        text.push_str(&tag);
    }

    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    decoded
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_owned()
}

fn is_line_break_tag(tag: &str) -> bool {
    let tag = tag.trim().trim_end_matches('/').to_ascii_lowercase();
    let name = tag.split_whitespace().next().unwrap_or_default();
    matches!(
        name,
        "br" | "/p" | "/div" | "/li" | "/h1" | "/h2" | "/h3" | "/tr"
    )
}
