//! Interface to the message composition and delivery service.
//!
//! The mail transport itself lives outside this crate. This module owns the message shape the
//! transport accepts, the defaults applied when composing a confirmation message (most
//! importantly the signed QR link), and best-effort sending.

use async_trait::async_trait;
use serde::Serialize;

use qrlink_tokens::Issuer;

pub const DEFAULT_LOGO_URL: &str = "https://app.authenology.com.ve/imagenes/logo01.png";

/// Placeholder the transport replaces with the rendered QR image.
pub const QR_BLOCK_MARKER: &str = "<!--QR_BLOCK-->";

/// Message as submitted to the delivery service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub to_email: String,
    pub from_email: String,
    pub subject: String,
    pub message: String,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_seed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

/// Optional context for [`compose_message`]. Empty strings count as absent.
#[derive(Debug, Clone, Default)]
pub struct MessageDetails {
    pub user_name: Option<String>,
    pub appointment_date: Option<String>,
    pub appointment_time: Option<String>,
    pub location: Option<String>,
    pub support_phone: Option<String>,
    pub support_email: Option<String>,
    /// Pre-rendered HTML body. When absent a basic body is generated.
    pub html: Option<String>,
    pub reply_to: Option<String>,
    pub qr_url: Option<String>,
    pub qr_seed: Option<String>,
    /// Raw size as supplied upstream; ignored unless it parses as an integer.
    pub qr_size: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("delivery service is not configured")]
    NotConfigured,
    #[error("invalid recipient address")]
    InvalidRecipient,
    #[error("delivery service rejected the message: {0}")]
    Rejected(String),
    #[error("delivery service unreachable: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<(), DeliveryError>;
}

/// Mailer used when no delivery service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredMailer;

#[async_trait]
impl Mailer for UnconfiguredMailer {
    async fn send(&self, _message: &OutboundMessage) -> Result<(), DeliveryError> {
        Err(DeliveryError::NotConfigured)
    }
}

/// Builds the message for `to_email`, filling in the QR link and presentation defaults.
///
/// A signed link is minted when `details.qr_url` is absent; if minting fails the message is
/// still produced, just without a QR link.
pub fn compose_message(
    issuer: &Issuer,
    from_email: &str,
    to_email: &str,
    subject: &str,
    body: &str,
    details: &MessageDetails,
) -> Result<OutboundMessage, DeliveryError> {
    if !valid_email(to_email) {
        return Err(DeliveryError::InvalidRecipient);
    }
    let to_email = to_email.trim();

    let qr_url = match present(&details.qr_url) {
        Some(url) => Some(url.to_string()),
        None => {
            let extras = [
                ("user", present(&details.user_name)),
                ("appt_date", present(&details.appointment_date)),
                ("appt_time", present(&details.appointment_time)),
            ];
            match issuer.signed_link(to_email, extras) {
                Ok(link) => Some(link),
                Err(err) => {
                    tracing::warn!(error = %err, "failed to mint QR link; sending without it");
                    None
                }
            }
        }
    };

    let html = match present(&details.html) {
        Some(html) => html.to_string(),
        None => default_html(body, details),
    };

    Ok(OutboundMessage {
        to_email: to_email.to_string(),
        from_email: from_email.to_string(),
        subject: subject.to_string(),
        message: body.to_string(),
        html,
        reply_to: present(&details.reply_to).map(str::to_string),
        qr_url,
        qr_seed: Some(present(&details.qr_seed).unwrap_or(to_email).to_string()),
        qr_size: present(&details.qr_size).and_then(|s| s.trim().parse().ok()),
        logo_url: Some(
            present(&details.logo_url)
                .unwrap_or(DEFAULT_LOGO_URL)
                .to_string(),
        ),
    })
}

/// Sends `message`, logging instead of propagating any failure.
///
/// Delivery supports the primary operation but never decides its outcome.
pub async fn deliver_best_effort(mailer: &dyn Mailer, message: &OutboundMessage) -> bool {
    match mailer.send(message).await {
        Ok(()) => true,
        Err(DeliveryError::NotConfigured) => {
            tracing::warn!("delivery service not configured; skipping message");
            false
        }
        Err(err) => {
            tracing::error!(error = %err, subject = %message.subject, "message delivery failed");
            false
        }
    }
}

/// `local@domain.tld`: local part `[A-Za-z0-9._%+-]+`, domain `[A-Za-z0-9.-]+`, and an
/// alphabetic top-level label of at least two characters.
pub fn valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.trim().split_once('@') else {
        return false;
    };
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    let local_ok = !local.is_empty()
        && local
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'%' | b'+' | b'-'));
    let host_ok = !host.is_empty()
        && host
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-'));
    let tld_ok = tld.len() >= 2 && tld.bytes().all(|b| b.is_ascii_alphabetic());
    local_ok && host_ok && tld_ok
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn default_html(body: &str, details: &MessageDetails) -> String {
    let fields = [
        ("Appointment Date", &details.appointment_date),
        ("Appointment Time", &details.appointment_time),
        ("User Name", &details.user_name),
        ("Location", &details.location),
        ("Support Phone", &details.support_phone),
        ("Support Email", &details.support_email),
    ];
    let extra: String = fields
        .iter()
        .filter_map(|(label, value)| {
            present(value).map(|v| format!("<p><strong>{label}:</strong> {}</p>", escape_html(v)))
        })
        .collect();
    let body_html = body
        .split('\n')
        .map(escape_html)
        .collect::<Vec<_>>()
        .join("<br>");

    format!(
        "<div style='font-family:Arial,Helvetica,sans-serif;font-size:14px;color:#111'>\
         <p>{body_html}</p>{extra}<div>{QR_BLOCK_MARKER}</div></div>"
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
