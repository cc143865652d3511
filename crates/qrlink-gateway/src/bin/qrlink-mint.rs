#![forbid(unsafe_code)]

//! Prints a signed QR deep link, for operators and manual testing.

use anyhow::{bail, Context};
use clap::Parser;
use qrlink_tokens::{Issuer, SigningKey};

#[derive(Debug, Parser)]
#[command(name = "qrlink-mint", version, about)]
struct Args {
    /// Recipient carried in the `e` field.
    #[arg(long)]
    email: String,

    /// Extra signed field as `key=value`. May be repeated.
    #[arg(long = "extra", value_parser = parse_extra)]
    extras: Vec<(String, String)>,

    /// URL the token is appended to as `?t=<token>`.
    ///
    /// Environment variable: `QRLINK_LINK_BASE`.
    #[arg(long, env = "QRLINK_LINK_BASE", default_value = "https://app.authenology.com.ve")]
    link_base: String,

    /// Environment variable: `QRLINK_SECRET` (legacy: `QR_SECRET`).
    #[arg(long, env = "QRLINK_SECRET", hide_env_values = true)]
    secret: Option<String>,
}

fn parse_extra(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got {raw:?}")),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let secret = args.secret.or_else(|| std::env::var("QR_SECRET").ok());
    let Some(key) = secret.as_deref().and_then(SigningKey::new) else {
        bail!("no signing secret configured; set QRLINK_SECRET");
    };

    let issuer = Issuer::new(Some(key), &args.link_base);
    let extras = args
        .extras
        .iter()
        .map(|(k, v)| (k.as_str(), Some(v.as_str())));
    let link = issuer
        .signed_link(&args.email, extras)
        .context("mint link")?;

    println!("{link}");
    Ok(())
}
