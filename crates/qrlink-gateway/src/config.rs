use clap::Parser;
use std::{env, net::SocketAddr};

use qrlink_tokens::{RedirectBase, SignatureMode, SigningKey, Ttl, Verifier, DEFAULT_TTL_SECS};

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_REDIRECT_BASE: &str = "https://app.authenology.com.ve";

#[derive(Debug, Clone, Parser)]
#[command(name = "qrlink-gateway", version, about)]
pub struct Args {
    /// Address the HTTP server listens on.
    ///
    /// Environment variable: `QRLINK_LISTEN_ADDR`.
    #[arg(long, env = "QRLINK_LISTEN_ADDR")]
    pub listen_addr: Option<SocketAddr>,

    /// Shared HMAC secret used by token issuers.
    ///
    /// Environment variable: `QRLINK_SECRET` (legacy: `QR_SECRET`).
    #[arg(long, env = "QRLINK_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Maximum token age in seconds. `0` disables expiry checking.
    ///
    /// Environment variable: `QRLINK_TTL_SECONDS`.
    #[arg(long, env = "QRLINK_TTL_SECONDS")]
    pub ttl_seconds: Option<u64>,

    /// Application URL verified scans are redirected to.
    ///
    /// Environment variable: `QRLINK_REDIRECT_BASE` (legacy: `QR_BASE_URL`).
    #[arg(long, env = "QRLINK_REDIRECT_BASE")]
    pub redirect_base: Option<String>,

    /// Start without a secret, accepting tokens with any signature.
    ///
    /// Only meant for local development; the server logs a warning at startup.
    ///
    /// Environment variable: `QRLINK_ALLOW_UNSIGNED=true`.
    #[arg(long, env = "QRLINK_ALLOW_UNSIGNED")]
    pub allow_unsigned: bool,

    /// Log filter (tracing-subscriber EnvFilter syntax).
    ///
    /// Environment variable: `QRLINK_LOG_LEVEL`.
    #[arg(long, env = "QRLINK_LOG_LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no signing secret configured; set QRLINK_SECRET or pass --allow-unsigned")]
    MissingSecret,
    #[error("invalid redirect base {0:?}: expected an absolute http(s) URL")]
    InvalidRedirectBase(String),
}

/// Process-wide configuration, immutable once loaded.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub signature: SignatureMode,
    pub ttl: Ttl,
    pub redirect_base: RedirectBase,
}

impl Config {
    /// Resolves parsed arguments (and their environment fallbacks) into a configuration.
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        let listen_addr = args
            .listen_addr
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.parse().expect("default listen addr"));

        let secret = args.secret.or_else(|| env::var("QR_SECRET").ok());
        let signature = match secret.as_deref().and_then(SigningKey::new) {
            Some(key) => SignatureMode::Required(key),
            None if args.allow_unsigned => SignatureMode::Bypass,
            None => return Err(ConfigError::MissingSecret),
        };

        let ttl = Ttl::from_secs(args.ttl_seconds.unwrap_or(DEFAULT_TTL_SECS));

        let redirect_base = args
            .redirect_base
            .or_else(|| env::var("QR_BASE_URL").ok())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_REDIRECT_BASE.to_string());
        let redirect_base = parse_redirect_base(&redirect_base)?;

        Ok(Self {
            listen_addr,
            signature,
            ttl,
            redirect_base,
        })
    }

    pub fn verifier(&self) -> Verifier {
        Verifier::new(self.signature.clone(), self.ttl, self.redirect_base.clone())
    }
}

fn parse_redirect_base(raw: &str) -> Result<RedirectBase, ConfigError> {
    let invalid = || ConfigError::InvalidRedirectBase(raw.to_string());
    let url = url::Url::parse(raw).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid());
    }
    // `Url` serializes to ASCII, so the derived `Location` is always a valid header value.
    Ok(RedirectBase::new(url.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_base_is_normalized() {
        assert_eq!(
            parse_redirect_base("https://app.example.test").unwrap().as_str(),
            "https://app.example.test"
        );
        assert_eq!(
            parse_redirect_base("https://app.example.test/deep/").unwrap().as_str(),
            "https://app.example.test/deep"
        );
        assert_eq!(
            parse_redirect_base("https://bücher.example/").unwrap().as_str(),
            "https://xn--bcher-kva.example"
        );
    }

    #[test]
    fn redirect_base_must_be_absolute_http() {
        for raw in [
            "app.example.test",
            "/relative",
            "ftp://app.example.test",
            "https://app.example.test/?x=1",
            "https://app.example.test/#frag",
        ] {
            assert!(parse_redirect_base(raw).is_err(), "{raw}");
        }
    }
}
