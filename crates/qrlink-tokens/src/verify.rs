use crate::codec::TokenParts;
use crate::expiry::{unix_now, Ttl};
use crate::redirect::RedirectBase;
use crate::signature::SigningKey;
use crate::{Payload, VerifyError};

/// Outcome of a successful verification.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedLink {
    pub payload: Payload,
    /// Redirect target derived from the payload (see [`RedirectBase::location_for`]).
    pub location: String,
}

/// How signatures are checked.
#[derive(Debug, Clone)]
pub enum SignatureMode {
    Required(SigningKey),
    /// No secret configured: any signature segment is accepted. Callers must opt into this
    /// explicitly and should log it as a security-relevant state.
    Bypass,
}

/// Stateless verifier for deep-link tokens.
///
/// Built once at startup and shared read-only across requests.
#[derive(Debug, Clone)]
pub struct Verifier {
    signature: SignatureMode,
    ttl: Ttl,
    redirect_base: RedirectBase,
}

impl Verifier {
    pub fn new(signature: SignatureMode, ttl: Ttl, redirect_base: RedirectBase) -> Self {
        Self {
            signature,
            ttl,
            redirect_base,
        }
    }

    pub fn is_bypass(&self) -> bool {
        matches!(self.signature, SignatureMode::Bypass)
    }

    pub fn ttl(&self) -> Ttl {
        self.ttl
    }

    pub fn redirect_base(&self) -> &RedirectBase {
        &self.redirect_base
    }

    /// Verifies `token` against the current wall clock, read once.
    pub fn verify(&self, token: &str) -> Result<VerifiedLink, VerifyError> {
        self.verify_at(token, unix_now())
    }

    /// Verifies `token` as of `now_unix`.
    ///
    /// Stages run strictly in order and the first failure is returned:
    /// split, payload decode, timestamp presence, signature, expiry, redirect.
    /// Expiry is only reported for authentic tokens.
    pub fn verify_at(&self, token: &str, now_unix: i64) -> Result<VerifiedLink, VerifyError> {
        let parts = TokenParts::split(token)?;
        let raw = parts.decode_payload()?;
        let payload = Payload::from_json_slice(&raw)?;

        if let SignatureMode::Required(key) = &self.signature {
            key.verify(&payload.canonical_bytes(), parts.signature)?;
        }

        self.ttl.check(payload.ts(), now_unix)?;

        let location = self.redirect_base.location_for(&payload);
        Ok(VerifiedLink { payload, location })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_segment;

    const NOW: i64 = 1_700_000_100;
    const BASE: &str = "https://app.example.test";

    fn key() -> SigningKey {
        SigningKey::new("s3cr3t").unwrap()
    }

    fn verifier(ttl: Ttl) -> Verifier {
        Verifier::new(SignatureMode::Required(key()), ttl, RedirectBase::new(BASE))
    }

    fn mint(payload: &Payload) -> String {
        let canonical = payload.canonical_bytes();
        format!(
            "{}.{}.nonce",
            key().sign(&canonical),
            encode_segment(&canonical)
        )
    }

    #[test]
    fn concrete_scenario_redirects_with_minimal_context() {
        let token = mint(&Payload::new(1_700_000_000).with_email("user@example.com"));
        let verified = verifier(Ttl::default()).verify_at(&token, NOW).unwrap();
        assert_eq!(
            verified.location,
            "https://app.example.test/?e=user%40example.com&ts=1700000000"
        );
        assert_eq!(verified.payload.ts(), 1_700_000_000);

        let mut tampered = token.clone().into_bytes();
        let sig_end = token.find('.').unwrap() - 1;
        tampered[sig_end] = if tampered[sig_end] == b'x' { b'y' } else { b'x' };
        let tampered = String::from_utf8(tampered).unwrap();
        assert_eq!(
            verifier(Ttl::default()).verify_at(&tampered, NOW),
            Err(VerifyError::InvalidSignature)
        );
    }

    #[test]
    fn signature_over_issuer_key_order_still_verifies() {
        // Issuer emitted `ts` before `e`; the signature is over the sorted canonical form.
        let canonical = br#"{"e":"user@example.com","ts":1700000000}"#;
        let wire = br#"{"ts":1700000000,"e":"user@example.com"}"#;
        let token = format!(
            "{}.{}.n",
            key().sign(canonical),
            encode_segment(wire)
        );
        assert!(verifier(Ttl::default()).verify_at(&token, NOW).is_ok());
    }

    #[test]
    fn extras_are_signed_but_not_forwarded() {
        let payload = Payload::new(NOW)
            .with_email("ana@example.com")
            .with_extra("appt_date", "12/05/2024")
            .unwrap();
        let token = mint(&payload);
        let verified = verifier(Ttl::default()).verify_at(&token, NOW).unwrap();
        assert!(!verified.location.contains("appt_date"));
        assert_eq!(verified.payload, payload);

        // Swapping the payload for one with a different extra breaks the signature.
        let forged = Payload::new(NOW)
            .with_email("ana@example.com")
            .with_extra("appt_date", "13/05/2024")
            .unwrap();
        let sig = token.split('.').next().unwrap();
        let forged_token = format!("{sig}.{}.nonce", encode_segment(forged.canonical_bytes()));
        assert_eq!(
            verifier(Ttl::default()).verify_at(&forged_token, NOW),
            Err(VerifyError::InvalidSignature)
        );
    }

    #[test]
    fn numeric_extras_from_issuer_bytes_verify() {
        for raw in [
            &br#"{"e":"a@b.co","n":123456789012345678901234567890,"ts":1700000000}"#[..],
            br#"{"e":"a@b.co","f":1e-05,"ts":1700000000}"#,
        ] {
            let token = format!("{}.{}.n", key().sign(raw), encode_segment(raw));
            assert!(
                verifier(Ttl::default()).verify_at(&token, NOW).is_ok(),
                "{}",
                String::from_utf8_lossy(raw)
            );
        }
    }

    #[test]
    fn expiry_boundary() {
        let v = verifier(Ttl::from_secs(604_800));
        let ok = mint(&Payload::new(NOW - 604_800).with_email("a@b.co"));
        let expired = mint(&Payload::new(NOW - 604_801).with_email("a@b.co"));
        assert!(v.verify_at(&ok, NOW).is_ok());
        assert_eq!(v.verify_at(&expired, NOW), Err(VerifyError::Expired));

        let unlimited = verifier(Ttl::UNLIMITED);
        assert!(unlimited.verify_at(&mint(&Payload::new(1)), NOW).is_ok());
    }

    #[test]
    fn expired_and_forged_reports_signature_first() {
        let token = mint(&Payload::new(1).with_email("a@b.co"));
        let sig_len = token.find('.').unwrap();
        let forged = format!("{}{}", "A".repeat(sig_len), &token[sig_len..]);
        assert_eq!(
            verifier(Ttl::from_secs(60)).verify_at(&forged, NOW),
            Err(VerifyError::InvalidSignature)
        );
    }

    #[test]
    fn format_and_payload_errors() {
        let v = verifier(Ttl::default());
        assert_eq!(v.verify_at("a.b", NOW), Err(VerifyError::InvalidFormat));
        assert_eq!(v.verify_at("a.b.c.d", NOW), Err(VerifyError::InvalidFormat));
        assert_eq!(v.verify_at("sig.!!!.n", NOW), Err(VerifyError::InvalidPayload));
        assert_eq!(
            v.verify_at(&format!("sig.{}.n", encode_segment("not json")), NOW),
            Err(VerifyError::MalformedPayload)
        );
        assert_eq!(
            v.verify_at(&format!("sig.{}.n", encode_segment(r#"{"e":"x"}"#)), NOW),
            Err(VerifyError::MissingTimestamp)
        );
        assert_eq!(
            v.verify_at(&format!("sig.{}.n", encode_segment(r#"{"ts":0}"#)), NOW),
            Err(VerifyError::MissingTimestamp)
        );
    }

    #[test]
    fn bypass_accepts_any_signature_but_still_checks_the_rest() {
        let v = Verifier::new(SignatureMode::Bypass, Ttl::default(), RedirectBase::new(BASE));
        assert!(v.is_bypass());
        let payload = encode_segment(format!(r#"{{"ts":{NOW},"e":"a@b.co"}}"#));
        let verified = v.verify_at(&format!("garbage.{payload}.n"), NOW).unwrap();
        assert_eq!(verified.location, format!("{BASE}/?e=a%40b.co&ts={NOW}"));
        assert!(v.verify_at(&format!(".{payload}."), NOW).is_ok());

        let stale = encode_segment(r#"{"ts":1}"#);
        assert_eq!(
            v.verify_at(&format!("garbage.{stale}.n"), NOW),
            Err(VerifyError::Expired)
        );
    }

    #[test]
    fn tokens_are_reusable_within_their_lifetime() {
        // The nonce is not tracked, so the same token verifies every time it is presented.
        let v = verifier(Ttl::default());
        let token = mint(&Payload::new(NOW).with_email("a@b.co"));
        for _ in 0..3 {
            assert!(v.verify_at(&token, NOW).is_ok());
        }
    }
}
