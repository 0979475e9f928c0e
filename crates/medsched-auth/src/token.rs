use std::str::FromStr;

use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use medsched_core::{Caller, Role};
use sha2::Sha256;

use crate::error::{AuthError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Issues and verifies session tokens.
///
/// Wire format: `v1.<id>.<role>.<exp-unix>.<hex hmac-sha256>` — the
/// signature covers everything before it. UUIDs and role names contain no
/// dots, so the last dot always splits payload from signature.
pub struct TokenSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &str, ttl_minutes: u64) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            ttl: Duration::minutes(ttl_minutes as i64),
        }
    }

    /// Mint a token for an authenticated caller, expiring after the
    /// configured TTL.
    pub fn issue(&self, caller: &Caller) -> String {
        let exp = (Utc::now() + self.ttl).timestamp();
        let payload = format!("v1.{}.{}.{}", caller.id, caller.role, exp);
        let sig = self.sign(&payload);
        format!("{payload}.{sig}")
    }

    /// Verify signature, expiry and shape; return the caller identity.
    pub fn verify(&self, token: &str) -> Result<Caller> {
        let (payload, sig_hex) = token
            .rsplit_once('.')
            .ok_or(AuthError::InvalidToken("missing signature"))?;

        let expected =
            hex::decode(sig_hex).map_err(|_| AuthError::InvalidToken("signature is not hex"))?;
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| AuthError::InvalidToken("bad key length"))?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&expected)
            .map_err(|_| AuthError::InvalidToken("signature mismatch"))?;

        // Signature checked; now parse the payload we just authenticated.
        let mut parts = payload.split('.');
        match parts.next() {
            Some("v1") => {}
            _ => return Err(AuthError::InvalidToken("unknown token version")),
        }
        let id = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::InvalidToken("missing id"))?;
        let role = parts
            .next()
            .and_then(|s| Role::from_str(s).ok())
            .ok_or(AuthError::InvalidToken("bad role"))?;
        let exp: i64 = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or(AuthError::InvalidToken("bad expiry"))?;
        if parts.next().is_some() {
            return Err(AuthError::InvalidToken("trailing segments"));
        }

        if exp <= Utc::now().timestamp() {
            return Err(AuthError::TokenExpired);
        }

        Ok(Caller::new(id, role))
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("hmac accepts any key size");
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new("test-secret", 60)
    }

    #[test]
    fn issue_then_verify_roundtrip() {
        let caller = Caller::new("0191f3a0-0000-7000-8000-000000000001", Role::Provider);
        let token = signer().issue(&caller);
        let verified = signer().verify(&token).unwrap();
        assert_eq!(verified, caller);
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let caller = Caller::new("abc", Role::Requester);
        let token = signer().issue(&caller);
        // Flip the role segment: signature no longer matches.
        let forged = token.replace(".requester.", ".provider.");
        assert!(matches!(
            signer().verify(&forged),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = signer().issue(&Caller::new("abc", Role::Requester));
        let other = TokenSigner::new("different-secret", 60);
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let s = signer();
        let exp = (Utc::now() - Duration::minutes(5)).timestamp();
        let payload = format!("v1.abc.requester.{exp}");
        let token = format!("{payload}.{}", s.sign(&payload));
        assert!(matches!(s.verify(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        for t in ["", "no-dots", "v1.a.b.c", "v2.id.requester.99999999999.00"] {
            assert!(signer().verify(t).is_err(), "accepted: {t}");
        }
    }
}
