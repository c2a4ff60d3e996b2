//! Claims carried inside a token.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use vouch_core::{Principal, Role};

use crate::error::TokenError;

/// The claim set of a token.
///
/// Fields serialize under their registered JWT names. A value only comes
/// into existence through issuance or a successful decode, and cannot be
/// modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawClaims")]
pub struct Claims {
    iss: String,
    sub: String,
    iat: i64,
    exp: i64,
    email: String,
    role: Role,
}

/// Wire shape of the claims, before validation.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawClaims {
    iss: String,
    sub: String,
    iat: i64,
    exp: i64,
    email: String,
    role: Role,
}

impl TryFrom<RawClaims> for Claims {
    type Error = String;

    fn try_from(raw: RawClaims) -> Result<Self, Self::Error> {
        if raw.sub.trim().is_empty() {
            return Err("empty subject".to_string());
        }
        if raw.email.trim().is_empty() {
            return Err("empty email".to_string());
        }
        if raw.exp <= raw.iat {
            return Err("expiry is not after issued-at".to_string());
        }
        Ok(Self {
            iss: raw.iss,
            sub: raw.sub,
            iat: raw.iat,
            exp: raw.exp,
            email: raw.email,
            role: raw.role,
        })
    }
}

impl Claims {
    /// Build the claims for a freshly issued token.
    pub(crate) fn issue(
        principal: &Principal,
        issuer: &str,
        issued_at: i64,
        lifetime: Duration,
    ) -> Result<Self, TokenError> {
        if principal.id.trim().is_empty() {
            return Err(TokenError::InvalidPrincipal("id is empty".to_string()));
        }
        if principal.email.trim().is_empty() {
            return Err(TokenError::InvalidPrincipal("email is empty".to_string()));
        }

        let exp = issued_at
            .checked_add(lifetime.num_seconds())
            .filter(|exp| *exp > issued_at)
            .ok_or_else(|| TokenError::SigningFailure("expiry is out of range".to_string()))?;

        Ok(Self {
            iss: issuer.to_string(),
            sub: principal.id.clone(),
            iat: issued_at,
            exp,
            email: principal.email.clone(),
            role: principal.role,
        })
    }

    /// Serialize to the JSON bytes placed in the claims segment.
    pub fn encode(&self) -> Result<Vec<u8>, TokenError> {
        serde_json::to_vec(self).map_err(|e| TokenError::SigningFailure(e.to_string()))
    }

    /// Parse a claims segment payload.
    pub fn decode(bytes: &[u8]) -> Result<Self, TokenError> {
        serde_json::from_slice(bytes).map_err(|e| TokenError::MalformedClaims(e.to_string()))
    }

    pub fn issuer(&self) -> &str {
        &self.iss
    }

    /// The principal id.
    pub fn subject(&self) -> &str {
        &self.sub
    }

    /// Issued-at, seconds since the Unix epoch.
    pub fn issued_at(&self) -> i64 {
        self.iat
    }

    /// Expiry, seconds since the Unix epoch.
    pub fn expires_at(&self) -> i64 {
        self.exp
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn issued_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Whether the token is expired at `now`. Expiry is exclusive: a token is
    /// dead from the `exp` second onwards.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    /// Time left before expiry, or zero once expired.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        let left = self.exp.saturating_sub(now.timestamp()).max(0);
        Duration::seconds(left)
    }

    /// Whether the claims describe `principal`.
    pub fn matches(&self, principal: &Principal) -> bool {
        self.sub == principal.id && self.email == principal.email && self.role == principal.role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal() -> Principal {
        Principal::new("u1", "a@b.c", Role::User)
    }

    #[test]
    fn test_issue_sets_window() {
        let claims = Claims::issue(&principal(), "vouch", 1000, Duration::seconds(86400)).unwrap();
        assert_eq!(claims.issuer(), "vouch");
        assert_eq!(claims.subject(), "u1");
        assert_eq!(claims.issued_at(), 1000);
        assert_eq!(claims.expires_at(), 87400);
        assert_eq!(claims.email(), "a@b.c");
        assert_eq!(claims.role(), Role::User);
        assert!(claims.matches(&principal()));
    }

    #[test]
    fn test_issue_rejects_empty_fields() {
        let no_id = Principal::new("", "a@b.c", Role::User);
        assert!(matches!(
            Claims::issue(&no_id, "vouch", 0, Duration::hours(1)),
            Err(TokenError::InvalidPrincipal(_))
        ));

        let no_email = Principal::new("u1", "  ", Role::User);
        assert!(matches!(
            Claims::issue(&no_email, "vouch", 0, Duration::hours(1)),
            Err(TokenError::InvalidPrincipal(_))
        ));
    }

    #[test]
    fn test_issue_rejects_overflowing_expiry() {
        let result = Claims::issue(&principal(), "vouch", i64::MAX - 10, Duration::hours(1));
        assert!(matches!(result, Err(TokenError::SigningFailure(_))));
    }

    #[test]
    fn test_encode_uses_registered_names() {
        let claims = Claims::issue(&principal(), "vouch", 1000, Duration::seconds(60)).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&claims.encode().unwrap()).unwrap();
        assert_eq!(json["iss"], "vouch");
        assert_eq!(json["sub"], "u1");
        assert_eq!(json["iat"], 1000);
        assert_eq!(json["exp"], 1060);
        assert_eq!(json["role"], "USER");
    }

    #[test]
    fn test_decode_ignores_field_order() {
        let json = br#"{"role":"ADMIN","exp":20,"email":"x@y.z","sub":"u9","iat":10,"iss":"vouch"}"#;
        let claims = Claims::decode(json).unwrap();
        assert_eq!(claims.subject(), "u9");
        assert_eq!(claims.role(), Role::Admin);
    }

    #[test]
    fn test_decode_rejects_bad_shapes() {
        let cases: [&[u8]; 8] = [
            b"not json",
            br#"{"iss":"vouch","sub":"u1","iat":1,"exp":2,"email":"a@b.c"}"#,
            br#"{"iss":"vouch","sub":"u1","iat":1,"exp":2,"email":"a@b.c","role":"ROOT"}"#,
            br#"{"iss":"vouch","sub":"u1","iat":1,"exp":2,"email":"a@b.c","role":"USER","admin":true}"#,
            br#"{"iss":"vouch","sub":"u1","iat":"1","exp":2,"email":"a@b.c","role":"USER"}"#,
            br#"{"iss":"vouch","sub":"u1","iat":5,"exp":5,"email":"a@b.c","role":"USER"}"#,
            br#"{"iss":"vouch","sub":"   ","iat":1,"exp":2,"email":"a@b.c","role":"USER"}"#,
            br#"{"iss":"vouch","sub":"u1","iat":1,"exp":2,"email":" ","role":"USER"}"#,
        ];
        for case in cases {
            assert!(
                matches!(Claims::decode(case), Err(TokenError::MalformedClaims(_))),
                "accepted {}",
                String::from_utf8_lossy(case)
            );
        }
    }

    #[test]
    fn test_deserialize_enforces_invariants() {
        let inverted = r#"{"iss":"vouch","sub":"u1","iat":50,"exp":10,"email":"a@b.c","role":"USER"}"#;
        assert!(serde_json::from_str::<Claims>(inverted).is_err());

        let blank = r#"{"iss":"vouch","sub":"","iat":1,"exp":2,"email":"","role":"USER"}"#;
        assert!(serde_json::from_str::<Claims>(blank).is_err());

        let valid = r#"{"iss":"vouch","sub":"u1","iat":1,"exp":2,"email":"a@b.c","role":"USER"}"#;
        let claims = serde_json::from_str::<Claims>(valid).unwrap();
        assert_eq!(claims.expires_at(), 2);
    }

    #[test]
    fn test_remaining_at() {
        let claims = Claims::issue(&principal(), "vouch", 1000, Duration::seconds(100)).unwrap();
        let at = |secs| DateTime::from_timestamp(secs, 0).unwrap();

        assert_eq!(claims.remaining_at(at(1040)), Duration::seconds(60));
        assert_eq!(claims.remaining_at(at(5000)), Duration::zero());
        assert!(!claims.is_expired_at(at(1099)));
        assert!(claims.is_expired_at(at(1100)));
    }
}
