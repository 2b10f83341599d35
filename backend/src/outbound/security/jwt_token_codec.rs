//! HS256 JSON Web Token implementation of the `TokenCodec` port.
//!
//! Claims on the wire: `sub` (username), `email`, `roles` (canonical role
//! names), the registered `iat` and `exp` NumericDate seconds, and `iat_ms` /
//! `exp_ms` carrying the same instants in milliseconds. The millisecond claims
//! are authoritative and `exp` is rounded up to the next whole second. Expiry is judged
//! against the injected clock rather than the library's system-time check, so
//! tests can move time deterministically.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::ports::{TokenCodec, TokenError};
use crate::domain::{IssuedToken, RoleSet, TokenClaims, TokenSettings, TokenTtl, User};

#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
    sub: String,
    email: String,
    roles: Vec<String>,
    iat: i64,
    exp: i64,
    iat_ms: i64,
    exp_ms: i64,
}

impl WireClaims {
    fn new(user: &User, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        let exp_ms = expires_at.timestamp_millis();
        Self {
            sub: user.username().to_string(),
            email: user.email().to_string(),
            roles: user.roles().names().into_iter().map(str::to_owned).collect(),
            iat: issued_at.timestamp(),
            exp: exp_ms.div_euclid(1000) + i64::from(exp_ms.rem_euclid(1000) != 0),
            iat_ms: issued_at.timestamp_millis(),
            exp_ms,
        }
    }
}

pub struct JwtTokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: TokenTtl,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl JwtTokenCodec {
    pub fn new(settings: &TokenSettings, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp", "iat"]);

        Self {
            encoding: EncodingKey::from_secret(settings.secret.expose()),
            decoding: DecodingKey::from_secret(settings.secret.expose()),
            validation,
            ttl: settings.ttl,
            clock,
        }
    }
}

fn timestamp(millis: i64) -> Result<DateTime<Utc>, TokenError> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| TokenError::malformed(format!("timestamp out of range: {millis}")))
}

fn map_decode_error(error: JwtError) -> TokenError {
    match error.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        _ => TokenError::malformed(error.to_string()),
    }
}

impl TokenCodec for JwtTokenCodec {
    fn issue(&self, user: &User) -> Result<IssuedToken, TokenError> {
        let now = self.clock.utc();
        let ttl = TimeDelta::from_std(self.ttl.as_duration())
            .map_err(|err| TokenError::signing(err.to_string()))?;
        let expiry = now
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::signing("token expiry overflows the calendar"))?;

        let claims = WireClaims::new(user, now, expiry);
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| TokenError::signing(err.to_string()))?;
        let expires_at = DateTime::from_timestamp_millis(claims.exp_ms)
            .ok_or_else(|| TokenError::signing("token expiry out of range"))?;

        debug!(subject = %claims.sub, %expires_at, "token issued");
        Ok(IssuedToken { token, expires_at })
    }

    fn parse(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let data = decode::<WireClaims>(token, &self.decoding, &self.validation)
            .map_err(map_decode_error)?;
        let wire = data.claims;
        let roles = RoleSet::try_from_names(&wire.roles)
            .map_err(|err| TokenError::malformed(err.to_string()))?;

        Ok(TokenClaims {
            subject: wire.sub,
            email: wire.email,
            roles,
            issued_at: timestamp(wire.iat_ms)?,
            expires_at: timestamp(wire.exp_ms)?,
        })
    }

    fn is_expired(&self, claims: &TokenClaims) -> bool {
        claims.expires_at <= self.clock.utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::test_support::{MutableClock, UserFixture, test_token_settings};
    use rstest::{fixture, rstest};

    const START: i64 = 1_700_000_000;

    struct Harness {
        clock: Arc<MutableClock>,
        codec: JwtTokenCodec,
    }

    fn harness_with_ttl(ttl_millis: u64) -> Harness {
        let clock = Arc::new(MutableClock::at_epoch_seconds(START));
        let codec = JwtTokenCodec::new(&test_token_settings(ttl_millis), clock.clone());
        Harness { clock, codec }
    }

    #[fixture]
    fn harness() -> Harness {
        harness_with_ttl(86_400_000)
    }

    #[fixture]
    fn alice() -> User {
        UserFixture::new("alice")
            .email("alice@example.com")
            .roles(&[Role::User])
            .build()
    }

    fn flip_char(token: &str, index: usize) -> String {
        let mut bytes = token.as_bytes().to_vec();
        bytes[index] = if bytes[index] == b'A' { b'B' } else { b'A' };
        String::from_utf8(bytes).expect("ascii token")
    }

    #[rstest]
    fn issued_tokens_parse_back_to_the_same_claims(harness: Harness, alice: User) {
        let issued = harness.codec.issue(&alice).expect("issue");
        let claims = harness.codec.parse(&issued.token).expect("parse");

        assert_eq!(claims.subject, "alice");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.roles, RoleSet::from(Role::User));
        assert_eq!(claims.issued_at.timestamp(), START);
        assert_eq!(claims.expires_at, issued.expires_at);
        assert_eq!(claims.expires_at.timestamp(), START + 86_400);
        assert!(!harness.codec.is_expired(&claims));
    }

    #[rstest]
    fn one_second_token_expires_between_half_and_one_and_a_half_seconds(alice: User) {
        let Harness { clock, codec } = harness_with_ttl(1000);
        let token = codec.issue(&alice).expect("issue").token;

        clock.advance_millis(500);
        assert!(codec.validate(&token, "alice"));

        clock.advance_millis(1000);
        assert!(!codec.validate(&token, "alice"));
        let claims = codec.parse(&token).expect("signature still intact");
        assert!(codec.is_expired(&claims));
    }

    #[rstest]
    fn expiry_is_inclusive_of_the_exp_instant(alice: User) {
        let Harness { clock, codec } = harness_with_ttl(1000);
        let claims = codec
            .parse(&codec.issue(&alice).expect("issue").token)
            .expect("parse");

        clock.advance_millis(999);
        assert!(!codec.is_expired(&claims));
        clock.advance_millis(1);
        assert!(codec.is_expired(&claims));
    }

    #[rstest]
    #[case::one_second(1000, 500)]
    #[case::half_second(500, 100)]
    fn sub_second_issue_instants_keep_the_full_lifetime(
        alice: User,
        #[case] ttl_millis: u64,
        #[case] elapsed: i64,
    ) {
        let clock = Arc::new(MutableClock::at_epoch_millis(START * 1000 + 700));
        let codec = JwtTokenCodec::new(&test_token_settings(ttl_millis), clock.clone());
        let ttl = i64::try_from(ttl_millis).expect("small ttl");
        let issued = codec.issue(&alice).expect("issue");
        let claims = codec.parse(&issued.token).expect("parse");

        assert_eq!(claims.expires_at - claims.issued_at, TimeDelta::milliseconds(ttl));
        assert_eq!(issued.expires_at, claims.expires_at);

        clock.advance_millis(elapsed);
        assert!(codec.validate(&issued.token, "alice"));
        clock.advance_millis(ttl - elapsed - 1);
        assert!(codec.validate(&issued.token, "alice"));
        clock.advance_millis(1);
        assert!(!codec.validate(&issued.token, "alice"));
    }

    #[rstest]
    fn validate_rejects_other_subjects(harness: Harness, alice: User) {
        let token = harness.codec.issue(&alice).expect("issue").token;
        assert!(harness.codec.validate(&token, "alice"));
        assert!(!harness.codec.validate(&token, "bob"));
    }

    #[rstest]
    fn tampering_with_payload_or_signature_is_detected(harness: Harness, alice: User) {
        let token = harness.codec.issue(&alice).expect("issue").token;
        let first_dot = token.find('.').expect("header separator");
        let last_dot = token.rfind('.').expect("signature separator");

        for index in [first_dot + 3, (first_dot + last_dot) / 2, last_dot + 5] {
            let tampered = flip_char(&token, index);
            assert_eq!(
                harness.codec.parse(&tampered),
                Err(TokenError::InvalidSignature),
                "flip at {index}"
            );
            assert!(!harness.codec.validate(&tampered, "alice"));
        }
    }

    #[rstest]
    fn tokens_from_another_secret_have_invalid_signatures(harness: Harness, alice: User) {
        let mut settings = test_token_settings(60_000);
        settings.secret = crate::domain::SigningSecret::new(vec![b'z'; 48]).expect("secret");
        let foreign = JwtTokenCodec::new(&settings, harness.clock.clone());
        let token = foreign.issue(&alice).expect("issue").token;

        assert_eq!(harness.codec.parse(&token), Err(TokenError::InvalidSignature));
    }

    #[rstest]
    #[case("")]
    #[case("not-a-token")]
    #[case("a.b.c")]
    fn garbage_is_malformed(harness: Harness, #[case] token: &str) {
        let err = harness.codec.parse(token).expect_err("garbage");
        assert!(matches!(err, TokenError::Malformed { .. }), "{err:?}");
    }

    #[rstest]
    fn other_algorithms_are_rejected(harness: Harness) {
        let claims = WireClaims {
            sub: "alice".into(),
            email: "alice@example.com".into(),
            roles: vec!["ADMIN".into()],
            iat: START,
            exp: START + 60,
            iat_ms: START * 1000,
            exp_ms: (START + 60) * 1000,
        };
        let key = EncodingKey::from_secret(crate::test_support::TEST_SECRET.as_bytes());
        let token = encode(&Header::new(Algorithm::HS512), &claims, &key).expect("encode");

        let err = harness.codec.parse(&token).expect_err("HS512 is not accepted");
        assert!(matches!(err, TokenError::Malformed { .. }));
    }

    #[rstest]
    fn unknown_roles_are_malformed(harness: Harness) {
        let claims = WireClaims {
            sub: "alice".into(),
            email: "alice@example.com".into(),
            roles: vec!["ROOT".into()],
            iat: START,
            exp: START + 60,
            iat_ms: START * 1000,
            exp_ms: (START + 60) * 1000,
        };
        let key = EncodingKey::from_secret(crate::test_support::TEST_SECRET.as_bytes());
        let token = encode(&Header::new(Algorithm::HS256), &claims, &key).expect("encode");

        let err = harness.codec.parse(&token).expect_err("unknown role");
        assert_eq!(err, TokenError::malformed("unknown role: ROOT"));
    }

    #[rstest]
    fn missing_required_claims_are_malformed(harness: Harness) {
        #[derive(Serialize)]
        struct NoIssuedAt {
            sub: &'static str,
            email: &'static str,
            roles: Vec<String>,
            exp: i64,
        }
        let key = EncodingKey::from_secret(crate::test_support::TEST_SECRET.as_bytes());
        let token = encode(
            &Header::new(Algorithm::HS256),
            &NoIssuedAt {
                sub: "alice",
                email: "alice@example.com",
                roles: Vec::new(),
                exp: START + 60,
            },
            &key,
        )
        .expect("encode");

        assert!(matches!(
            harness.codec.parse(&token),
            Err(TokenError::Malformed { .. })
        ));
    }
}
