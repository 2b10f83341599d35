//! Login outcomes, rejection uniformity and failure propagation.

use super::*;
use crate::domain::ports::{MockTokenCodec, MockUserRepository, TokenError, UserPersistenceError};
use crate::domain::{ErrorCode, Role, RoleSet};
use crate::outbound::persistence::InMemoryUserRepository;
use crate::outbound::security::JwtTokenCodec;
use crate::test_support::{MutableClock, RecordingHasher, UserFixture, test_token_settings};
use rstest::{fixture, rstest};

const START: i64 = 1_700_000_000;

struct Harness {
    authenticator: Authenticator,
    hasher: Arc<RecordingHasher>,
    tokens: Arc<JwtTokenCodec>,
}

async fn harness_with(users: Vec<User>) -> Harness {
    let hasher = Arc::new(RecordingHasher::new());
    let clock = Arc::new(MutableClock::at_epoch_seconds(START));
    let tokens = Arc::new(JwtTokenCodec::new(&test_token_settings(60_000), clock));
    let authenticator = Authenticator::new(
        Arc::new(InMemoryUserRepository::with_users(users)),
        hasher.clone(),
        tokens.clone(),
    )
    .await
    .expect("authenticator");
    Harness {
        authenticator,
        hasher,
        tokens,
    }
}

#[fixture]
fn accounts() -> Vec<User> {
    vec![
        UserFixture::new("alice")
            .email("alice@example.com")
            .password("correctpw")
            .roles(&[Role::User])
            .build(),
        UserFixture::new("dormant").password("correctpw").inactive().build(),
    ]
}

fn credentials(identifier: &str, password: &str) -> LoginCredentials {
    LoginCredentials::try_from_parts(identifier, password).expect("valid credentials")
}

#[rstest]
#[case("alice")]
#[case("alice@example.com")]
#[case("  ALICE@example.com ")]
#[tokio::test]
async fn correct_password_yields_a_grant(accounts: Vec<User>, #[case] identifier: &str) {
    let harness = harness_with(accounts).await;

    let grant = harness
        .authenticator
        .authenticate(&credentials(identifier, "correctpw"))
        .await
        .expect("authenticate")
        .expect("grant");

    assert_eq!(grant.username, "alice");
    assert_eq!(grant.email, "alice@example.com");
    assert_eq!(grant.expires_at.timestamp(), START + 60);
    assert!(harness.tokens.validate(&grant.token, "alice"));
    let claims = harness.tokens.parse(&grant.token).expect("parse");
    assert_eq!(claims.roles, RoleSet::from(Role::User));
}

#[rstest]
#[case::wrong_password("alice", "wrongpw")]
#[case::unknown_username("ghost", "correctpw")]
#[case::unknown_email("ghost@example.com", "correctpw")]
#[case::not_an_identifier("!!", "correctpw")]
#[case::inactive_account("dormant", "correctpw")]
#[tokio::test]
async fn rejections_are_indistinguishable(
    accounts: Vec<User>,
    #[case] identifier: &str,
    #[case] password: &str,
) {
    let harness = harness_with(accounts).await;

    let outcome = harness
        .authenticator
        .authenticate(&credentials(identifier, password))
        .await
        .expect("rejections are not errors");

    assert_eq!(outcome, None);
    assert_eq!(harness.hasher.verifications(), 1);
}

#[rstest]
#[tokio::test]
async fn successful_login_verifies_exactly_once(accounts: Vec<User>) {
    let harness = harness_with(accounts).await;
    harness
        .authenticator
        .authenticate(&credentials("alice", "correctpw"))
        .await
        .expect("authenticate");
    assert_eq!(harness.hasher.verifications(), 1);
}

#[rstest]
#[tokio::test]
async fn username_match_skips_the_email_lookup() {
    let alice = UserFixture::new("alice").build();
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_username()
        .times(1)
        .returning(move |_| Ok(Some(alice.clone())));
    users.expect_find_by_email().times(0);
    let tokens = Arc::new(JwtTokenCodec::new(
        &test_token_settings(60_000),
        Arc::new(MutableClock::at_epoch_seconds(START)),
    ));
    let authenticator = Authenticator::new(
        Arc::new(users),
        Arc::new(RecordingHasher::new()),
        tokens,
    )
    .await
    .expect("authenticator");

    let grant = authenticator
        .authenticate(&credentials("alice", "correctpw"))
        .await
        .expect("authenticate");
    assert!(grant.is_some());
}

#[rstest]
#[tokio::test]
async fn store_outage_is_an_error_not_a_rejection() {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_username()
        .returning(|_| Err(UserPersistenceError::connection("refused")));
    let authenticator = Authenticator::new(
        Arc::new(users),
        Arc::new(RecordingHasher::new()),
        Arc::new(MockTokenCodec::new()),
    )
    .await
    .expect("authenticator");

    let err = authenticator
        .authenticate(&credentials("alice", "correctpw"))
        .await
        .expect_err("outage must surface");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn signing_failure_is_an_internal_error(accounts: Vec<User>) {
    let mut tokens = MockTokenCodec::new();
    tokens
        .expect_issue()
        .returning(|_| Err(TokenError::signing("key rejected")));
    let authenticator = Authenticator::new(
        Arc::new(InMemoryUserRepository::with_users(accounts)),
        Arc::new(RecordingHasher::new()),
        Arc::new(tokens),
    )
    .await
    .expect("authenticator");

    let err = authenticator
        .authenticate(&credentials("alice", "correctpw"))
        .await
        .expect_err("signing failure");
    assert_eq!(err.code(), ErrorCode::InternalError);
}
