//! Provisioning, ownership and uniqueness rules for user administration.

use super::*;
use crate::domain::ErrorCode;
use crate::outbound::persistence::InMemoryUserRepository;
use crate::test_support::{RecordingHasher, UserFixture, principal};
use rstest::{fixture, rstest};

struct Harness {
    service: UserAccountService,
    alice: User,
    bob: User,
}

#[fixture]
fn harness() -> Harness {
    let alice = UserFixture::new("alice").roles(&[Role::User]).build();
    let bob = UserFixture::new("bob").roles(&[Role::Customer]).build();
    let users = InMemoryUserRepository::with_users([alice.clone(), bob.clone()]);
    Harness {
        service: UserAccountService::new(Arc::new(users), Arc::new(RecordingHasher::new())),
        alice,
        bob,
    }
}

fn admin() -> Principal {
    principal("root", &[Role::Admin])
}

fn as_alice() -> Principal {
    principal("alice", &[Role::User])
}

fn new_account(username: &str, email: &str) -> NewAccount {
    NewAccount {
        username: Username::new(username).expect("username"),
        email: EmailAddress::new(email).expect("email"),
        password: NewPassword::new("s3cret-pass").expect("password"),
        first_name: PersonName::new("first_name", "Carol").expect("first name"),
        last_name: PersonName::new("last_name", "Jones").expect("last name"),
        phone: None,
        roles: None,
    }
}

/// Changes that keep every field of `user` as it is.
fn unchanged(user: &User) -> AccountChanges {
    AccountChanges {
        username: user.username().clone(),
        email: user.email().clone(),
        password: None,
        first_name: user.first_name().clone(),
        last_name: user.last_name().clone(),
        phone: user.phone().cloned(),
        roles: None,
        is_active: None,
    }
}

#[rstest]
#[tokio::test]
async fn admin_creates_active_customer_accounts_by_default(harness: Harness) {
    let created = harness
        .service
        .create_user(&admin(), new_account("carol", "carol@example.com"))
        .await
        .expect("create");

    assert_eq!(created.roles(), &RoleSet::from(Role::Customer));
    assert!(created.is_active());
    assert!(!created.is_email_verified());
    assert_eq!(
        created.password_hash(),
        &RecordingHasher::digest_for("s3cret-pass")
    );
    let fetched = harness
        .service
        .user_by_id(&admin(), &created.id())
        .await
        .expect("fetch");
    assert_eq!(fetched, created);
}

#[rstest]
#[tokio::test]
async fn explicit_roles_are_kept_on_create(harness: Harness) {
    let mut account = new_account("carol", "carol@example.com");
    account.roles = Some([Role::Admin, Role::User].into_iter().collect());
    let created = harness
        .service
        .create_user(&admin(), account)
        .await
        .expect("create");
    assert_eq!(created.roles().names(), vec!["ADMIN", "USER"]);
}

#[rstest]
#[case::username("alice", "carol@example.com", "Username already exists")]
#[case::email("carol", "bob@example.com", "Email already exists")]
#[tokio::test]
async fn create_rejects_taken_identities(
    harness: Harness,
    #[case] username: &str,
    #[case] email: &str,
    #[case] message: &str,
) {
    let err = harness
        .service
        .create_user(&admin(), new_account(username, email))
        .await
        .expect_err("duplicate");
    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(err.message(), message);
}

#[rstest]
#[tokio::test]
async fn non_admins_cannot_create_list_or_delete(harness: Harness) {
    let caller = as_alice();
    let create = harness
        .service
        .create_user(&caller, new_account("carol", "carol@example.com"))
        .await;
    let list = harness.service.list_users(&caller).await;
    let delete = harness.service.delete_user(&caller, &harness.bob.id()).await;

    for code in [
        create.map(|_| ()).expect_err("create").code(),
        list.map(|_| ()).expect_err("list").code(),
        delete.expect_err("delete").code(),
    ] {
        assert_eq!(code, ErrorCode::Forbidden);
    }
}

#[rstest]
#[tokio::test]
async fn admins_list_everyone_in_username_order(harness: Harness) {
    let names: Vec<String> = harness
        .service
        .list_users(&admin())
        .await
        .expect("list")
        .iter()
        .map(|user| user.username().to_string())
        .collect();
    assert_eq!(names, ["alice", "bob"]);
}

#[rstest]
#[tokio::test]
async fn users_read_only_their_own_record(harness: Harness) {
    let own = harness
        .service
        .user_by_id(&as_alice(), &harness.alice.id())
        .await
        .expect("own record");
    assert_eq!(own.username().as_str(), "alice");

    let other = harness
        .service
        .user_by_id(&as_alice(), &harness.bob.id())
        .await
        .expect_err("other record");
    assert_eq!(other.code(), ErrorCode::Forbidden);

    let by_name = harness
        .service
        .user_by_username(&as_alice(), harness.bob.username())
        .await
        .expect_err("other username");
    assert_eq!(by_name.code(), ErrorCode::Forbidden);

    let by_email = harness
        .service
        .user_by_email(&as_alice(), harness.alice.email())
        .await
        .expect("own email");
    assert_eq!(by_email.id(), harness.alice.id());
}

#[rstest]
#[case::admin(admin(), ErrorCode::NotFound)]
#[case::owner_role(as_alice(), ErrorCode::Forbidden)]
#[tokio::test]
async fn missing_ids_only_reveal_absence_to_admins(
    harness: Harness,
    #[case] caller: Principal,
    #[case] expected: ErrorCode,
) {
    let err = harness
        .service
        .user_by_id(&caller, &UserId::random())
        .await
        .expect_err("missing");
    assert_eq!(err.code(), expected);
}

#[rstest]
#[tokio::test]
async fn admin_lookups_by_name_and_email_report_missing_records(harness: Harness) {
    let name = Username::new("nobody").expect("username");
    let email = EmailAddress::new("nobody@example.com").expect("email");

    let by_name = harness.service.user_by_username(&admin(), &name).await;
    let by_email = harness.service.user_by_email(&admin(), &email).await;

    assert_eq!(by_name.expect_err("name").code(), ErrorCode::NotFound);
    assert_eq!(by_email.expect_err("email").code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn owners_update_profile_fields_and_password(harness: Harness) {
    let mut changes = unchanged(&harness.alice);
    changes.first_name = PersonName::new("first_name", "Alicia").expect("name");
    changes.password = Some(NewPassword::new("brand-new-pass").expect("password"));

    let updated = harness
        .service
        .update_user(&as_alice(), &harness.alice.id(), changes)
        .await
        .expect("update");

    assert_eq!(updated.first_name().as_str(), "Alicia");
    assert_eq!(
        updated.password_hash(),
        &RecordingHasher::digest_for("brand-new-pass")
    );
    assert_eq!(updated.roles(), harness.alice.roles());
}

#[rstest]
#[case::roles(Some(RoleSet::from(Role::Admin)), None)]
#[case::status(None, Some(false))]
#[tokio::test]
async fn owners_cannot_change_roles_or_status(
    harness: Harness,
    #[case] roles: Option<RoleSet>,
    #[case] is_active: Option<bool>,
) {
    let mut changes = unchanged(&harness.alice);
    changes.roles = roles;
    changes.is_active = is_active;

    let err = harness
        .service
        .update_user(&as_alice(), &harness.alice.id(), changes)
        .await
        .expect_err("escalation");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn owners_may_resubmit_their_current_roles_and_status(harness: Harness) {
    let mut changes = unchanged(&harness.alice);
    changes.roles = Some(harness.alice.roles().clone());
    changes.is_active = Some(harness.alice.is_active());
    changes.last_name = PersonName::new("last_name", "Liddell").expect("name");

    let updated = harness
        .service
        .update_user(&as_alice(), &harness.alice.id(), changes)
        .await
        .expect("unchanged roles and status are allowed");

    assert_eq!(updated.last_name().as_str(), "Liddell");
    assert_eq!(updated.roles(), harness.alice.roles());
    assert!(updated.is_active());
}

#[rstest]
#[tokio::test]
async fn admins_replace_roles_and_deactivate(harness: Harness) {
    let mut changes = unchanged(&harness.bob);
    changes.roles = Some([Role::User, Role::Customer].into_iter().collect());
    changes.is_active = Some(false);

    let updated = harness
        .service
        .update_user(&admin(), &harness.bob.id(), changes)
        .await
        .expect("update");

    assert_eq!(updated.roles().names(), vec!["USER", "CUSTOMER"]);
    assert!(!updated.is_active());
}

#[rstest]
#[tokio::test]
async fn renaming_onto_a_taken_username_conflicts(harness: Harness) {
    let mut changes = unchanged(&harness.alice);
    changes.username = harness.bob.username().clone();

    let err = harness
        .service
        .update_user(&admin(), &harness.alice.id(), changes)
        .await
        .expect_err("taken");
    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(err.message(), "Username already exists");
}

#[rstest]
#[tokio::test]
async fn updating_a_missing_account_is_not_found(harness: Harness) {
    let err = harness
        .service
        .update_user(&admin(), &UserId::random(), unchanged(&harness.alice))
        .await
        .expect_err("missing");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn delete_removes_once_then_reports_missing(harness: Harness) {
    let id = harness.bob.id();
    harness
        .service
        .delete_user(&admin(), &id)
        .await
        .expect("delete");

    let again = harness.service.delete_user(&admin(), &id).await;
    assert_eq!(again.expect_err("gone").code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn ensure_account_provisions_only_once(harness: Harness) {
    let first = harness
        .service
        .ensure_account(new_account("admin", "admin@example.com"))
        .await
        .expect("provision");
    let second = harness
        .service
        .ensure_account(new_account("admin", "admin@example.com"))
        .await
        .expect("provision");

    assert_eq!(first, Provisioning::Created);
    assert_eq!(second, Provisioning::AlreadyPresent);
}
