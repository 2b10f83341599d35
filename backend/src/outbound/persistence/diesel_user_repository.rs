//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{
    EmailAddress, PasswordDigest, PersonName, PhoneNumber, RoleSet, User, UserId, UserParts,
    Username,
};

use super::models::{NewUserRow, UserRow, UserUpdate};
use super::pool::DbPool;
use super::schema::users;
use super::user_persistence_error_mapping::{map_diesel_error, map_pool_error};

/// Diesel-backed credential store.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn find_one<F>(&self, filter: F) -> Result<Option<User>, UserPersistenceError>
    where
        F: FnOnce(users::table) -> users::BoxedQuery<'static, diesel::pg::Pg> + Send,
    {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = filter(users::table)
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_user).transpose()
    }
}

/// Convert a stored row back into a validated domain user.
///
/// Rows violating domain rules surface as query errors rather than being
/// silently repaired.
fn row_to_user(row: UserRow) -> Result<User, UserPersistenceError> {
    let invalid = |err: &dyn std::fmt::Display| {
        UserPersistenceError::query(format!("stored user {} is invalid: {err}", row.id))
    };
    let parts = UserParts {
        id: UserId::from_uuid(row.id),
        username: Username::new(&row.username).map_err(|e| invalid(&e))?,
        email: EmailAddress::new(&row.email).map_err(|e| invalid(&e))?,
        password_hash: PasswordDigest::new(row.password_hash.clone()),
        first_name: PersonName::new("first_name", &row.first_name).map_err(|e| invalid(&e))?,
        last_name: PersonName::new("last_name", &row.last_name).map_err(|e| invalid(&e))?,
        phone: PhoneNumber::parse_optional(row.phone.as_deref()).map_err(|e| invalid(&e))?,
        is_active: row.is_active,
        is_email_verified: row.is_email_verified,
        roles: RoleSet::try_from_names(&row.roles).map_err(|e| invalid(&e))?,
    };
    Ok(User::from_parts(parts))
}

fn role_names(user: &User) -> Vec<String> {
    user.roles().names().into_iter().map(str::to_owned).collect()
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let id = *id.as_uuid();
        self.find_one(move |table| table.filter(users::id.eq(id)).into_boxed())
            .await
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, UserPersistenceError> {
        let username = username.to_string();
        self.find_one(move |table| table.filter(users::username.eq(username)).into_boxed())
            .await
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        let email = email.to_string();
        self.find_one(move |table| table.filter(users::email.eq(email)).into_boxed())
            .await
    }

    async fn list(&self) -> Result<Vec<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserRow> = users::table
            .order(users::username.asc())
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_user).collect()
    }

    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewUserRow {
            id: *user.id().as_uuid(),
            username: user.username().as_str(),
            email: user.email().as_str(),
            password_hash: user.password_hash().as_str(),
            first_name: user.first_name().as_str(),
            last_name: user.last_name().as_str(),
            phone: user.phone().map(PhoneNumber::as_str),
            is_active: user.is_active(),
            is_email_verified: user.is_email_verified(),
            roles: role_names(user),
        };
        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(&self, user: &User) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changes = UserUpdate {
            username: user.username().as_str(),
            email: user.email().as_str(),
            password_hash: user.password_hash().as_str(),
            first_name: user.first_name().as_str(),
            last_name: user.last_name().as_str(),
            phone: user.phone().map(PhoneNumber::as_str),
            is_active: user.is_active(),
            is_email_verified: user.is_email_verified(),
            roles: role_names(user),
        };
        let updated = diesel::update(users::table.find(*user.id().as_uuid()))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(users::table.find(*id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    //! Row conversion coverage; query paths run against PostgreSQL only.
    use super::*;
    use chrono::Utc;
    use rstest::{fixture, rstest};
    use uuid::Uuid;

    #[fixture]
    fn row() -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: "$argon2id$v=19$stub".into(),
            first_name: "Alice".into(),
            last_name: "Liddell".into(),
            phone: Some("+44 20 7946 0000".into()),
            is_active: true,
            is_email_verified: true,
            roles: vec!["USER".into(), "ADMIN".into()],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[rstest]
    fn row_to_user_maps_every_column(row: UserRow) {
        let id = row.id;
        let user = row_to_user(row).expect("valid row");
        assert_eq!(*user.id().as_uuid(), id);
        assert_eq!(user.username().as_str(), "alice");
        assert_eq!(user.phone().map(PhoneNumber::as_str), Some("+44 20 7946 0000"));
        assert_eq!(user.roles().names(), vec!["ADMIN", "USER"]);
        assert!(user.is_email_verified());
        assert_eq!(role_names(&user), vec!["ADMIN".to_owned(), "USER".to_owned()]);
    }

    #[rstest]
    fn row_with_unknown_role_is_rejected(mut row: UserRow) {
        row.roles = vec!["ROOT".into()];
        let err = row_to_user(row).expect_err("unknown role");
        assert!(matches!(err, UserPersistenceError::Query { .. }));
        assert!(err.to_string().contains("unknown role: ROOT"));
    }

    #[rstest]
    fn row_with_invalid_username_is_rejected(mut row: UserRow) {
        row.username = "x".into();
        assert!(row_to_user(row).is_err());
    }
}
