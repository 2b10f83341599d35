//! User administration endpoints.
//!
//! ```text
//! POST   /api/users                      AdminOnly
//! GET    /api/users                      AdminOnly
//! GET    /api/users/{id}                 AdminOrUser
//! PUT    /api/users/{id}                 AdminOrUser
//! DELETE /api/users/{id}                 AdminOnly
//! GET    /api/users/username/{username}  AdminOrUser
//! GET    /api/users/email/{email}        AdminOrUser
//! ```
//!
//! The extractor enforces the route policy; record ownership is decided by
//! the domain service.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    AccountChanges, EmailAddress, Error, NewAccount, NewPassword, PersonName, PhoneNumber, RoleSet,
    User, Username,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::bearer::{AdminOnly, AdminOrUser, Authorized};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_field, missing_field_error, parse_user_id, unknown_role_error,
};

const USERNAME: FieldName = FieldName::new("username");
const EMAIL: FieldName = FieldName::new("email");
const PASSWORD: FieldName = FieldName::new("password");
const FIRST_NAME: FieldName = FieldName::new("firstName");
const LAST_NAME: FieldName = FieldName::new("lastName");
const PHONE: FieldName = FieldName::new("phone");
const ROLES: FieldName = FieldName::new("roles");

/// Account payload for create and update.
///
/// `password` is required on create; on update a missing or empty password
/// leaves the stored hash untouched. `roles` and `isActive` are honoured for
/// administrators only.
#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    #[schema(example = json!(["CUSTOMER"]))]
    pub roles: Option<Vec<String>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Fields shared by create and update once validated.
struct ProfileFields {
    username: Username,
    email: EmailAddress,
    first_name: PersonName,
    last_name: PersonName,
    phone: Option<PhoneNumber>,
    roles: Option<RoleSet>,
}

impl UserRequest {
    fn profile(&self) -> Result<ProfileFields, Error> {
        Ok(ProfileFields {
            username: Username::new(&self.username).map_err(invalid_field(USERNAME))?,
            email: EmailAddress::new(&self.email).map_err(invalid_field(EMAIL))?,
            first_name: PersonName::new("firstName", &self.first_name)
                .map_err(invalid_field(FIRST_NAME))?,
            last_name: PersonName::new("lastName", &self.last_name)
                .map_err(invalid_field(LAST_NAME))?,
            phone: PhoneNumber::parse_optional(self.phone.as_deref())
                .map_err(invalid_field(PHONE))?,
            roles: self.roles()?,
        })
    }

    /// Requested roles; an empty list counts as none requested.
    fn roles(&self) -> Result<Option<RoleSet>, Error> {
        match self.roles.as_deref() {
            None | Some([]) => Ok(None),
            Some(names) => RoleSet::try_from_names(names)
                .map(Some)
                .map_err(|err| unknown_role_error(ROLES, &err)),
        }
    }

    /// Password supplied for an update, ignoring blanks.
    fn replacement_password(&self) -> Result<Option<NewPassword>, Error> {
        match self.password.as_deref() {
            None | Some("") => Ok(None),
            Some(raw) => NewPassword::new(raw)
                .map(Some)
                .map_err(invalid_field(PASSWORD)),
        }
    }
}

impl TryFrom<UserRequest> for NewAccount {
    type Error = Error;

    fn try_from(request: UserRequest) -> Result<Self, Self::Error> {
        let profile = request.profile()?;
        let password = match request.password.as_deref() {
            None | Some("") => return Err(missing_field_error(PASSWORD)),
            Some(raw) => NewPassword::new(raw).map_err(invalid_field(PASSWORD))?,
        };
        Ok(Self {
            username: profile.username,
            email: profile.email,
            password,
            first_name: profile.first_name,
            last_name: profile.last_name,
            phone: profile.phone,
            roles: profile.roles,
        })
    }
}

impl TryFrom<UserRequest> for AccountChanges {
    type Error = Error;

    fn try_from(request: UserRequest) -> Result<Self, Self::Error> {
        let profile = request.profile()?;
        Ok(Self {
            username: profile.username,
            email: profile.email,
            password: request.replacement_password()?,
            first_name: profile.first_name,
            last_name: profile.last_name,
            phone: profile.phone,
            roles: profile.roles,
            is_active: request.is_active,
        })
    }
}

/// Public view of an account. Never carries the password hash.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub is_active: bool,
    pub is_email_verified: bool,
    #[schema(example = json!(["USER"]))]
    pub roles: Vec<String>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            username: user.username().to_string(),
            email: user.email().to_string(),
            first_name: user.first_name().to_string(),
            last_name: user.last_name().to_string(),
            phone: user.phone().map(|phone| phone.as_str().to_owned()),
            is_active: user.is_active(),
            is_email_verified: user.is_email_verified(),
            roles: user.roles().names().into_iter().map(str::to_owned).collect(),
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

/// Create an account.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = UserRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid token", body = Error),
        (status = 403, description = "Administrator role required", body = Error),
        (status = 409, description = "Username or email taken", body = Error)
    ),
    tags = ["users"],
    operation_id = "createUser",
    security(("bearerAuth" = []))
)]
#[post("/users")]
pub async fn create_user(
    caller: Authorized<AdminOnly>,
    state: web::Data<HttpState>,
    payload: web::Json<UserRequest>,
) -> ApiResult<HttpResponse> {
    let account = NewAccount::try_from(payload.into_inner())?;
    let user = state
        .users_command
        .create_user(caller.principal(), account)
        .await?;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// List every account ordered by username.
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All accounts", body = [UserResponse]),
        (status = 401, description = "Invalid token", body = Error),
        (status = 403, description = "Administrator role required", body = Error)
    ),
    tags = ["users"],
    operation_id = "listUsers",
    security(("bearerAuth" = []))
)]
#[get("/users")]
pub async fn list_users(
    caller: Authorized<AdminOnly>,
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<UserResponse>>> {
    let users = state.users.list_users(caller.principal()).await?;
    Ok(web::Json(users.iter().map(UserResponse::from).collect()))
}

/// Fetch one account by id.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "Account UUID")),
    responses(
        (status = 200, description = "Account", body = UserResponse),
        (status = 400, description = "Invalid id", body = Error),
        (status = 401, description = "Invalid token", body = Error),
        (status = 403, description = "Not the caller's account", body = Error),
        (status = 404, description = "No such account", body = Error)
    ),
    tags = ["users"],
    operation_id = "getUser",
    security(("bearerAuth" = []))
)]
#[get("/users/{id}")]
pub async fn get_user(
    caller: Authorized<AdminOrUser>,
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserResponse>> {
    let id = parse_user_id(&path.into_inner())?;
    let user = state.users.user_by_id(caller.principal(), &id).await?;
    Ok(web::Json(UserResponse::from(user)))
}

/// Replace an account's profile.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "Account UUID")),
    request_body = UserRequest,
    responses(
        (status = 200, description = "Updated account", body = UserResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid token", body = Error),
        (status = 403, description = "Not permitted", body = Error),
        (status = 404, description = "No such account", body = Error),
        (status = 409, description = "Username or email taken", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateUser",
    security(("bearerAuth" = []))
)]
#[put("/users/{id}")]
pub async fn update_user(
    caller: Authorized<AdminOrUser>,
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<UserRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let id = parse_user_id(&path.into_inner())?;
    let changes = AccountChanges::try_from(payload.into_inner())?;
    let user = state
        .users_command
        .update_user(caller.principal(), &id, changes)
        .await?;
    Ok(web::Json(UserResponse::from(user)))
}

/// Remove an account.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "Account UUID")),
    responses(
        (status = 204, description = "Account removed"),
        (status = 400, description = "Invalid id", body = Error),
        (status = 401, description = "Invalid token", body = Error),
        (status = 403, description = "Administrator role required", body = Error),
        (status = 404, description = "No such account", body = Error)
    ),
    tags = ["users"],
    operation_id = "deleteUser",
    security(("bearerAuth" = []))
)]
#[delete("/users/{id}")]
pub async fn delete_user(
    caller: Authorized<AdminOnly>,
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_user_id(&path.into_inner())?;
    state
        .users_command
        .delete_user(caller.principal(), &id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Fetch one account by username.
#[utoipa::path(
    get,
    path = "/api/users/username/{username}",
    params(("username" = String, Path)),
    responses(
        (status = 200, description = "Account", body = UserResponse),
        (status = 400, description = "Invalid username", body = Error),
        (status = 401, description = "Invalid token", body = Error),
        (status = 403, description = "Not the caller's account", body = Error),
        (status = 404, description = "No such account", body = Error)
    ),
    tags = ["users"],
    operation_id = "getUserByUsername",
    security(("bearerAuth" = []))
)]
#[get("/users/username/{username}")]
pub async fn get_user_by_username(
    caller: Authorized<AdminOrUser>,
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserResponse>> {
    let username = Username::new(path.into_inner()).map_err(invalid_field(USERNAME))?;
    let user = state
        .users
        .user_by_username(caller.principal(), &username)
        .await?;
    Ok(web::Json(UserResponse::from(user)))
}

/// Fetch one account by email address.
#[utoipa::path(
    get,
    path = "/api/users/email/{email}",
    params(("email" = String, Path)),
    responses(
        (status = 200, description = "Account", body = UserResponse),
        (status = 400, description = "Invalid email", body = Error),
        (status = 401, description = "Invalid token", body = Error),
        (status = 403, description = "Not the caller's account", body = Error),
        (status = 404, description = "No such account", body = Error)
    ),
    tags = ["users"],
    operation_id = "getUserByEmail",
    security(("bearerAuth" = []))
)]
#[get("/users/email/{email}")]
pub async fn get_user_by_email(
    caller: Authorized<AdminOrUser>,
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserResponse>> {
    let email = EmailAddress::new(path.into_inner()).map_err(invalid_field(EMAIL))?;
    let user = state.users.user_by_email(caller.principal(), &email).await?;
    Ok(web::Json(UserResponse::from(user)))
}
