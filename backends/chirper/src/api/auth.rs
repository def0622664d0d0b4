use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    db,
    error::{AppError, AppResult},
    utils::{
        auth::ActorContext,
        extract::Json,
        form::{self, required},
        hasher,
        jwt::JwtKeys,
        password,
    },
};

const MAX_USERNAME_LENGTH: usize = 150;

// Path segments under /accounts/ that would shadow a profile URL.
const RESERVED_USERNAMES: [&str; 5] = ["signup", "login", "logout", "password", "me"];

const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

fn validate_username(username: &str) -> Result<(), ValidationError> {
    required(username)?;

    let length = username.chars().count();
    if length > MAX_USERNAME_LENGTH {
        return Err(form::error(
            "max_length",
            format!(
                "Ensure this value has at most {MAX_USERNAME_LENGTH} characters (it has {length})."
            ),
        ));
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
        return Err(form::error(
            "invalid",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }

    if RESERVED_USERNAMES.contains(&username) {
        return Err(form::error("reserved", "This username is reserved."));
    }

    Ok(())
}

fn validate_email_address(email: &str) -> Result<(), ValidationError> {
    required(email)?;

    if !validator::validate_email(email) {
        return Err(form::error("invalid", "Enter a valid email address."));
    }
    Ok(())
}

/// Confirmation and strength checks for a new password pair. Failures are
/// reported against the confirmation field.
fn check_new_password(
    errors: &mut ValidationErrors,
    field: &'static str,
    (password1, password2): (&str, &str),
    (username, email): (&str, &str),
) {
    if password1.is_empty() || password2.is_empty() {
        return;
    }

    if password1 != password2 {
        errors.add(
            field,
            form::error("password_mismatch", "The two password fields didn't match."),
        );
        return;
    }

    for error in password::validate(password2, username, email) {
        errors.add(field, error);
    }
}

// ================================================= SIGNUP ================================================= //

#[derive(Debug, Deserialize, Validate)]
struct SignupUser {
    #[serde(default, deserialize_with = "form::trimmed")]
    #[validate(custom = "validate_username")]
    username: String,

    #[serde(default, deserialize_with = "form::trimmed")]
    #[validate(custom = "validate_email_address")]
    email: String,

    #[serde(default)]
    #[validate(custom = "required")]
    password1: String,

    #[serde(default)]
    #[validate(custom = "required")]
    password2: String,
}

impl SignupUser {
    fn clean(&self) -> Result<(), ValidationErrors> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);
        check_new_password(
            &mut errors,
            "password2",
            (&self.password1, &self.password2),
            (&self.username, &self.email),
        );
        form::finish(errors)
    }
}

#[derive(Deserialize)]
pub struct Signup {
    user: SignupUser,
}

// POST /accounts/signup/
pub async fn signup(
    State(pool): State<SqlitePool>,
    State(keys): State<JwtKeys>,
    Json(Signup { user }): Json<Signup>,
) -> AppResult<impl IntoResponse> {
    user.clean()?;

    let hash = hasher::hash_password(&user.password1)?;
    let account = db::create_user(&pool, &user.username, &user.email, &hash).await?;
    tracing::info!(username = %account.username, "user signed up");

    // A fresh account is logged in straight away.
    let account = db::record_login(&pool, account.id)
        .await?
        .with_token(&keys)?;
    Ok((StatusCode::CREATED, Json(json!({ "user": account }))))
}

// ================================================= LOGIN ================================================= //

#[derive(Debug, Deserialize, Validate)]
struct LoginUser {
    #[serde(default, deserialize_with = "form::trimmed")]
    #[validate(length(min = 1, message = "This field is required."))]
    username: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    password: String,
}

#[derive(Deserialize)]
pub struct Login {
    user: LoginUser,
}

fn invalid_login() -> AppError {
    form::single(
        form::NON_FIELD_ERRORS,
        form::error("invalid_login", INVALID_LOGIN),
    )
    .into()
}

// POST /accounts/login/
pub async fn login(
    State(pool): State<SqlitePool>,
    State(keys): State<JwtKeys>,
    Json(Login { user }): Json<Login>,
) -> AppResult<impl IntoResponse> {
    user.validate()?;

    let account = db::find_user_by_username(&pool, &user.username).await?;
    let Some(account) = account.filter(|account| account.is_active) else {
        // Unknown and inactive users cost one argon2 run, like a wrong password.
        hasher::hash_password(&user.password)?;
        return Err(invalid_login());
    };

    if !hasher::verify_password(&account.hash, &user.password)? {
        tracing::debug!(username = %user.username, "rejected login");
        return Err(invalid_login());
    }

    let account = db::record_login(&pool, account.id)
        .await?
        .with_token(&keys)?;
    tracing::info!(username = %account.username, "user logged in");
    Ok(Json(json!({ "user": account })))
}

// ================================================= LOGOUT ================================================= //

// POST /accounts/logout/
pub async fn logout(
    State(pool): State<SqlitePool>,
    actor: ActorContext,
) -> AppResult<impl IntoResponse> {
    db::bump_session_epoch(&pool, actor.user_id).await?;
    tracing::info!(username = %actor.username, "user logged out");
    Ok(Json(json!({ "message": "Logged out." })))
}

// ================================================= CURRENT USER ================================================= //

// GET /accounts/me/
pub async fn current_user(
    State(pool): State<SqlitePool>,
    actor: ActorContext,
) -> AppResult<impl IntoResponse> {
    let account = db::get_user(&pool, actor.user_id).await?;
    Ok(Json(json!({ "user": account })))
}

// ================================================= PASSWORD CHANGE ================================================= //

#[derive(Debug, Deserialize, Validate)]
struct PasswordChangeUser {
    #[serde(default)]
    #[validate(custom = "required")]
    old_password: String,

    #[serde(default)]
    #[validate(custom = "required")]
    new_password1: String,

    #[serde(default)]
    #[validate(custom = "required")]
    new_password2: String,
}

#[derive(Deserialize)]
pub struct PasswordChange {
    user: PasswordChangeUser,
}

// POST /accounts/password/
pub async fn change_password(
    State(pool): State<SqlitePool>,
    State(keys): State<JwtKeys>,
    actor: ActorContext,
    Json(PasswordChange { user }): Json<PasswordChange>,
) -> AppResult<impl IntoResponse> {
    let account = db::get_user(&pool, actor.user_id).await?;

    let mut errors = user.validate().err().unwrap_or_else(ValidationErrors::new);
    if !user.old_password.is_empty() && !hasher::verify_password(&account.hash, &user.old_password)?
    {
        errors.add(
            "old_password",
            form::error(
                "password_incorrect",
                "Your old password was entered incorrectly. Please enter it again.",
            ),
        );
    }
    check_new_password(
        &mut errors,
        "new_password2",
        (&user.new_password1, &user.new_password2),
        (&account.username, &account.email),
    );
    form::finish(errors)?;

    let hash = hasher::hash_password(&user.new_password1)?;
    let account = db::set_password(&pool, actor.user_id, &hash)
        .await?
        .with_token(&keys)?;
    tracing::info!(username = %account.username, "password changed");
    Ok(Json(json!({ "user": account })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup_form(username: &str, email: &str, password1: &str, password2: &str) -> SignupUser {
        SignupUser {
            username: username.to_string(),
            email: email.to_string(),
            password1: password1.to_string(),
            password2: password2.to_string(),
        }
    }

    fn messages(errors: &ValidationErrors, field: &str) -> Vec<String> {
        crate::error::field_messages(errors)
            .get(field)
            .cloned()
            .unwrap_or_default()
    }

    #[test]
    fn a_valid_signup_passes() {
        let form = signup_form("testuser", "test@test.com", "testpassword", "testpassword");
        assert!(form.clean().is_ok());
    }

    #[test]
    fn empty_signup_reports_every_field() {
        let errors = signup_form("", "", "", "").clean().unwrap_err();

        for field in ["username", "email", "password1", "password2"] {
            assert_eq!(messages(&errors, field), vec![form::REQUIRED.to_string()]);
        }
    }

    #[test]
    fn invalid_email_is_reported() {
        let errors = signup_form("testuser", "invalid_email", "testpassword", "testpassword")
            .clean()
            .unwrap_err();
        assert_eq!(
            messages(&errors, "email"),
            vec!["Enter a valid email address.".to_string()]
        );
    }

    #[test]
    fn password_problems_land_on_the_confirmation_field() {
        let errors = signup_form("testuser", "test@test.com", "fdasjkn2", "novcian2")
            .clean()
            .unwrap_err();
        assert_eq!(
            messages(&errors, "password2"),
            vec!["The two password fields didn't match.".to_string()]
        );

        let errors = signup_form("testuser", "test@test.com", "testuser1", "testuser1")
            .clean()
            .unwrap_err();
        assert_eq!(
            messages(&errors, "password2"),
            vec!["The password is too similar to the username.".to_string()]
        );
        assert!(messages(&errors, "password1").is_empty());
    }

    #[test]
    fn usernames_are_restricted() {
        assert!(validate_username("alice.b+c@d-e_f").is_ok());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("login").is_err());
        assert!(validate_username(&"a".repeat(150)).is_ok());
        assert!(validate_username(&"a".repeat(151)).is_err());
    }

    #[test]
    fn login_requires_both_fields() {
        let form = LoginUser {
            username: "testuser".to_string(),
            password: String::new(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(
            messages(&errors, "password"),
            vec![form::REQUIRED.to_string()]
        );
    }
}
