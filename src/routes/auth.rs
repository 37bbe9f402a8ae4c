use log::error;
use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::models::{AuthResponse, LoginDto, RegisterDto, User, UserResponse};
use crate::services::{IdentityService, JwtService};
use crate::utils::{validated, ApiError};

pub(crate) fn issue_token(jwt: &JwtService, user: &User) -> Result<String, ApiError> {
    jwt.generate_token(user).map_err(|e| {
        error!("Token generation failed for {}: {}", user.id, e);
        ApiError::internal_error("Internal server error")
    })
}

#[openapi(tag = "Auth")]
#[post("/auth/register", data = "<dto>")]
pub async fn register(
    identity: &State<IdentityService>,
    jwt: &State<JwtService>,
    dto: Json<RegisterDto>,
) -> Result<Created<Json<AuthResponse>>, ApiError> {
    let mut dto = validated(dto.into_inner())?;
    dto.email = dto.email.trim().to_lowercase();

    let registration = identity.register(dto).await?;
    let token = issue_token(jwt, &registration.user)?;
    let location = match registration.worker {
        Some(ref profile) => format!("/workers/{}", profile.user_id.to_hex()),
        None => "/users/me".to_string(),
    };

    Ok(Created::new(location).body(Json(AuthResponse {
        user: UserResponse::from(registration.user),
        token,
    })))
}

#[openapi(tag = "Auth")]
#[post("/auth/login", data = "<dto>")]
pub async fn login(
    identity: &State<IdentityService>,
    jwt: &State<JwtService>,
    dto: Json<LoginDto>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = dto.email.trim().to_lowercase();
    let user = identity.login(&email, &dto.password).await?;
    let token = issue_token(jwt, &user)?;

    Ok(Json(AuthResponse {
        user: UserResponse::from(user),
        token,
    }))
}
