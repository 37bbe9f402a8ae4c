use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::guards::AuthGuard;
use crate::models::{CurrentUserResponse, UpdateUserDto, UserResponse, WorkerProfileResponse};
use crate::services::IdentityService;
use crate::utils::{validated, ApiError};

#[openapi(tag = "User")]
#[get("/users/me")]
pub async fn get_current_user(
    identity: &State<IdentityService>,
    auth: AuthGuard,
) -> Result<Json<CurrentUserResponse>, ApiError> {
    let (user, profile) = identity.current_user(auth.user_id).await?;

    Ok(Json(CurrentUserResponse {
        user: UserResponse::from(user),
        worker_details: profile.map(WorkerProfileResponse::from),
    }))
}

#[openapi(tag = "User")]
#[patch("/users/me", data = "<dto>")]
pub async fn update_current_user(
    identity: &State<IdentityService>,
    auth: AuthGuard,
    dto: Json<UpdateUserDto>,
) -> Result<Json<UserResponse>, ApiError> {
    let mut dto = validated(dto.into_inner())?;
    dto.email = dto.email.map(|email| email.trim().to_lowercase());

    let user = identity.update_user(auth.user_id, dto).await?;
    Ok(Json(UserResponse::from(user)))
}
