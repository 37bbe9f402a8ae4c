use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::guards::AuthGuard;
use crate::models::{
    AvailabilityQuery, AvailabilityResponse, RatingResponse, SearchWorkersQuery, UpdateWorkerDto,
    WorkerProfileResponse,
};
use crate::services::{WorkerDirectory, WorkerFilters};
use crate::utils::{parse_object_id, parse_service_date, validated, ApiError};

#[openapi(tag = "Worker")]
#[get("/workers?<query..>")]
pub async fn search_workers(
    directory: &State<WorkerDirectory>,
    query: SearchWorkersQuery,
) -> Result<Json<Vec<WorkerProfileResponse>>, ApiError> {
    let workers = directory.search(WorkerFilters::try_from(query)?).await?;
    Ok(Json(workers.into_iter().map(WorkerProfileResponse::from).collect()))
}

/// Profiles owned by the given user id; empty when there are none.
#[openapi(tag = "Worker")]
#[get("/workers/<user_id>")]
pub async fn get_workers_by_user(
    directory: &State<WorkerDirectory>,
    user_id: String,
) -> Result<Json<Vec<WorkerProfileResponse>>, ApiError> {
    let user_id = parse_object_id(&user_id, "user")?;
    let workers = directory.find_by_owner(user_id).await?;
    Ok(Json(workers.into_iter().map(WorkerProfileResponse::from).collect()))
}

#[openapi(tag = "Worker")]
#[put("/workers/<user_id>", data = "<dto>")]
pub async fn update_worker(
    directory: &State<WorkerDirectory>,
    auth: AuthGuard,
    user_id: String,
    dto: Json<UpdateWorkerDto>,
) -> Result<Json<WorkerProfileResponse>, ApiError> {
    let user_id = parse_object_id(&user_id, "user")?;
    let dto = validated(dto.into_inner())?;

    let updated = directory
        .update_profile(user_id, auth.user_id, dto.into())
        .await?;
    Ok(Json(WorkerProfileResponse::from(updated)))
}

#[openapi(tag = "Worker")]
#[get("/workers/<worker_id>/rating")]
pub async fn get_worker_rating(
    directory: &State<WorkerDirectory>,
    worker_id: String,
) -> Result<Json<RatingResponse>, ApiError> {
    let worker_id = parse_object_id(&worker_id, "worker")?;
    let rating = directory.rating(worker_id).await?;
    Ok(Json(RatingResponse { rating }))
}

#[openapi(tag = "Worker")]
#[get("/workers/<worker_id>/availability?<query..>")]
pub async fn check_worker_availability(
    directory: &State<WorkerDirectory>,
    worker_id: String,
    query: AvailabilityQuery,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let worker_id = parse_object_id(&worker_id, "worker")?;
    let day = parse_service_date(&query.service_date)
        .ok_or_else(|| ApiError::bad_request("Invalid service date"))?;

    let available = directory.is_free_on(worker_id, day).await?;
    Ok(Json(AvailabilityResponse { available }))
}
