use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::guards::AuthGuard;
use crate::models::{CreateReviewDto, ReviewResponse};
use crate::services::ReviewAggregator;
use crate::utils::{parse_object_id, validated, ApiError};

#[openapi(tag = "Review")]
#[post("/reviews", data = "<dto>")]
pub async fn create_review(
    reviews: &State<ReviewAggregator>,
    auth: AuthGuard,
    dto: Json<CreateReviewDto>,
) -> Result<Created<Json<ReviewResponse>>, ApiError> {
    let dto = validated(dto.into_inner())?;
    let worker_id = parse_object_id(&dto.worker_id, "worker")?;

    let review = reviews
        .create_review(auth.user_id, worker_id, dto.rating, dto.comment)
        .await?;
    let location = format!("/reviews/{}", review.worker_id.to_hex());
    Ok(Created::new(location).body(Json(ReviewResponse::from(review))))
}

#[openapi(tag = "Review")]
#[get("/reviews/<worker_id>")]
pub async fn get_worker_reviews(
    reviews: &State<ReviewAggregator>,
    worker_id: String,
) -> Result<Json<Vec<ReviewResponse>>, ApiError> {
    let worker_id = parse_object_id(&worker_id, "worker")?;
    let entries = reviews.list_for_worker(worker_id).await?;
    Ok(Json(entries.into_iter().map(ReviewResponse::from).collect()))
}
