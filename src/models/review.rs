use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;
use validator::Validate;

use crate::models::{User, UserResponse};
use crate::utils::to_chrono;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub worker_id: ObjectId,
    pub customer_id: ObjectId,
    pub rating: i32, // 1-5
    pub comment: Option<String>,
    pub created_at: DateTime,
}

#[derive(Debug, Clone)]
pub struct ReviewWithCustomer {
    pub review: Review,
    pub customer: Option<User>,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewDto {
    #[serde(alias = "worker")]
    pub worker_id: String,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: String,
    pub worker_id: String,
    pub customer_id: String,
    pub customer: Option<UserResponse>,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<ReviewWithCustomer> for ReviewResponse {
    fn from(entry: ReviewWithCustomer) -> Self {
        let review = entry.review;
        ReviewResponse {
            id: review.id.to_hex(),
            worker_id: review.worker_id.to_hex(),
            customer_id: review.customer_id.to_hex(),
            customer: entry.customer.map(UserResponse::from),
            rating: review.rating,
            comment: review.comment,
            created_at: to_chrono(review.created_at),
        }
    }
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        ReviewResponse::from(ReviewWithCustomer {
            review,
            customer: None,
        })
    }
}
