use log::info;
use mongodb::bson::{oid::ObjectId, DateTime};
use std::collections::HashMap;

use crate::config::Policy;
use crate::db::{BookingQuery, StoreHandle};
use crate::models::{BookingStatus, Review, ReviewWithCustomer, User};
use crate::services::{MarketError, MarketResult};

/// Arithmetic mean of the ratings, 0 for none.
pub fn mean_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let total: i64 = reviews.iter().map(|r| i64::from(r.rating)).sum();
    total as f64 / reviews.len() as f64
}

pub struct ReviewAggregator {
    store: StoreHandle,
    policy: Policy,
}

impl ReviewAggregator {
    pub fn new(store: StoreHandle, policy: Policy) -> Self {
        ReviewAggregator { store, policy }
    }

    /// Stores the review, then recomputes the worker's rating from every
    /// review it has received.
    pub async fn create_review(
        &self,
        customer_id: ObjectId,
        worker_id: ObjectId,
        rating: i32,
        comment: Option<String>,
    ) -> MarketResult<Review> {
        if self.store.find_worker(worker_id).await?.is_none() {
            return Err(MarketError::NotFound("Worker not found".to_string()));
        }

        if self.policy.require_completed_booking_for_review {
            let completed = BookingQuery::for_worker(worker_id)
                .with_customer(customer_id)
                .with_status(BookingStatus::Completed);
            if self.store.find_one_booking(&completed).await?.is_none() {
                return Err(MarketError::Forbidden(
                    "Only customers with a completed booking can review this worker".to_string(),
                ));
            }
        }

        let review = Review {
            id: ObjectId::new(),
            worker_id,
            customer_id,
            rating,
            comment,
            created_at: DateTime::now(),
        };
        self.store.insert_review(&review).await?;

        let reviews = self.store.find_reviews_for_worker(worker_id).await?;
        let average = mean_rating(&reviews);
        self.store
            .set_worker_rating(worker_id, average, reviews.len() as i32)
            .await?;

        info!(
            "Review {} for worker {} brings rating to {:.2} over {} reviews",
            review.id,
            worker_id,
            average,
            reviews.len()
        );
        Ok(review)
    }

    pub async fn list_for_worker(&self, worker_id: ObjectId) -> MarketResult<Vec<ReviewWithCustomer>> {
        let reviews = self.store.find_reviews_for_worker(worker_id).await?;

        let mut customers: HashMap<ObjectId, Option<User>> = HashMap::new();
        let mut entries = Vec::with_capacity(reviews.len());
        for review in reviews {
            if !customers.contains_key(&review.customer_id) {
                let customer = self.store.find_user(review.customer_id).await?;
                customers.insert(review.customer_id, customer);
            }
            entries.push(ReviewWithCustomer {
                customer: customers.get(&review.customer_id).cloned().flatten(),
                review,
            });
        }

        Ok(entries)
    }
}
