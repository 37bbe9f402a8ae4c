mod memory;
mod mongo;
mod query;

pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use query::{BookingQuery, WorkerQuery};

use log::{error, info};
use mongodb::bson::oid::ObjectId;
use rocket::fairing::AdHoc;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{AppConfig, StoreBackend};
use crate::models::{Booking, BookingStatus, Review, User, UserChanges, WorkerChanges, WorkerProfile};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("{0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Document collections backing the marketplace. Every method is a single
/// round trip; nothing here spans more than one document write.
#[rocket::async_trait]
pub trait Store: Send + Sync {
    async fn insert_user(&self, user: &User) -> StoreResult<()>;
    async fn find_user(&self, id: ObjectId) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_phone(&self, phone: &str) -> StoreResult<Option<User>>;
    /// Ids of users whose address contains `pattern`, ignoring case.
    async fn find_user_ids_by_address(&self, pattern: &str) -> StoreResult<Vec<ObjectId>>;
    async fn update_user(&self, id: ObjectId, changes: &UserChanges) -> StoreResult<Option<User>>;

    async fn insert_worker(&self, worker: &WorkerProfile) -> StoreResult<()>;
    async fn find_worker(&self, id: ObjectId) -> StoreResult<Option<WorkerProfile>>;
    async fn find_workers_by_user(&self, user_id: ObjectId) -> StoreResult<Vec<WorkerProfile>>;
    async fn search_workers(&self, query: &WorkerQuery, limit: i64) -> StoreResult<Vec<WorkerProfile>>;
    async fn update_worker(
        &self,
        id: ObjectId,
        changes: &WorkerChanges,
    ) -> StoreResult<Option<WorkerProfile>>;
    async fn set_worker_rating(&self, id: ObjectId, rating: f64, total_reviews: i32) -> StoreResult<()>;

    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()>;
    async fn find_booking(&self, id: ObjectId) -> StoreResult<Option<Booking>>;
    async fn find_one_booking(&self, query: &BookingQuery) -> StoreResult<Option<Booking>>;
    /// Matching bookings, latest service date first.
    async fn find_bookings(&self, query: &BookingQuery) -> StoreResult<Vec<Booking>>;
    /// Moves a booking to `to` only while it is still in `from`.
    async fn compare_and_set_booking_status(
        &self,
        id: ObjectId,
        from: BookingStatus,
        to: BookingStatus,
    ) -> StoreResult<Option<Booking>>;

    async fn insert_review(&self, review: &Review) -> StoreResult<()>;
    /// Reviews for a worker, newest first.
    async fn find_reviews_for_worker(&self, worker_id: ObjectId) -> StoreResult<Vec<Review>>;
}

pub type StoreHandle = Arc<dyn Store>;

pub fn init() -> AdHoc {
    AdHoc::try_on_ignite("Store", |rocket| async move {
        let config = match AppConfig::from_figment(rocket.figment()) {
            Ok(config) => config,
            Err(e) => {
                error!("✗ Invalid configuration: {}", e);
                return Err(rocket);
            }
        };

        let store: StoreHandle = match config.store {
            StoreBackend::Memory => {
                info!("✓ Using in-memory store");
                Arc::new(MemoryStore::default())
            }
            StoreBackend::Mongodb => {
                match MongoStore::connect(&config.mongodb_uri, &config.database_name).await {
                    Ok(store) => {
                        info!("✓ MongoDB connected successfully");
                        Arc::new(store)
                    }
                    Err(e) => {
                        error!("✗ Failed to connect to MongoDB: {}", e);
                        return Err(rocket);
                    }
                }
            }
        };

        Ok(rocket.manage(store).manage(config))
    })
}
