use mongodb::bson::{oid::ObjectId, DateTime};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{BookingQuery, Store, StoreError, StoreResult, WorkerQuery};
use crate::models::{Booking, BookingStatus, Review, User, UserChanges, WorkerChanges, WorkerProfile};

/// Process-local store. Keys are ObjectIds, so iteration follows insertion
/// order the same way MongoDB's natural order does.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<BTreeMap<ObjectId, User>>,
    workers: RwLock<BTreeMap<ObjectId, WorkerProfile>>,
    bookings: RwLock<BTreeMap<ObjectId, Booking>>,
    reviews: RwLock<BTreeMap<ObjectId, Review>>,
}

fn insert_unique<T: Clone>(map: &mut BTreeMap<ObjectId, T>, id: ObjectId, value: &T) -> StoreResult<()> {
    if map.contains_key(&id) {
        return Err(StoreError::Backend(format!("duplicate key {}", id)));
    }
    map.insert(id, value.clone());
    Ok(())
}

#[rocket::async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(StoreError::Backend(format!("duplicate email {}", user.email)));
        }
        insert_unique(&mut users, user.id, user)
    }

    async fn find_user(&self, id: ObjectId) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn find_user_by_phone(&self, phone: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|user| user.phone_number.as_deref() == Some(phone))
            .cloned())
    }

    async fn find_user_ids_by_address(&self, pattern: &str) -> StoreResult<Vec<ObjectId>> {
        let needle = pattern.to_lowercase();
        let users = self.users.read().await;
        Ok(users
            .values()
            .filter(|user| {
                user.address
                    .as_deref()
                    .is_some_and(|address| address.to_lowercase().contains(&needle))
            })
            .map(|user| user.id)
            .collect())
    }

    async fn update_user(&self, id: ObjectId, changes: &UserChanges) -> StoreResult<Option<User>> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).map(|user| {
            changes.apply(user);
            user.clone()
        }))
    }

    async fn insert_worker(&self, worker: &WorkerProfile) -> StoreResult<()> {
        let mut workers = self.workers.write().await;
        insert_unique(&mut workers, worker.id, worker)
    }

    async fn find_worker(&self, id: ObjectId) -> StoreResult<Option<WorkerProfile>> {
        Ok(self.workers.read().await.get(&id).cloned())
    }

    async fn find_workers_by_user(&self, user_id: ObjectId) -> StoreResult<Vec<WorkerProfile>> {
        let workers = self.workers.read().await;
        Ok(workers
            .values()
            .filter(|worker| worker.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn search_workers(&self, query: &WorkerQuery, limit: i64) -> StoreResult<Vec<WorkerProfile>> {
        let workers = self.workers.read().await;
        Ok(workers
            .values()
            .filter(|worker| query.matches(worker))
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn update_worker(
        &self,
        id: ObjectId,
        changes: &WorkerChanges,
    ) -> StoreResult<Option<WorkerProfile>> {
        let mut workers = self.workers.write().await;
        Ok(workers.get_mut(&id).map(|worker| {
            changes.apply(worker);
            worker.clone()
        }))
    }

    async fn set_worker_rating(&self, id: ObjectId, rating: f64, total_reviews: i32) -> StoreResult<()> {
        let mut workers = self.workers.write().await;
        if let Some(worker) = workers.get_mut(&id) {
            worker.rating = rating;
            worker.total_reviews = total_reviews;
            worker.updated_at = DateTime::now();
        }
        Ok(())
    }

    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()> {
        let mut bookings = self.bookings.write().await;
        insert_unique(&mut bookings, booking.id, booking)
    }

    async fn find_booking(&self, id: ObjectId) -> StoreResult<Option<Booking>> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn find_one_booking(&self, query: &BookingQuery) -> StoreResult<Option<Booking>> {
        Ok(self.find_bookings(query).await?.into_iter().next())
    }

    async fn find_bookings(&self, query: &BookingQuery) -> StoreResult<Vec<Booking>> {
        let bookings = self.bookings.read().await;
        let mut matching: Vec<Booking> = bookings
            .values()
            .filter(|booking| query.matches(booking))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.service_date.cmp(&a.service_date));
        Ok(matching)
    }

    async fn compare_and_set_booking_status(
        &self,
        id: ObjectId,
        from: BookingStatus,
        to: BookingStatus,
    ) -> StoreResult<Option<Booking>> {
        let mut bookings = self.bookings.write().await;
        Ok(bookings
            .get_mut(&id)
            .filter(|booking| booking.status == from)
            .map(|booking| {
                booking.status = to;
                booking.updated_at = DateTime::now();
                booking.clone()
            }))
    }

    async fn insert_review(&self, review: &Review) -> StoreResult<()> {
        let mut reviews = self.reviews.write().await;
        insert_unique(&mut reviews, review.id, review)
    }

    async fn find_reviews_for_worker(&self, worker_id: ObjectId) -> StoreResult<Vec<Review>> {
        let reviews = self.reviews.read().await;
        let mut matching: Vec<Review> = reviews
            .values()
            .rev()
            .filter(|review| review.worker_id == worker_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }
}
