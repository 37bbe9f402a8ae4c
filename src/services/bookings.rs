use chrono::Duration;
use log::{info, warn};
use mongodb::bson::{oid::ObjectId, DateTime};
use std::collections::HashMap;

use crate::config::Policy;
use crate::db::{BookingQuery, StoreHandle};
use crate::models::{
    Booking, BookingDetails, BookingRequest, BookingStatus, User, WorkerChanges, WorkerProfile,
    WorkerWithOwner,
};
use crate::services::{MarketError, MarketResult};
use crate::utils::{day_bounds, start_of_day, today};

pub fn warranty_period() -> Duration {
    Duration::hours(1)
}

/// Owns booking records, the status lifecycle and the availability flag
/// those bookings imply for a worker.
pub struct BookingLedger {
    store: StoreHandle,
    policy: Policy,
}

impl BookingLedger {
    pub fn new(store: StoreHandle, policy: Policy) -> Self {
        BookingLedger { store, policy }
    }

    pub async fn create_booking(
        &self,
        customer_id: ObjectId,
        request: BookingRequest,
    ) -> MarketResult<Booking> {
        let worker = self
            .store
            .find_worker(request.worker_id)
            .await?
            .ok_or_else(|| MarketError::NotFound("Worker not found".to_string()))?;

        if self.store.find_user(customer_id).await?.is_none() {
            return Err(MarketError::NotFound("User not found".to_string()));
        }

        if request.service_date < today() {
            return Err(MarketError::Validation(
                "Booking date must be in the future".to_string(),
            ));
        }

        if self.policy.enforce_single_booking_per_customer {
            let repeat = BookingQuery::for_worker(worker.id)
                .with_customer(customer_id)
                .active();
            if self.store.find_one_booking(&repeat).await?.is_some() {
                return Err(MarketError::Conflict(
                    "You have already booked this worker".to_string(),
                ));
            }
        }

        let (from, until) = day_bounds(request.service_date);
        let same_day = BookingQuery::for_worker(worker.id).within(from, until).active();
        if self.store.find_one_booking(&same_day).await?.is_some() {
            return Err(MarketError::Conflict(
                "Worker is already booked for the selected date".to_string(),
            ));
        }

        let now = DateTime::now();
        let warranty_until =
            DateTime::from_millis(now.timestamp_millis() + warranty_period().num_milliseconds());

        let booking = Booking {
            id: ObjectId::new(),
            customer_id,
            worker_id: worker.id,
            service_date: start_of_day(request.service_date),
            address: request.address,
            service_type: request.service_type,
            status: BookingStatus::Pending,
            description: request.description,
            warranty_until,
            created_at: now,
            updated_at: now,
        };

        self.store.insert_booking(&booking).await?;
        self.set_availability(worker.id, false).await?;

        info!(
            "Booking {} created by {} for worker {} on {}",
            booking.id, customer_id, worker.id, request.service_date
        );
        Ok(booking)
    }

    /// Moves a booking along the lifecycle graph on behalf of `actor_id`.
    pub async fn transition_status(
        &self,
        booking_id: ObjectId,
        actor_id: ObjectId,
        next: BookingStatus,
    ) -> MarketResult<Booking> {
        let booking = self
            .store
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| MarketError::NotFound("Booking not found".to_string()))?;

        let worker = self.store.find_worker(booking.worker_id).await?;

        match next {
            BookingStatus::Accepted | BookingStatus::Rejected => {
                let is_worker_owner = worker.as_ref().is_some_and(|w| w.user_id == actor_id);
                if !is_worker_owner {
                    return Err(MarketError::Forbidden(
                        "Unauthorized: Only the worker can accept or reject bookings".to_string(),
                    ));
                }
            }
            BookingStatus::Cancelled => {
                if booking.customer_id != actor_id {
                    return Err(MarketError::Forbidden(
                        "Unauthorized: Only the user can cancel bookings".to_string(),
                    ));
                }
            }
            BookingStatus::Pending | BookingStatus::Completed => {}
        }

        if !booking.status.can_transition_to(next) {
            return Err(MarketError::InvalidTransition {
                from: booking.status,
                to: next,
            });
        }

        let updated = self
            .store
            .compare_and_set_booking_status(booking.id, booking.status, next)
            .await?;
        let Some(updated) = updated else {
            warn!("Booking {} changed while moving to {}", booking.id, next);
            let current = self
                .store
                .find_booking(booking.id)
                .await?
                .map(|b| b.status)
                .unwrap_or(booking.status);
            return Err(MarketError::InvalidTransition {
                from: current,
                to: next,
            });
        };

        if let Some(available) = self.availability_after(next) {
            match worker {
                Some(ref worker) => self.set_availability(worker.id, available).await?,
                None => warn!("Booking {} references a missing worker", booking.id),
            }
        }

        info!(
            "Booking {} moved {} -> {} by {}",
            updated.id, booking.status, next, actor_id
        );
        if next.is_terminal() {
            info!("Booking {} closed as {}", updated.id, next);
        }
        Ok(updated)
    }

    fn availability_after(&self, next: BookingStatus) -> Option<bool> {
        match next {
            BookingStatus::Accepted => Some(false),
            BookingStatus::Completed | BookingStatus::Cancelled => Some(true),
            BookingStatus::Rejected if self.policy.release_worker_on_reject => Some(true),
            BookingStatus::Rejected | BookingStatus::Pending => None,
        }
    }

    async fn set_availability(&self, worker_id: ObjectId, available: bool) -> MarketResult<()> {
        self.store
            .update_worker(worker_id, &WorkerChanges::availability(available))
            .await?;
        Ok(())
    }

    pub async fn list_for_customer(&self, customer_id: ObjectId) -> MarketResult<Vec<BookingDetails>> {
        let bookings = self
            .store
            .find_bookings(&BookingQuery::for_customer(customer_id))
            .await?;
        self.expand(bookings).await
    }

    pub async fn list_for_worker(&self, worker_id: ObjectId) -> MarketResult<Vec<BookingDetails>> {
        let bookings = self
            .store
            .find_bookings(&BookingQuery::for_worker(worker_id))
            .await?;
        self.expand(bookings).await
    }

    /// Bookings addressed to the worker profile owned by `user_id`.
    pub async fn list_for_worker_owner(&self, user_id: ObjectId) -> MarketResult<Vec<BookingDetails>> {
        let profile = self
            .store
            .find_workers_by_user(user_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| MarketError::NotFound("Worker not found".to_string()))?;
        self.list_for_worker(profile.id).await
    }

    pub async fn get_by_id(&self, booking_id: ObjectId) -> MarketResult<BookingDetails> {
        let booking = self
            .store
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| MarketError::NotFound("Booking not found".to_string()))?;

        let customer = self.store.find_user(booking.customer_id).await?;
        Ok(BookingDetails {
            booking,
            customer,
            worker: None,
        })
    }

    async fn expand(&self, bookings: Vec<Booking>) -> MarketResult<Vec<BookingDetails>> {
        let mut users: HashMap<ObjectId, Option<User>> = HashMap::new();
        let mut workers: HashMap<ObjectId, Option<WorkerProfile>> = HashMap::new();
        let mut details = Vec::with_capacity(bookings.len());

        for booking in bookings {
            if !workers.contains_key(&booking.worker_id) {
                let worker = self.store.find_worker(booking.worker_id).await?;
                workers.insert(booking.worker_id, worker);
            }
            let worker = workers.get(&booking.worker_id).cloned().flatten();

            let mut wanted = vec![booking.customer_id];
            if let Some(ref worker) = worker {
                wanted.push(worker.user_id);
            }
            for id in wanted {
                if !users.contains_key(&id) {
                    let user = self.store.find_user(id).await?;
                    users.insert(id, user);
                }
            }

            let customer = users.get(&booking.customer_id).cloned().flatten();
            let worker = worker.map(|profile| WorkerWithOwner {
                owner: users.get(&profile.user_id).cloned().flatten(),
                profile,
            });

            details.push(BookingDetails {
                booking,
                customer,
                worker,
            });
        }

        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, Store};
    use crate::models::{Role, ServiceCategory};
    use chrono::NaiveDate;
    use std::sync::Arc;

    struct Fixture {
        store: Arc<MemoryStore>,
        ledger: BookingLedger,
        customer: User,
        worker_owner: User,
        worker: WorkerProfile,
    }

    async fn user(store: &MemoryStore, email: &str, role: Role) -> User {
        let user = User {
            id: ObjectId::new(),
            name: email.to_string(),
            email: email.to_string(),
            password: "hash".to_string(),
            role,
            address: Some("Pune".to_string()),
            phone_number: None,
            profile_picture: "/p.png".to_string(),
            is_verified: false,
            worker_profile: None,
            created_at: DateTime::now(),
            updated_at: DateTime::now(),
        };
        store.insert_user(&user).await.unwrap();
        user
    }

    async fn fixture_with(policy: Policy) -> Fixture {
        let store = Arc::new(MemoryStore::default());
        let customer = user(&store, "a@x.io", Role::Customer).await;
        let worker_owner = user(&store, "w@x.io", Role::Worker).await;
        let worker = WorkerProfile {
            id: ObjectId::new(),
            user_id: worker_owner.id,
            address: "Pune".to_string(),
            service_category: ServiceCategory::Plumber,
            hourly_rate: Some(50.0),
            fixed_price: None,
            availability: true,
            rating: 0.0,
            total_reviews: 0,
            certifications: vec![],
            photos: vec![],
            trusted_badge: false,
            created_at: DateTime::now(),
            updated_at: DateTime::now(),
        };
        store.insert_worker(&worker).await.unwrap();

        Fixture {
            ledger: BookingLedger::new(store.clone(), policy),
            store,
            customer,
            worker_owner,
            worker,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with(Policy::default()).await
    }

    fn request(worker_id: ObjectId, service_date: NaiveDate) -> BookingRequest {
        BookingRequest {
            worker_id,
            service_date,
            address: Some("4 Lake Road".to_string()),
            service_type: ServiceCategory::Plumber,
            description: None,
        }
    }

    fn in_days(days: i64) -> NaiveDate {
        today() + Duration::days(days)
    }

    impl Fixture {
        async fn book(&self, days: i64) -> MarketResult<Booking> {
            self.ledger
                .create_booking(self.customer.id, request(self.worker.id, in_days(days)))
                .await
        }

        async fn available(&self) -> bool {
            self.store
                .find_worker(self.worker.id)
                .await
                .unwrap()
                .unwrap()
                .availability
        }

        async fn force_status(&self, booking: &Booking, status: BookingStatus) {
            self.store
                .compare_and_set_booking_status(booking.id, booking.status, status)
                .await
                .unwrap()
                .unwrap();
        }

        /// The account allowed to request `next`.
        fn actor_for(&self, next: BookingStatus) -> ObjectId {
            match next {
                BookingStatus::Cancelled => self.customer.id,
                _ => self.worker_owner.id,
            }
        }
    }

    #[tokio::test]
    async fn new_booking_is_pending_and_blocks_worker() {
        let fx = fixture().await;
        let booking = fx.book(1).await.unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.service_date, start_of_day(in_days(1)));
        assert_eq!(
            booking.warranty_until.timestamp_millis() - booking.created_at.timestamp_millis(),
            3_600_000
        );
        assert!(!fx.available().await);
    }

    #[tokio::test]
    async fn unknown_worker_or_customer_is_not_found() {
        let fx = fixture().await;
        let err = fx
            .ledger
            .create_booking(fx.customer.id, request(ObjectId::new(), in_days(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::NotFound(_)));

        let err = fx
            .ledger
            .create_booking(ObjectId::new(), request(fx.worker.id, in_days(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::NotFound(_)));
    }

    #[tokio::test]
    async fn yesterday_is_rejected_today_is_accepted() {
        let fx = fixture().await;
        assert!(matches!(fx.book(-1).await, Err(MarketError::Validation(_))));
        assert!(fx.book(0).await.is_ok());
    }

    #[tokio::test]
    async fn same_day_is_a_conflict_unless_cancelled() {
        let fx = fixture().await;
        let first = fx.book(2).await.unwrap();
        assert!(matches!(fx.book(2).await, Err(MarketError::Conflict(_))));
        assert!(fx.book(3).await.is_ok());

        fx.force_status(&first, BookingStatus::Cancelled).await;
        assert!(fx.book(2).await.is_ok());
    }

    #[tokio::test]
    async fn repeat_customer_rule_follows_policy() {
        let fx = fixture().await;
        fx.book(1).await.unwrap();
        assert!(fx.book(2).await.is_ok());

        let strict = fixture_with(Policy {
            enforce_single_booking_per_customer: true,
            ..Default::default()
        })
        .await;
        strict.book(1).await.unwrap();
        assert!(matches!(strict.book(2).await, Err(MarketError::Conflict(_))));
    }

    #[tokio::test]
    async fn every_listed_edge_succeeds_with_its_side_effect() {
        let edges = [
            (BookingStatus::Pending, BookingStatus::Accepted, Some(false)),
            (BookingStatus::Pending, BookingStatus::Rejected, None),
            (BookingStatus::Pending, BookingStatus::Cancelled, Some(true)),
            (BookingStatus::Accepted, BookingStatus::Completed, Some(true)),
            (BookingStatus::Accepted, BookingStatus::Cancelled, Some(true)),
        ];

        for (from, to, availability) in edges {
            let fx = fixture().await;
            let booking = fx.book(1).await.unwrap();
            if from != BookingStatus::Pending {
                fx.force_status(&booking, from).await;
            }
            // seed the opposite value so the side effect is observable
            let seeded = availability.map(|a| !a).unwrap_or(true);
            fx.store
                .update_worker(fx.worker.id, &WorkerChanges::availability(seeded))
                .await
                .unwrap();

            let moved = fx
                .ledger
                .transition_status(booking.id, fx.actor_for(to), to)
                .await
                .unwrap();
            assert_eq!(moved.status, to, "{from} -> {to}");

            let stored = fx.store.find_booking(booking.id).await.unwrap().unwrap();
            assert_eq!(stored.status, to);
            assert_eq!(fx.available().await, availability.unwrap_or(seeded), "{from} -> {to}");
        }
    }

    #[tokio::test]
    async fn every_missing_edge_is_an_invalid_transition() {
        for from in BookingStatus::ALL {
            for to in BookingStatus::ALL {
                if from.can_transition_to(to) {
                    continue;
                }
                let fx = fixture().await;
                let booking = fx.book(1).await.unwrap();
                if from != BookingStatus::Pending {
                    fx.force_status(&booking, from).await;
                }

                let err = fx
                    .ledger
                    .transition_status(booking.id, fx.actor_for(to), to)
                    .await
                    .unwrap_err();
                assert!(
                    matches!(err, MarketError::InvalidTransition { .. }),
                    "{from} -> {to}: {err:?}"
                );
            }
        }
    }

    #[tokio::test]
    async fn strangers_cannot_accept_reject_or_cancel() {
        let fx = fixture().await;
        let booking = fx.book(1).await.unwrap();
        let stranger = user(&fx.store, "s@x.io", Role::Worker).await;

        for next in [BookingStatus::Accepted, BookingStatus::Rejected, BookingStatus::Cancelled] {
            let err = fx
                .ledger
                .transition_status(booking.id, stranger.id, next)
                .await
                .unwrap_err();
            assert!(matches!(err, MarketError::Forbidden(_)), "{next}");
        }

        // the customer may not accept and the worker may not cancel
        let err = fx
            .ledger
            .transition_status(booking.id, fx.customer.id, BookingStatus::Accepted)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Forbidden(_)));
        let err = fx
            .ledger
            .transition_status(booking.id, fx.worker_owner.id, BookingStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Forbidden(_)));
    }

    #[tokio::test]
    async fn authorization_is_checked_before_the_table() {
        let fx = fixture().await;
        let booking = fx.book(1).await.unwrap();
        fx.force_status(&booking, BookingStatus::Completed).await;

        let err = fx
            .ledger
            .transition_status(booking.id, ObjectId::new(), BookingStatus::Accepted)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Forbidden(_)));
    }

    #[tokio::test]
    async fn anyone_may_complete() {
        let fx = fixture().await;
        let booking = fx.book(1).await.unwrap();
        fx.force_status(&booking, BookingStatus::Accepted).await;

        let done = fx
            .ledger
            .transition_status(booking.id, ObjectId::new(), BookingStatus::Completed)
            .await
            .unwrap();
        assert_eq!(done.status, BookingStatus::Completed);
    }

    #[tokio::test]
    async fn rejection_release_follows_policy() {
        let fx = fixture().await;
        let booking = fx.book(1).await.unwrap();
        fx.ledger
            .transition_status(booking.id, fx.worker_owner.id, BookingStatus::Rejected)
            .await
            .unwrap();
        assert!(!fx.available().await);

        let lenient = fixture_with(Policy {
            release_worker_on_reject: true,
            ..Default::default()
        })
        .await;
        let booking = lenient.book(1).await.unwrap();
        lenient
            .ledger
            .transition_status(booking.id, lenient.worker_owner.id, BookingStatus::Rejected)
            .await
            .unwrap();
        assert!(lenient.available().await);
    }

    #[tokio::test]
    async fn missing_booking_is_not_found() {
        let fx = fixture().await;
        let err = fx
            .ledger
            .transition_status(ObjectId::new(), fx.customer.id, BookingStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::NotFound(_)));
        assert!(matches!(
            fx.ledger.get_by_id(ObjectId::new()).await,
            Err(MarketError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn listings_are_expanded_latest_first() {
        let fx = fixture().await;
        fx.book(1).await.unwrap();
        fx.book(5).await.unwrap();
        fx.book(3).await.unwrap();

        let mine = fx.ledger.list_for_customer(fx.customer.id).await.unwrap();
        let dates: Vec<DateTime> = mine.iter().map(|d| d.booking.service_date).collect();
        assert_eq!(
            dates,
            vec![
                start_of_day(in_days(5)),
                start_of_day(in_days(3)),
                start_of_day(in_days(1))
            ]
        );
        let first = &mine[0];
        assert_eq!(first.customer.as_ref().map(|c| c.id), Some(fx.customer.id));
        let worker = first.worker.as_ref().unwrap();
        assert_eq!(worker.profile.id, fx.worker.id);
        assert_eq!(worker.owner.as_ref().map(|o| o.id), Some(fx.worker_owner.id));

        let theirs = fx.ledger.list_for_worker_owner(fx.worker_owner.id).await.unwrap();
        assert_eq!(theirs.len(), 3);
        assert!(matches!(
            fx.ledger.list_for_worker_owner(fx.customer.id).await,
            Err(MarketError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn single_booking_carries_its_customer() {
        let fx = fixture().await;
        let booking = fx.book(1).await.unwrap();
        let details = fx.ledger.get_by_id(booking.id).await.unwrap();
        assert_eq!(details.booking.id, booking.id);
        assert_eq!(details.customer.map(|c| c.id), Some(fx.customer.id));
        assert!(details.worker.is_none());
    }
}
