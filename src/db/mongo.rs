use mongodb::bson::{doc, oid::ObjectId, DateTime};
use mongodb::options::{FindOneAndUpdateOptions, FindOneOptions, FindOptions, IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};
use rocket::futures::TryStreamExt;

use super::{BookingQuery, Store, StoreResult, WorkerQuery};
use crate::models::{Booking, BookingStatus, Review, User, UserChanges, WorkerChanges, WorkerProfile};

pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database_name: &str) -> StoreResult<Self> {
        let client = Client::with_uri_str(uri).await?;

        // Test connection
        client
            .database("admin")
            .run_command(doc! {"ping": 1}, None)
            .await?;

        let store = MongoStore {
            db: client.database(database_name),
        };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> StoreResult<()> {
        self.users()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
                None,
            )
            .await?;
        self.worker_profiles()
            .create_index(IndexModel::builder().keys(doc! { "user_id": 1 }).build(), None)
            .await?;
        self.bookings()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "worker_id": 1, "service_date": -1 })
                    .build(),
                None,
            )
            .await?;
        self.reviews()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "worker_id": 1, "created_at": -1 })
                    .build(),
                None,
            )
            .await?;
        Ok(())
    }

    fn users(&self) -> Collection<User> {
        self.db.collection::<User>("users")
    }

    fn worker_profiles(&self) -> Collection<WorkerProfile> {
        self.db.collection::<WorkerProfile>("worker_profiles")
    }

    fn bookings(&self) -> Collection<Booking> {
        self.db.collection::<Booking>("bookings")
    }

    fn reviews(&self) -> Collection<Review> {
        self.db.collection::<Review>("reviews")
    }

    fn return_updated() -> FindOneAndUpdateOptions {
        FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build()
    }
}

#[rocket::async_trait]
impl Store for MongoStore {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        self.users().insert_one(user, None).await?;
        Ok(())
    }

    async fn find_user(&self, id: ObjectId) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "email": email }, None).await?)
    }

    async fn find_user_by_phone(&self, phone: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users()
            .find_one(doc! { "phone_number": phone }, None)
            .await?)
    }

    async fn find_user_ids_by_address(&self, pattern: &str) -> StoreResult<Vec<ObjectId>> {
        let users: Vec<User> = self
            .users()
            .find(
                doc! { "address": { "$regex": regex::escape(pattern), "$options": "i" } },
                None,
            )
            .await?
            .try_collect()
            .await?;

        Ok(users.into_iter().map(|user| user.id).collect())
    }

    async fn update_user(&self, id: ObjectId, changes: &UserChanges) -> StoreResult<Option<User>> {
        Ok(self
            .users()
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": changes.to_document() },
                Self::return_updated(),
            )
            .await?)
    }

    async fn insert_worker(&self, worker: &WorkerProfile) -> StoreResult<()> {
        self.worker_profiles().insert_one(worker, None).await?;
        Ok(())
    }

    async fn find_worker(&self, id: ObjectId) -> StoreResult<Option<WorkerProfile>> {
        Ok(self
            .worker_profiles()
            .find_one(doc! { "_id": id }, None)
            .await?)
    }

    async fn find_workers_by_user(&self, user_id: ObjectId) -> StoreResult<Vec<WorkerProfile>> {
        Ok(self
            .worker_profiles()
            .find(doc! { "user_id": user_id }, None)
            .await?
            .try_collect()
            .await?)
    }

    async fn search_workers(&self, query: &WorkerQuery, limit: i64) -> StoreResult<Vec<WorkerProfile>> {
        let find_options = FindOptions::builder().limit(limit).build();

        Ok(self
            .worker_profiles()
            .find(query.to_document(), find_options)
            .await?
            .try_collect()
            .await?)
    }

    async fn update_worker(
        &self,
        id: ObjectId,
        changes: &WorkerChanges,
    ) -> StoreResult<Option<WorkerProfile>> {
        Ok(self
            .worker_profiles()
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": changes.to_document() },
                Self::return_updated(),
            )
            .await?)
    }

    async fn set_worker_rating(&self, id: ObjectId, rating: f64, total_reviews: i32) -> StoreResult<()> {
        self.worker_profiles()
            .update_one(
                doc! { "_id": id },
                doc! {
                    "$set": {
                        "rating": rating,
                        "total_reviews": total_reviews,
                        "updated_at": DateTime::now()
                    }
                },
                None,
            )
            .await?;
        Ok(())
    }

    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()> {
        self.bookings().insert_one(booking, None).await?;
        Ok(())
    }

    async fn find_booking(&self, id: ObjectId) -> StoreResult<Option<Booking>> {
        Ok(self.bookings().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_one_booking(&self, query: &BookingQuery) -> StoreResult<Option<Booking>> {
        let options = FindOneOptions::builder()
            .sort(doc! { "service_date": -1 })
            .build();

        Ok(self.bookings().find_one(query.to_document(), options).await?)
    }

    async fn find_bookings(&self, query: &BookingQuery) -> StoreResult<Vec<Booking>> {
        let find_options = FindOptions::builder()
            .sort(doc! { "service_date": -1 })
            .build();

        Ok(self
            .bookings()
            .find(query.to_document(), find_options)
            .await?
            .try_collect()
            .await?)
    }

    async fn compare_and_set_booking_status(
        &self,
        id: ObjectId,
        from: BookingStatus,
        to: BookingStatus,
    ) -> StoreResult<Option<Booking>> {
        Ok(self
            .bookings()
            .find_one_and_update(
                doc! { "_id": id, "status": from.as_str() },
                doc! {
                    "$set": {
                        "status": to.as_str(),
                        "updated_at": DateTime::now()
                    }
                },
                Self::return_updated(),
            )
            .await?)
    }

    async fn insert_review(&self, review: &Review) -> StoreResult<()> {
        self.reviews().insert_one(review, None).await?;
        Ok(())
    }

    async fn find_reviews_for_worker(&self, worker_id: ObjectId) -> StoreResult<Vec<Review>> {
        let find_options = FindOptions::builder()
            .sort(doc! { "created_at": -1, "_id": -1 })
            .build();

        Ok(self
            .reviews()
            .find(doc! { "worker_id": worker_id }, find_options)
            .await?
            .try_collect()
            .await?)
    }
}
