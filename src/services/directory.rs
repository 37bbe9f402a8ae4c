use chrono::NaiveDate;
use log::{debug, info};
use mongodb::bson::{oid::ObjectId, DateTime};
use std::collections::HashMap;

use crate::db::{BookingQuery, StoreHandle, WorkerQuery};
use crate::models::{SearchWorkersQuery, User, WorkerChanges, WorkerProfile, WorkerWithOwner};
use crate::services::{MarketError, MarketResult};
use crate::utils::day_bounds;

pub const SEARCH_LIMIT: i64 = 50;
pub const DEFAULT_MIN_PRICE: f64 = 0.0;
pub const DEFAULT_MAX_PRICE: f64 = 9999.0;

/// Search criteria after blank values have been dropped.
#[derive(Debug, Clone, Default)]
pub struct WorkerFilters {
    pub location: Option<String>,
    pub service_category: Option<String>,
    pub min_rating: Option<f64>,
    pub availability: Option<bool>,
    pub price_range: Option<(f64, f64)>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_number(value: Option<String>, name: &str) -> MarketResult<Option<f64>> {
    match non_blank(value) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Some)
            .ok_or_else(|| MarketError::Validation(format!("{} must be a number", name))),
    }
}

fn parse_flag(value: Option<String>, name: &str) -> MarketResult<Option<bool>> {
    match non_blank(value).as_deref() {
        None => Ok(None),
        Some("true") => Ok(Some(true)),
        Some("false") => Ok(Some(false)),
        Some(_) => Err(MarketError::Validation(format!(
            "{} must be true or false",
            name
        ))),
    }
}

impl TryFrom<SearchWorkersQuery> for WorkerFilters {
    type Error = MarketError;

    fn try_from(query: SearchWorkersQuery) -> MarketResult<Self> {
        let min_price = parse_number(query.min_price, "minPrice")?;
        let max_price = parse_number(query.max_price, "maxPrice")?;
        let price_range = match (min_price, max_price) {
            (None, None) => None,
            (min, max) => Some((
                min.unwrap_or(DEFAULT_MIN_PRICE),
                max.unwrap_or(DEFAULT_MAX_PRICE),
            )),
        };

        Ok(WorkerFilters {
            location: non_blank(query.location),
            service_category: non_blank(query.service_category),
            min_rating: parse_number(query.min_rating, "minRating")?,
            availability: parse_flag(query.availability, "availability")?,
            price_range,
        })
    }
}

pub struct WorkerDirectory {
    store: StoreHandle,
}

impl WorkerDirectory {
    pub fn new(store: StoreHandle) -> Self {
        WorkerDirectory { store }
    }

    /// Up to fifty matching profiles with their owners. Any profile that
    /// still has an active booking dated in the past is released first.
    pub async fn search(&self, filters: WorkerFilters) -> MarketResult<Vec<WorkerWithOwner>> {
        let owners = match filters.location {
            Some(ref location) => Some(self.store.find_user_ids_by_address(location).await?),
            None => None,
        };

        let query = WorkerQuery {
            owners,
            category_pattern: filters.service_category,
            min_rating: filters.min_rating,
            availability: filters.availability,
            price_range: filters.price_range,
        };

        let workers = self.store.search_workers(&query, SEARCH_LIMIT).await?;
        debug!("Worker search matched {} profiles", workers.len());

        let mut owners: HashMap<ObjectId, Option<User>> = HashMap::new();
        let mut results = Vec::with_capacity(workers.len());

        for worker in workers {
            let worker = self.release_if_expired(worker).await?;

            let owner = match owners.get(&worker.user_id) {
                Some(owner) => owner.clone(),
                None => {
                    let owner = self.store.find_user(worker.user_id).await?;
                    owners.insert(worker.user_id, owner.clone());
                    owner
                }
            };

            results.push(WorkerWithOwner {
                profile: worker,
                owner,
            });
        }

        Ok(results)
    }

    async fn release_if_expired(&self, mut worker: WorkerProfile) -> MarketResult<WorkerProfile> {
        let expired = BookingQuery::for_worker(worker.id)
            .before(DateTime::now())
            .active();

        if self.store.find_one_booking(&expired).await?.is_none() {
            return Ok(worker);
        }

        if let Some(updated) = self
            .store
            .update_worker(worker.id, &WorkerChanges::availability(true))
            .await?
        {
            if !worker.availability {
                info!("Released worker {} after a past booking", worker.id);
            }
            worker = updated;
        }

        Ok(worker)
    }

    /// Profiles owned by `user_id`, each with the owner attached.
    pub async fn find_by_owner(&self, user_id: ObjectId) -> MarketResult<Vec<WorkerWithOwner>> {
        let profiles = self.store.find_workers_by_user(user_id).await?;
        if profiles.is_empty() {
            return Ok(Vec::new());
        }

        let owner = self.store.find_user(user_id).await?;
        Ok(profiles
            .into_iter()
            .map(|profile| WorkerWithOwner {
                profile,
                owner: owner.clone(),
            })
            .collect())
    }

    pub async fn update_profile(
        &self,
        user_id: ObjectId,
        actor_id: ObjectId,
        changes: WorkerChanges,
    ) -> MarketResult<WorkerWithOwner> {
        if actor_id != user_id {
            return Err(MarketError::Forbidden("Unauthorized".to_string()));
        }

        let profile = self
            .store
            .find_workers_by_user(user_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| MarketError::NotFound("Worker not found".to_string()))?;

        let updated = self
            .store
            .update_worker(profile.id, &changes)
            .await?
            .ok_or_else(|| MarketError::NotFound("Worker not found".to_string()))?;

        info!("Worker profile {} updated by its owner", updated.id);
        Ok(WorkerWithOwner {
            owner: self.store.find_user(user_id).await?,
            profile: updated,
        })
    }

    pub async fn rating(&self, worker_id: ObjectId) -> MarketResult<f64> {
        self.store
            .find_worker(worker_id)
            .await?
            .map(|worker| worker.rating)
            .ok_or_else(|| MarketError::NotFound("Worker not found".to_string()))
    }

    /// True when the worker holds no booking at all on `day`, whatever its status.
    pub async fn is_free_on(&self, worker_id: ObjectId, day: NaiveDate) -> MarketResult<bool> {
        if self.store.find_worker(worker_id).await?.is_none() {
            return Err(MarketError::NotFound("Worker not found".to_string()));
        }

        let (from, until) = day_bounds(day);
        let query = BookingQuery::for_worker(worker_id).within(from, until);
        Ok(self.store.find_one_booking(&query).await?.is_none())
    }
}
