use mongodb::bson::{doc, oid::ObjectId, DateTime, Document};

use crate::models::{Booking, BookingStatus, WorkerProfile};

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn case_insensitive_literal(pattern: &str) -> Document {
    doc! { "$regex": regex::escape(pattern), "$options": "i" }
}

/// Filter over worker profiles. Every populated field narrows the result.
#[derive(Debug, Clone, Default)]
pub struct WorkerQuery {
    /// Restrict to profiles owned by these users.
    pub owners: Option<Vec<ObjectId>>,
    pub category_pattern: Option<String>,
    pub min_rating: Option<f64>,
    pub availability: Option<bool>,
    /// Inclusive bounds; either the hourly rate or the fixed price may match.
    pub price_range: Option<(f64, f64)>,
}

impl WorkerQuery {
    pub fn to_document(&self) -> Document {
        let mut filter = doc! {};

        if let Some(ref owners) = self.owners {
            filter.insert("user_id", doc! { "$in": owners.clone() });
        }
        if let Some(ref pattern) = self.category_pattern {
            filter.insert("service_category", case_insensitive_literal(pattern));
        }
        if let Some(min_rating) = self.min_rating {
            filter.insert("rating", doc! { "$gte": min_rating });
        }
        if let Some(available) = self.availability {
            filter.insert("availability", available);
        }
        if let Some((min, max)) = self.price_range {
            filter.insert(
                "$or",
                vec![
                    doc! { "hourly_rate": { "$gte": min, "$lte": max } },
                    doc! { "fixed_price": { "$gte": min, "$lte": max } },
                ],
            );
        }

        filter
    }

    pub fn matches(&self, worker: &WorkerProfile) -> bool {
        if let Some(ref owners) = self.owners {
            if !owners.contains(&worker.user_id) {
                return false;
            }
        }
        if let Some(ref pattern) = self.category_pattern {
            if !contains_ignore_case(worker.service_category.as_str(), pattern) {
                return false;
            }
        }
        if let Some(min_rating) = self.min_rating {
            if worker.rating < min_rating {
                return false;
            }
        }
        if let Some(available) = self.availability {
            if worker.availability != available {
                return false;
            }
        }
        if let Some((min, max)) = self.price_range {
            let in_range = |price: Option<f64>| price.is_some_and(|p| p >= min && p <= max);
            if !in_range(worker.hourly_rate) && !in_range(worker.fixed_price) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy)]
pub enum DateFilter {
    /// `from` inclusive, `until` exclusive.
    Within { from: DateTime, until: DateTime },
    Before(DateTime),
}

impl DateFilter {
    fn to_document(self) -> Document {
        match self {
            DateFilter::Within { from, until } => doc! { "$gte": from, "$lt": until },
            DateFilter::Before(limit) => doc! { "$lt": limit },
        }
    }

    fn matches(self, value: DateTime) -> bool {
        match self {
            DateFilter::Within { from, until } => value >= from && value < until,
            DateFilter::Before(limit) => value < limit,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BookingQuery {
    pub customer_id: Option<ObjectId>,
    pub worker_id: Option<ObjectId>,
    pub service_date: Option<DateFilter>,
    pub status: Option<BookingStatus>,
    pub exclude_status: Option<BookingStatus>,
}

impl BookingQuery {
    pub fn for_customer(customer_id: ObjectId) -> Self {
        BookingQuery {
            customer_id: Some(customer_id),
            ..Default::default()
        }
    }

    pub fn for_worker(worker_id: ObjectId) -> Self {
        BookingQuery {
            worker_id: Some(worker_id),
            ..Default::default()
        }
    }

    pub fn with_customer(mut self, customer_id: ObjectId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn within(mut self, from: DateTime, until: DateTime) -> Self {
        self.service_date = Some(DateFilter::Within { from, until });
        self
    }

    pub fn before(mut self, limit: DateTime) -> Self {
        self.service_date = Some(DateFilter::Before(limit));
        self
    }

    pub fn with_status(mut self, status: BookingStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Skip cancelled bookings.
    pub fn active(mut self) -> Self {
        self.exclude_status = Some(BookingStatus::Cancelled);
        self
    }

    pub fn to_document(&self) -> Document {
        let mut filter = doc! {};

        if let Some(customer_id) = self.customer_id {
            filter.insert("customer_id", customer_id);
        }
        if let Some(worker_id) = self.worker_id {
            filter.insert("worker_id", worker_id);
        }
        if let Some(date) = self.service_date {
            filter.insert("service_date", date.to_document());
        }
        match (self.status, self.exclude_status) {
            (Some(status), _) => {
                filter.insert("status", status.as_str());
            }
            (None, Some(excluded)) => {
                filter.insert("status", doc! { "$ne": excluded.as_str() });
            }
            (None, None) => {}
        }

        filter
    }

    pub fn matches(&self, booking: &Booking) -> bool {
        if self.customer_id.is_some_and(|id| id != booking.customer_id) {
            return false;
        }
        if self.worker_id.is_some_and(|id| id != booking.worker_id) {
            return false;
        }
        if self.service_date.is_some_and(|date| !date.matches(booking.service_date)) {
            return false;
        }
        if self.status.is_some_and(|status| status != booking.status) {
            return false;
        }
        if self.exclude_status.is_some_and(|status| status == booking.status) {
            return false;
        }
        true
    }
}
