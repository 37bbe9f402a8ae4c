use mongodb::bson::{doc, oid::ObjectId, DateTime, Document};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;
use std::fmt;
use validator::Validate;

use crate::models::{User, UserResponse};

/// Fixed service catalog. Stored and sent by display name, e.g. `"Plumber"`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
pub enum ServiceCategory {
    Plumber,
    Electrician,
    Carpenter,
    Painter,
    Cleaner,
    Mechanic,
    Gardener,
    Mason,
    #[serde(rename = "AC Repair")]
    AcRepair,
    #[serde(rename = "Pest Control")]
    PestControl,
}

impl ServiceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Plumber => "Plumber",
            ServiceCategory::Electrician => "Electrician",
            ServiceCategory::Carpenter => "Carpenter",
            ServiceCategory::Painter => "Painter",
            ServiceCategory::Cleaner => "Cleaner",
            ServiceCategory::Mechanic => "Mechanic",
            ServiceCategory::Gardener => "Gardener",
            ServiceCategory::Mason => "Mason",
            ServiceCategory::AcRepair => "AC Repair",
            ServiceCategory::PestControl => "Pest Control",
        }
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WorkerProfile {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: ObjectId,
    pub address: String,
    pub service_category: ServiceCategory,
    pub hourly_rate: Option<f64>,
    pub fixed_price: Option<f64>,
    pub availability: bool,
    /// Mean of all review ratings, 0 without reviews.
    pub rating: f64,
    pub total_reviews: i32,
    pub certifications: Vec<String>,
    pub photos: Vec<String>,
    pub trusted_badge: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// A profile together with the account that owns it.
#[derive(Debug, Clone)]
pub struct WorkerWithOwner {
    pub profile: WorkerProfile,
    pub owner: Option<User>,
}

#[derive(Debug, Default, Clone)]
pub struct WorkerChanges {
    pub address: Option<String>,
    pub service_category: Option<ServiceCategory>,
    pub hourly_rate: Option<f64>,
    pub fixed_price: Option<f64>,
    pub availability: Option<bool>,
}

impl WorkerChanges {
    pub fn availability(available: bool) -> Self {
        WorkerChanges {
            availability: Some(available),
            ..Default::default()
        }
    }

    pub fn to_document(&self) -> Document {
        let mut update_doc = doc! {
            "updated_at": DateTime::now()
        };

        if let Some(ref address) = self.address {
            update_doc.insert("address", address);
        }
        if let Some(category) = self.service_category {
            update_doc.insert("service_category", category.as_str());
        }
        if let Some(rate) = self.hourly_rate {
            update_doc.insert("hourly_rate", rate);
        }
        if let Some(price) = self.fixed_price {
            update_doc.insert("fixed_price", price);
        }
        if let Some(available) = self.availability {
            update_doc.insert("availability", available);
        }

        update_doc
    }

    pub fn apply(&self, worker: &mut WorkerProfile) {
        if let Some(ref address) = self.address {
            worker.address = address.clone();
        }
        if let Some(category) = self.service_category {
            worker.service_category = category;
        }
        if let Some(rate) = self.hourly_rate {
            worker.hourly_rate = Some(rate);
        }
        if let Some(price) = self.fixed_price {
            worker.fixed_price = Some(price);
        }
        if let Some(available) = self.availability {
            worker.availability = available;
        }
        worker.updated_at = DateTime::now();
    }
}

/// Worker-specific part of a registration request.
#[derive(Debug, Clone, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkerDetailsDto {
    pub address: Option<String>,
    pub service_category: ServiceCategory,
    #[validate(range(min = 0.0, message = "Hourly rate cannot be negative"))]
    pub hourly_rate: Option<f64>,
    #[validate(range(min = 0.0, message = "Fixed price cannot be negative"))]
    pub fixed_price: Option<f64>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub photos: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkerDto {
    pub address: Option<String>,
    pub service_category: Option<ServiceCategory>,
    #[validate(range(min = 0.0, message = "Hourly rate cannot be negative"))]
    pub hourly_rate: Option<f64>,
    #[validate(range(min = 0.0, message = "Fixed price cannot be negative"))]
    pub fixed_price: Option<f64>,
    pub availability: Option<bool>,
}

impl From<UpdateWorkerDto> for WorkerChanges {
    fn from(dto: UpdateWorkerDto) -> Self {
        WorkerChanges {
            address: dto.address,
            service_category: dto.service_category,
            hourly_rate: dto.hourly_rate,
            fixed_price: dto.fixed_price,
            availability: dto.availability,
        }
    }
}

/// Raw search parameters. Numbers and flags stay textual so a malformed
/// value is rejected instead of silently dropping the filter.
#[derive(Debug, Default, FromForm, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchWorkersQuery {
    pub location: Option<String>,
    #[field(name = "serviceCategory")]
    pub service_category: Option<String>,
    #[field(name = "minRating")]
    pub min_rating: Option<String>,
    pub availability: Option<String>,
    #[field(name = "minPrice")]
    pub min_price: Option<String>,
    #[field(name = "maxPrice")]
    pub max_price: Option<String>,
}

#[derive(Debug, FromForm, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    #[field(name = "serviceDate")]
    pub service_date: String,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkerProfileResponse {
    pub id: String,
    pub user_id: String,
    pub user: Option<UserResponse>,
    pub address: String,
    pub service_category: ServiceCategory,
    pub hourly_rate: Option<f64>,
    pub fixed_price: Option<f64>,
    pub availability: bool,
    pub rating: f64,
    pub total_reviews: i32,
    pub certifications: Vec<String>,
    pub photos: Vec<String>,
    pub trusted_badge: bool,
}

impl From<WorkerProfile> for WorkerProfileResponse {
    fn from(worker: WorkerProfile) -> Self {
        WorkerProfileResponse {
            id: worker.id.to_hex(),
            user_id: worker.user_id.to_hex(),
            user: None,
            address: worker.address,
            service_category: worker.service_category,
            hourly_rate: worker.hourly_rate,
            fixed_price: worker.fixed_price,
            availability: worker.availability,
            rating: worker.rating,
            total_reviews: worker.total_reviews,
            certifications: worker.certifications,
            photos: worker.photos,
            trusted_badge: worker.trusted_badge,
        }
    }
}

impl From<WorkerWithOwner> for WorkerProfileResponse {
    fn from(listing: WorkerWithOwner) -> Self {
        let mut response = WorkerProfileResponse::from(listing.profile);
        response.user = listing.owner.map(UserResponse::from);
        response
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct RatingResponse {
    pub rating: f64,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct AvailabilityResponse {
    pub available: bool,
}
