use mongodb::bson::{doc, oid::ObjectId, DateTime, Document};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;
use validator::{Validate, ValidationError};

use crate::models::{WorkerDetailsDto, WorkerProfileResponse};
use crate::utils::{to_chrono, validate_phone};

pub const DEFAULT_PROFILE_PICTURE: &str = "/profile-pics/pic1.png";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "user")]
    Customer,
    Worker,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Worker => "worker",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    /// bcrypt hash, never the plain password
    pub password: String,
    pub role: Role,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub profile_picture: String,
    pub is_verified: bool,
    pub worker_profile: Option<ObjectId>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Partial update of a user record. `None` leaves the field untouched.
#[derive(Debug, Default, Clone)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub password: Option<String>,
    pub profile_picture: Option<String>,
    pub worker_profile: Option<ObjectId>,
}

impl UserChanges {
    pub fn to_document(&self) -> Document {
        let mut update_doc = doc! {
            "updated_at": DateTime::now()
        };

        if let Some(ref name) = self.name {
            update_doc.insert("name", name);
        }
        if let Some(ref email) = self.email {
            update_doc.insert("email", email);
        }
        if let Some(ref address) = self.address {
            update_doc.insert("address", address);
        }
        if let Some(ref password) = self.password {
            update_doc.insert("password", password);
        }
        if let Some(ref picture) = self.profile_picture {
            update_doc.insert("profile_picture", picture);
        }
        if let Some(worker_profile) = self.worker_profile {
            update_doc.insert("worker_profile", worker_profile);
        }

        update_doc
    }

    pub fn apply(&self, user: &mut User) {
        if let Some(ref name) = self.name {
            user.name = name.clone();
        }
        if let Some(ref email) = self.email {
            user.email = email.clone();
        }
        if let Some(ref address) = self.address {
            user.address = Some(address.clone());
        }
        if let Some(ref password) = self.password {
            user.password = password.clone();
        }
        if let Some(ref picture) = self.profile_picture {
            user.profile_picture = picture.clone();
        }
        if let Some(worker_profile) = self.worker_profile {
            user.worker_profile = Some(worker_profile);
        }
        user.updated_at = DateTime::now();
    }
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDto {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub role: Role,
    pub address: Option<String>,
    #[validate(custom = "valid_phone_number")]
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
    #[validate]
    pub worker_details: Option<WorkerDetailsDto>,
}

fn valid_phone_number(phone: &str) -> Result<(), ValidationError> {
    if validate_phone(phone) {
        return Ok(());
    }
    let mut error = ValidationError::new("phone_number");
    error.message = Some("Phone number must be 10 to 15 digits".into());
    Err(error)
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LoginDto {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserDto {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub address: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub profile_picture: String,
    pub is_verified: bool,
    pub worker_profile: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id.to_hex(),
            name: user.name,
            email: user.email,
            role: user.role,
            address: user.address,
            phone_number: user.phone_number,
            profile_picture: user.profile_picture,
            is_verified: user.is_verified,
            worker_profile: user.worker_profile.map(|id| id.to_hex()),
            created_at: to_chrono(user.created_at),
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

/// The signed-in account, with the worker profile expanded for workers.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUserResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub worker_details: Option<WorkerProfileResponse>,
}
