use log::info;
use mongodb::bson::{oid::ObjectId, DateTime};

use crate::db::StoreHandle;
use crate::models::{
    RegisterDto, Role, UpdateUserDto, User, UserChanges, WorkerProfile,
    DEFAULT_PROFILE_PICTURE,
};
use crate::services::{MarketError, MarketResult};

/// Accounts and the worker profiles attached to them.
pub struct IdentityService {
    store: StoreHandle,
    bcrypt_cost: u32,
}

impl IdentityService {
    pub fn new(store: StoreHandle, bcrypt_cost: u32) -> Self {
        IdentityService { store, bcrypt_cost }
    }

    fn hash_password(&self, password: &str) -> MarketResult<String> {
        Ok(bcrypt::hash(password, self.bcrypt_cost)?)
    }

    /// Creates the account, plus its worker profile when registering as a
    /// worker. The returned account carries the profile back-reference.
    pub async fn register(&self, dto: RegisterDto) -> MarketResult<Registration> {
        if self.store.find_user_by_email(&dto.email).await?.is_some() {
            return Err(MarketError::Validation("Email already exists".to_string()));
        }
        if let Some(ref phone) = dto.phone_number {
            if self.store.find_user_by_phone(phone).await?.is_some() {
                return Err(MarketError::Validation("Phone number already exists".to_string()));
            }
        }

        let worker_details = match (dto.role, dto.worker_details) {
            (Role::Worker, Some(details)) => Some(details),
            (Role::Worker, None) => {
                return Err(MarketError::Validation(
                    "Worker details are required for worker accounts".to_string(),
                ));
            }
            (Role::Customer, _) => None,
        };
        let worker_address = match worker_details {
            Some(ref details) => match details.address.clone().or_else(|| dto.address.clone()) {
                Some(address) => Some(address),
                None => {
                    return Err(MarketError::Validation("Worker address is required".to_string()));
                }
            },
            None => None,
        };

        let now = DateTime::now();
        let mut user = User {
            id: ObjectId::new(),
            name: dto.name,
            email: dto.email,
            password: self.hash_password(&dto.password)?,
            role: dto.role,
            address: dto.address,
            phone_number: dto.phone_number,
            profile_picture: dto
                .profile_picture
                .unwrap_or_else(|| DEFAULT_PROFILE_PICTURE.to_string()),
            is_verified: false,
            worker_profile: None,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_user(&user).await?;

        let (Some(details), Some(address)) = (worker_details, worker_address) else {
            info!("Registered customer {}", user.id);
            return Ok(Registration { user, worker: None });
        };

        let profile = WorkerProfile {
            id: ObjectId::new(),
            user_id: user.id,
            address,
            service_category: details.service_category,
            hourly_rate: details.hourly_rate,
            fixed_price: details.fixed_price,
            availability: true,
            rating: 0.0,
            total_reviews: 0,
            certifications: details.certifications,
            photos: details.photos,
            trusted_badge: false,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_worker(&profile).await?;

        let link = UserChanges {
            worker_profile: Some(profile.id),
            ..Default::default()
        };
        if let Some(updated) = self.store.update_user(user.id, &link).await? {
            user = updated;
        }

        info!("Registered worker {} with profile {}", user.id, profile.id);
        Ok(Registration {
            user,
            worker: Some(profile),
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> MarketResult<User> {
        let user = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or(MarketError::InvalidCredentials)?;

        if !bcrypt::verify(password, &user.password)? {
            return Err(MarketError::InvalidCredentials);
        }

        Ok(user)
    }

    /// The account behind `user_id` with its first worker profile, if any.
    pub async fn current_user(&self, user_id: ObjectId) -> MarketResult<(User, Option<WorkerProfile>)> {
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| MarketError::NotFound("User not found".to_string()))?;

        let profile = match user.worker_profile {
            Some(profile_id) => self.store.find_worker(profile_id).await?,
            None => None,
        };

        Ok((user, profile))
    }

    pub async fn update_user(&self, user_id: ObjectId, dto: UpdateUserDto) -> MarketResult<User> {
        if let Some(ref email) = dto.email {
            if let Some(existing) = self.store.find_user_by_email(email).await? {
                if existing.id != user_id {
                    return Err(MarketError::Validation("Email already exists".to_string()));
                }
            }
        }

        let password = match dto.password {
            Some(ref password) => Some(self.hash_password(password)?),
            None => None,
        };

        let changes = UserChanges {
            name: dto.name,
            email: dto.email,
            address: dto.address,
            password,
            profile_picture: dto.profile_picture,
            worker_profile: None,
        };

        self.store
            .update_user(user_id, &changes)
            .await?
            .ok_or_else(|| MarketError::NotFound("User not found".to_string()))
    }
}

/// A freshly registered account and, for workers, its profile.
#[derive(Debug)]
pub struct Registration {
    pub user: User,
    pub worker: Option<WorkerProfile>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{ServiceCategory, WorkerDetailsDto};
    use std::sync::Arc;

    fn service() -> IdentityService {
        IdentityService::new(Arc::new(MemoryStore::default()), 4)
    }

    fn customer(email: &str) -> RegisterDto {
        RegisterDto {
            name: "Asha".to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
            role: Role::Customer,
            address: Some("4 Lake Road, Pune".to_string()),
            phone_number: None,
            profile_picture: None,
            worker_details: None,
        }
    }

    fn plumber(email: &str) -> RegisterDto {
        RegisterDto {
            role: Role::Worker,
            worker_details: Some(WorkerDetailsDto {
                address: None,
                service_category: ServiceCategory::Plumber,
                hourly_rate: Some(50.0),
                fixed_price: None,
                certifications: vec![],
                photos: vec![],
            }),
            ..customer(email)
        }
    }

    #[tokio::test]
    async fn customer_registration_hashes_password() {
        let identity = service();
        let registered = identity.register(customer("a@x.io")).await.unwrap();

        assert!(registered.worker.is_none());
        assert_ne!(registered.user.password, "secret1");
        assert_eq!(registered.user.profile_picture, DEFAULT_PROFILE_PICTURE);
        assert!(bcrypt::verify("secret1", &registered.user.password).unwrap());
    }

    #[tokio::test]
    async fn worker_registration_links_profile() {
        let identity = service();
        let registered = identity.register(plumber("w@x.io")).await.unwrap();

        let profile = registered.worker.unwrap();
        assert_eq!(registered.user.worker_profile, Some(profile.id));
        assert_eq!(profile.user_id, registered.user.id);
        assert_eq!(profile.address, "4 Lake Road, Pune");
        assert!(profile.availability);
        assert_eq!(profile.rating, 0.0);

        let (user, current) = identity.current_user(registered.user.id).await.unwrap();
        assert_eq!(user.id, registered.user.id);
        assert_eq!(current.map(|p| p.id), Some(profile.id));
    }

    #[tokio::test]
    async fn worker_without_details_or_address_is_rejected() {
        let identity = service();

        let mut dto = plumber("w@x.io");
        dto.worker_details = None;
        assert!(matches!(identity.register(dto).await, Err(MarketError::Validation(_))));

        let mut dto = plumber("w@x.io");
        dto.address = None;
        assert!(matches!(identity.register(dto).await, Err(MarketError::Validation(_))));
    }

    #[tokio::test]
    async fn duplicate_email_and_phone_are_rejected() {
        let identity = service();
        let mut first = customer("a@x.io");
        first.phone_number = Some("9876543210".to_string());
        identity.register(first).await.unwrap();

        let err = identity.register(customer("a@x.io")).await.unwrap_err();
        assert_eq!(err.to_string(), "Email already exists");

        let mut second = customer("b@x.io");
        second.phone_number = Some("9876543210".to_string());
        let err = identity.register(second).await.unwrap_err();
        assert_eq!(err.to_string(), "Phone number already exists");
    }

    #[tokio::test]
    async fn login_checks_the_password() {
        let identity = service();
        identity.register(customer("a@x.io")).await.unwrap();

        assert!(identity.login("a@x.io", "secret1").await.is_ok());
        assert!(matches!(
            identity.login("a@x.io", "wrong").await,
            Err(MarketError::InvalidCredentials)
        ));
        assert!(matches!(
            identity.login("nobody@x.io", "secret1").await,
            Err(MarketError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn update_rehashes_and_guards_email() {
        let identity = service();
        let asha = identity.register(customer("a@x.io")).await.unwrap().user;
        identity.register(customer("b@x.io")).await.unwrap();

        let taken = UpdateUserDto {
            email: Some("b@x.io".to_string()),
            ..Default::default()
        };
        assert!(identity.update_user(asha.id, taken).await.is_err());

        let own = UpdateUserDto {
            email: Some("a@x.io".to_string()),
            name: Some("Asha K".to_string()),
            password: Some("newpass".to_string()),
            ..Default::default()
        };
        let updated = identity.update_user(asha.id, own).await.unwrap();
        assert_eq!(updated.name, "Asha K");
        assert!(identity.login("a@x.io", "newpass").await.is_ok());
    }
}
