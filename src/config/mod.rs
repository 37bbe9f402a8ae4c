use rocket::Config as RocketConfig;
use rocket::figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use std::env;

pub struct Config;

impl Config {
    pub fn figment() -> Figment {
        // Get the current profile
        let profile = env::var("ROCKET_PROFILE").unwrap_or_else(|_| "development".to_string());

        Figment::from(RocketConfig::default())
            .merge(Toml::file("Rocket.toml").nested())
            .select(&profile)
            .merge(Env::raw().only(&["PORT", "JWT_SECRET"]))
            .merge(Env::raw().only(&["MONGO_URI"]).map(|_| "mongodb_uri".into()))
            .merge(Env::prefixed("ROCKET_").split("__"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Mongodb,
    Memory,
}

/// Switches for the behaviours the booking and review flows leave open.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Reject a booking when the customer already holds an active booking
    /// with the same worker.
    pub enforce_single_booking_per_customer: bool,
    /// Put the worker back on the market when a pending booking is rejected.
    pub release_worker_on_reject: bool,
    /// Only customers with a completed booking may review a worker.
    pub require_completed_booking_for_review: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub mongodb_uri: String,
    pub database_name: String,
    pub jwt_secret: String,
    pub jwt_expiry: i64,
    pub bcrypt_cost: u32,
    pub policy: Policy,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            store: StoreBackend::Mongodb,
            mongodb_uri: "mongodb://localhost:27017/fixmate".to_string(),
            database_name: "fixmate".to_string(),
            jwt_secret: "default-secret".to_string(),
            jwt_expiry: 7 * 24 * 60 * 60,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            policy: Policy::default(),
        }
    }
}

impl AppConfig {
    pub fn from_figment(figment: &Figment) -> Result<Self, rocket::figment::Error> {
        figment.extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let figment = Figment::from(RocketConfig::default()).merge(("store", "memory"));
        let config = AppConfig::from_figment(&figment).unwrap();

        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.jwt_expiry, 604800);
        assert!(!config.policy.enforce_single_booking_per_customer);
        assert!(!config.policy.release_worker_on_reject);
    }

    #[test]
    fn nested_policy_is_read() {
        let figment = Figment::from(RocketConfig::default())
            .merge(("policy.release_worker_on_reject", true))
            .merge(("bcrypt_cost", 4));
        let config = AppConfig::from_figment(&figment).unwrap();

        assert!(config.policy.release_worker_on_reject);
        assert!(!config.policy.require_completed_booking_for_review);
        assert_eq!(config.bcrypt_cost, 4);
    }
}
