pub mod bookings;
pub mod directory;
pub mod error;
pub mod identity;
pub mod jwt;
pub mod reviews;

pub use bookings::BookingLedger;
pub use directory::{WorkerDirectory, WorkerFilters};
pub use error::{MarketError, MarketResult};
pub use identity::IdentityService;
pub use jwt::JwtService;
pub use reviews::ReviewAggregator;

use log::{error, info};
use rocket::fairing::AdHoc;

use crate::config::AppConfig;
use crate::db::StoreHandle;

/// Builds every component on top of the store handle managed by `db::init`.
pub fn init() -> AdHoc {
    AdHoc::try_on_ignite("Services", |rocket| async move {
        let (Some(store), Some(config)) = (
            rocket.state::<StoreHandle>().cloned(),
            rocket.state::<AppConfig>().cloned(),
        ) else {
            error!("✗ Store must be attached before services");
            return Err(rocket);
        };

        info!(
            "✓ Services ready (single booking per customer: {}, release on reject: {}, review gate: {})",
            config.policy.enforce_single_booking_per_customer,
            config.policy.release_worker_on_reject,
            config.policy.require_completed_booking_for_review
        );

        Ok(rocket
            .manage(JwtService::from_config(&config))
            .manage(IdentityService::new(store.clone(), config.bcrypt_cost))
            .manage(WorkerDirectory::new(store.clone()))
            .manage(BookingLedger::new(store.clone(), config.policy.clone()))
            .manage(ReviewAggregator::new(store, config.policy)))
    })
}
