pub mod user;
pub mod worker;
pub mod booking;
pub mod review;

pub use user::*;
pub use worker::*;
pub use booking::*;
pub use review::*;
