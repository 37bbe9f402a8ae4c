pub mod auth;
pub mod booking;
pub mod review;
pub mod user;
pub mod worker;
