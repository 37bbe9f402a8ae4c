#[macro_use]
extern crate rocket;

mod config;
mod db;
mod guards;
mod models;
mod routes;
mod services;
mod utils;


use dotenvy::dotenv;
use log::info;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::figment::Figment;
use rocket::http::Header;
use rocket::{Build, Request, Response, Rocket};
use rocket_okapi::openapi_get_routes;
use rocket_okapi::swagger_ui::{SwaggerUIConfig, make_swagger_ui};

use crate::config::Config;
use crate::utils::ApiError;

/* ----------------------------- CORS ----------------------------- */

pub struct CORS;

#[rocket::async_trait]
impl Fairing for CORS {
    fn info(&self) -> Info {
        Info {
            name: "CORS",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        if let Some(origin) = request.headers().get_one("Origin") {
            response.set_header(Header::new("Access-Control-Allow-Origin", origin));
        }

        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, PATCH, DELETE, OPTIONS",
        ));

        response.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "Content-Type, Authorization",
        ));

        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

/* ----------------------------- OPTIONS ----------------------------- */

#[options("/<_..>")]
fn options_handler() {}

/* ----------------------------- ERRORS ----------------------------- */

#[catch(400)]
fn bad_request() -> ApiError {
    ApiError::bad_request("Malformed request")
}

#[catch(401)]
fn unauthorized() -> ApiError {
    ApiError::unauthorized("Unauthorized")
}

#[catch(404)]
fn not_found() -> ApiError {
    ApiError::not_found("Resource not found")
}

#[catch(422)]
fn unprocessable() -> ApiError {
    ApiError::bad_request("Invalid request body")
}

#[catch(500)]
fn internal_error() -> ApiError {
    ApiError::internal_error("Internal server error")
}

/* ----------------------------- SWAGGER ----------------------------- */

fn swagger_config() -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: "/openapi.json".to_string(),
        ..Default::default()
    }
}

/* ----------------------------- LAUNCH ----------------------------- */

pub fn assemble(figment: Figment) -> Rocket<Build> {
    rocket::custom(figment)
        .attach(db::init())
        .attach(services::init())
        .attach(CORS)
        .mount("/", routes![options_handler])
        .mount(
            "/",
            openapi_get_routes![
                // Auth
                routes::auth::register,
                routes::auth::login,
                // User
                routes::user::get_current_user,
                routes::user::update_current_user,
                // Worker
                routes::worker::search_workers,
                routes::worker::get_workers_by_user,
                routes::worker::update_worker,
                routes::worker::get_worker_rating,
                routes::worker::check_worker_availability,
                // Booking
                routes::booking::create_booking,
                routes::booking::get_user_bookings,
                routes::booking::get_worker_bookings,
                routes::booking::update_booking_status,
                routes::booking::get_booking,
                // Review
                routes::review::create_review,
                routes::review::get_worker_reviews,
            ],
        )
        .mount("/api/docs", make_swagger_ui(&swagger_config()))
        .register(
            "/",
            catchers![bad_request, unauthorized, not_found, unprocessable, internal_error],
        )
}

#[launch]
fn rocket() -> Rocket<Build> {
    dotenv().ok();
    env_logger::init();

    info!("🚀 FixMate API starting");
    info!("📚 Swagger UI → /api/docs");

    assemble(Config::figment())
}
