use log::debug;
use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::guards::AuthGuard;
use crate::models::{BookingRequest, BookingResponse, CreateBookingDto, UpdateBookingStatusDto};
use crate::services::BookingLedger;
use crate::utils::{parse_object_id, parse_service_date, ApiError};

#[openapi(tag = "Booking")]
#[post("/bookings", data = "<dto>")]
pub async fn create_booking(
    ledger: &State<BookingLedger>,
    auth: AuthGuard,
    dto: Json<CreateBookingDto>,
) -> Result<Created<Json<BookingResponse>>, ApiError> {
    let dto = dto.into_inner();
    let request = BookingRequest {
        worker_id: parse_object_id(&dto.worker_id, "worker")?,
        service_date: parse_service_date(&dto.service_date)
            .ok_or_else(|| ApiError::bad_request("Invalid service date"))?,
        address: dto.address,
        service_type: dto.service_type,
        description: dto.description,
    };

    let booking = ledger.create_booking(auth.user_id, request).await?;
    let location = format!("/bookings/{}", booking.id.to_hex());
    Ok(Created::new(location).body(Json(BookingResponse::from(booking))))
}

#[openapi(tag = "Booking")]
#[get("/bookings/user")]
pub async fn get_user_bookings(
    ledger: &State<BookingLedger>,
    auth: AuthGuard,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let bookings = ledger.list_for_customer(auth.user_id).await?;
    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

#[openapi(tag = "Booking")]
#[get("/bookings/worker")]
pub async fn get_worker_bookings(
    ledger: &State<BookingLedger>,
    auth: AuthGuard,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let bookings = ledger.list_for_worker_owner(auth.user_id).await?;
    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

#[openapi(tag = "Booking")]
#[put("/bookings/<booking_id>", data = "<dto>")]
pub async fn update_booking_status(
    ledger: &State<BookingLedger>,
    auth: AuthGuard,
    booking_id: String,
    dto: Json<UpdateBookingStatusDto>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking_id = parse_object_id(&booking_id, "booking")?;
    debug!(
        "{} {} requests {} on booking {}",
        auth.role.as_str(),
        auth.user_id,
        dto.status,
        booking_id
    );
    let booking = ledger
        .transition_status(booking_id, auth.user_id, dto.status)
        .await?;
    Ok(Json(BookingResponse::from(booking)))
}

#[openapi(tag = "Booking")]
#[get("/bookings/<booking_id>")]
pub async fn get_booking(
    ledger: &State<BookingLedger>,
    _auth: AuthGuard,
    booking_id: String,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking_id = parse_object_id(&booking_id, "booking")?;
    let details = ledger.get_by_id(booking_id).await?;
    Ok(Json(BookingResponse::from(details)))
}
