//! Error types for the pricing service

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Malformed input found while planning or pricing an itinerary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CostError {
    #[error("Trip ends ({end}) before it starts ({start})")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("A trip needs at least one adult")]
    NoAdults,

    #[error("Too many travelers: {adults} adults and {children} children")]
    TooManyTravelers { adults: u32, children: u32 },

    #[error("Trip of {days} days exceeds the maximum of {max}")]
    TripTooLong { days: i64, max: i64 },

    #[error("{component} '{id}' is scheduled on {date}, outside the trip dates")]
    OutsideTrip {
        component: &'static str,
        id: String,
        date: NaiveDate,
    },

    #[error("Duplicate {component} id '{id}'")]
    DuplicateId { component: &'static str, id: String },

    #[error("{component} '{id}' has an invalid price {amount}")]
    InvalidPrice {
        component: &'static str,
        id: String,
        amount: f64,
    },

    #[error("activity '{id}' lasts {minutes} minutes, longer than the trip")]
    InvalidDuration { id: String, minutes: u32 },

    #[error("Amount {0} is too large to price")]
    AmountOutOfRange(f64),

    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("Cost engine error: {0}")]
    Engine(String),
}

#[derive(Error, Debug)]
pub enum PricingError {
    #[error("Failed to calculate pricing")]
    CalculationFailed(#[source] CostError),

    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("Stale pricing request: token {token} was superseded by {latest}")]
    StaleRequest { token: u64, latest: u64 },

    #[error("Planning session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("No pricing has been calculated for this session yet")]
    NoPricing,
}

pub type Result<T> = std::result::Result<T, PricingError>;

impl ResponseError for PricingError {
    fn status_code(&self) -> StatusCode {
        match self {
            PricingError::CalculationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PricingError::UnsupportedCurrency(_) => StatusCode::BAD_REQUEST,
            PricingError::StaleRequest { .. } => StatusCode::CONFLICT,
            PricingError::SessionNotFound(_) | PricingError::NoPricing => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}
