use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use trip_pricing_api::config::PricingConfig;
use trip_pricing_api::routes;
use trip_pricing_api::services::cost_engine::StandardCostEngine;
use trip_pricing_api::services::currency_service::CurrencyTable;
use trip_pricing_api::services::session_service::SessionStore;

pub struct TestApp {
    pub store: web::Data<SessionStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(PricingConfig::default())
    }

    /// Only selected activities, stays and transport cost money.
    pub fn selections_only() -> Self {
        Self::with_config(PricingConfig {
            placeholder_nightly_rate: 0.0,
            meal_rate: 0.0,
            service_fee_rate: 0.0,
            service_fee_minimum: 0.0,
            ..Default::default()
        })
    }

    pub fn with_config(config: PricingConfig) -> Self {
        let currencies = Arc::new(CurrencyTable::new(
            &config.base_currency,
            config.strict_currencies,
        ));
        let engine = Arc::new(StandardCostEngine::new(currencies.clone(), config.clone()));
        let store = SessionStore::new(currencies, engine, config, Duration::from_secs(3600));

        Self {
            store: web::Data::new(store),
        }
    }

    pub fn create_app(&self) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(self.store.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(routes::configure)
    }
}

pub fn trip_json(start: &str, end: &str, adults: u32) -> Value {
    json!({
        "start_date": start,
        "end_date": end,
        "adults": adults,
        "children": 0,
        "infants": 0
    })
}

pub fn activity_json(id: &str, name: &str, amount: f64, currency: &str, date: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "price_per_person": { "amount": amount, "currency": currency },
        "date": date
    })
}

pub fn timed_activity_json(id: &str, date: &str, start: &str, minutes: u32) -> Value {
    json!({
        "id": id,
        "name": format!("Activity {}", id),
        "price_per_person": { "amount": 10.0, "currency": "USD" },
        "date": date,
        "start_time": start,
        "duration_minutes": minutes
    })
}
