use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, rt, web, App, HttpServer};
use env_logger::Env;

use trip_pricing_api::config::AppConfig;
use trip_pricing_api::routes;
use trip_pricing_api::services::cost_engine::StandardCostEngine;
use trip_pricing_api::services::currency_service::CurrencyTable;
use trip_pricing_api::services::session_service::SessionStore;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    }

    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::from_env();
    log::info!(
        "Pricing in {} (cache ttl {:?}, strict currencies: {})",
        config.pricing.base_currency,
        config.pricing.cache_ttl,
        config.pricing.strict_currencies
    );

    let currencies = Arc::new(CurrencyTable::new(
        &config.pricing.base_currency,
        config.pricing.strict_currencies,
    ));
    let engine = Arc::new(StandardCostEngine::new(
        currencies.clone(),
        config.pricing.clone(),
    ));
    let store = web::Data::new(SessionStore::new(
        currencies,
        engine,
        config.pricing.clone(),
        config.session_idle_ttl,
    ));

    let sweeper = store.clone();
    let sweep_interval = config.sweep_interval;
    rt::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            sweeper.sweep();
        }
    });

    log::info!("Attempting to bind to {}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .app_data(store.clone())
            .configure(routes::configure)
    })
    .bind((config.host.clone(), config.port))?
    .run()
    .await
}
