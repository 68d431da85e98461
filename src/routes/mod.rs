use actix_web::web;

pub mod currency;
pub mod health;
pub mod session;
pub mod timeline;

/// Register every route. Shared by the server and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health_check)).service(
        web::scope("/api")
            .service(
                web::scope("/currencies")
                    .route("", web::get().to(currency::get_currencies))
                    .route("/convert", web::post().to(currency::convert)),
            )
            .route("/timeline/conflicts", web::post().to(timeline::conflicts))
            .service(
                web::scope("/sessions")
                    .route("", web::post().to(session::create))
                    .route("/{id}", web::get().to(session::get_by_id))
                    .route("/{id}", web::delete().to(session::end))
                    .route("/{id}/pricing", web::post().to(session::calculate))
                    .route("/{id}/history", web::get().to(session::get_history))
                    .route("/{id}/history", web::delete().to(session::reset_history))
                    .route("/{id}/comparison", web::get().to(session::get_comparison))
                    .route("/{id}/conflicts", web::get().to(session::get_conflicts)),
            ),
    );
}
