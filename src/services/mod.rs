pub mod cost_engine;
pub mod currency_service;
pub mod history_service;
pub mod pricing_service;
pub mod session_service;
pub mod timeline_service;
