pub mod analysis;
pub mod auth;
pub mod case;
pub mod chat;
pub mod error;
pub mod health;
pub mod openapi;
pub mod settings;

use actix_web::web;

/// Register every route of the service
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::configure)
        .configure(openapi::configure)
        .configure(case::configure)
        .configure(analysis::configure)
        .configure(chat::configure)
        .configure(settings::configure);
}
