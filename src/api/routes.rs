use actix_web::web;

use super::handlers::*;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
    cfg.route("/ws", web::get().to(ws_handler));
}
