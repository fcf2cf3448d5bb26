mod api;
mod domain;
mod websocket;

use actix::Actor;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use api::{configure_routes, AppState};
use websocket::ChatServer;

#[actix_web::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting pairchat...");

    // Load configuration
    let server_port = std::env::var("SERVER_PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()?;

    // Start the engine actor: registry, match queue and abuse gate all
    // live behind this one mailbox.
    let chat_server = ChatServer::new().start();
    info!("Chat server actor started");

    let app_state = web::Data::new(AppState { chat_server });

    info!("Starting HTTP server on port {}", server_port);

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(Logger::default())
            .configure(configure_routes)
    })
    .bind(("0.0.0.0", server_port))?
    .run()
    .await?;

    Ok(())
}
