//! Tournament engine web server: REST API only.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default.
//! Override with env: HOST, PORT, DEFAULT_MATCH_MINUTES, DEFAULT_BREAK_MINUTES.

use actix_web::{web::Data, App, HttpServer};
use tournament_engine::{api, ServerConfig, TournamentStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ServerConfig::from_env();
    let bind = (config.host.clone(), config.port);
    log::info!(
        "Starting server at http://{}:{} (matches {} min, breaks {} min)",
        bind.0,
        bind.1,
        config.settings.match_duration,
        config.settings.break_duration
    );

    let store = Data::new(TournamentStore::new());
    let config = Data::new(config);

    HttpServer::new(move || {
        App::new()
            .app_data(store.clone())
            .app_data(config.clone())
            .configure(api::configure)
    })
    .bind(bind)?
    .run()
    .await
}
