//! Recipe builder: a five-step form wizard over a document store.
//!
//! # Routes
//!
//! | method   | path                          | what                                      |
//! |----------|-------------------------------|-------------------------------------------|
//! | GET      | `/`                           | landing page                              |
//! | GET      | `/read?sort=&order=&search=`  | list, sort, search by name                |
//! | GET/POST | `/create?step=`               | create wizard                             |
//! | GET/POST | `/edit/<id>?step=`            | edit wizard, full replace on completion   |
//! | GET      | `/delete/<id>`                | delete, back to `/read`                   |
//! | POST     | `/webhook`                    | signed deploy hook (`git pull` + `chmod`) |
//!
//!
//!
//! # Wizard
//!
//! - Steps 1-5 each collect one field: base, flavor, nutrition, texture, name
//! - `navigation=next` moves forward and copies the submitted fields into the session
//! - Editing falls back to the stored recipe for fields the session lacks
//! - Anything else moves back without touching the session
//! - Reaching step 6 saves the recipe and clears the session
//!
//!
//!
//! # Storage
//!
//! Redis hash per database, one JSON document per recipe. See [`database`].
//! `STORE_BACKEND=memory` swaps in an in-process map for local runs.
//!
//!
//!
//! # Setup
//!
//! ```sh
//! echo "some long random string" > /run/secrets/SESSION_KEY
//! REDIS_URL=redis://127.0.0.1:6379 RUST_LOG=info cargo run --bin recipes
//! ```
//!
//! Without Docker secrets, `SESSION_KEY` and `WEBHOOK_SECRET` are read from the
//! environment instead.
use axum::{
    Router,
    routing::{get, post},
};
use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod database;
pub mod deploy;
pub mod error;
pub mod extract;
pub mod listing;
pub mod recipe;
pub mod routes;
pub mod session;
pub mod state;
pub mod utils;
pub mod views;
pub mod wizard;

use config::{Config, Environment};
use error::StartupError;
use routes::{
    create_form_handler, create_submit_handler, delete_handler, edit_form_handler,
    edit_submit_handler, home_handler, not_found_handler, read_handler, webhook_handler,
};
use state::State;

pub async fn start_server() -> Result<(), StartupError> {
    init_tracing(Environment::from_env());

    let result = run().await;
    if let Err(e) = &result {
        error!("{e}");
    }

    result
}

async fn run() -> Result<(), StartupError> {
    let config = Config::load()?;

    info!("Initializing state ({:?})...", config.environment);
    let state = State::new(config).await?;

    info!("Starting server...");
    let app = build_router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

pub fn build_router(state: Arc<State>) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/read", get(read_handler))
        .route("/create", get(create_form_handler).post(create_submit_handler))
        .route("/edit/:id", get(edit_form_handler).post(edit_submit_handler))
        .route("/delete/:id", get(delete_handler))
        .route("/webhook", post(webhook_handler))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn init_tracing(environment: Environment) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match environment {
        Environment::Development => fmt().with_env_filter(filter).init(),
        Environment::Production => fmt().json().with_env_filter(filter).init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
