mod handlers;
mod route;

use crate::route::create_router;
use axum::http::{Method, header::CONTENT_TYPE};
use clap::Parser;
use spares::collection::Collection;
use spares::config::{Environment, get_env_config, read_external_config};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

struct AppState {
    collection: Mutex<Collection>,
}

/// Periodically flushes the collection to disk once `autosave_interval_secs`
/// has elapsed, mirroring the CLI study loop's autosave check (`spec.md` §5).
fn spawn_autosave_task(app_state: Arc<AppState>) {
    tokio::spawn(async move {
        loop {
            let autosave_interval_secs = match read_external_config() {
                Ok(config) => config.autosave_interval_secs,
                Err(e) => {
                    println!("Failed to read external config for autosave: {e}");
                    return;
                }
            };
            tokio::time::sleep(Duration::from_secs(autosave_interval_secs)).await;
            let mut collection = app_state.collection.lock().await;
            if collection.autosave_due(chrono::Utc::now(), autosave_interval_secs) {
                if let Err(e) = collection.save().await {
                    println!("Autosave failed: {e}");
                }
            }
        }
    });
}

async fn start_server(args: Args) -> Result<(), String> {
    let env_config = get_env_config(args.environment);
    let collection = Collection::open(&env_config.database_url)
        .await
        .map_err(|e| format!("Failed to open collection: {e}"))?;
    println!("Collection opened at {}", env_config.database_url);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_origin(Any)
        .allow_headers([CONTENT_TYPE]);
    let app_state = Arc::new(AppState {
        collection: Mutex::new(collection),
    });
    spawn_autosave_task(app_state.clone());
    let app = create_router(app_state).layer(cors);
    let listener = TcpListener::bind(&env_config.socket_address)
        .await
        .map_err(|e| format!("Failed to bind {}: {e}", env_config.socket_address))?;
    println!("Starting server at {:?}", env_config.socket_address);
    axum::serve(listener, app.into_make_service())
        .await
        .map_err(|e| e.to_string())?;
    Ok(())
}

/// Spares Web Server
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = Environment::Production)]
    environment: Environment,
}

#[tokio::main(worker_threads = 5)]
async fn main() {
    env_logger::init();

    let args = Args::parse();
    let res = start_server(args).await;
    if let Err(e) = res {
        println!("{}", e);
    }
}
