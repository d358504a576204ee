use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use futures::future::FutureExt;
use sqlx::postgres::PgPool;
use tokio::sync::mpsc;
use url::Url;
use warp::Filter;

use backend::catalog::{YoutubeCatalog, DEFAULT_YOUTUBE_API_URL};
use backend::config::{get_optional_variable, get_variable, parse_variable_or};
use backend::db::PgDb;
use backend::environment::{Config, Environment};
use backend::routes;
use log::{info, initialize_logger};

const DEFAULT_CATALOG_TIMEOUT_SECONDS: u64 = 10;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let logger = initialize_logger();

    let main_port: u16 = get_variable("BACKEND_PORT")
        .parse()
        .expect("parse BACKEND_PORT as u16");
    let admin_port: u16 = get_variable("BACKEND_ADMIN_PORT")
        .parse()
        .expect("parse BACKEND_ADMIN_PORT as u16");

    info!(logger, "Starting..."; "main_port" => main_port, "admin_port" => admin_port);
    let logger = Arc::new(logger);

    info!(logger, "Creating database pool...");
    let connection_string = get_variable("BACKEND_DB_CONNECTION_STRING");
    let pool = PgPool::connect(&connection_string)
        .await
        .expect("create database pool from BACKEND_DB_CONNECTION_STRING");
    let db = Arc::new(PgDb::new(pool));

    let api_url = get_optional_variable("BACKEND_YOUTUBE_API_URL")
        .unwrap_or_else(|| DEFAULT_YOUTUBE_API_URL.to_owned());
    let catalog = Arc::new(YoutubeCatalog::new(
        Url::parse(&api_url).expect("parse BACKEND_YOUTUBE_API_URL"),
        get_variable("BACKEND_YOUTUBE_API_KEY"),
        Duration::from_secs(parse_variable_or(
            "BACKEND_CATALOG_TIMEOUT_SECONDS",
            DEFAULT_CATALOG_TIMEOUT_SECONDS,
        )),
    )?);

    let config = Config::from_env();
    info!(logger, "Loaded configuration"; "config" => ?config);

    let environment = Environment::new(logger.clone(), db, catalog, config);

    let (termination_sender, mut termination_receiver) = mpsc::channel::<()>(1);

    let terminate: routes::admin::TerminationFunctionWrapper<'static> = Arc::new(move || {
        let termination_sender = termination_sender.clone();

        async move {
            // the receiver only goes away once shutdown has begun
            let _ = termination_sender.send(()).await;
        }
        .boxed()
    });

    let should_terminate = async move {
        termination_receiver.recv().await;
    }
    .shared();

    let ctrlc = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let signal = tokio::signal::ctrl_c();

        async move {
            tokio::select! {
                _ = should_terminate => {},
                _ = signal => {
                    terminate().await;
                }
            }
        }
    };

    let main_server = {
        let should_terminate = should_terminate.clone();

        let routes = routes::make_api_routes(environment);

        let (_, main_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], main_port), async {
                should_terminate.await;
            });

        main_server
    };

    let admin_server = {
        let should_terminate = should_terminate.clone();

        let routes = routes::admin::make_healthz_route()
            .or(routes::admin::make_termination_route(terminate));

        let (_, admin_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], admin_port), async {
                should_terminate.await;
            });

        admin_server
    };

    tokio::join!(ctrlc, main_server, admin_server);

    info!(logger, "Exiting gracefully...");

    Ok(())
}
