use actix_cors::Cors;
use actix_web::{http::header, middleware::{DefaultHeaders, Logger}, web, App, HttpServer};
use bloodlink_backend::{
    config::Config,
    routes,
    services::identity::{IdentityVerifier, JwtIdentityVerifier},
    services::payments::{PaymentGateway, StripePaymentGateway},
};
use clap::Parser;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use redb::Database;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "bloodlink_server", author, version, about = "Starts the BloodLink API server.")]
struct Cli {
    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

fn build_cors(allowed_origins: &str) -> Cors {
    let base = if allowed_origins.trim() == "*" {
        Cors::default().allow_any_origin()
    } else {
        allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };
    base.allowed_methods(vec!["GET", "POST", "PATCH", "DELETE"])
        .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env(&cli.env_file)
        .expect("FATAL: Failed to load or parse configuration.");

    env_logger::init_from_env(env_logger::Env::new().default_filter_or(&config.log_level));

    let users_db_path = config.users_db_path();
    if !users_db_path.exists() {
        panic!(
            "FATAL: users.db not found at '{}'. Run 'setup_cli --env-file <path> db setup'",
            users_db_path.display()
        );
    }
    let manager = SqliteConnectionManager::file(&users_db_path)
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;"));
    let pool = Pool::builder()
        .build(manager)
        .expect("FATAL: Failed to create Rusqlite connection pool.");

    let records_db = web::Data::new(
        Database::open(config.records_db_path())
            .expect("FATAL: records.db not found. Run 'setup_cli --env-file <path> db setup'"),
    );

    let identity_verifier: Arc<dyn IdentityVerifier> = Arc::new(JwtIdentityVerifier::from_config(&config));
    let payment_gateway: Arc<dyn PaymentGateway> = Arc::new(StripePaymentGateway::from_config(&config));
    let identity_verifier = web::Data::from(identity_verifier);
    let payment_gateway = web::Data::from(payment_gateway);
    let pool = web::Data::new(pool);
    let config_data = web::Data::new(config.clone());

    let server_address = format!("{}:{}", config.web.host, config.web.port);
    log::info!("Server starting at http://{}", server_address);

    HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&config.allowed_origins))
            .wrap(Logger::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY")),
            )
            .app_data(config_data.clone())
            .app_data(pool.clone())
            .app_data(records_db.clone())
            .app_data(identity_verifier.clone())
            .app_data(payment_gateway.clone())
            .configure(routes::configure)
    })
    .bind(server_address)?
    .run()
    .await
}
