use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

use taskmanager::{
    auth::{AuthMiddleware, PasswordHasher, TokenService},
    config::Config,
    routes::{self, health},
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let tokens = match TokenService::from_config(&config.auth) {
        Ok(tokens) => Arc::new(tokens),
        Err(e) => {
            log::error!("cannot start token service: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
        log::error!("failed to run migrations: {}", e);
        std::process::exit(1);
    }

    let hasher = PasswordHasher::new(config.bcrypt_cost);
    lazy_static::initialize(&health::STARTED_AT);

    log::info!("Starting TaskManager server at {}", config.server_url());
    log::debug!("token settings: {:?}", config.auth);

    HttpServer::new(move || {
        let auth = AuthMiddleware::new(tokens.clone());

        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::from(tokens.clone()))
            .app_data(web::Data::new(hasher))
            .wrap(Cors::permissive())
            .wrap(Logger::default())
            .service(health::health)
            .service(web::scope("/api/v1").configure(|cfg| routes::config(cfg, auth)))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
