use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use anyhow::Context;
use product_api::application::auth_service::AuthService;
use product_api::application::product_service::ProductService;
use product_api::data::sqlite::{
    SqliteProductRepository, SqliteUserRepository, connect, run_migrations,
};
use product_api::infrastructure::config::AppConfig;
use product_api::infrastructure::logging::init_logging;
use product_api::presentation::auth::{login, register};
use product_api::presentation::handlers::{
    AppState, create_product, delete_product, get_product_by_id, get_products, health_check,
    json_error_handler, not_found, update_product,
};
use product_api::presentation::middleware::{JwtAuthMiddleware, RequestLogMiddleware};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    init_logging();

    // Fail fast: no database URL or signing secret means no server.
    let config = AppConfig::from_env().context("invalid configuration")?;
    info!(host = %config.host, port = config.port, "Configuration loaded");

    let pool = connect(&config.database_url)
        .await
        .context("failed to connect to database")?;
    run_migrations(&pool)
        .await
        .context("failed to run migrations")?;
    info!("Database ready");

    let user_repository = SqliteUserRepository::new(pool.clone());
    let product_repository = SqliteProductRepository::new(pool);

    let auth_service = Arc::new(AuthService::new(
        Arc::new(user_repository),
        config.jwt_secret.clone(),
    ));
    let product_service = ProductService::new(Arc::new(product_repository));

    let state = web::Data::new(AppState {
        auth_service,
        product_service,
    });

    let jwt_secret = config.jwt_secret.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .wrap(Cors::permissive())
            .wrap(RequestLogMiddleware)
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(health_check))
                    .service(
                        web::scope("/auth")
                            .route("/register", web::post().to(register))
                            .route("/login", web::post().to(login)),
                    )
                    .service(
                        web::scope("/products")
                            .wrap(JwtAuthMiddleware::new(jwt_secret.clone()))
                            .route("", web::post().to(create_product))
                            .route("", web::get().to(get_products))
                            .route("/{id}", web::get().to(get_product_by_id))
                            .route("/{id}", web::put().to(update_product))
                            .route("/{id}", web::delete().to(delete_product)),
                    ),
            )
            .default_service(web::route().to(not_found))
    });

    let bind_addr = config.bind_addr();
    info!(host = %bind_addr.0, port = bind_addr.1, "Starting HTTP server");
    let server = server
        .bind(bind_addr)
        .context("failed to bind server address")?;

    server.run().await.context("server terminated abnormally")
}
