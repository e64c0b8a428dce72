use actix_web::{App, test, web};
use product_api::application::auth_service::AuthService;
use product_api::application::product_service::ProductService;
use product_api::data::sqlite::{
    SqliteProductRepository, SqliteUserRepository, run_migrations,
};
use product_api::infrastructure::security::verify_token;
use product_api::presentation::auth::{login, register};
use product_api::presentation::handlers::{AppState, json_error_handler, not_found};
use product_api::presentation::middleware::RequestLogMiddleware;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;

const JWT_SECRET: &str = "test-secret-key-for-auth-tests";

macro_rules! setup_auth_test {
    () => {{
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();

        let auth_service = Arc::new(AuthService::new(
            Arc::new(SqliteUserRepository::new(pool.clone())),
            JWT_SECRET.to_string(),
        ));
        let product_service = ProductService::new(Arc::new(SqliteProductRepository::new(pool)));

        let state = web::Data::new(AppState {
            auth_service,
            product_service,
        });

        test::init_service(
            App::new()
                .app_data(state.clone())
                .app_data(web::JsonConfig::default().error_handler(json_error_handler))
                .wrap(RequestLogMiddleware)
                .service(
                    web::scope("/api").service(
                        web::scope("/auth")
                            .route("/register", web::post().to(register))
                            .route("/login", web::post().to(login)),
                    ),
                )
                .default_service(web::route().to(not_found)),
        )
        .await
    }};
}

#[actix_web::test]
async fn test_full_registration_login_flow() {
    let app = setup_auth_test!();

    // Register user
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(serde_json::json!({
            "email": "flow@example.com",
            "password": "password123"
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: serde_json::Value = test::read_body_json(resp).await;
    let user_id = body["id"].as_i64().unwrap();
    assert!(user_id > 0);
    assert_eq!(body["email"], "flow@example.com");

    // Login
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(serde_json::json!({
            "email": "flow@example.com",
            "password": "password123"
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: serde_json::Value = test::read_body_json(resp).await;
    let token = body["token"].as_str().unwrap();

    // Decoded claims carry the registered identity
    let claims = verify_token(token, JWT_SECRET).unwrap();
    assert_eq!(claims.sub, user_id);
    assert_eq!(claims.email, "flow@example.com");
}

#[actix_web::test]
async fn test_register_does_not_echo_password() {
    let app = setup_auth_test!();

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(serde_json::json!({
            "email": "private@example.com",
            "password": "password123"
        }))
        .to_request();

    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());
}

#[actix_web::test]
async fn test_register_duplicate_email_conflicts() {
    let app = setup_auth_test!();

    let payload = serde_json::json!({
        "email": "duplicate@example.com",
        "password": "password1"
    });

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    // Second registration with the same email is a store-derived conflict
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["statusCode"], 409);
    assert_eq!(body["message"], "Email already registered");
}

#[actix_web::test]
async fn test_register_rejects_invalid_payload() {
    let app = setup_auth_test!();

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(serde_json::json!({
            "email": "not-an-email",
            "password": "short"
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Validation failed");
    assert!(body["errors"]["email"].is_array());
    assert!(body["errors"]["password"].is_array());
}

#[actix_web::test]
async fn test_login_wrong_password_yields_401_without_token() {
    let app = setup_auth_test!();

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(serde_json::json!({
            "email": "user@example.com",
            "password": "password123"
        }))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(serde_json::json!({
            "email": "user@example.com",
            "password": "wrong-password"
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Invalid credentials");
    assert!(body.get("token").is_none());
}

#[actix_web::test]
async fn test_login_unknown_email_yields_401_without_token() {
    let app = setup_auth_test!();

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(serde_json::json!({
            "email": "ghost@example.com",
            "password": "password123"
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Invalid credentials");
    assert!(body.get("token").is_none());
}
