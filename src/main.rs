use axum::{routing::get, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

mod api;
mod auth;
mod config;
mod database;
mod error;
mod geo;
mod handlers;
mod mail;
mod middleware;
mod query;

use database::Db;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campdir=info,tower_http=info".into()),
        )
        .init();

    let config = crate::config::config();
    tracing::info!("Starting Campdir API in {:?} mode", config.environment);

    // Refuse to serve with a blank signing secret outside development
    if crate::is_production!() && config.security.jwt_secret.is_empty() {
        eprintln!("JWT_SECRET must be set in production");
        std::process::exit(1);
    }

    if let Err(e) = Db::init().await {
        eprintln!("Database initialization failed: {}", e);
        std::process::exit(1);
    }

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(config.server.port);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("🚀 Campdir API server listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server");

    Db::close().await;
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Versioned API
        .nest("/api/v1/auth", auth_routes())
        .nest("/api/v1/bootcamps", bootcamp_routes())
        .nest("/api/v1/courses", course_routes())
        .nest("/api/v1/reviews", review_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn auth_routes() -> Router {
    use axum::routing::{post, put};
    use handlers::{auth, users};

    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/me", get(auth::me))
        .route("/updatedetails", put(auth::update_details))
        .route("/updatepassword", put(auth::update_password))
        .route("/forgotpassword", post(auth::forgot_password))
        .route("/resetpassword/:resettoken", put(auth::reset_password))
        // Admin-only user management
        .route("/users", get(users::list).post(users::create))
        .route(
            "/users/:id",
            get(users::show).put(users::update).delete(users::destroy),
        )
}

fn bootcamp_routes() -> Router {
    use axum::routing::put;
    use handlers::{bootcamps, courses, reviews};

    Router::new()
        .route("/", get(bootcamps::list).post(bootcamps::create))
        .route(
            "/:id",
            get(bootcamps::show)
                .put(bootcamps::update)
                .delete(bootcamps::destroy),
        )
        .route("/radius/:zipcode/:distance", get(bootcamps::within_radius))
        .route("/:id/photo", put(bootcamps::upload_photo))
        // Nested resources
        .route(
            "/:id/courses",
            get(courses::list_for_bootcamp).post(courses::create),
        )
        .route(
            "/:id/reviews",
            get(reviews::list_for_bootcamp).post(reviews::create),
        )
}

fn course_routes() -> Router {
    use handlers::courses;

    Router::new().route("/", get(courses::list)).route(
        "/:id",
        get(courses::show).put(courses::update).delete(courses::destroy),
    )
}

fn review_routes() -> Router {
    use handlers::reviews;

    Router::new().route("/", get(reviews::list)).route(
        "/:id",
        get(reviews::show).put(reviews::update).delete(reviews::destroy),
    )
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Campdir API",
            "version": version,
            "description": "Bootcamp directory backend API built with Rust (Axum)",
            "endpoints": {
                "home": "/ (public)",
                "auth": "/api/v1/auth/* (register, login, password flows)",
                "bootcamps": "/api/v1/bootcamps[/:id] (public read, publisher write)",
                "courses": "/api/v1/courses[/:id] (public read, publisher write)",
                "reviews": "/api/v1/reviews[/:id] (public read, user write)",
                "users": "/api/v1/auth/users[/:id] (admin only)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match Db::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("ctrl_c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, closing database pool");
}
