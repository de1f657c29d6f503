use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use careers_backend::{
    config::{get_config, init_config},
    database::{pool::create_pool, schema},
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    schema::init(&pool).await?;

    let app_state = AppState::new(pool);

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let api = Router::new()
        .route("/api/auth/me", get(routes::auth::me))
        .route(
            "/api/jobs",
            get(routes::jobs::list_jobs).post(routes::jobs::create_job),
        )
        .route(
            "/api/jobs/:id",
            get(routes::jobs::get_job)
                .patch(routes::jobs::update_job)
                .delete(routes::jobs::delete_job),
        )
        .route(
            "/api/applications",
            get(routes::applications::list_applications),
        )
        .route(
            "/api/applications/:id",
            get(routes::applications::get_application),
        )
        .route(
            "/api/applications/:id/status",
            post(routes::applications::update_status),
        )
        .route(
            "/api/applications/:id/withdraw",
            post(routes::applications::withdraw),
        )
        .route(
            "/api/applications/:id/panel",
            get(routes::applications::list_panel).post(routes::applications::add_panelist),
        )
        .route(
            "/api/applications/:id/panel/:user_id",
            axum::routing::delete(routes::applications::remove_panelist),
        )
        .route(
            "/api/users",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route(
            "/api/users/:id",
            get(routes::users::get_user)
                .patch(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        .route("/api/users/:id/profile", get(routes::users::get_user_profile))
        .route("/api/users/import", post(routes::users::import_users))
        .route(
            "/api/user-groups",
            get(routes::user_groups::list_groups).post(routes::user_groups::create_group),
        )
        .route(
            "/api/user-groups/:id",
            get(routes::user_groups::get_group)
                .patch(routes::user_groups::update_group)
                .delete(routes::user_groups::delete_group),
        )
        .route(
            "/api/content/:kind",
            get(routes::content::list_items).post(routes::content::create_item),
        )
        .route(
            "/api/content/:kind/:id",
            get(routes::content::get_item)
                .patch(routes::content::update_item)
                .delete(routes::content::delete_item),
        )
        .route("/api/uploads/:category", post(routes::content::upload_file))
        .route("/api/messages", post(routes::messages::send_message))
        .route("/api/messages/unread", get(routes::messages::unread_count))
        .route("/api/messages/:user_id", get(routes::messages::get_thread))
        .route("/api/notifications", get(routes::notifications::poll))
        .route(
            "/api/notifications/:id/read",
            post(routes::notifications::mark_read),
        )
        .route("/api/offers/generate", post(routes::offers::generate_letter))
        .route(
            "/api/offers/:id/upload",
            post(routes::offers::upload_letter),
        )
        .route("/api/export/applications", get(routes::export::export_applications))
        .route("/api/export/users", get(routes::export::export_users))
        .layer(axum::middleware::from_fn(
            careers_backend::middleware::auth::require_bearer_auth,
        ))
        .layer(axum::middleware::from_fn_with_state(
            careers_backend::middleware::rate_limit::new_rps_state(config.api_rps),
            careers_backend::middleware::rate_limit::rps_middleware,
        ));

    let public_api = Router::new()
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/public/jobs", get(routes::jobs::list_public_jobs))
        .route("/api/public/jobs/:id", get(routes::jobs::get_public_job))
        .route(
            "/api/public/applications",
            post(routes::applications::apply),
        )
        .route(
            "/api/public/applications/upload",
            post(routes::applications::apply_with_resume),
        )
        .route("/api/public/resume/parse", post(routes::resume::parse_resume))
        .route(
            "/api/public/content/:kind",
            get(routes::content::list_public_items),
        )
        .route(
            "/api/public/content/:kind/:id",
            get(routes::content::get_public_item),
        )
        .layer(axum::middleware::from_fn_with_state(
            careers_backend::middleware::rate_limit::new_rps_state(config.public_rps),
            careers_backend::middleware::rate_limit::rps_middleware,
        ));

    info!("Serving uploads from: {}", config.uploads_dir);

    let app = base_routes
        .merge(api)
        .merge(public_api)
        .nest_service(
            "/uploads",
            tower_http::services::ServeDir::new(config.uploads_dir.clone()),
        )
        .with_state(app_state)
        .layer(careers_backend::middleware::cors::permissive_cors())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
