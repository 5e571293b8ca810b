use axum::{
    extract::FromRef,
    routing::{get, post, put},
    Router,
};
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

pub mod client;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;


#[derive(Clone, FromRef)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt_secret: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::me,
        handlers::tasks::list_tasks,
        handlers::tasks::create_task,
        handlers::tasks::get_task,
        handlers::tasks::update_task,
        handlers::tasks::delete_task,
        handlers::tasks::bulk_delete,
        handlers::tasks::bulk_status
    ),
    components(
        schemas(
            models::User,
            models::RegisterUser,
            models::LoginRequest,
            models::AuthResponse,
            models::Task,
            models::TaskStatus,
            models::TaskPriority,
            models::CreateTask,
            models::UpdateTask,
            models::BulkDeleteRequest,
            models::BulkStatusRequest,
            models::TaskStats,
            models::TaskPage,
            models::SortField,
            models::SortOrder
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "tasks", description = "Task management endpoints")
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public routes
        .route("/", get(|| async { "TaskFlow API is running!" }))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        // Protected routes
        .route("/api/auth/me", get(handlers::auth::me))
        .route(
            "/api/tasks",
            get(handlers::tasks::list_tasks).post(handlers::tasks::create_task),
        )
        .route("/api/tasks/bulk-delete", post(handlers::tasks::bulk_delete))
        .route("/api/tasks/bulk-status", put(handlers::tasks::bulk_status))
        .route(
            "/api/tasks/:id",
            get(handlers::tasks::get_task)
                .put(handlers::tasks::update_task)
                .delete(handlers::tasks::delete_task),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
