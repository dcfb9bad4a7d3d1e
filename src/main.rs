//src/main.rs

use anyhow::Context;
use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let app_state = AppState::new(&config).await?;

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let work_order_routes = Router::new()
        .route(
            "/",
            post(handlers::work_orders::create_work_order).get(handlers::work_orders::list_work_orders),
        )
        .route("/board", get(handlers::work_orders::get_board))
        .route(
            "/{id}",
            get(handlers::work_orders::get_work_order).patch(handlers::work_orders::update_work_order),
        )
        .route("/{id}/assign-master", post(handlers::work_orders::assign_master))
        .route("/{id}/assign-executor", post(handlers::work_orders::assign_executor))
        .route("/{id}/start", post(handlers::work_orders::start_work))
        .route("/{id}/submit-review", post(handlers::work_orders::submit_review))
        .route("/{id}/approve", post(handlers::work_orders::approve))
        .route("/{id}/request-revision", post(handlers::work_orders::request_revision))
        .route("/{id}/complete", post(handlers::work_orders::complete));

    let assignment_routes = Router::new()
        .route("/{id}/status", patch(handlers::assignments::update_task_status))
        .route("/{id}/payments", post(handlers::assignments::record_payment));

    let payroll_routes = Router::new()
        .route("/executors/{id}", get(handlers::assignments::executor_payroll));

    // Tudo que mexe em OS exige Bearer válido
    let protected = Router::new()
        .nest("/work-orders", work_order_routes)
        .nest("/assignments", assignment_routes)
        .nest("/payroll", payroll_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/permissions", get(handlers::rbac::list_permissions))
        .nest("/api", protected)
        .with_state(app_state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", config.bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Erro no servidor Axum")?;
    Ok(())
}
