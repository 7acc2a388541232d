use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::auth::ADMIN_SECRET_HEADER;
use crate::bootstrap::BootState;
use crate::config::{AppConfig, Environment};
use crate::error::ApiError;
use crate::handlers::{self, protected, public};
use crate::middleware::{admin_secret_middleware, rate_limit_middleware, require_ready_middleware};
use crate::state::AppState;

/// Full application router with every global layer applied.
pub fn app(state: Arc<AppState>) -> Router {
    let routes = api_routes(state.clone());

    // Serverless deployments also reach the same routes under a function prefix
    let routes = match state.config.server.base_path.as_deref() {
        Some(prefix) => Router::new().merge(routes.clone()).nest(prefix, routes),
        None => routes,
    };

    let config = &state.config;
    let mut router = routes
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit_middleware))
        .layer(cors_layer(config))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ));

    if config.api.enable_response_compression {
        router = router.layer(CompressionLayer::new());
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/api/admin/login", post(public::login_post))
        .merge(fund_routes(state.clone()))
        // Admin
        .merge(donation_routes(state))
}

fn fund_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/fund", get(public::fund_get))
        .route_layer(middleware::from_fn_with_state(state, require_ready_middleware))
}

fn donation_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // route_layer: last added runs first, so the secret is checked before waiting on storage
    Router::new()
        .route("/api/donations", post(protected::donation_post))
        .route("/api/donations/:id", delete(protected::donation_delete))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_ready_middleware))
        .route_layer(middleware::from_fn_with_state(state, admin_secret_middleware))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = &config.security.cors_origins;

    let allow_origin = if origins.is_empty() && config.environment == Environment::Development {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(ADMIN_SECRET_HEADER),
        ])
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    tracing::error!("Handler panicked: {}", detail);

    let body = ApiError::internal_server_error("An error occurred while processing your request");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body.to_json())).into_response()
}

/// Bind the configured port and serve until ctrl-c or a failed bootstrap.
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let state = AppState::new(config)?;

    let bind_addr = SocketAddr::from(([0, 0, 0, 0], state.config.server.port));
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    run(listener, state).await
}

/// Serve on an already bound listener. Storage bootstrap starts in the
/// background; requests that need storage wait for it.
pub async fn run(listener: TcpListener, state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(
        "Fund tracker listening on http://{} ({})",
        addr,
        state.config.environment.as_str()
    );

    {
        let state = state.clone();
        tokio::spawn(async move {
            // Outcome is published on the bootstrap channel
            let _ = state.bootstrap.run(&state.db, &state.config).await;
        });
    }

    let bootstrap = state.bootstrap.clone();
    let shutdown = async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
            }
            reason = bootstrap.failed() => {
                tracing::error!("Shutting down, storage bootstrap failed: {}", reason);
            }
        }
    };

    axum::serve(
        listener,
        app(state.clone()).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .context("server error")?;

    state.db.close().await;

    if let BootState::Failed(reason) = state.bootstrap.state() {
        anyhow::bail!("storage bootstrap failed: {}", reason);
    }
    Ok(())
}
