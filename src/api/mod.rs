use crate::{
    auth::{Credentials, TokenKeys},
    lot::SlotStore,
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::Extension,
    http::{HeaderName, HeaderValue, Method, Request},
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};
use tokio::{net::TcpListener, signal, time::interval};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{debug, debug_span, info, Span};
use ulid::Ulid;
use utoipa_swagger_ui::SwaggerUi;

pub mod error;
pub mod handlers;
pub mod middleware;
mod openapi;
pub mod rate_limit;

pub use self::openapi::openapi;
use self::rate_limit::RateLimit;

const RATE_LIMIT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Everything the handlers and middleware share, created once at startup.
#[derive(Clone, Debug)]
pub struct Services {
    pub lot: Arc<SlotStore>,
    pub credentials: Arc<Credentials>,
    pub tokens: Arc<TokenKeys>,
    pub client_limit: Arc<RateLimit>,
    pub user_limit: Arc<RateLimit>,
}

/// Build the application router.
///
/// Lot routes sit behind `require_auth` and the per-user limit. `/login` and the
/// lot routes share the per-client limit; `/health` and the docs are not limited.
#[must_use]
pub fn router(services: &Services) -> Router {
    let protected = Router::new()
        .route("/park", post(handlers::park))
        .route("/slot/:slot_id", get(handlers::slot))
        .route("/slots", get(handlers::slots))
        .route("/unpark", delete(handlers::unpark))
        .route_layer(
            ServiceBuilder::new()
                .layer(from_fn_with_state(
                    services.tokens.clone(),
                    middleware::require_auth,
                ))
                .layer(from_fn_with_state(
                    services.user_limit.clone(),
                    middleware::limit_by_user,
                )),
        );

    Router::new()
        .route("/login", post(handlers::login))
        .merge(protected)
        .route_layer(from_fn_with_state(
            services.client_limit.clone(),
            middleware::limit_by_client,
        ))
        .route("/health", get(handlers::health).options(handlers::health))
        .merge(SwaggerUi::new("/swagger-ui").url("/openapi.json", openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(Extension(services.lot.clone()))
                .layer(Extension(services.credentials.clone()))
                .layer(Extension(services.tokens.clone())),
        )
}

/// Wrap the router with request-id, tracing and CORS layers.
fn app(services: &Services) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_origin(Any);

    router(services).layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(cors),
    )
}

/// Bind `[::]:port` and serve until Ctrl-C or SIGTERM.
/// # Errors
/// Returns an error if the listener cannot be bound or the server fails
pub async fn new(port: u16, services: Services) -> Result<()> {
    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!("Listening on [::]:{}", port);

    serve(listener, services, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves.
/// # Errors
/// Returns an error if the server fails
pub async fn serve<F>(listener: TcpListener, services: Services, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let sweeper = spawn_rate_limit_sweeper(&services);

    let result = axum::serve(
        listener,
        app(&services).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .context("Server error");

    sweeper.abort();
    info!("Gracefully shutdown");

    result
}

fn spawn_rate_limit_sweeper(services: &Services) -> tokio::task::JoinHandle<()> {
    let limits = [services.client_limit.clone(), services.user_limit.clone()];

    tokio::spawn(async move {
        let mut sweep = interval(RATE_LIMIT_SWEEP_INTERVAL);
        loop {
            sweep.tick().await;
            for limit in &limits {
                limit.retain_recent();
                debug!("{} rate limit tracking {} keys", limit.name(), limit.len());
            }
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {err}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

// span
fn make_span(request: &Request<Body>) -> Span {
    let headers = request.headers();
    let path = request.uri().path();
    let method = request.method().as_str();
    let request_id = headers
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");

    debug_span!("http-request", method, path, request_id)
}

#[cfg(test)]
mod tests;
