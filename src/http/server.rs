//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, CORS, panic recovery)
//! - Bind the configured listen address and serve until stopped

use std::any::Any;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderValue, Method, Response, StatusCode},
    response::{IntoResponse, Redirect},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{self, AllowHeaders, AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::validation::split_host_port;
use crate::config::{Config, CorsConfig};
use crate::lifecycle::{Service, ServiceError};

const TEAPOT: &str = "I refuse to brew coffee because I am, permanently, a teapot.";
const SERVER_ERROR: &str = "a server error was encountered";

#[derive(Debug, Serialize)]
struct Message {
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct Errors {
    errors: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
}

struct Running {
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<io::Result<()>>,
}

/// The apid HTTP API, served for one immutable [`Config`].
pub struct HttpService {
    config: Arc<Config>,
    running: Option<Running>,
}

impl HttpService {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            running: None,
        }
    }

    /// [`ServiceFactory`](crate::lifecycle::ServiceFactory) entry point.
    pub fn factory(config: Arc<Config>) -> Result<Box<dyn Service>, ServiceError> {
        Ok(Box::new(Self::new(config)))
    }

    /// Address actually bound, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|running| running.local_addr)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[async_trait]
impl Service for HttpService {
    async fn start(&mut self) -> Result<(), ServiceError> {
        if self.running.is_some() {
            return Err(ServiceError::AlreadyRunning);
        }

        let address = bind_address(&self.config.http.listen_address);
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| ServiceError::Bind {
                address: address.clone(),
                source,
            })?;
        let local_addr = listener.local_addr().map_err(ServiceError::Serve)?;

        let app = router(&self.config);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        tracing::info!(address = %local_addr, "HTTP server listening");
        self.running = Some(Running {
            local_addr,
            shutdown_tx: Some(shutdown_tx),
            handle,
        });
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), ServiceError> {
        let Some(running) = self.running.as_mut() else {
            return Ok(());
        };
        if let Some(tx) = running.shutdown_tx.take() {
            let _ = tx.send(());
        }

        // The handle stays in `self` while draining so a caller that gives up
        // waiting still aborts the task on drop.
        let result = (&mut running.handle).await;
        self.running = None;
        result?.map_err(ServiceError::Serve)?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

impl Drop for HttpService {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.handle.abort();
        }
    }
}

/// Build the Axum router with all middleware layers.
pub fn router(config: &Config) -> Router {
    let routes = Router::new()
        .route("/", get(root))
        .route("/v2", get(root_v2))
        .route("/v2/ping", get(ping))
        .route("/v2/healthcheck", get(healthcheck))
        .route("/v2/brew", get(brew));
    with_layers(routes, &config.http.cors)
}

fn with_layers(routes: Router, settings: &CorsConfig) -> Router {
    routes
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors_layer(settings))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// A wildcard entry allows any origin without credentials; an explicit list
/// allows credentials for exactly those origins.
fn cors_layer(settings: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ]);

    if settings.allowed_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(cors::Any).allow_headers(cors::Any);
    }

    let origins: Vec<HeaderValue> = settings
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring CORS origin that is not a valid header value");
                None
            }
        })
        .collect();

    layer
        .allow_origin(AllowOrigin::list(origins))
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// An empty host means every interface.
fn bind_address(listen_address: &str) -> String {
    match split_host_port(listen_address) {
        Some(("", port)) => format!("0.0.0.0:{port}"),
        _ => listen_address.to_string(),
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    tracing::error!(panic = %detail, "Recovered from panic in request handler");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: SERVER_ERROR,
        }),
    )
        .into_response()
}

async fn root() -> Redirect {
    Redirect::temporary("docs/index.html")
}

async fn root_v2() -> Json<Message> {
    Json(Message { message: "Root V2" })
}

async fn ping() -> Json<Message> {
    Json(Message { message: "Pong!" })
}

async fn healthcheck() -> Json<Errors> {
    Json(Errors { errors: Vec::new() })
}

async fn brew() -> impl IntoResponse {
    (StatusCode::IM_A_TEAPOT, Json(ErrorBody { error: TEAPOT }))
}
