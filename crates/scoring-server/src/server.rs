//! HTTP transport.
//!
//! Serves `POST /method` over HTTP/1.1 with hyper. Each connection runs in
//! its own task and each dispatch in another, so a panicking handler costs
//! one 500 response rather than the connection or the process.
//!
//! Responses always carry a JSON body:
//!
//! ```text
//! {"response": <payload>, "code": 200}
//! {"error": "<message or generic text>", "code": <status>}
//! ```

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use serde_json::{json, Map, Value};
use tokio::net::{TcpListener, TcpStream};

use scoring_core::{ApiError, ApiResult, RequestContext, RequestId};
use scoring_telemetry::metrics::record_request;

use crate::config::ServerSettings;
use crate::dispatch::Dispatcher;
use crate::error::{ServerError, ServerResult};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// The only path served.
pub const METHOD_PATH: &str = "/method";

/// Header carrying the caller's request id, echoed on the response.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Type alias for HTTP response body.
pub type ResponseBody = Full<Bytes>;

/// Type alias for the HTTP response.
pub type HttpResponse = Response<ResponseBody>;

/// The scoring API server.
///
/// # Example
///
/// ```rust,ignore
/// use scoring_server::{Dispatcher, Server, ServerSettings, ShutdownSignal};
///
/// let server = Server::new(dispatcher, ServerSettings::default());
/// let listener = Server::bind("0.0.0.0:8080".parse()?).await?;
/// server.run(listener, ShutdownSignal::with_os_signals()).await;
/// ```
#[derive(Debug)]
pub struct Server {
    dispatcher: Arc<Dispatcher>,
    settings: ServerSettings,
}

impl Server {
    /// Creates a server.
    pub fn new(dispatcher: Dispatcher, settings: ServerSettings) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            settings,
        }
    }

    /// Returns the transport settings.
    pub const fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    /// Binds a listener.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if the address cannot be bound.
    pub async fn bind(addr: std::net::SocketAddr) -> ServerResult<TcpListener> {
        TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })
    }

    /// Serves connections from `listener` until `shutdown` is triggered,
    /// then waits up to the shutdown timeout for open connections.
    pub async fn run(self, listener: TcpListener, shutdown: ShutdownSignal) {
        match listener.local_addr() {
            Ok(addr) => tracing::info!(addr = %addr, "server listening"),
            Err(e) => tracing::warn!(error = %e, "server listening on unknown address"),
        }

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => {
                        let server = Arc::clone(&server);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();

                        tokio::spawn(async move {
                            if let Err(e) = server.serve_connection(stream, shutdown).await {
                                tracing::debug!(remote = %remote_addr, error = %e, "connection closed with error");
                            }
                            drop(token);
                        });
                    }
                    Err(e) => tracing::error!(error = %e, "failed to accept connection"),
                },
                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        let shutdown_timeout = server.settings.shutdown_timeout;
        tracing::info!(
            active = tracker.active_connections(),
            timeout_ms = duration_ms(shutdown_timeout),
            "waiting for open connections"
        );

        if tokio::time::timeout(shutdown_timeout, tracker.wait_idle())
            .await
            .is_err()
        {
            tracing::warn!(
                active = tracker.active_connections(),
                "shutdown timeout reached with connections still open"
            );
        }

        tracing::info!("server stopped");
    }

    async fn serve_connection(
        self: Arc<Self>,
        stream: TcpStream,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(&self);

        let service = service_fn(move |req: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle(req).await) }
        });

        let conn = http1::Builder::new().serve_connection(io, service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.recv() => {
                // Finish the in-flight request, then close.
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }

    /// Answers one HTTP request.
    ///
    /// Never fails: every outcome, including transport errors, becomes a
    /// JSON response. The request is logged and counted before returning.
    pub async fn handle<B>(&self, req: Request<B>) -> HttpResponse
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let request_id = RequestId::from_header_or_new(
            req.headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok()),
        );
        let mut ctx = RequestContext::with_request_id(request_id);

        let result = self.process(req, &mut ctx).await;
        let code = match &result {
            Ok(_) => 200,
            Err(err) => err.code(),
        };
        ctx.set_code(code);

        let elapsed = ctx.elapsed();
        log_request(&ctx, &result, elapsed);
        record_request(ctx.method(), code, elapsed);

        build_response(request_id, result)
    }

    async fn process<B>(&self, req: Request<B>, ctx: &mut RequestContext) -> ApiResult<Value>
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let path = req.uri().path();
        if req.method() != Method::POST || path.trim_matches('/') != METHOD_PATH.trim_matches('/') {
            return Err(ApiError::unknown_route(path));
        }

        let body = self.read_body(req.into_body()).await?;
        self.dispatch(body, ctx).await
    }

    async fn read_body<B>(&self, body: B) -> ApiResult<Map<String, Value>>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let limit = self.settings.max_body_bytes;
        let collected =
            tokio::time::timeout(self.settings.request_timeout, Limited::new(body, limit).collect())
                .await;

        let bytes = match collected {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(e)) if e.downcast_ref::<LengthLimitError>().is_some() => {
                return Err(ApiError::malformed_body(format!(
                    "body exceeds {limit} bytes"
                )));
            }
            Ok(Err(e)) => {
                return Err(ApiError::malformed_body(format!(
                    "failed to read body: {e}"
                )));
            }
            Err(_) => return Err(ApiError::malformed_body("timed out reading body")),
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(ApiError::malformed_body("body is not a JSON object")),
            Err(e) => Err(ApiError::malformed_body(format!("invalid JSON: {e}"))),
        }
    }

    async fn dispatch(
        &self,
        body: Map<String, Value>,
        ctx: &mut RequestContext,
    ) -> ApiResult<Value> {
        let dispatcher = Arc::clone(&self.dispatcher);
        let mut task_ctx = ctx.clone();

        let task = tokio::spawn(async move {
            let result = dispatcher.dispatch(&body, &mut task_ctx).await;
            (result, task_ctx)
        });
        let abort = task.abort_handle();

        match tokio::time::timeout(self.settings.request_timeout, task).await {
            Ok(Ok((result, task_ctx))) => {
                *ctx = task_ctx;
                result
            }
            Ok(Err(join_error)) => Err(ApiError::internal_with_source(
                "dispatch task failed",
                join_error,
            )),
            Err(_) => {
                abort.abort();
                Err(ApiError::internal(format!(
                    "dispatch exceeded {} ms",
                    duration_ms(self.settings.request_timeout)
                )))
            }
        }
    }
}

fn log_request(ctx: &RequestContext, result: &ApiResult<Value>, elapsed: Duration) {
    let method = ctx.method().unwrap_or("-");
    let duration_ms = duration_ms(elapsed);

    match result {
        Ok(_) => tracing::info!(
            request_id = %ctx.request_id(),
            method,
            code = 200,
            has = ?ctx.has(),
            nclients = ?ctx.nclients(),
            duration_ms,
            "request served"
        ),
        Err(err) => {
            let source = std::error::Error::source(err).map(ToString::to_string);
            tracing::error!(
                request_id = %ctx.request_id(),
                method,
                code = err.code(),
                has = ?ctx.has(),
                nclients = ?ctx.nclients(),
                duration_ms,
                error = %err,
                source = ?source,
                "request failed"
            );
        }
    }
}

fn build_response(request_id: RequestId, result: ApiResult<Value>) -> HttpResponse {
    let (status, body) = match result {
        Ok(payload) => (StatusCode::OK, json!({ "response": payload, "code": 200 })),
        Err(err) => (
            err.status_code(),
            json!({ "error": err.response_text(), "code": err.code() }),
        ),
    };

    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        headers.insert(REQUEST_ID_HEADER, value);
    }

    response
}

fn duration_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoring_core::Authenticator;
    use scoring_store::MemoryStore;

    fn test_server() -> Server {
        let dispatcher = Dispatcher::new(Authenticator::default(), Arc::new(MemoryStore::new()));
        Server::new(dispatcher, ServerSettings::default().with_max_body_bytes(256))
    }

    fn post(path: &str, body: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(Method::POST)
            .uri(path)
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    async fn read_json(response: HttpResponse) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let response = test_server().handle(post("/score", "{}")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            read_json(response).await,
            json!({"error": "Not Found", "code": 404})
        );
    }

    #[tokio::test]
    async fn test_get_is_not_found() {
        let request = Request::builder()
            .method(Method::GET)
            .uri(METHOD_PATH)
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = test_server().handle(request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_trailing_slash_is_accepted() {
        let response = test_server().handle(post("/method/", "{}")).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_invalid_json_is_bad_request() {
        let response = test_server().handle(post(METHOD_PATH, "{not json")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            read_json(response).await,
            json!({"error": "Bad Request", "code": 400})
        );
    }

    #[tokio::test]
    async fn test_non_object_is_bad_request() {
        let response = test_server().handle(post(METHOD_PATH, "[1, 2]")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_body_is_bad_request() {
        let body = format!(r#"{{"login": "{}"}}"#, "x".repeat(512));
        let response = test_server().handle(post(METHOD_PATH, &body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_validation_message_is_returned() {
        let response = test_server()
            .handle(post(METHOD_PATH, r#"{"login": "h&f", "token": "", "arguments": {}}"#))
            .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            read_json(response).await,
            json!({"error": "method: Field is required", "code": 422})
        );
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let id = "0190c5a0-7b1e-7cc0-8a5e-1f2d3c4b5a69";
        let mut request = post(METHOD_PATH, "{}");
        request
            .headers_mut()
            .insert(REQUEST_ID_HEADER, HeaderValue::from_static(id));

        let response = test_server().handle(request).await;
        assert_eq!(response.headers()[REQUEST_ID_HEADER], id);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
    }

    #[tokio::test]
    async fn test_malformed_request_id_is_replaced() {
        let mut request = post(METHOD_PATH, "{}");
        request
            .headers_mut()
            .insert(REQUEST_ID_HEADER, HeaderValue::from_static("not-a-uuid"));

        let response = test_server().handle(request).await;
        let echoed = response.headers()[REQUEST_ID_HEADER].to_str().unwrap();
        assert!(RequestId::parse(echoed).is_some());
    }
}
