//! HTTP front end.
//!
//! Routes under `/api` speak JSON and map [`ApiError::status`] straight onto
//! the response status:
//!
//! ```text
//! GET  /api/banks
//! POST /api/start            {"bank":"geo","count":3,"mode":"study"}
//! GET  /api/question/{id}
//! POST /api/answer/{id}      {"answer":"Paris"}
//! POST /api/end/{id}
//! ```
//!
//! Every response carries CORS headers for any origin. Other `GET` paths are
//! served from the static directory when one is configured.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use services::api::{AnswerRequest, StartRequest};
use services::{ApiError, ErrorBody, QuizService};

use crate::serve::to_json;

/// Request bodies above this size are rejected before being read.
const MAX_REQUEST_BODY_BYTES: u64 = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("http server error: {0}")]
    Server(#[from] hyper::Error),
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub addr: SocketAddr,
    /// Directory of frontend files served for non-API paths.
    pub static_dir: Option<PathBuf>,
}

struct HttpState {
    quiz: Arc<QuizService>,
    static_dir: Option<PathBuf>,
}

/// An API endpoint, with the session id taken from the path where there is one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route<'a> {
    Banks,
    Start,
    Question(&'a str),
    Answer(&'a str),
    End(&'a str),
}

fn match_route<'a>(method: &Method, path: &'a str) -> Option<Route<'a>> {
    let rest = path.strip_prefix("/api/")?;
    let (head, id) = match rest.split_once('/') {
        Some((head, id)) if !id.is_empty() && !id.contains('/') => (head, Some(id)),
        Some(_) => return None,
        None => (rest, None),
    };

    match (method, head, id) {
        (&Method::GET, "banks", None) => Some(Route::Banks),
        (&Method::POST, "start", None) => Some(Route::Start),
        (&Method::GET, "question", Some(id)) => Some(Route::Question(id)),
        (&Method::POST, "answer", Some(id)) => Some(Route::Answer(id)),
        (&Method::POST, "end", Some(id)) => Some(Route::End(id)),
        _ => None,
    }
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|err| {
        tracing::debug!(error = %err, "rejected malformed request body");
        ApiError::bad_request("Malformed request body")
    })
}

fn dispatch(quiz: &QuizService, route: Route<'_>, body: &[u8]) -> Result<Value, ApiError> {
    Ok(match route {
        Route::Banks => to_json(&quiz.list_banks()),
        Route::Start => to_json(&quiz.start(parse_body::<StartRequest>(body)?)?),
        Route::Question(id) => to_json(&quiz.question(id)?),
        Route::Answer(id) => to_json(&quiz.answer(id, parse_body::<AnswerRequest>(body)?)?),
        Route::End(id) => to_json(&quiz.end(id)?),
    })
}

/// Status and JSON payload for one `/api` request.
fn api_reply(quiz: &QuizService, method: &Method, path: &str, body: &[u8]) -> (StatusCode, Value) {
    let Some(route) = match_route(method, path) else {
        return (
            StatusCode::NOT_FOUND,
            json!({"error": "Not Found", "status": 404}),
        );
    };

    match dispatch(quiz, route, body) {
        Ok(value) => (StatusCode::OK, value),
        Err(err) => {
            let status =
                StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, to_json(&ErrorBody::from(&err)))
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<Body> {
    let body = serde_json::to_vec(value).unwrap_or_default();
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

fn plain_response(status: StatusCode, text: &'static str) -> Response<Body> {
    let mut response = Response::new(Body::from(text));
    *response.status_mut() = status;
    response
}

fn bad_request_response(message: &str) -> Response<Body> {
    let err = ApiError::bad_request(message);
    json_response(StatusCode::BAD_REQUEST, &ErrorBody::from(&err))
}

async fn read_body(req: Request<Body>) -> Result<hyper::body::Bytes, Response<Body>> {
    let declared = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());
    if declared.is_some_and(|len| len > MAX_REQUEST_BODY_BYTES) {
        return Err(bad_request_response("Request body too large"));
    }

    hyper::body::to_bytes(req.into_body()).await.map_err(|err| {
        tracing::debug!(error = %err, "failed to read request body");
        bad_request_response("Unreadable request body")
    })
}

/// Map a URL path onto a file under `dir`. Anything other than plain path
/// segments is refused.
fn resolve_static(dir: &Path, request_path: &str) -> Option<PathBuf> {
    let mut resolved = dir.to_path_buf();
    for component in Path::new(request_path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(resolved)
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

async fn static_response(dir: &Path, request_path: &str) -> Response<Body> {
    let Some(mut file) = resolve_static(dir, request_path) else {
        return plain_response(StatusCode::NOT_FOUND, "Not Found");
    };
    if tokio::fs::metadata(&file)
        .await
        .is_ok_and(|meta| meta.is_dir())
    {
        file.push("index.html");
    }

    match tokio::fs::read(&file).await {
        Ok(bytes) => {
            let mut response = Response::new(Body::from(bytes));
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(content_type(&file)),
            );
            response
        }
        Err(_) => plain_response(StatusCode::NOT_FOUND, "Not Found"),
    }
}

fn preflight(headers: &HeaderMap) -> Response<Body> {
    let mut response = plain_response(StatusCode::OK, "OK");
    let out = response.headers_mut();
    out.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        headers
            .get(header::ACCESS_CONTROL_REQUEST_METHOD)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("GET, POST, OPTIONS")),
    );
    out.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        headers
            .get(header::ACCESS_CONTROL_REQUEST_HEADERS)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("*")),
    );
    out.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("600"));
    response
}

/// Any origin is allowed. A request that names its origin gets it echoed back
/// with credentials allowed, since browsers refuse `*` alongside credentials.
fn with_cors(mut response: Response<Body>, origin: Option<HeaderValue>) -> Response<Body> {
    let headers = response.headers_mut();
    match origin {
        Some(origin) => {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
            headers.insert(header::VARY, HeaderValue::from_static("Origin"));
        }
        None => {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        }
    }
    response
}

async fn route_request(state: &HttpState, req: Request<Body>) -> Response<Body> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    if path == "/api" || path.starts_with("/api/") {
        let body = match read_body(req).await {
            Ok(body) => body,
            Err(response) => return response,
        };
        let (status, value) = api_reply(&state.quiz, &method, &path, &body);
        tracing::debug!(%method, %path, status = status.as_u16(), "api request");
        return json_response(status, &value);
    }

    match (&state.static_dir, &method) {
        (Some(dir), &Method::GET | &Method::HEAD) => static_response(dir, &path).await,
        _ => plain_response(StatusCode::NOT_FOUND, "Not Found"),
    }
}

async fn handle(state: Arc<HttpState>, req: Request<Body>) -> Result<Response<Body>, Infallible> {
    let origin = req.headers().get(header::ORIGIN).cloned();
    let response = if req.method() == Method::OPTIONS {
        preflight(req.headers())
    } else {
        route_request(&state, req).await
    };
    Ok(with_cors(response, origin))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
}

async fn serve(quiz: Arc<QuizService>, config: HttpConfig) -> Result<(), HttpError> {
    let state = Arc::new(HttpState {
        quiz,
        static_dir: config.static_dir,
    });
    let make_svc = make_service_fn(move |_conn| {
        let state = Arc::clone(&state);
        async move {
            Ok::<_, Infallible>(service_fn(move |req| handle(Arc::clone(&state), req)))
        }
    });

    let server = Server::try_bind(&config.addr)?.serve(make_svc);
    tracing::info!(addr = %server.local_addr(), "http api listening");
    server.with_graceful_shutdown(shutdown_signal()).await?;
    tracing::info!("http server stopped");
    Ok(())
}

/// Serve the HTTP API until ctrl-c.
pub fn run_http(quiz: Arc<QuizService>, config: HttpConfig) -> Result<(), HttpError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(HttpError::Runtime)?;
    runtime.block_on(serve(quiz, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Bank, Question};
    use quiz_core::time::fixed_now;
    use services::{AppServices, Clock, ServiceOptions};
    use storage::BankStore;

    fn quiz() -> Arc<QuizService> {
        let questions = vec![
            Question::from_pairs("Capital of Peru?", [("A", "Lima"), ("B", "Cusco")], "A").unwrap(),
            Question::from_pairs("Capital of Ghana?", [("A", "Kumasi"), ("B", "Accra")], "B").unwrap(),
        ];
        AppServices::in_memory(
            BankStore::new([Bank::new("capitals", questions).unwrap()]),
            ServiceOptions {
                clock: Clock::fixed(fixed_now()),
                seed: Some(11),
                idle_ttl: None,
            },
        )
        .quiz()
    }

    fn state(static_dir: Option<PathBuf>) -> Arc<HttpState> {
        Arc::new(HttpState {
            quiz: quiz(),
            static_dir,
        })
    }

    async fn send(state: &Arc<HttpState>, req: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
        let response = handle(Arc::clone(state), req).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        (status, headers, body.to_vec())
    }

    fn request(method: Method, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn routes_match_method_and_shape() {
        assert_eq!(match_route(&Method::GET, "/api/banks"), Some(Route::Banks));
        assert_eq!(match_route(&Method::POST, "/api/start"), Some(Route::Start));
        assert_eq!(match_route(&Method::GET, "/api/question/abc"), Some(Route::Question("abc")));
        assert_eq!(match_route(&Method::POST, "/api/answer/abc"), Some(Route::Answer("abc")));
        assert_eq!(match_route(&Method::POST, "/api/end/abc"), Some(Route::End("abc")));

        assert_eq!(match_route(&Method::POST, "/api/banks"), None);
        assert_eq!(match_route(&Method::GET, "/api/end/abc"), None);
        assert_eq!(match_route(&Method::GET, "/api/question/"), None);
        assert_eq!(match_route(&Method::GET, "/api/question/a/b"), None);
        assert_eq!(match_route(&Method::GET, "/banks"), None);
    }

    #[test]
    fn api_errors_carry_their_status() {
        let quiz = quiz();
        let (status, body) = api_reply(
            &quiz,
            &Method::POST,
            "/api/start",
            br#"{"bank":"capitals","count":1,"mode":"exam"}"#,
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_mode");

        let (status, body) = api_reply(&quiz, &Method::POST, "/api/start", br#"{"bank":"art","count":1}"#);
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Bank 'art' not found");

        let (status, _) = api_reply(&quiz, &Method::POST, "/api/start", b"{oops");
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = api_reply(&quiz, &Method::POST, "/api/end/unknown", b"");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "session_not_found");

        let (status, _) = api_reply(&quiz, &Method::DELETE, "/api/banks", b"");
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn full_quiz_over_api_routes() {
        let quiz = quiz();
        let (status, banks) = api_reply(&quiz, &Method::GET, "/api/banks", b"");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(banks, json!({"banks": ["capitals"]}));

        let (_, started) = api_reply(
            &quiz,
            &Method::POST,
            "/api/start",
            br#"{"bank":"capitals","count":1,"mode":"study"}"#,
        );
        let id = started["session_id"].as_str().unwrap().to_string();

        let (status, question) = api_reply(&quiz, &Method::GET, &format!("/api/question/{id}"), b"");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(question["index"], 1);
        assert_eq!(question["total"], 1);

        let (status, graded) = api_reply(
            &quiz,
            &Method::POST,
            &format!("/api/answer/{id}"),
            br#"{"answer":"nowhere"}"#,
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(graded["correct"], false);
        assert_eq!(graded["finished"], true);
        assert!(graded["correct_answer"].is_string());

        let (status, _) = api_reply(
            &quiz,
            &Method::POST,
            &format!("/api/answer/{id}"),
            br#"{"answer":"nowhere"}"#,
        );
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, ended) = api_reply(&quiz, &Method::POST, &format!("/api/end/{id}"), b"");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ended["final_score"], 0);
        assert_eq!(ended["total"], 1);

        let (status, _) = api_reply(&quiz, &Method::POST, &format!("/api/end/{id}"), b"");
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn static_paths_stay_inside_the_directory() {
        let dir = Path::new("/srv/front");
        assert_eq!(resolve_static(dir, "/app.js"), Some(dir.join("app.js")));
        assert_eq!(resolve_static(dir, "/css/./site.css"), Some(dir.join("css/site.css")));
        assert_eq!(resolve_static(dir, "/"), Some(dir.to_path_buf()));
        assert_eq!(resolve_static(dir, "/../etc/passwd"), None);
    }

    #[tokio::test]
    async fn responses_carry_cors_headers() {
        let state = state(None);
        let (status, headers, body) = send(&state, request(Method::GET, "/api/banks", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({"banks": ["capitals"]}));

        let mut req = request(Method::GET, "/api/banks", "");
        req.headers_mut()
            .insert(header::ORIGIN, HeaderValue::from_static("http://localhost:3000"));
        let (_, headers, _) = send(&state, req).await;
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:3000");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    }

    #[tokio::test]
    async fn preflight_allows_requested_method() {
        let state = state(None);
        let mut req = request(Method::OPTIONS, "/api/start", "");
        req.headers_mut()
            .insert(header::ORIGIN, HeaderValue::from_static("http://example.test"));
        req.headers_mut().insert(
            header::ACCESS_CONTROL_REQUEST_METHOD,
            HeaderValue::from_static("POST"),
        );
        let (status, headers, _) = send(&state, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://example.test");
    }

    #[tokio::test]
    async fn error_status_reaches_the_wire() {
        let state = state(None);
        let (status, _, body) = send(
            &state,
            request(Method::POST, "/api/start", r#"{"bank":"missing","count":2}"#),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["status"], 404);
        assert_eq!(value["kind"], "invalid_bank");
    }

    #[tokio::test]
    async fn serves_frontend_files_outside_api() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>quiz</h1>").unwrap();
        let state = state(Some(dir.path().to_path_buf()));

        let (status, headers, body) = send(&state, request(Method::GET, "/", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(body, b"<h1>quiz</h1>");

        let (status, _, _) = send(&state, request(Method::GET, "/missing.js", "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn without_static_dir_only_api_is_served() {
        let state = state(None);
        let (status, _, _) = send(&state, request(Method::GET, "/index.html", "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
