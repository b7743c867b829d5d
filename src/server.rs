use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::analyzer;
use crate::error::{ErrorKind, LexisError, Result};
use crate::filter::{self, FilterQuery};
use crate::model::Record;
use crate::ContentStore;

/// Largest accepted create body
const MAX_BODY_BYTES: u64 = 64 * 1024;

/// Characters escaped when a value is placed in a path segment
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

#[derive(Deserialize, Debug)]
struct NaturalLanguageParams {
    query: Option<String>,
}

#[derive(Serialize)]
struct ListResponse<'a> {
    data: Vec<&'a Record>,
    count: usize,
    filters_applied: filter::Filter,
}

#[derive(Serialize)]
struct InterpretedQuery<'a> {
    original: &'a str,
    parsed_filters: filter::Filter,
}

#[derive(Serialize)]
struct NaturalLanguageResponse<'a> {
    data: Vec<&'a Record>,
    count: usize,
    interpreted_query: InterpretedQuery<'a>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Binds `addr` and serves until `shutdown` resolves.
pub async fn serve<S>(store: Arc<ContentStore>, addr: SocketAddr, shutdown: S) -> std::result::Result<(), warp::Error>
where
    S: Future<Output = ()> + Send + 'static,
{
    let (bound, server) = warp::serve(routes(store)).try_bind_with_graceful_shutdown(addr, shutdown)?;
    tracing::info!(addr = %bound, "Lexis listening");
    server.await;
    tracing::info!("Lexis stopped");
    Ok(())
}

/// Path filters come before method filters so unknown paths reject as 404, not 405.
pub fn routes(store: Arc<ContentStore>) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    // 1. POST /strings
    let create = warp::path!("strings")
    .and(warp::post())
    .and(warp::body::content_length_limit(MAX_BODY_BYTES))
    .and(warp::body::bytes())
    .and(with_store(store.clone()))
    .map(handle_create);

    // 2. GET /strings/filter-by-natural-language (ahead of the by-value route)
    let natural = warp::path!("strings" / "filter-by-natural-language")
    .and(warp::get())
    .and(warp::query::<NaturalLanguageParams>())
    .and(with_store(store.clone()))
    .map(handle_natural_language);

    // 3. GET /strings
    let list = warp::path!("strings")
    .and(warp::get())
    .and(warp::query::<FilterQuery>())
    .and(with_store(store.clone()))
    .map(handle_list);

    // 4. GET /strings/{value}
    let get = warp::path!("strings" / String)
    .and(warp::get())
    .and(with_store(store.clone()))
    .map(handle_get);

    // 5. DELETE /strings/{value}
    let delete = warp::path!("strings" / String)
    .and(warp::delete())
    .and(with_store(store))
    .map(handle_delete);

    create
    .or(natural)
    .or(list)
    .or(get)
    .or(delete)
    .recover(handle_rejection)
    .with(warp::trace::request())
}

fn with_store(store: Arc<ContentStore>) -> impl Filter<Extract = (Arc<ContentStore>,), Error = Infallible> + Clone {
    warp::any().map(move || store.clone())
}

// --- HANDLERS ---

fn handle_create(body: Bytes, store: Arc<ContentStore>) -> Response {
    let created = parse_create_body(&body)
    .and_then(|value| analyzer::try_analyze(value.as_deref()))
    .and_then(|record| store.admit(record));

    match created {
        Ok(record) => {
            let location = format!("/strings/{}", utf8_percent_encode(&record.raw_text, PATH_SEGMENT));
            let reply = warp::reply::with_status(warp::reply::json(&*record), StatusCode::CREATED);
            warp::reply::with_header(reply, "location", location).into_response()
        }
        Err(e) => error_reply(&e),
    }
}

fn handle_get(raw_value: String, store: Arc<ContentStore>) -> Response {
    match decode_segment(&raw_value).and_then(|value| store.fetch(&value)) {
        Ok(record) => warp::reply::json(&*record).into_response(),
        Err(e) => error_reply(&e),
    }
}

fn handle_list(query: FilterQuery, store: Arc<ContentStore>) -> Response {
    match store.query(&query) {
        Ok((filter, records)) => {
            let data: Vec<&Record> = records.iter().map(|r| r.as_ref()).collect();
            let body = ListResponse { count: data.len(), data, filters_applied: filter };
            warp::reply::json(&body).into_response()
        }
        Err(e) => error_reply(&e),
    }
}

fn handle_natural_language(params: NaturalLanguageParams, store: Arc<ContentStore>) -> Response {
    let original = params.query.unwrap_or_default();
    match store.query_natural(&original) {
        Ok((filter, records)) => {
            let data: Vec<&Record> = records.iter().map(|r| r.as_ref()).collect();
            let body = NaturalLanguageResponse {
                count: data.len(),
                data,
                interpreted_query: InterpretedQuery { original: &original, parsed_filters: filter },
            };
            warp::reply::json(&body).into_response()
        }
        Err(e) => error_reply(&e),
    }
}

fn handle_delete(raw_value: String, store: Arc<ContentStore>) -> Response {
    match decode_segment(&raw_value).and_then(|value| store.remove(&value)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_reply(&e),
    }
}

// --- HELPERS ---

/// `None` when the body has no usable `value`; a non-string value is a type error.
fn parse_create_body(body: &[u8]) -> Result<Option<String>> {
    let json: Value = serde_json::from_slice(body).map_err(|_| {
        LexisError::InvalidInput("Invalid request body or missing 'value' field.".to_string())
    })?;

    match json.get("value") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(LexisError::InvalidType(
            "Invalid data type for 'value' (must be string).".to_string(),
        )),
    }
}

fn decode_segment(raw: &str) -> Result<String> {
    percent_decode_str(raw)
    .decode_utf8()
    .map(|s| s.into_owned())
    .map_err(|_| LexisError::InvalidInput("Path value is not valid UTF-8.".to_string()))
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput | ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::InvalidType => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
    }
}

fn error_reply(err: &LexisError) -> Response {
    json_error(status_for(err.kind()), err.to_string())
}

fn json_error(status: StatusCode, error: String) -> Response {
    warp::reply::with_status(warp::reply::json(&ErrorBody { error }), status).into_response()
}

async fn handle_rejection(err: Rejection) -> std::result::Result<Response, Infallible> {
    let reply = if err.is_not_found() {
        json_error(StatusCode::NOT_FOUND, "Route not found.".to_string())
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        json_error(StatusCode::BAD_REQUEST, format!("Invalid query parameters: {}", e))
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        json_error(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large.".to_string())
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        json_error(StatusCode::LENGTH_REQUIRED, "Content-Length header required.".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        json_error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed.".to_string())
    } else {
        tracing::error!(?err, "unhandled rejection");
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.".to_string())
    };
    Ok(reply)
}
