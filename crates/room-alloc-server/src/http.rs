//! 🏗 HTTP front of the engine

use std::io::Read;

use room_alloc_core::{AssignmentId, Class, RequestId, StoreError};
use room_alloc_engine::{Engine, EngineError};
use serde::Serialize;
use tiny_http::{Header, Method, Request, Response};
use tracing::warn;

const ROUTES: &str = "🛏 could not find the service you are looking for!

Valid requests are:
  POST /api/admin/run
  POST /api/reject/primary
  POST /api/reject/secondary
  GET  /api/primary
  GET  /api/secondary
  GET  /api/assignments
  GET  /api/assignments/{id}
  GET  /api/admin/waitlist
  PUT  /api/admin/waitlist/reorder
  GET  /api/admin/pools";

/// Answer a single HTTP request
pub fn handle(engine: &Engine, mut rq: Request) {
    let method = rq.method().clone();
    let url = rq.url().to_owned();
    let mut response = match (&method, url.as_str()) {
        (Method::Options, _) => Response::empty(204).boxed(),
        (Method::Post, "/api/admin/run") => match engine.run_full_reassignment() {
            Ok(summary) => json(200, &summary),
            Err(err) => error(&err),
        },
        (Method::Post, "/api/reject/primary") => reject(engine, &mut rq, Class::Primary),
        (Method::Post, "/api/reject/secondary") => reject(engine, &mut rq, Class::Secondary),
        (Method::Get, "/api/primary") => json(200, &*engine.primary_snapshot()),
        (Method::Get, "/api/secondary") => json(200, &*engine.secondary_snapshot()),
        (Method::Get, "/api/assignments") => match engine.assignments() {
            Ok(rows) => json(200, &rows),
            Err(err) => error(&err),
        },
        (Method::Get, path) if path.starts_with("/api/assignments/") => {
            assignment(engine, &path["/api/assignments/".len()..])
        }
        (Method::Get, "/api/admin/waitlist") => match engine.waitlist() {
            Ok(waiting) if waiting.is_empty() => Response::empty(204).boxed(),
            Ok(waiting) => json(200, &waiting),
            Err(err) => error(&err),
        },
        (Method::Put, "/api/admin/waitlist/reorder") => reorder(engine, &mut rq),
        (Method::Get, "/api/admin/pools") => json(200, &engine.pool_contents()),
        (Method::Get | Method::Post | Method::Put, _) => {
            Response::from_string(ROUTES).with_status_code(404).boxed()
        }
        _ => Response::empty(405).boxed(),
    };

    add_response_cors_headers(&mut response);
    if let Err(err) = rq.respond(response) {
        warn!(%err, "HTTP response failed");
    }
}

fn reject(engine: &Engine, rq: &mut Request, class: Class) -> Response<Box<dyn Read + Send>> {
    let Some(id) = read_body(rq).and_then(|body| body.trim().parse().ok()) else {
        return text(400, "No request id given.");
    };
    match engine.reject(RequestId(id), class) {
        Ok(rejection) => json(200, &rejection),
        Err(err) => error(&err),
    }
}

fn assignment(engine: &Engine, id: &str) -> Response<Box<dyn Read + Send>> {
    let Ok(id) = id.parse() else {
        return text(400, "Assignment ids are decimal numbers.");
    };
    match engine.assignment(AssignmentId(id)) {
        Ok(Some(row)) => json(200, &row),
        Ok(None) => text(404, format!("No assignment with id {id}.")),
        Err(err) => error(&err),
    }
}

fn reorder(engine: &Engine, rq: &mut Request) -> Response<Box<dyn Read + Send>> {
    let ids: Vec<AssignmentId> = match read_body(rq).map(|body| serde_json::from_str(&body)) {
        Some(Ok(ids)) => ids,
        _ => return text(400, "Expected a JSON array of assignment ids."),
    };
    match engine.reorder_waitlist(&ids) {
        Ok(rows) => json(200, &rows),
        Err(err) => error(&err),
    }
}

fn read_body(rq: &mut Request) -> Option<String> {
    let mut s = String::with_capacity(rq.body_length().unwrap_or(16));
    rq.as_reader().read_to_string(&mut s).ok()?;
    Some(s)
}

fn json<T: Serialize + ?Sized>(status: u16, body: &T) -> Response<Box<dyn Read + Send>> {
    match serde_json::to_vec(body) {
        Ok(bytes) => {
            let mut res = Response::from_data(bytes).with_status_code(status);
            res.add_header(header(b"Content-Type", b"application/json"));
            res.boxed()
        }
        Err(err) => text(500, format!("could not encode response: {err}")),
    }
}

fn text(status: u16, msg: impl Into<String>) -> Response<Box<dyn Read + Send>> {
    Response::from_string(msg.into())
        .with_status_code(status)
        .boxed()
}

fn error(err: &EngineError) -> Response<Box<dyn Read + Send>> {
    let status = match err {
        EngineError::Store(StoreError::UnknownAssignment(_)) => 400,
        _ => 500,
    };
    warn!(%err, status, "request failed");
    text(status, err.to_string())
}

fn header(field: &[u8], value: &[u8]) -> Header {
    Header::from_bytes(field, value).expect("static header is valid")
}

/// Add CORS headers to `res`
fn add_response_cors_headers<R: Read>(res: &mut Response<R>) {
    res.add_header(header(b"Access-Control-Request-Method", b"*"));
    res.add_header(header(b"Access-Control-Allow-Origin", b"*"));
    res.add_header(header(b"Access-Control-Allow-Headers", b"*"));
    res.add_header(header(b"Access-Control-Expose-Headers", b"*"));
}
