//! HTTP surface: chat webhook, control session API and report export.
//!
//! Control and report routes identify the operator by the `X-Operator-Id` header and
//! only serve configured admins. Control sessions are private to the admin who opened them.

use crate::console::{ChatKind, Console, Event};
use crate::error::ConsoleError;
use crate::logic::status_report;
use crate::models::{OperatorId, PlayerStatus, SessionHandle};
use crate::store::SqliteStore;
use actix_web::{
    delete, get, post,
    web::{self, Data, Json, Path},
    HttpRequest, HttpResponse, Responder,
};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

/// Shared console behind one lock: each request runs to completion before the next.
pub type AppState = Data<Mutex<Console<SqliteStore>>>;

pub const OPERATOR_HEADER: &str = "X-Operator-Id";

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

/// Webhook body posted by the bot framework for every message or button press.
#[derive(Deserialize)]
struct UpdateBody {
    operator_id: OperatorId,
    #[serde(default)]
    chat: ChatKind,
    event: Event,
}

#[derive(Deserialize)]
struct NameBody {
    name: String,
}

#[derive(Serialize)]
struct SessionStarted {
    id: SessionHandle,
    snapshot: Vec<String>,
}

#[derive(Serialize)]
struct SelectionView {
    selected: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    removed: Option<String>,
}

/// Path segment: session id (e.g. /api/control/sessions/{id})
#[derive(Deserialize)]
struct SessionPath {
    id: SessionHandle,
}

/// Path segments: session id and position in the selection.
#[derive(Deserialize)]
struct SelectedPath {
    id: SessionHandle,
    index: usize,
}

#[derive(Deserialize)]
struct ReportPath {
    status: String,
}

fn error_response(e: &ConsoleError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        ConsoleError::NotEligible(_)
        | ConsoleError::IndexOutOfRange { .. }
        | ConsoleError::InvalidSessionState { .. }
        | ConsoleError::InvalidName
        | ConsoleError::Duplicate(_) => HttpResponse::BadRequest().json(body),
        ConsoleError::SessionNotFound(_) | ConsoleError::NotFound(_) => {
            HttpResponse::NotFound().json(body)
        }
        ConsoleError::Persistence(_) | ConsoleError::LockPoisoned => {
            HttpResponse::ServiceUnavailable().json(body)
        }
        ConsoleError::Export(_) => HttpResponse::InternalServerError().json(body),
    }
}

fn lock(state: &AppState) -> Result<MutexGuard<'_, Console<SqliteStore>>, HttpResponse> {
    state
        .lock()
        .map_err(|_| error_response(&ConsoleError::LockPoisoned))
}

/// Admin operator from the request header, or the response to send instead.
fn admin_operator(
    console: &Console<SqliteStore>,
    req: &HttpRequest,
) -> Result<OperatorId, HttpResponse> {
    let operator = req
        .headers()
        .get(OPERATOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<OperatorId>().ok());
    match operator {
        Some(id) if console.is_admin(id) => Ok(id),
        Some(_) => Err(HttpResponse::Forbidden()
            .json(serde_json::json!({ "error": "Admin access required" }))),
        None => Err(HttpResponse::Unauthorized()
            .json(serde_json::json!({ "error": format!("Missing {OPERATOR_HEADER} header") }))),
    }
}

/// Admin check plus session ownership. Unknown sessions are reported as not found.
fn session_owner(
    console: &Console<SqliteStore>,
    req: &HttpRequest,
    handle: SessionHandle,
) -> Result<OperatorId, HttpResponse> {
    let operator = admin_operator(console, req)?;
    match console.desk().owner(handle) {
        Some(owner) if owner == operator => Ok(operator),
        Some(_) => Err(HttpResponse::Forbidden()
            .json(serde_json::json!({ "error": "Session belongs to another operator" }))),
        None => Err(error_response(&ConsoleError::SessionNotFound(handle))),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "roster-console",
    })
}

/// Chat webhook: one event in, one reply out (204 when the console stays silent).
#[post("/api/updates")]
async fn api_update(state: AppState, body: Json<UpdateBody>) -> HttpResponse {
    let mut console = match lock(&state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let UpdateBody {
        operator_id,
        chat,
        event,
    } = body.into_inner();
    match console.handle(operator_id, chat, event) {
        Some(reply) => HttpResponse::Ok().json(reply),
        None => HttpResponse::NoContent().finish(),
    }
}

/// Start a control session over the current roster snapshot.
#[post("/api/control/sessions")]
async fn api_start_session(state: AppState, req: HttpRequest) -> HttpResponse {
    let mut console = match lock(&state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let operator = match admin_operator(&console, &req) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let (desk, store) = console.desk_and_store();
    let started = desk.start_session(store, operator).and_then(|id| {
        let snapshot = desk.session(id)?.snapshot().to_vec();
        Ok(SessionStarted { id, snapshot })
    });
    match started {
        Ok(started) => HttpResponse::Created().json(started),
        Err(e) => error_response(&e),
    }
}

/// Mark one player present.
#[post("/api/control/sessions/{id}/names")]
async fn api_submit_name(
    state: AppState,
    req: HttpRequest,
    path: Path<SessionPath>,
    body: Json<NameBody>,
) -> HttpResponse {
    let mut console = match lock(&state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    if let Err(resp) = session_owner(&console, &req, path.id) {
        return resp;
    }
    let (desk, _) = console.desk_and_store();
    let result = desk
        .submit_name(path.id, &body.name)
        .and_then(|()| desk.session(path.id).map(|s| s.selected().to_vec()));
    match result {
        Ok(selected) => HttpResponse::Ok().json(SelectionView {
            selected,
            removed: None,
        }),
        Err(e) => error_response(&e),
    }
}

/// Freeze and return the partition (selected + everyone else).
#[post("/api/control/sessions/{id}/review")]
async fn api_review(state: AppState, req: HttpRequest, path: Path<SessionPath>) -> HttpResponse {
    let mut console = match lock(&state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    if let Err(resp) = session_owner(&console, &req, path.id) {
        return resp;
    }
    let (desk, _) = console.desk_and_store();
    match desk.request_review(path.id) {
        Ok(partition) => HttpResponse::Ok().json(partition),
        Err(e) => error_response(&e),
    }
}

/// Remove the selected player at `index` and go back to collecting names.
#[delete("/api/control/sessions/{id}/selected/{index}")]
async fn api_remove_selected(
    state: AppState,
    req: HttpRequest,
    path: Path<SelectedPath>,
) -> HttpResponse {
    let mut console = match lock(&state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    if let Err(resp) = session_owner(&console, &req, path.id) {
        return resp;
    }
    let (desk, _) = console.desk_and_store();
    let result = desk.remove_selected(path.id, path.index).and_then(|removed| {
        let selected = desk.session(path.id)?.selected().to_vec();
        Ok(SelectionView {
            selected,
            removed: Some(removed),
        })
    });
    match result {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => error_response(&e),
    }
}

/// Apply the reviewed partition; the session is closed on success and kept on failure.
#[post("/api/control/sessions/{id}/apply")]
async fn api_apply(state: AppState, req: HttpRequest, path: Path<SessionPath>) -> HttpResponse {
    let mut console = match lock(&state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    if let Err(resp) = session_owner(&console, &req, path.id) {
        return resp;
    }
    let (desk, store) = console.desk_and_store();
    match desk.confirm_and_apply(store, path.id) {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => error_response(&e),
    }
}

#[delete("/api/control/sessions/{id}")]
async fn api_cancel_session(
    state: AppState,
    req: HttpRequest,
    path: Path<SessionPath>,
) -> HttpResponse {
    let mut console = match lock(&state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    if let Err(resp) = session_owner(&console, &req, path.id) {
        return resp;
    }
    let (desk, _) = console.desk_and_store();
    match desk.cancel_session(path.id) {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => error_response(&e),
    }
}

fn parse_status(raw: &str) -> Result<PlayerStatus, HttpResponse> {
    raw.parse().map_err(|e: ConsoleError| error_response(&e))
}

#[get("/api/reports/{status}")]
async fn api_report(state: AppState, req: HttpRequest, path: Path<ReportPath>) -> HttpResponse {
    let console = match lock(&state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    if let Err(resp) = admin_operator(&console, &req) {
        return resp;
    }
    let status = match parse_status(&path.status) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    match status_report(console.store(), status) {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => error_response(&e),
    }
}

#[get("/api/reports/{status}/csv")]
async fn api_report_csv(state: AppState, req: HttpRequest, path: Path<ReportPath>) -> HttpResponse {
    let console = match lock(&state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    if let Err(resp) = admin_operator(&console, &req) {
        return resp;
    }
    let status = match parse_status(&path.status) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    match status_report(console.store(), status).and_then(|report| report.to_csv()) {
        Ok(bytes) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"{}.csv\"", status.as_str()),
            ))
            .body(bytes),
        Err(e) => error_response(&e),
    }
}

/// Register every route; shared by the binary and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(api_health)
        .service(api_update)
        .service(api_start_session)
        .service(api_submit_name)
        .service(api_review)
        .service(api_remove_selected)
        .service(api_apply)
        .service(api_cancel_session)
        .service(api_report_csv)
        .service(api_report);
}
