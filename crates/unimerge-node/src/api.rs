//! HTTP API for the UniMerge node.
//!
//! All JSON bodies are camelCase, matching the historical frontend; the
//! negotiate endpoint additionally accepts the old `matricNumber` field
//! name, and constraint day lists may arrive either as a JSON array or as
//! the frontend's comma-joined string (`"Monday, Tuesday"`, or `"None"`
//! for an empty set).

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use unimerge_engine::{NegotiateRequest, NegotiateResult, Outcome, Session};
use unimerge_knowledge::BookingRecord;
use unimerge_protocol::{Identity, Role, SessionId, SessionState, Slot, Weekday};

use crate::error::{Error, Result};
use crate::node::NodeState;
use crate::slip;
use crate::ws::ws_trace_handler;

pub type AppState = Arc<NodeState>;

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    // CORS layer for browser access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(health))
        .route("/ready", get(ready))
        // Identity
        .route("/api/schedule/login", post(login))
        // Venue constraints
        .route("/api/schedule/constraints", get(list_constraints))
        .route("/api/schedule/constraints", post(set_constraints))
        // Negotiation
        .route("/api/schedule/negotiate", post(negotiate))
        .route("/api/schedule/sessions", get(list_sessions))
        .route("/api/schedule/sessions/:id", get(get_session))
        .route("/api/schedule/sessions/:id/abort", post(abort_session))
        .route("/api/schedule/sessions/:id/slip", get(exam_slip))
        // Confirmed bookings
        .route("/api/schedule/bookings", get(list_bookings))
        // WebSocket for the live negotiation trace
        .route("/api/schedule/ws/trace", get(ws_trace_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// --- Health endpoints ---

async fn health() -> &'static str {
    "OK"
}

async fn ready() -> &'static str {
    "OK"
}

// --- Identity ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest {
    /// `student`, `authority`, or the historical `lecturer` token.
    role: String,
    login_id: String,
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Identity>> {
    let role: Role = req
        .role
        .parse()
        .map_err(|e: unimerge_protocol::Error| Error::InvalidRequest(e.to_string()))?;
    let identity = state.directory.lookup(role, &req.login_id).await?;
    Ok(Json(identity))
}

// --- Venue constraints ---

/// Day list as the wire carries it: a JSON array of day names, or the
/// frontend's comma-joined string where `"None"` means the empty set.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DayList {
    List(Vec<String>),
    Csv(String),
}

impl DayList {
    fn into_days(self) -> Result<BTreeSet<Weekday>> {
        let tokens: Vec<String> = match self {
            Self::List(items) => items,
            Self::Csv(text) => text.split(',').map(str::to_string).collect(),
        };

        let mut days = BTreeSet::new();
        for token in &tokens {
            let token = token.trim();
            if token.is_empty() || token.eq_ignore_ascii_case("none") {
                continue;
            }
            let day: Weekday = token
                .parse()
                .map_err(|e: unimerge_protocol::Error| Error::InvalidRequest(e.to_string()))?;
            days.insert(day);
        }
        Ok(days)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetConstraintsRequest {
    venue_name: String,
    prohibited_days: DayList,
}

/// One venue's prohibited-day set, as stored.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VenueConstraints {
    venue_name: String,
    prohibited_days: Vec<Weekday>,
}

async fn set_constraints(
    State(state): State<AppState>,
    Json(req): Json<SetConstraintsRequest>,
) -> Result<Json<VenueConstraints>> {
    let venue = req.venue_name.trim();
    if venue.is_empty() {
        return Err(Error::InvalidRequest("venue name must not be empty".into()));
    }
    let days = req.prohibited_days.into_days()?;

    state
        .engine
        .constraints()
        .set_constraints(venue, days.clone())
        .await;

    Ok(Json(VenueConstraints {
        venue_name: venue.to_string(),
        prohibited_days: days.into_iter().collect(),
    }))
}

async fn list_constraints(State(state): State<AppState>) -> Json<Vec<VenueConstraints>> {
    let venues = state.engine.constraints().venues().await;
    Json(
        venues
            .into_iter()
            .map(|(venue_name, days)| VenueConstraints {
                venue_name,
                prohibited_days: days.into_iter().collect(),
            })
            .collect(),
    )
}

// --- Negotiation ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NegotiateApiRequest {
    /// The historical frontend sends this as `matricNumber`.
    #[serde(alias = "matricNumber")]
    requester_id: String,
    course_code: String,
    preferred_venue: String,
    preferred_day: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NegotiateResponse {
    session_id: SessionId,
    /// `CONFIRMED` or `REFUSED`.
    outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    venue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    day: Option<Weekday>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason_code: Option<&'static str>,
}

impl From<NegotiateResult> for NegotiateResponse {
    fn from(result: NegotiateResult) -> Self {
        match result.outcome {
            Outcome::Confirmed { slot } => Self {
                session_id: result.session.id,
                outcome: "CONFIRMED".to_string(),
                venue: Some(slot.venue),
                day: Some(slot.day),
                reason: None,
                reason_code: None,
            },
            Outcome::Refused { reason } => Self {
                session_id: result.session.id,
                outcome: "REFUSED".to_string(),
                venue: None,
                day: None,
                reason: Some(reason.to_string()),
                reason_code: Some(reason.code()),
            },
        }
    }
}

async fn negotiate(
    State(state): State<AppState>,
    Json(req): Json<NegotiateApiRequest>,
) -> Result<Json<NegotiateResponse>> {
    let request = NegotiateRequest::parse(
        &req.requester_id,
        &req.course_code,
        &req.preferred_venue,
        &req.preferred_day,
    )?;
    let result = state.engine.negotiate(request).await?;
    Ok(Json(result.into()))
}

async fn list_sessions(State(state): State<AppState>) -> Json<Vec<Session>> {
    Json(state.engine.sessions().await)
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Session>> {
    Ok(Json(state.engine.session(SessionId(id)).await?))
}

async fn abort_session(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Session>> {
    Ok(Json(state.engine.abort(SessionId(id)).await?))
}

// --- Exam slip ---

async fn exam_slip(State(state): State<AppState>, Path(id): Path<u64>) -> Result<Html<String>> {
    let session = state.engine.session(SessionId(id)).await?;
    if session.state != SessionState::Confirmed {
        return Err(Error::NotConfirmed(session.id));
    }

    // The proposal echoes the preferred slot, so for a confirmed session
    // this is the booked slot.
    let slot: &Slot = &session.slot;
    let student = state
        .directory
        .display_name(session.requester.as_str())
        .await
        .unwrap_or_else(|| session.requester.to_string());

    Ok(Html(slip::render(&student, &session.course, slot)))
}

// --- Bookings ---

async fn list_bookings(State(state): State<AppState>) -> Json<Vec<BookingRecord>> {
    Json(state.engine.ledger().bookings().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Directory;
    use unimerge_engine::NegotiationEngine;
    use unimerge_knowledge::{BookingLedger, ConstraintStore};
    use unimerge_protocol::{CourseCode, RefusalReason, RequesterId};

    fn app_state() -> AppState {
        let engine = NegotiationEngine::new(
            Arc::new(ConstraintStore::new()),
            Arc::new(BookingLedger::new()),
        );
        Arc::new(NodeState {
            engine,
            directory: Directory::builtin(),
        })
    }

    async fn run(
        state: &AppState,
        requester: &str,
        course: &str,
        venue: &str,
        day: &str,
    ) -> SessionId {
        let request = NegotiateRequest::parse(requester, course, venue, day).unwrap();
        state.engine.negotiate(request).await.unwrap().session.id
    }

    #[tokio::test]
    async fn slip_renders_the_roster_display_name() {
        let state = app_state();
        let id = run(&state, "U2021001", "CSC301", "LT1", "Monday").await;

        let html = exam_slip(State(Arc::clone(&state)), Path(id.0))
            .await
            .unwrap()
            .0;
        assert!(html.contains("Adaeze Okafor"));
        assert!(html.contains("CSC301"));
        assert!(html.contains("LT1"));
        assert!(html.contains("Monday"));
    }

    #[tokio::test]
    async fn slip_is_refused_for_non_confirmed_sessions() {
        let state = app_state();
        state
            .engine
            .constraints()
            .set_constraints("LT1", [Weekday::Monday].into_iter().collect())
            .await;
        let id = run(&state, "U2021001", "CSC301", "LT1", "Monday").await;

        let err = exam_slip(State(Arc::clone(&state)), Path(id.0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotConfirmed(_)), "{err}");

        let err = exam_slip(State(state), Path(404)).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn day_list_accepts_array_and_csv_forms() {
        let array: DayList = serde_json::from_str(r#"["Monday", "Friday"]"#).unwrap();
        assert_eq!(
            array.into_days().unwrap(),
            [Weekday::Monday, Weekday::Friday].into_iter().collect()
        );

        let csv: DayList = serde_json::from_str(r#""Monday, friday""#).unwrap();
        assert_eq!(
            csv.into_days().unwrap(),
            [Weekday::Monday, Weekday::Friday].into_iter().collect()
        );

        // The frontend sends "None" when no day is blocked.
        let none: DayList = serde_json::from_str(r#""None""#).unwrap();
        assert!(none.into_days().unwrap().is_empty());

        let empty: DayList = serde_json::from_str("[]").unwrap();
        assert!(empty.into_days().unwrap().is_empty());
    }

    #[test]
    fn day_list_rejects_unknown_tokens() {
        let bad: DayList = serde_json::from_str(r#""Monday, Someday""#).unwrap();
        let err = bad.into_days().unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)), "{err}");
    }

    #[test]
    fn negotiate_request_accepts_the_matric_number_alias() {
        let historical: NegotiateApiRequest = serde_json::from_str(
            r#"{"matricNumber": "U2021001", "courseCode": "CSC301",
                "preferredVenue": "LT1", "preferredDay": "Monday"}"#,
        )
        .unwrap();
        assert_eq!(historical.requester_id, "U2021001");

        let current: NegotiateApiRequest = serde_json::from_str(
            r#"{"requesterId": "U2021001", "courseCode": "CSC301",
                "preferredVenue": "LT1", "preferredDay": "Monday"}"#,
        )
        .unwrap();
        assert_eq!(current.requester_id, "U2021001");
    }

    #[test]
    fn negotiate_response_shapes() {
        let session = Session {
            id: SessionId(3),
            requester: RequesterId::new("U1").unwrap(),
            course: CourseCode::new("CSC301").unwrap(),
            slot: Slot::new("LT1", Weekday::Monday).unwrap(),
            state: SessionState::Confirmed,
            reason: None,
            created_at: 0,
            messages: Vec::new(),
        };

        let confirmed = NegotiateResponse::from(NegotiateResult {
            session: session.clone(),
            outcome: Outcome::Confirmed {
                slot: session.slot.clone(),
            },
        });
        let json = serde_json::to_value(&confirmed).unwrap();
        assert_eq!(json["sessionId"], 3);
        assert_eq!(json["outcome"], "CONFIRMED");
        assert_eq!(json["venue"], "LT1");
        assert_eq!(json["day"], "Monday");
        assert!(json.get("reason").is_none());

        let refused = NegotiateResponse::from(NegotiateResult {
            session,
            outcome: Outcome::Refused {
                reason: RefusalReason::DayProhibited,
            },
        });
        let json = serde_json::to_value(&refused).unwrap();
        assert_eq!(json["outcome"], "REFUSED");
        assert_eq!(json["reason"], "day prohibited for venue");
        assert_eq!(json["reasonCode"], "DAY_PROHIBITED");
        assert!(json.get("venue").is_none());
    }

    #[test]
    fn login_request_uses_camel_case() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"role": "lecturer", "loginId": "L-501"}"#).unwrap();
        assert_eq!(req.role, "lecturer");
        assert_eq!(req.login_id, "L-501");
        assert_eq!(req.role.parse::<Role>().unwrap(), Role::Authority);
    }
}
