//! Slateboard Whiteboard Server
//!
//! A small HTTP backend that stores whiteboards per user. Identity is
//! taken from the `X-User-Id` header (session issuance lives outside
//! this service); requests without it can only read their own empty
//! listing.
//!
//! ## API
//!
//! ```text
//! GET    /api/whiteboards        list summaries, newest first
//! POST   /api/whiteboards        create or update (existingId)
//! GET    /api/whiteboards/{id}   full whiteboard
//! DELETE /api/whiteboards/{id}   remove
//! ```

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use dashmap::DashMap;
use serde::Deserialize;
use slateboard_core::element::Element;
use slateboard_core::storage::{
    DEFAULT_WHITEBOARD_NAME, Whiteboard, WhiteboardSummary, unix_millis, validate_elements,
};
use std::{collections::HashMap, net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use uuid::Uuid;

const USER_ID_HEADER: &str = "x-user-id";

/// API errors, mapped onto HTTP status codes.
#[derive(Debug)]
enum ApiError {
    Unauthorized,
    NotFound,
    Validation(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "missing or invalid identity").into_response()
            }
            ApiError::NotFound => (StatusCode::NOT_FOUND, "whiteboard not found").into_response(),
            ApiError::Validation(message) => {
                (StatusCode::UNPROCESSABLE_ENTITY, message).into_response()
            }
        }
    }
}

/// Save request body. `existingId` switches create to update.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveRequest {
    name: Option<String>,
    #[serde(default)]
    elements: Vec<Element>,
    existing_id: Option<String>,
}

/// Shared application state: whiteboards keyed by owner, then by id.
struct AppState {
    boards: DashMap<String, HashMap<String, Whiteboard>>,
}

impl AppState {
    fn new() -> Self {
        Self {
            boards: DashMap::new(),
        }
    }

    /// List one user's whiteboards, newest first.
    fn list(&self, user: &str) -> Vec<WhiteboardSummary> {
        let mut summaries: Vec<_> = self
            .boards
            .get(user)
            .map(|boards| boards.values().map(Whiteboard::summary).collect())
            .unwrap_or_default();
        summaries.sort_by(|a: &WhiteboardSummary, b: &WhiteboardSummary| {
            b.updated_at.cmp(&a.updated_at)
        });
        summaries
    }

    fn load(&self, user: &str, id: &str) -> Option<Whiteboard> {
        self.boards.get(user)?.get(id).cloned()
    }

    /// Create a whiteboard, or update one owned by this user.
    fn save(&self, user: &str, request: SaveRequest) -> Result<Whiteboard, ApiError> {
        validate_elements(&request.elements).map_err(|e| ApiError::Validation(e.to_string()))?;
        let mut boards = self.boards.entry(user.to_string()).or_default();
        let now = unix_millis();

        let board = if let Some(id) = request.existing_id {
            let board = boards.get_mut(&id).ok_or(ApiError::NotFound)?;
            if let Some(name) = request.name {
                board.name = name;
            }
            board.elements = request.elements;
            board.updated_at = now;
            board.clone()
        } else {
            let board = Whiteboard {
                id: Uuid::new_v4().to_string(),
                name: request
                    .name
                    .unwrap_or_else(|| DEFAULT_WHITEBOARD_NAME.to_string()),
                elements: request.elements,
                created_at: now,
                updated_at: now,
            };
            boards.insert(board.id.clone(), board.clone());
            board
        };
        Ok(board)
    }

    fn delete(&self, user: &str, id: &str) -> Result<(), ApiError> {
        let mut boards = self.boards.get_mut(user).ok_or(ApiError::NotFound)?;
        boards.remove(id).map(|_| ()).ok_or(ApiError::NotFound)
    }
}

/// Pull the caller's identity out of the request headers.
fn user_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slateboard_server=info,tower_http=info".into()),
        )
        .init();

    let state = Arc::new(AppState::new());

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/whiteboards", get(list_boards).post(save_board))
        .route(
            "/api/whiteboards/{id}",
            get(get_board).delete(delete_board),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 3030));
    info!("Slateboard server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

/// List summaries. An unauthenticated caller owns nothing and gets an
/// empty list rather than an error.
async fn list_boards(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<Vec<WhiteboardSummary>> {
    match user_id(&headers) {
        Some(user) => Json(state.list(&user)),
        None => Json(Vec::new()),
    }
}

async fn get_board(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Whiteboard>, ApiError> {
    let user = user_id(&headers).ok_or(ApiError::NotFound)?;
    state.load(&user, &id).map(Json).ok_or(ApiError::NotFound)
}

async fn save_board(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<SaveRequest>,
) -> Result<Json<Whiteboard>, ApiError> {
    let user = user_id(&headers).ok_or(ApiError::Unauthorized)?;
    let board = state.save(&user, request)?;
    info!("saved whiteboard {} for {}", board.id, user);
    Ok(Json(board))
}

async fn delete_board(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let user = user_id(&headers).ok_or(ApiError::Unauthorized)?;
    state.delete(&user, &id)?;
    info!("deleted whiteboard {} for {}", id, user);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use slateboard_core::element::PathElement;

    fn save_request(elements: Vec<Element>, existing_id: Option<String>) -> SaveRequest {
        SaveRequest {
            name: None,
            elements,
            existing_id,
        }
    }

    fn rectangle() -> Element {
        Element::Rectangle(PathElement::new(
            vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)],
            "#000000",
            2.0,
        ))
    }

    #[test]
    fn test_save_and_list_per_user() {
        let state = AppState::new();
        let board = state.save("alice", save_request(vec![rectangle()], None)).unwrap();
        assert_eq!(board.name, DEFAULT_WHITEBOARD_NAME);

        assert_eq!(state.list("alice").len(), 1);
        assert!(state.list("bob").is_empty());
        assert!(state.load("bob", &board.id).is_none());
        assert_eq!(state.load("alice", &board.id).unwrap(), board);
    }

    #[test]
    fn test_update_requires_owned_id() {
        let state = AppState::new();
        let board = state.save("alice", save_request(vec![], None)).unwrap();

        let result = state.save("bob", save_request(vec![], Some(board.id.clone())));
        assert!(matches!(result, Err(ApiError::NotFound)));

        let updated = state
            .save("alice", save_request(vec![rectangle()], Some(board.id.clone())))
            .unwrap();
        assert_eq!(updated.id, board.id);
        assert_eq!(updated.created_at, board.created_at);
        assert_eq!(updated.elements.len(), 1);
        assert_eq!(state.list("alice").len(), 1);
    }

    #[test]
    fn test_save_rejects_invalid_elements() {
        let state = AppState::new();
        let bad = Element::Line(PathElement::new(vec![Point::new(0.0, 0.0)], "#000000", 2.0));
        let result = state.save("alice", save_request(vec![bad], None));
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_delete_scoped_to_owner() {
        let state = AppState::new();
        let board = state.save("alice", save_request(vec![], None)).unwrap();

        assert!(matches!(
            state.delete("bob", &board.id),
            Err(ApiError::NotFound)
        ));
        state.delete("alice", &board.id).unwrap();
        assert!(state.load("alice", &board.id).is_none());
    }

    #[test]
    fn test_user_id_header_extraction() {
        let mut headers = HeaderMap::new();
        assert!(user_id(&headers).is_none());

        headers.insert(USER_ID_HEADER, "".parse().unwrap());
        assert!(user_id(&headers).is_none());

        headers.insert(USER_ID_HEADER, "alice".parse().unwrap());
        assert_eq!(user_id(&headers).as_deref(), Some("alice"));
    }

    #[test]
    fn test_save_request_wire_shape() {
        let request: SaveRequest = serde_json::from_str(
            r#"{"name":"Plan","elements":[],"existingId":"b1"}"#,
        )
        .unwrap();
        assert_eq!(request.name.as_deref(), Some("Plan"));
        assert_eq!(request.existing_id.as_deref(), Some("b1"));

        // All fields are optional.
        let request: SaveRequest = serde_json::from_str("{}").unwrap();
        assert!(request.name.is_none());
        assert!(request.elements.is_empty());
        assert!(request.existing_id.is_none());
    }
}
