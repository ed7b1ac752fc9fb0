//! HTTP binding of the game service.

use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use stakes_tictactoe::{Address, Game, GameId, StorageError};
use tokio::net::TcpListener;
use tracing::{debug, error, info, instrument};

use crate::api::{
    BalanceResponse, CALLER_HEADER, CallResponse, CallResult, CreateGameRequest, FundRequest,
    MoveRequest,
};
use crate::service::{GameService, ServiceError};

/// Address taken from the `x-caller` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub Address);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(CALLER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| Caller(Address::new(value)))
            .ok_or(ApiError::MissingCaller)
    }
}

/// Failures reported with a non-2xx status other than a rejected call.
#[derive(Debug)]
pub enum ApiError {
    /// No `x-caller` header.
    MissingCaller,
    /// No record with this id.
    GameNotFound(GameId),
    /// Funding while the faucet is off.
    FaucetDisabled,
    /// The store failed.
    Storage(StorageError),
}

impl From<StorageError> for ApiError {
    fn from(error: StorageError) -> Self {
        ApiError::Storage(error)
    }
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Storage(error) => ApiError::Storage(error),
            ServiceError::FaucetDisabled => ApiError::FaucetDisabled,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::MissingCaller => (
                StatusCode::UNAUTHORIZED,
                format!("missing {} header", CALLER_HEADER),
            ),
            ApiError::GameNotFound(id) => (StatusCode::NOT_FOUND, format!("game {} not found", id)),
            ApiError::FaucetDisabled => (StatusCode::FORBIDDEN, "faucet is disabled".to_string()),
            ApiError::Storage(err) => {
                error!(error = %err, "Storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "storage failure".to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Status for a mutating call: 200 when committed, 400 when rejected.
fn call_status<T>(result: &CallResult<T>) -> StatusCode {
    if result.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    }
}

/// Builds the router over a service.
pub fn router(service: GameService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/games", get(list_games).post(create_game))
        .route("/games/{id}", get(get_game))
        .route("/games/{id}/join", post(join_game))
        .route("/games/{id}/play", post(play))
        .route("/accounts/{address}/balance", get(balance))
        .route("/accounts/{address}/fund", post(fund))
        .with_state(service)
}

/// Serves the router until ctrl-c.
///
/// # Errors
///
/// Returns an I/O error if serving fails.
#[instrument(skip(listener, service))]
pub async fn serve(listener: TcpListener, service: GameService) -> std::io::Result<()> {
    info!(address = ?listener.local_addr().ok(), "Game service listening");
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[instrument(skip(service))]
async fn list_games(State(service): State<GameService>) -> Result<Json<Vec<Game>>, ApiError> {
    let games = service.list_games().await?;
    debug!(count = games.len(), "Listing games");
    Ok(Json(games))
}

#[instrument(skip(service))]
async fn get_game(
    State(service): State<GameService>,
    Path(id): Path<GameId>,
) -> Result<Json<Game>, ApiError> {
    service
        .get_game(id)
        .await?
        .map(Json)
        .ok_or(ApiError::GameNotFound(id))
}

#[instrument(skip(service, caller), fields(caller = %caller.0))]
async fn create_game(
    State(service): State<GameService>,
    caller: Caller,
    Json(request): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<CallResponse>), ApiError> {
    let response = service
        .create_game(&caller.0, request.bet_amount, request.move_index, request.mv)
        .await?;
    Ok((call_status(&response.result), Json(response)))
}

#[instrument(skip(service, caller), fields(caller = %caller.0))]
async fn join_game(
    State(service): State<GameService>,
    Path(id): Path<GameId>,
    caller: Caller,
    Json(request): Json<MoveRequest>,
) -> Result<(StatusCode, Json<CallResponse>), ApiError> {
    let response = service
        .join_game(&caller.0, id, request.move_index, request.mv)
        .await?;
    Ok((call_status(&response.result), Json(response)))
}

#[instrument(skip(service, caller), fields(caller = %caller.0))]
async fn play(
    State(service): State<GameService>,
    Path(id): Path<GameId>,
    caller: Caller,
    Json(request): Json<MoveRequest>,
) -> Result<(StatusCode, Json<CallResponse>), ApiError> {
    let response = service
        .play(&caller.0, id, request.move_index, request.mv)
        .await?;
    Ok((call_status(&response.result), Json(response)))
}

#[instrument(skip(service))]
async fn balance(
    State(service): State<GameService>,
    Path(address): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let address = Address::new(address);
    let balance = service.balance(&address).await?;
    Ok(Json(BalanceResponse { address, balance }))
}

#[instrument(skip(service))]
async fn fund(
    State(service): State<GameService>,
    Path(address): Path<String>,
    Json(request): Json<FundRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let result = service.fund(&Address::new(address), request.amount).await?;
    Ok((call_status(&result), Json(json!({ "result": result }))))
}
