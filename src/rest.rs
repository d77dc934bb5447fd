use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::db::DbConnection;
use crate::domain::{AccountStore, TransactionService};
use crate::error::ApiError;
use crate::models::{
    CreateAccountRequest, CreateTransactionRequest, TransactionStatusUpdate,
    UpdateAccountRequest, UpdateTransactionRequest,
};

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountStore,
    pub transactions: TransactionService,
}

impl AppState {
    pub fn new(db: DbConnection) -> Self {
        Self {
            accounts: AccountStore::new(db.clone()),
            transactions: TransactionService::new(db),
        }
    }
}

/// Build the full route table with permissive CORS on every route.
///
/// The POST routes keep their trailing slash; that is the surface clients
/// already speak.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route("/accounts", get(list_accounts))
        .route("/accounts/", post(create_account))
        .route(
            "/accounts/:id",
            get(get_account).put(update_account).delete(delete_account),
        )
        .route("/transactions", get(list_transactions))
        .route("/transactions/", post(create_transaction))
        .route(
            "/transactions/:id",
            get(get_transaction).put(update_transaction),
        )
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}

async fn list_accounts(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    info!("GET /accounts");
    let accounts = state.accounts.list().await?;
    Ok(Json(accounts))
}

async fn create_account(
    State(state): State<AppState>,
    Json(req): Json<CreateAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!("POST /accounts/ - balance: {}", req.balance);
    let account = state.accounts.create(req.balance).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    info!("GET /accounts/{id}");
    let account = state.accounts.fetch(&id).await?;
    Ok(Json(account))
}

async fn update_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!("PUT /accounts/{id} - balance: {}", req.balance);
    let account = state.accounts.update(&id, req.balance).await?;
    Ok(Json(account))
}

async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    info!("DELETE /accounts/{id}");
    state.accounts.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_transactions(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    info!("GET /transactions");
    let transactions = state.transactions.list().await?;
    Ok(Json(transactions))
}

async fn create_transaction(
    State(state): State<AppState>,
    Json(req): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!(
        "POST /transactions/ - account: {}, type: {}, amount: {}",
        req.account_id,
        req.kind.as_str(),
        req.amount
    );
    let transaction = state.transactions.create(req).await?;
    Ok(Json(transaction))
}

async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    info!("GET /transactions/{id}");
    let transaction = state.transactions.fetch(&id).await?;
    Ok(Json(transaction))
}

async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTransactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!("PUT /transactions/{id} - status: {}", req.status);
    let status = state.transactions.update_status(&id, &req.status).await?;
    Ok(Json(TransactionStatusUpdate { id, status }))
}

/// Liveness endpoint. Never touches storage.
async fn health() -> impl IntoResponse {
    Json(json!({"status": "healthy"}))
}
