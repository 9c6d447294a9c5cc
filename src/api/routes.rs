//! API route handlers

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Serialize;

use super::error::ApiError;
use super::server::AppState;
use crate::analysis::ContractAnalysis;
use crate::auth::{AuthenticatedUser, LoginRequest, RegisterRequest, UserResponse};
use crate::contracts::{Contract, ContractId, ContractUpdate, NewContract};
use crate::error::Error;
use crate::extract::{self, DocumentKind};

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Multipart field carrying the uploaded document
const UPLOAD_FIELD: &str = "file";

// Response types

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub id: ContractId,
    pub filename: String,
    /// Username of the uploader
    pub uploaded_by: String,
    pub analysis: ContractAnalysis,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ContractListResponse {
    pub contracts: Vec<Contract>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub message: String,
    pub updated_contract: Contract,
}

// Public routes

pub async fn root() -> impl IntoResponse {
    MessageResponse::new("Contract analysis API is running")
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let token = state.auth.login(&req.email, &req.password).await?;
    Ok(Json(token))
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state.auth.register(req).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

// Protected routes

pub async fn current_user(
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> impl IntoResponse {
    Json(UserResponse::from(user))
}

pub async fn upload_contract(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let (filename, bytes) = loop {
        let Some(field) = multipart.next_field().await? else {
            return Err(ApiError::BadRequest(format!(
                "Missing multipart field '{}'",
                UPLOAD_FIELD
            )));
        };

        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ApiError::BadRequest("Uploaded file has no name".to_string()))?;
        let bytes = field.bytes().await?;
        break (filename, bytes);
    };

    let kind = DocumentKind::from_filename(&filename)?;

    if state
        .store
        .find_contract_by_filename(&filename)
        .await?
        .is_some()
    {
        return Err(Error::FilenameTaken(filename).into());
    }

    let analyzer = state.analyzer.clone().ok_or(Error::AnalyzerDisabled)?;

    tracing::info!(
        user_id = user.id,
        filename = %filename,
        kind = %kind,
        size = bytes.len(),
        "Analyzing uploaded contract"
    );

    let text = extract::extract_text_blocking(bytes.to_vec(), kind).await?;
    if text.is_empty() {
        return Err(Error::Extraction(format!("no text found in {}", filename)).into());
    }

    let analysis = analyzer.analyze(&text).await?;

    let contract = state
        .store
        .create_contract(NewContract::from_analysis(filename, user.id, &analysis))
        .await?;

    tracing::info!(contract_id = contract.id, "Stored contract analysis");

    Ok(Json(UploadResponse {
        id: contract.id,
        filename: contract.filename,
        uploaded_by: user.username,
        analysis,
        message: "Contract uploaded and analyzed successfully".to_string(),
    }))
}

pub async fn list_contracts(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let contracts = state.store.list_contracts().await?;

    if contracts.is_empty() {
        return Err(ApiError::NotFound("No contracts found".to_string()));
    }

    Ok(Json(ContractListResponse {
        total: contracts.len(),
        contracts,
    }))
}

pub async fn get_contract(
    State(state): State<AppState>,
    Path(id): Path<ContractId>,
) -> ApiResult<impl IntoResponse> {
    state
        .store
        .find_contract_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| contract_not_found(id))
}

pub async fn get_contract_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state
        .store
        .find_contract_by_filename(&name)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Contract '{}' not found", name)))
}

pub async fn update_contract(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<ContractId>,
    Json(changes): Json<ContractUpdate>,
) -> ApiResult<impl IntoResponse> {
    if changes.is_empty() {
        return Err(ApiError::BadRequest(
            "No fields to update were provided".to_string(),
        ));
    }
    if let Some(filename) = &changes.filename {
        if filename.trim().is_empty() {
            return Err(ApiError::BadRequest("filename must not be empty".to_string()));
        }
    }

    let updated = state
        .store
        .update_contract(id, changes)
        .await?
        .ok_or_else(|| contract_not_found(id))?;

    tracing::info!(contract_id = id, user_id = user.id, "Updated contract");

    Ok(Json(UpdateResponse {
        message: "Contract updated successfully".to_string(),
        updated_contract: updated,
    }))
}

pub async fn delete_contract(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<ContractId>,
) -> ApiResult<impl IntoResponse> {
    if !state.store.delete_contract(id).await? {
        return Err(contract_not_found(id));
    }

    tracing::info!(contract_id = id, user_id = user.id, "Deleted contract");
    Ok(MessageResponse::new(format!(
        "Contract {} deleted successfully",
        id
    )))
}

fn contract_not_found(id: ContractId) -> ApiError {
    ApiError::NotFound(format!("Contract {} not found", id))
}
