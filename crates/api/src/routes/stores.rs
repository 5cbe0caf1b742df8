//! Stores and onboarding.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Account, Store};
use crate::services::StoreService;
use crate::services::stores::{AdminDraft, StoreDraft};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateStoreRequest {
    pub name: String,
    pub address: String,
    #[serde(alias = "cnpj")]
    pub tax_id: String,
}

impl From<CreateStoreRequest> for StoreDraft {
    fn from(req: CreateStoreRequest) -> Self {
        Self {
            name: req.name,
            address: req.address,
            tax_id: req.tax_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AdminRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OnboardRequest {
    #[serde(alias = "store_name")]
    pub name: String,
    #[serde(alias = "store_address")]
    pub address: String,
    #[serde(alias = "cnpj", alias = "cpnj")]
    pub tax_id: String,
    pub admin: AdminRequest,
}

#[derive(Debug, Serialize)]
pub struct OnboardResponse {
    pub store: Store,
    pub admin: Account,
}

/// GET /api/v1/stores
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Store>>> {
    let stores = StoreService::new(state.repos().stores.as_ref()).list().await?;
    Ok(Json(stores))
}

/// POST /api/v1/stores
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateStoreRequest>,
) -> Result<(StatusCode, Json<Store>)> {
    let store = StoreService::new(state.repos().stores.as_ref())
        .create(&req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(store)))
}

/// POST /api/v1/stores/onboard
///
/// Creates the store and its `store_admin` account in one unit of work.
pub async fn onboard(
    State(state): State<AppState>,
    Json(req): Json<OnboardRequest>,
) -> Result<(StatusCode, Json<OnboardResponse>)> {
    let draft = StoreDraft {
        name: req.name,
        address: req.address,
        tax_id: req.tax_id,
    };
    let admin = AdminDraft {
        name: req.admin.name,
        email: req.admin.email,
        password: req.admin.password,
        phone: req.admin.phone,
    };

    let provisioned = StoreService::new(state.repos().stores.as_ref())
        .provision(&draft, admin)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(OnboardResponse {
            store: provisioned.store,
            admin: provisioned.admin,
        }),
    ))
}
