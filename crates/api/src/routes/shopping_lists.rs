//! Shopping lists. Every list-scoped handler goes through the ownership
//! check in [`ShoppingListService::authorize`].

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use localiza_core::{ProductId, ShoppingListId, ShoppingListItemId, StoreId};

use crate::error::Result;
use crate::models::{
    AuthContext, ListItemDetail, NewListItem, PricedList, ShoppingList, ShoppingListItem,
    ShoppingListSummary,
};
use crate::services::ShoppingListService;
use crate::state::AppState;

fn service(state: &AppState) -> ShoppingListService<'_> {
    ShoppingListService::new(
        state.repos().shopping_lists.as_ref(),
        state.repos().stores.as_ref(),
    )
}

#[derive(Debug, Deserialize)]
pub struct CreateListRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct CheckItemRequest {
    pub is_checked: bool,
}

#[derive(Debug, Deserialize)]
pub struct OptimizeQuery {
    pub store_id: StoreId,
}

/// POST /api/v1/shopping-lists
pub async fn create(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(req): Json<CreateListRequest>,
) -> Result<(StatusCode, Json<ShoppingList>)> {
    let list = service(&state).create_list(&ctx, &req.name).await?;
    Ok((StatusCode::CREATED, Json(list)))
}

/// GET /api/v1/shopping-lists
pub async fn list(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> Result<Json<Vec<ShoppingListSummary>>> {
    Ok(Json(service(&state).lists_for(&ctx).await?))
}

/// POST /api/v1/shopping-lists/{list_id}/items
pub async fn add_item(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(list_id): Path<ShoppingListId>,
    Json(req): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<ShoppingListItem>)> {
    let item = service(&state)
        .add_item(
            &ctx,
            list_id,
            NewListItem {
                product_id: req.product_id,
                quantity: req.quantity,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /api/v1/shopping-lists/{list_id}/items
pub async fn items(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(list_id): Path<ShoppingListId>,
) -> Result<Json<Vec<ListItemDetail>>> {
    Ok(Json(service(&state).items(&ctx, list_id).await?))
}

/// PATCH /api/v1/shopping-lists/{list_id}/items/{item_id}
pub async fn set_item_checked(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path((list_id, item_id)): Path<(ShoppingListId, ShoppingListItemId)>,
    Json(req): Json<CheckItemRequest>,
) -> Result<Json<ShoppingListItem>> {
    let item = service(&state)
        .set_item_checked(&ctx, list_id, item_id, req.is_checked)
        .await?;
    Ok(Json(item))
}

/// GET /api/v1/shopping-lists/{list_id}/optimize?store_id=
pub async fn optimize(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(list_id): Path<ShoppingListId>,
    Query(query): Query<OptimizeQuery>,
) -> Result<Json<PricedList>> {
    let priced = service(&state)
        .priced_view(&ctx, list_id, query.store_id)
        .await?;
    Ok(Json(priced))
}
