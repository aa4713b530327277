//! Products resource.
//!
//! Reads are public; mutations sit behind the auth gate with the admin
//! role and broadcast a change event once the store commit succeeds.

use crate::api::{ApiError, Body, MessageResponse};
use crate::app::AppState;
use crate::models::{Product, ProductPayload};
use crate::realtime::ResourceKind;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductListResponse {
    pub success: bool,
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductResponse {
    pub success: bool,
    pub product: Product,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductCreatedResponse {
    pub success: bool,
    #[serde(rename = "productId")]
    pub product_id: Uuid,
    pub message: String,
}

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::Validation("Invalid product id"))
}

/// GET /api/products
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let products = state
        .products
        .list()
        .map_err(|e| ApiError::internal("list products", e))?;

    Ok(Json(ProductListResponse {
        success: true,
        products,
    }))
}

/// GET /api/products/:id
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let id = parse_id(&id)?;
    let product = state
        .products
        .get(&id)
        .map_err(|e| ApiError::internal("get product", e))?
        .ok_or(ApiError::NotFound("Product not found"))?;

    Ok(Json(ProductResponse {
        success: true,
        product,
    }))
}

/// POST /api/products (admin)
pub async fn create_product(
    State(state): State<AppState>,
    Body(payload): Body<ProductPayload>,
) -> Result<(StatusCode, Json<ProductCreatedResponse>), ApiError> {
    if !payload.validate() {
        return Err(ApiError::Validation("Missing or invalid product fields"));
    }

    let product = state
        .products
        .create(&payload)
        .map_err(|e| ApiError::internal("create product", e))?;

    state.notifier.notify(ResourceKind::Products);

    Ok((
        StatusCode::CREATED,
        Json(ProductCreatedResponse {
            success: true,
            product_id: product.id,
            message: "Product created successfully".to_string(),
        }),
    ))
}

/// PUT /api/products/:id (admin)
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Body(payload): Body<ProductPayload>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    if !payload.validate() {
        return Err(ApiError::Validation("Missing or invalid product fields"));
    }

    let found = state
        .products
        .update(&id, &payload)
        .map_err(|e| ApiError::internal("update product", e))?;
    if !found {
        return Err(ApiError::NotFound("Product not found"));
    }

    state.notifier.notify(ResourceKind::Products);

    Ok(Json(MessageResponse::new("Product updated successfully")))
}

/// DELETE /api/products/:id (admin)
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;

    let found = state
        .products
        .delete(&id)
        .map_err(|e| ApiError::internal("delete product", e))?;
    if !found {
        return Err(ApiError::NotFound("Product not found"));
    }

    state.notifier.notify(ResourceKind::Products);

    Ok(Json(MessageResponse::new("Product deleted successfully")))
}
