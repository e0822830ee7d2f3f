// HTTP handlers for the vehicle catalog endpoints

use std::collections::HashMap;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::auth::middleware::AuthenticatedUser;
use crate::products::error::ProductError;
use crate::products::models::{
    CreateProduct, ListProductsQuery, ProductImageResponse, ProductListResponse, ProductResponse,
    UpdateProduct,
};
use crate::AppState;

const DEFAULT_PAGE_SIZE: i64 = 30;
const MAX_PAGE_SIZE: i64 = 100;

/// Handler for GET /api/products
/// Returns one page of listings plus the total count
#[utoipa::path(
    get,
    path = "/api/products",
    params(ListProductsQuery),
    responses(
        (status = 200, description = "Page of listings", body = ProductListResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "products"
)]
pub async fn list_products_handler(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<ProductListResponse>, ProductError> {
    let skip = query.skip.unwrap_or(0).max(0);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    tracing::debug!(skip, limit, "Listing products");

    let products = state.products_repo.list(skip, limit).await?;
    let total = state.products_repo.count().await?;

    let ids: Vec<i32> = products.iter().map(|p| p.id).collect();
    let images = state.images_repo.find_by_product_ids(&ids).await?;

    let mut by_product: HashMap<i32, Vec<String>> = HashMap::new();
    for image in images {
        by_product.entry(image.product_id).or_default().push(image.path);
    }

    let products = products
        .into_iter()
        .map(|p| {
            let paths = by_product.remove(&p.id).unwrap_or_default();
            ProductResponse::from_parts(p, paths)
        })
        .collect();

    Ok(Json(ProductListResponse {
        products,
        total,
        skip,
        limit,
    }))
}

/// Handler for GET /api/products/:id
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Listing found", body = ProductResponse),
        (status = 404, description = "Listing not found")
    ),
    tag = "products"
)]
pub async fn get_product_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductResponse>, ProductError> {
    let product = state
        .products_repo
        .find_by_id(id)
        .await?
        .ok_or(ProductError::NotFound)?;

    let images = state.images_repo.find_by_product_id(id).await?;
    let paths = images.into_iter().map(|i| i.path).collect();

    Ok(Json(ProductResponse::from_parts(product, paths)))
}

/// Handler for POST /api/products
/// Creates a new listing (authenticated)
#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProduct,
    responses(
        (status = 201, description = "Listing created", body = ProductResponse),
        (status = 400, description = "Invalid input data"),
        (status = 401, description = "Missing or invalid access token")
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn create_product_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateProduct>,
) -> Result<(StatusCode, Json<ProductResponse>), ProductError> {
    payload
        .validate()
        .map_err(|e| ProductError::ValidationError(e.to_string()))?;

    let product = state
        .products_repo
        .create(
            &payload.title,
            &payload.description,
            payload.price,
            payload.cash_price,
            payload.discount_percentage,
            &payload.city,
            payload.mileage,
            &payload.brand,
            &payload.category,
            &payload.thumbnail,
        )
        .await?;

    tracing::info!(product_id = product.id, user_id = user.user_id, "Created listing");
    Ok((
        StatusCode::CREATED,
        Json(ProductResponse::from_parts(product, Vec::new())),
    ))
}

/// Handler for PUT /api/products/:id
/// Partial update; omitted fields keep their current values (authenticated)
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product ID")),
    request_body = UpdateProduct,
    responses(
        (status = 200, description = "Listing updated", body = ProductResponse),
        (status = 400, description = "Invalid input data"),
        (status = 401, description = "Missing or invalid access token"),
        (status = 404, description = "Listing not found")
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn update_product_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProduct>,
) -> Result<Json<ProductResponse>, ProductError> {
    payload
        .validate()
        .map_err(|e| ProductError::ValidationError(e.to_string()))?;

    let product = state.products_repo.update(id, payload).await?;

    let images = state.images_repo.find_by_product_id(id).await?;
    let paths = images.into_iter().map(|i| i.path).collect();

    tracing::info!(product_id = id, user_id = user.user_id, "Updated listing");
    Ok(Json(ProductResponse::from_parts(product, paths)))
}

/// Handler for DELETE /api/products/:id
/// Removes the listing, its image rows, and the stored files (authenticated)
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Listing deleted"),
        (status = 401, description = "Missing or invalid access token"),
        (status = 404, description = "Listing not found")
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn delete_product_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ProductError> {
    let images = state.images_repo.find_by_product_id(id).await?;

    let deleted = state.products_repo.delete(id).await?;
    if !deleted {
        return Err(ProductError::NotFound);
    }

    // Rows are gone (cascade); now reclaim the stored files. A missing
    // file is not an error at this point.
    for image in images {
        if let Err(e) = state.image_store.delete(&image.path).await {
            tracing::warn!(path = %image.path, "Failed to delete stored image: {}", e);
        }
    }

    tracing::info!(product_id = id, user_id = user.user_id, "Deleted listing");
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for POST /api/products/:id/images
/// Multipart upload; every file part is stored and attached (authenticated)
#[utoipa::path(
    post,
    path = "/api/products/{id}/images",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 201, description = "Images attached", body = Vec<ProductImageResponse>),
        (status = 400, description = "No file parts in the request"),
        (status = 401, description = "Missing or invalid access token"),
        (status = 404, description = "Listing not found")
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn upload_images_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<ProductImageResponse>>), ProductError> {
    state
        .products_repo
        .find_by_id(id)
        .await?
        .ok_or(ProductError::NotFound)?;

    let mut attached = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ProductError::InvalidImage(e.to_string()))?
    {
        let filename = match field.file_name() {
            Some(name) => name.to_string(),
            // Non-file form fields are ignored.
            None => continue,
        };

        let data = field
            .bytes()
            .await
            .map_err(|e| ProductError::InvalidImage(e.to_string()))?;
        if data.is_empty() {
            continue;
        }

        let path = state
            .image_store
            .save(&filename, &data)
            .await
            .map_err(|e| ProductError::StorageError(e.to_string()))?;

        let image = state.images_repo.insert(id, &path).await?;
        attached.push(image.into());
    }

    if attached.is_empty() {
        return Err(ProductError::InvalidImage(
            "Request contained no image files".to_string(),
        ));
    }

    tracing::info!(
        product_id = id,
        user_id = user.user_id,
        count = attached.len(),
        "Attached images"
    );
    Ok((StatusCode::CREATED, Json(attached)))
}

/// Handler for DELETE /api/products/:id/images/:image_id
/// Detaches one image and removes its stored file (authenticated)
#[utoipa::path(
    delete,
    path = "/api/products/{id}/images/{image_id}",
    params(
        ("id" = i32, Path, description = "Product ID"),
        ("image_id" = i32, Path, description = "Image ID")
    ),
    responses(
        (status = 204, description = "Image removed"),
        (status = 401, description = "Missing or invalid access token"),
        (status = 404, description = "Listing or image not found")
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn delete_image_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((id, image_id)): Path<(i32, i32)>,
) -> Result<StatusCode, ProductError> {
    let image = state
        .images_repo
        .find_by_id(id, image_id)
        .await?
        .ok_or(ProductError::ImageNotFound)?;

    state.images_repo.delete(image.id).await?;

    if let Err(e) = state.image_store.delete(&image.path).await {
        tracing::warn!(path = %image.path, "Failed to delete stored image: {}", e);
    }

    tracing::info!(product_id = id, image_id, user_id = user.user_id, "Removed image");
    Ok(StatusCode::NO_CONTENT)
}
