//! Product catalog and checkout endpoints

use axum::{
    Extension, Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Query, State},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::{
    AppState,
    checkout::CheckoutError,
    error::{ApiError, is_unique_violation},
    extract::ApiJson,
    images::{ImageStoreError, MAX_IMAGE_BYTES},
    middleware::{AuthUser, auth_middleware},
    models::{CartLine, ProductFields, ProductWithCreator},
    validation,
};

/// Multipart parsing overhead on top of the image size cap
const MAX_UPLOAD_BODY_BYTES: usize = MAX_IMAGE_BYTES + 64 * 1024;

/// Create the router for the product endpoints
///
/// Listing is public; everything else requires a valid session token.
pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route(
            "/",
            post(create_product)
                .put(update_product)
                .delete(delete_product),
        )
        .route("/product", get(get_product))
        .route("/buy", post(buy))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES));

    Router::new().route("/", get(list_products)).merge(protected)
}

/// Query parameter carrying a product id
#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: i64,
}

/// Request body for checkout
#[derive(Debug, Deserialize)]
pub struct BuyRequest {
    #[serde(default)]
    pub cart: Vec<CartLine>,
}

/// List all products, most recently updated first
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state.product_repository.list().await?;
    let data: Vec<_> = products
        .into_iter()
        .map(ProductWithCreator::into_response)
        .collect();

    Ok(Json(json!({
        "error": false,
        "data": data,
    })))
}

/// Fetch one product by id
pub async fn get_product(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .product_repository
        .find_with_creator(query.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    Ok(Json(json!({
        "error": false,
        "product": product.into_response(),
    })))
}

/// Create a product from a multipart form, image optional
pub async fn create_product(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = ProductForm::parse(multipart).await?;
    let fields = form.validated(1)?;
    let image_url = store_image(&state, form.image.as_ref()).await?;

    match state
        .product_repository
        .create(&fields, user.id, image_url)
        .await
    {
        Ok(_) => Ok(Json(json!({
            "error": false,
            "msg": "Product created",
        }))),
        Err(e) if is_unique_violation(&e) => Err(ApiError::Validation(
            "A product with that name already exists. Please choose another name.".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

/// Overwrite a product's mutable fields, image optional
pub async fn update_product(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<IdQuery>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = ProductForm::parse(multipart).await?;
    // Purchases may have driven stock to 0, so updates allow it.
    let fields = form.validated(0)?;
    let image_url = store_image(&state, form.image.as_ref()).await?;

    let updated = state
        .product_repository
        .update(query.id, &fields, user.id, image_url)
        .await;

    match updated {
        Ok(Some(_)) => Ok(Json(json!({
            "error": false,
            "msg": "Product updated",
        }))),
        Ok(None) => Err(ApiError::NotFound(
            "Cannot update: the product does not exist".to_string(),
        )),
        Err(e) if is_unique_violation(&e) => Err(ApiError::Validation(
            "A product with that name already exists. Please choose another name.".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

/// Delete a product
pub async fn delete_product(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state.product_repository.delete(query.id).await?;

    if deleted {
        Ok(Json(json!({
            "error": false,
            "msg": "Product deleted",
        })))
    } else {
        Err(ApiError::NotFound("Product not found".to_string()))
    }
}

/// Validate the cart and decrement stock, all-or-nothing
///
/// A body where `cart` is not an array never reaches the handler; the
/// extractor turns it into the same 400 envelope as an empty cart.
pub async fn buy(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<BuyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.cart.is_empty() {
        return Err(ApiError::Validation(
            "Cart is empty or malformed".to_string(),
        ));
    }

    match state
        .product_repository
        .checkout(user.id, &payload.cart)
        .await
    {
        Ok(()) => Ok(Json(json!({
            "error": false,
            "msg": "Purchase processed and stock updated",
        }))),
        Err(CheckoutError::Rejected { problems }) => {
            Err(ApiError::Validation(problems.join("; ")))
        }
        Err(CheckoutError::Database(e)) => Err(e.into()),
    }
}

/// One uploaded image part
struct UploadedImage {
    bytes: Bytes,
    file_name: String,
    content_type: Option<String>,
}

/// Raw multipart fields of a product form
#[derive(Default)]
struct ProductForm {
    name: Option<String>,
    price: Option<String>,
    stock: Option<String>,
    image: Option<UploadedImage>,
}

impl ProductForm {
    /// Drain the multipart body into the known fields
    async fn parse(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|_| ApiError::Validation("Malformed multipart body".to_string()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match name.as_str() {
                "name" => form.name = Some(text(field).await?),
                "price" => form.price = Some(text(field).await?),
                "stock" => form.stock = Some(text(field).await?),
                "image" => {
                    let file_name = field
                        .file_name()
                        .map(str::to_string)
                        .unwrap_or_default();
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await.map_err(|_| {
                        ApiError::Validation("Image upload was truncated or too large".to_string())
                    })?;

                    // An image input submitted empty is treated as absent.
                    if !bytes.is_empty() {
                        form.image = Some(UploadedImage {
                            bytes,
                            file_name,
                            content_type,
                        });
                    }
                }
                _ => {}
            }
        }

        Ok(form)
    }

    /// Check field presence and constraints, producing validated fields
    fn validated(&self, min_stock: i32) -> Result<ProductFields, ApiError> {
        let (Some(name), Some(price), Some(stock)) = (
            self.name.as_deref().filter(|s| !s.trim().is_empty()),
            self.price.as_deref().filter(|s| !s.trim().is_empty()),
            self.stock.as_deref().filter(|s| !s.trim().is_empty()),
        ) else {
            return Err(ApiError::Validation("All fields are required".to_string()));
        };

        let price: Decimal = price
            .trim()
            .parse()
            .map_err(|_| ApiError::Validation("Price must be a number".to_string()))?;
        let stock: i32 = stock
            .trim()
            .parse()
            .map_err(|_| ApiError::Validation("Stock must be an integer".to_string()))?;

        validation::validate_product_name(name).map_err(ApiError::Validation)?;
        validation::validate_price(price).map_err(ApiError::Validation)?;
        validation::validate_stock(stock, min_stock).map_err(ApiError::Validation)?;

        Ok(ProductFields {
            name: name.trim().to_string(),
            price,
            stock,
        })
    }
}

async fn text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|_| ApiError::Validation("Malformed multipart body".to_string()))
}

/// Persist the uploaded image, if any, and return its public URL
async fn store_image(
    state: &AppState,
    image: Option<&UploadedImage>,
) -> Result<Option<String>, ApiError> {
    let Some(image) = image else {
        return Ok(None);
    };

    let stored = state
        .image_store
        .store(&image.bytes, &image.file_name, image.content_type.as_deref())
        .await
        .map_err(|e| match e {
            ImageStoreError::UnsupportedFormat | ImageStoreError::TooLarge => {
                ApiError::Validation(e.to_string())
            }
            ImageStoreError::Io(io_err) => {
                error!("Failed to store image: {io_err}");
                ApiError::Internal
            }
        })?;

    Ok(Some(state.image_store.url_for(&stored)))
}
