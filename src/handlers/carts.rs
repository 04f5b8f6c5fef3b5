use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::domain::cart::{ensure_positive_quantity, CartItem, CartView, StagedCartItem, UpdateMode};
use crate::domain::errors::DomainError;
use crate::domain::ports::UnitOfWork;
use crate::errors::AppError;
use crate::infrastructure::staged_cart::STAGED_CART_COOKIE;
use crate::state::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

impl TryFrom<AddItemRequest> for StagedCartItem {
    type Error = DomainError;

    fn try_from(req: AddItemRequest) -> Result<Self, Self::Error> {
        ensure_positive_quantity(req.quantity)?;
        Ok(StagedCartItem {
            product_id: req.product_id,
            quantity: req.quantity,
        })
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UpdateModeRequest {
    Increment,
    Decrement,
    Set,
}

impl From<UpdateModeRequest> for UpdateMode {
    fn from(mode: UpdateModeRequest) -> Self {
        match mode {
            UpdateModeRequest::Increment => UpdateMode::Increment,
            UpdateModeRequest::Decrement => UpdateMode::Decrement,
            UpdateModeRequest::Set => UpdateMode::Set,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateItemRequest {
    pub quantity: i32,
    pub mode: UpdateModeRequest,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemResponse {
    pub product_id: Uuid,
    pub quantity: i32,
}

impl From<CartItem> for CartItemResponse {
    fn from(item: CartItem) -> Self {
        CartItemResponse {
            product_id: item.product_id,
            quantity: item.quantity,
        }
    }
}

impl From<StagedCartItem> for CartItemResponse {
    fn from(item: StagedCartItem) -> Self {
        CartItemResponse {
            product_id: item.product_id,
            quantity: item.quantity,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub created_at: String,
    pub items: Vec<CartItemResponse>,
}

impl From<CartView> for CartResponse {
    fn from(view: CartView) -> Self {
        CartResponse {
            id: view.cart.id,
            owner_id: view.cart.owner_id,
            created_at: view.cart.created_at.to_rfc3339(),
            items: view.items.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClearCartResponse {
    /// `false` when the cart was already empty.
    pub cleared: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StagedCartResponse {
    pub items: Vec<CartItemResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MergeCartResponse {
    pub cart_id: Uuid,
    pub merged: Vec<CartItemResponse>,
    /// Staged products that no longer exist and were dropped.
    pub skipped: Vec<Uuid>,
}

// ── Persisted cart ───────────────────────────────────────────────────────────

/// GET /cart
#[utoipa::path(
    get,
    path = "/cart",
    responses(
        (status = 200, description = "The caller's cart", body = CartResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Cart not found"),
    ),
    security(("bearer" = [])),
    tag = "cart"
)]
pub async fn get_cart<U: UnitOfWork>(
    state: web::Data<AppState<U>>,
    user: AuthUser,
) -> Result<HttpResponse, AppError> {
    let view = web::block(move || state.carts.get_cart(user.user_id)).await??;
    Ok(HttpResponse::Ok().json(CartResponse::from(view)))
}

/// POST /cart
#[utoipa::path(
    post,
    path = "/cart",
    responses(
        (status = 201, description = "Cart created", body = CartResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "User not found"),
        (status = 409, description = "The caller already has a cart"),
    ),
    security(("bearer" = [])),
    tag = "cart"
)]
pub async fn create_cart<U: UnitOfWork>(
    state: web::Data<AppState<U>>,
    user: AuthUser,
) -> Result<HttpResponse, AppError> {
    let cart = web::block(move || state.carts.create_cart(user.user_id)).await??;
    Ok(HttpResponse::Created().json(CartResponse::from(CartView {
        cart,
        items: Vec::new(),
    })))
}

/// POST /cart/items
///
/// Adding a product that is already in the cart increments its quantity.
#[utoipa::path(
    post,
    path = "/cart/items",
    request_body = AddItemRequest,
    responses(
        (status = 200, description = "Resulting cart line", body = CartItemResponse),
        (status = 400, description = "Quantity must be positive"),
        (status = 404, description = "Cart or product not found"),
    ),
    security(("bearer" = [])),
    tag = "cart"
)]
pub async fn add_item<U: UnitOfWork>(
    state: web::Data<AppState<U>>,
    user: AuthUser,
    body: web::Json<AddItemRequest>,
) -> Result<HttpResponse, AppError> {
    let AddItemRequest {
        product_id,
        quantity,
    } = body.into_inner();

    let item =
        web::block(move || state.carts.add_item(user.user_id, product_id, quantity)).await??;
    Ok(HttpResponse::Ok().json(CartItemResponse::from(item)))
}

/// PATCH /cart/items/{product_id}
#[utoipa::path(
    patch,
    path = "/cart/items/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product UUID"),
    ),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Updated cart line", body = CartItemResponse),
        (status = 400, description = "Quantity out of range"),
        (status = 404, description = "Cart or item not found"),
    ),
    security(("bearer" = [])),
    tag = "cart"
)]
pub async fn update_item<U: UnitOfWork>(
    state: web::Data<AppState<U>>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateItemRequest>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let UpdateItemRequest { quantity, mode } = body.into_inner();

    let item = web::block(move || {
        state
            .carts
            .update_item(user.user_id, product_id, quantity, mode.into())
    })
    .await??;
    Ok(HttpResponse::Ok().json(CartItemResponse::from(item)))
}

/// DELETE /cart/items/{product_id}
#[utoipa::path(
    delete,
    path = "/cart/items/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product UUID"),
    ),
    responses(
        (status = 200, description = "Removed cart line", body = CartItemResponse),
        (status = 404, description = "Cart or item not found"),
    ),
    security(("bearer" = [])),
    tag = "cart"
)]
pub async fn remove_item<U: UnitOfWork>(
    state: web::Data<AppState<U>>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let item = web::block(move || state.carts.remove_item(user.user_id, product_id)).await??;
    Ok(HttpResponse::Ok().json(CartItemResponse::from(item)))
}

/// DELETE /cart/items
#[utoipa::path(
    delete,
    path = "/cart/items",
    responses(
        (status = 200, description = "Cart emptied", body = ClearCartResponse),
        (status = 404, description = "Cart not found"),
    ),
    security(("bearer" = [])),
    tag = "cart"
)]
pub async fn clear_cart<U: UnitOfWork>(
    state: web::Data<AppState<U>>,
    user: AuthUser,
) -> Result<HttpResponse, AppError> {
    let cleared = web::block(move || state.carts.clear(user.user_id)).await??;
    Ok(HttpResponse::Ok().json(ClearCartResponse { cleared }))
}

// ── Staged (cookie) cart ─────────────────────────────────────────────────────

/// GET /cart/staged
///
/// An absent or unreadable cookie reads as an empty cart.
#[utoipa::path(
    get,
    path = "/cart/staged",
    responses(
        (status = 200, description = "Staged lines", body = StagedCartResponse),
    ),
    tag = "cart"
)]
pub async fn get_staged<U: UnitOfWork>(
    state: web::Data<AppState<U>>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let items = read_staged(&state, &req);
    Ok(HttpResponse::Ok().json(StagedCartResponse {
        items: items.into_iter().map(Into::into).collect(),
    }))
}

/// POST /cart/staged/items
#[utoipa::path(
    post,
    path = "/cart/staged/items",
    request_body = AddItemRequest,
    responses(
        (status = 200, description = "Staged lines after the add", body = StagedCartResponse),
        (status = 400, description = "Quantity must be positive"),
    ),
    tag = "cart"
)]
pub async fn add_staged_item<U: UnitOfWork>(
    state: web::Data<AppState<U>>,
    req: HttpRequest,
    body: web::Json<AddItemRequest>,
) -> Result<HttpResponse, AppError> {
    let item = StagedCartItem::try_from(body.into_inner())?;
    let current = req.cookie(STAGED_CART_COOKIE);

    let (token, items) = state
        .staged
        .add_item(current.as_ref().map(|c| c.value()), item)?;

    let cookie = Cookie::build(STAGED_CART_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(state.staged.ttl().num_seconds()))
        .finish();

    Ok(HttpResponse::Ok().cookie(cookie).json(StagedCartResponse {
        items: items.into_iter().map(Into::into).collect(),
    }))
}

/// POST /cart/merge
///
/// Folds the staged cookie cart into the caller's persisted cart, creating
/// the cart if needed. The cookie is removed only when the merge commits.
#[utoipa::path(
    post,
    path = "/cart/merge",
    responses(
        (status = 200, description = "Merge result", body = MergeCartResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "User not found"),
    ),
    security(("bearer" = [])),
    tag = "cart"
)]
pub async fn merge_cart<U: UnitOfWork>(
    state: web::Data<AppState<U>>,
    user: AuthUser,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let staged = read_staged(&state, &req);

    let outcome = web::block(move || state.carts.merge_staged(user.user_id, &staged)).await??;

    let mut removal = Cookie::build(STAGED_CART_COOKIE, "").path("/").finish();
    removal.make_removal();

    Ok(HttpResponse::Ok().cookie(removal).json(MergeCartResponse {
        cart_id: outcome.cart_id,
        merged: outcome.merged.into_iter().map(Into::into).collect(),
        skipped: outcome.skipped,
    }))
}

fn read_staged<U>(state: &AppState<U>, req: &HttpRequest) -> Vec<StagedCartItem> {
    let Some(cookie) = req.cookie(STAGED_CART_COOKIE) else {
        return Vec::new();
    };
    state.staged.decode(cookie.value()).unwrap_or_else(|e| {
        log::warn!("Ignoring staged cart cookie: {}", e);
        Vec::new()
    })
}
