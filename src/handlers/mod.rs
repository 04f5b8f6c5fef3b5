pub mod carts;
pub mod purchases;

use actix_web::{web, HttpResponse};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::ports::UnitOfWork;

#[derive(OpenApi)]
#[openapi(
    paths(
        purchases::checkout,
        purchases::list_purchases,
        purchases::receipt,
        carts::get_cart,
        carts::create_cart,
        carts::add_item,
        carts::update_item,
        carts::remove_item,
        carts::clear_cart,
        carts::get_staged,
        carts::add_staged_item,
        carts::merge_cart,
    ),
    components(schemas(
        purchases::CheckoutRequest,
        purchases::CheckoutResponse,
        purchases::AddressResponse,
        purchases::PurchaseLineResponse,
        purchases::PurchaseResponse,
        carts::AddItemRequest,
        carts::UpdateModeRequest,
        carts::UpdateItemRequest,
        carts::CartItemResponse,
        carts::CartResponse,
        carts::ClearCartResponse,
        carts::StagedCartResponse,
        carts::MergeCartResponse,
    )),
    modifiers(&BearerScheme),
    tags(
        (name = "purchases", description = "Checkout, purchase history and receipts"),
        (name = "cart", description = "Persisted and staged carts"),
    )
)]
pub struct ApiDoc;

struct BearerScheme;

impl Modify for BearerScheme {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// GET /api-docs/openapi.json
pub async fn openapi_json() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

pub fn configure_purchases<U: UnitOfWork>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/purchases")
            .route("", web::post().to(purchases::checkout::<U>))
            .route("", web::get().to(purchases::list_purchases::<U>))
            .route("/{id}/receipt", web::get().to(purchases::receipt::<U>)),
    );
}

pub fn configure_cart<U: UnitOfWork>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/cart")
            .route("", web::get().to(carts::get_cart::<U>))
            .route("", web::post().to(carts::create_cart::<U>))
            .route("/items", web::post().to(carts::add_item::<U>))
            .route("/items", web::delete().to(carts::clear_cart::<U>))
            .route("/items/{product_id}", web::patch().to(carts::update_item::<U>))
            .route("/items/{product_id}", web::delete().to(carts::remove_item::<U>))
            .route("/staged", web::get().to(carts::get_staged::<U>))
            .route("/staged/items", web::post().to(carts::add_staged_item::<U>))
            .route("/merge", web::post().to(carts::merge_cart::<U>)),
    );
}
