use actix_web::{http::header, web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::domain::errors::DomainError;
use crate::domain::ports::UnitOfWork;
use crate::domain::purchase::{PurchaseRecord, ReceiptLine, ShippingAddress};
use crate::errors::AppError;
use crate::state::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub country: String,
    pub city: String,
    pub commune: String,
    pub street: String,
}

impl TryFrom<CheckoutRequest> for ShippingAddress {
    type Error = DomainError;

    fn try_from(req: CheckoutRequest) -> Result<Self, Self::Error> {
        ShippingAddress::new(&req.country, &req.city, &req.commune, &req.street)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub status: String,
    pub purchase_id: Uuid,
    pub ticket_id: Uuid,
    /// Decimal string with two places, e.g. "25.00"
    pub total_price: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddressResponse {
    pub country: String,
    pub city: String,
    pub commune: String,
    pub street: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PurchaseLineResponse {
    pub product_id: Uuid,
    pub product_name: String,
    pub product_type: String,
    pub quantity: i32,
    pub unit_price: String,
    pub total_price: String,
}

impl From<ReceiptLine> for PurchaseLineResponse {
    fn from(line: ReceiptLine) -> Self {
        PurchaseLineResponse {
            product_id: line.product_id,
            product_name: line.product_name,
            product_type: line.product_type,
            quantity: line.quantity,
            unit_price: line.unit_price.to_string(),
            total_price: line.total_price.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PurchaseResponse {
    pub id: Uuid,
    pub ticket_id: Option<Uuid>,
    pub transaction_date: String,
    pub shipping_address: AddressResponse,
    pub total_price: String,
    pub items: Vec<PurchaseLineResponse>,
}

impl From<PurchaseRecord> for PurchaseResponse {
    fn from(record: PurchaseRecord) -> Self {
        let address = &record.purchase.address;
        PurchaseResponse {
            id: record.purchase.id,
            ticket_id: record.ticket_id,
            transaction_date: record.purchase.transaction_date.to_rfc3339(),
            shipping_address: AddressResponse {
                country: address.country().to_string(),
                city: address.city().to_string(),
                commune: address.commune().to_string(),
                street: address.street().to_string(),
            },
            total_price: record.total_price.to_string(),
            items: record.lines.into_iter().map(Into::into).collect(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /purchases
///
/// Checks out the caller's cart. The purchase, its price-snapshotted sale
/// items, the ticket, the emptied cart and the outbox event are committed
/// together or not at all.
#[utoipa::path(
    post,
    path = "/purchases",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Purchase created", body = CheckoutResponse),
        (status = 400, description = "Invalid shipping address"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "User or cart not found"),
        (status = 422, description = "Cart is empty"),
        (status = 500, description = "Internal server error"),
    ),
    security(("bearer" = [])),
    tag = "purchases"
)]
pub async fn checkout<U: UnitOfWork>(
    state: web::Data<AppState<U>>,
    user: AuthUser,
    body: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
    let address = ShippingAddress::try_from(body.into_inner())?;

    let outcome = web::block(move || state.checkout.checkout(user.user_id, address)).await??;

    Ok(HttpResponse::Ok().json(CheckoutResponse {
        status: "created".to_string(),
        purchase_id: outcome.purchase.id,
        ticket_id: outcome.ticket.id,
        total_price: outcome.ticket.total_price.to_string(),
    }))
}

/// GET /purchases
///
/// The caller's purchases, newest first, with their snapshotted lines.
#[utoipa::path(
    get,
    path = "/purchases",
    responses(
        (status = 200, description = "Purchase history", body = [PurchaseResponse]),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 500, description = "Internal server error"),
    ),
    security(("bearer" = [])),
    tag = "purchases"
)]
pub async fn list_purchases<U: UnitOfWork>(
    state: web::Data<AppState<U>>,
    user: AuthUser,
) -> Result<HttpResponse, AppError> {
    let records = web::block(move || state.purchases.list_purchases(user.user_id)).await??;

    let body: Vec<PurchaseResponse> = records.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /purchases/{id}/receipt
#[utoipa::path(
    get,
    path = "/purchases/{id}/receipt",
    params(
        ("id" = Uuid, Path, description = "Purchase UUID"),
    ),
    responses(
        (status = 200, description = "PDF receipt", content_type = "application/pdf"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Purchase not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(("bearer" = [])),
    tag = "purchases"
)]
pub async fn receipt<U: UnitOfWork>(
    state: web::Data<AppState<U>>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let purchase_id = path.into_inner();

    let pdf =
        web::block(move || state.purchases.render_receipt(user.user_id, purchase_id)).await??;

    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"receipt-{purchase_id}.pdf\""),
        ))
        .body(pdf))
}
