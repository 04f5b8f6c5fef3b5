use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::upsert::excluded;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::cart::{Cart, CartItem};
use crate::domain::catalog::{Product, User};
use crate::domain::errors::DomainError;
use crate::domain::money::Money;
use crate::domain::ports::{
    CartStore, Catalog, OutboxEvent, OutboxRepository, PurchaseRepository, SaleItemRepository,
    Store, TicketRepository, UnitOfWork, UserDirectory,
};
use crate::domain::purchase::{Purchase, ReceiptLine, SaleItem, Ticket};
use crate::schema::{
    cart_items, carts, checkout_outbox, products, purchases, sale_items, tickets, users,
};

use super::models::{
    CartItemRow, CartRow, NewCartItemRow, NewCartRow, NewOutboxEventRow, ProductRow, PurchaseRow,
    SaleItemRow, TicketRow, UserRow,
};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

// ── Unit of work ──────────────────────────────────────────────────────────────

/// Runs each unit of work in its own Postgres transaction (read committed).
#[derive(Clone)]
pub struct DieselUnitOfWork {
    pool: DbPool,
}

impl DieselUnitOfWork {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl UnitOfWork for DieselUnitOfWork {
    fn run<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn Store) -> Result<T, DomainError>,
    {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let mut store = PgStore { conn: &mut **conn };
            f(&mut store)
        })
    }
}

// ── Store ─────────────────────────────────────────────────────────────────────

/// All ports backed by one connection that is already inside a transaction.
pub struct PgStore<'c> {
    conn: &'c mut PgConnection,
}

impl UserDirectory for PgStore<'_> {
    fn get_user(&mut self, id: Uuid) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> = users::table
            .find(id)
            .select(UserRow::as_select())
            .first(self.conn)
            .optional()?;
        Ok(row.map(Into::into))
    }
}

impl Catalog for PgStore<'_> {
    fn get_product(&mut self, id: Uuid) -> Result<Option<Product>, DomainError> {
        let row: Option<ProductRow> = products::table
            .find(id)
            .select(ProductRow::as_select())
            .first(self.conn)
            .optional()?;
        Ok(row.map(Into::into))
    }
}

impl CartStore for PgStore<'_> {
    fn get_cart(&mut self, owner_id: Uuid) -> Result<Option<Cart>, DomainError> {
        let row: Option<CartRow> = carts::table
            .filter(carts::owner_id.eq(owner_id))
            .select(CartRow::as_select())
            .first(self.conn)
            .optional()?;
        Ok(row.map(Into::into))
    }

    fn create_cart(&mut self, owner_id: Uuid) -> Result<Cart, DomainError> {
        let inserted = diesel::insert_into(carts::table)
            .values(&NewCartRow {
                id: Uuid::new_v4(),
                owner_id,
            })
            .returning(CartRow::as_returning())
            .get_result::<CartRow>(self.conn);

        match inserted {
            Ok(row) => Ok(row.into()),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Err(DomainError::CartAlreadyExists)
            }
            Err(DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)) => {
                Err(DomainError::UserNotFound)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn ensure_cart(&mut self, owner_id: Uuid) -> Result<Cart, DomainError> {
        // A concurrent insert for the same owner makes this wait, then skip.
        let inserted = diesel::insert_into(carts::table)
            .values(&NewCartRow {
                id: Uuid::new_v4(),
                owner_id,
            })
            .on_conflict(carts::owner_id)
            .do_nothing()
            .execute(self.conn);

        match inserted {
            Ok(_) => {}
            Err(DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)) => {
                return Err(DomainError::UserNotFound)
            }
            Err(e) => return Err(e.into()),
        }
        self.get_cart(owner_id)?.ok_or(DomainError::CartNotFound)
    }

    fn lock_cart(&mut self, cart_id: Uuid) -> Result<(), DomainError> {
        carts::table
            .find(cart_id)
            .select(carts::id)
            .for_update()
            .first::<Uuid>(self.conn)
            .optional()?
            .map(|_| ())
            .ok_or(DomainError::CartNotFound)
    }

    fn add_item(
        &mut self,
        cart_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartItem, DomainError> {
        // The composite primary key turns a second add into an increment.
        let row: CartItemRow = diesel::insert_into(cart_items::table)
            .values(&NewCartItemRow {
                cart_id,
                product_id,
                quantity,
            })
            .on_conflict((cart_items::cart_id, cart_items::product_id))
            .do_update()
            .set(cart_items::quantity.eq(cart_items::quantity + excluded(cart_items::quantity)))
            .returning(CartItemRow::as_returning())
            .get_result(self.conn)?;
        Ok(row.into())
    }

    fn get_item(
        &mut self,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<CartItem>, DomainError> {
        let row: Option<CartItemRow> = cart_items::table
            .find((cart_id, product_id))
            .select(CartItemRow::as_select())
            .first(self.conn)
            .optional()?;
        Ok(row.map(Into::into))
    }

    fn set_item_quantity(
        &mut self,
        cart_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartItem, DomainError> {
        diesel::update(cart_items::table.find((cart_id, product_id)))
            .set(cart_items::quantity.eq(quantity))
            .returning(CartItemRow::as_returning())
            .get_result::<CartItemRow>(self.conn)
            .optional()?
            .map(Into::into)
            .ok_or(DomainError::CartItemNotFound)
    }

    fn remove_item(
        &mut self,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<CartItem>, DomainError> {
        let row: Option<CartItemRow> = diesel::delete(cart_items::table.find((cart_id, product_id)))
            .returning(CartItemRow::as_returning())
            .get_result(self.conn)
            .optional()?;
        Ok(row.map(Into::into))
    }

    fn list_items(&mut self, cart_id: Uuid) -> Result<Vec<CartItem>, DomainError> {
        let rows: Vec<CartItemRow> = cart_items::table
            .filter(cart_items::cart_id.eq(cart_id))
            .order((cart_items::added_at.asc(), cart_items::product_id.asc()))
            .select(CartItemRow::as_select())
            .load(self.conn)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn clear(&mut self, cart_id: Uuid) -> Result<bool, DomainError> {
        let deleted = diesel::delete(cart_items::table.filter(cart_items::cart_id.eq(cart_id)))
            .execute(self.conn)?;
        Ok(deleted > 0)
    }
}

impl PurchaseRepository for PgStore<'_> {
    fn insert_purchase(&mut self, purchase: &Purchase) -> Result<(), DomainError> {
        diesel::insert_into(purchases::table)
            .values(&PurchaseRow::from(purchase))
            .execute(self.conn)?;
        Ok(())
    }

    fn find_purchase(
        &mut self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Purchase>, DomainError> {
        purchases::table
            .filter(purchases::id.eq(id))
            .filter(purchases::owner_id.eq(owner_id))
            .select(PurchaseRow::as_select())
            .first::<PurchaseRow>(self.conn)
            .optional()?
            .map(Purchase::try_from)
            .transpose()
    }

    fn list_purchases(&mut self, owner_id: Uuid) -> Result<Vec<Purchase>, DomainError> {
        purchases::table
            .filter(purchases::owner_id.eq(owner_id))
            .order((purchases::transaction_date.desc(), purchases::id.asc()))
            .select(PurchaseRow::as_select())
            .load::<PurchaseRow>(self.conn)?
            .into_iter()
            .map(Purchase::try_from)
            .collect()
    }
}

impl SaleItemRepository for PgStore<'_> {
    fn insert_sale_items(&mut self, items: &[SaleItem]) -> Result<(), DomainError> {
        let rows: Vec<SaleItemRow> = items.iter().map(SaleItemRow::from).collect();
        diesel::insert_into(sale_items::table)
            .values(&rows)
            .execute(self.conn)?;
        Ok(())
    }

    fn receipt_lines(&mut self, purchase_id: Uuid) -> Result<Vec<ReceiptLine>, DomainError> {
        let rows: Vec<(SaleItemRow, String, String)> = sale_items::table
            .inner_join(products::table)
            .filter(sale_items::purchase_id.eq(purchase_id))
            .order((products::name.asc(), sale_items::product_id.asc()))
            .select((
                SaleItemRow::as_select(),
                products::name,
                products::product_type,
            ))
            .load(self.conn)?;

        Ok(rows
            .into_iter()
            .map(|(item, product_name, product_type)| ReceiptLine {
                product_id: item.product_id,
                product_name,
                product_type,
                quantity: item.quantity,
                unit_price: Money::from_minor(item.unit_price_minor),
                total_price: Money::from_minor(item.total_price_minor),
            })
            .collect())
    }
}

impl TicketRepository for PgStore<'_> {
    fn insert_ticket(&mut self, ticket: &Ticket) -> Result<(), DomainError> {
        diesel::insert_into(tickets::table)
            .values(&TicketRow {
                id: ticket.id,
                purchase_id: ticket.purchase_id,
                owner_id: ticket.owner_id,
                purchase_date: ticket.purchase_date,
                total_price_minor: ticket.total_price.minor(),
            })
            .execute(self.conn)?;
        Ok(())
    }

    fn find_ticket(&mut self, purchase_id: Uuid) -> Result<Option<Ticket>, DomainError> {
        let Some(row) = tickets::table
            .filter(tickets::purchase_id.eq(purchase_id))
            .select(TicketRow::as_select())
            .first::<TicketRow>(self.conn)
            .optional()?
        else {
            return Ok(None);
        };

        let items: Vec<SaleItemRow> = sale_items::table
            .filter(sale_items::purchase_id.eq(purchase_id))
            .order(sale_items::product_id.asc())
            .select(SaleItemRow::as_select())
            .load(self.conn)?;

        Ok(Some(Ticket {
            id: row.id,
            purchase_id: row.purchase_id,
            owner_id: row.owner_id,
            purchase_date: row.purchase_date,
            total_price: Money::from_minor(row.total_price_minor),
            sale_items: items.into_iter().map(Into::into).collect(),
        }))
    }
}

impl OutboxRepository for PgStore<'_> {
    fn append_event(&mut self, event: OutboxEvent) -> Result<(), DomainError> {
        // Debezium's EventRouter SMT derives the Kafka topic from `aggregate_type`.
        diesel::insert_into(checkout_outbox::table)
            .values(&NewOutboxEventRow {
                id: Uuid::new_v4(),
                aggregate_type: event.aggregate_type,
                aggregate_id: event.aggregate_id,
                event_type: event.event_type,
                payload: event.payload,
            })
            .execute(self.conn)?;
        Ok(())
    }
}
