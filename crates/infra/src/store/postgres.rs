//! Postgres-backed stock ledger and actor directory.
//!
//! The two concurrency-sensitive operations are single `UPDATE` statements
//! that carry their precondition in the `WHERE` clause, so the check and the
//! mutation happen under the row lock and concurrent callers serialize at the
//! database:
//!
//! - `try_decrement_stock`: `SET available_quantity = available_quantity - $2
//!   WHERE ... available_quantity >= $2`
//! - `mark_reversed_if_active`: `SET reversed = TRUE WHERE ... reversed = FALSE`
//!
//! Error mapping: unique violations (23505) become [`StoreError::Conflict`];
//! everything else becomes [`StoreError::Backend`] with the operation name in
//! the message.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;

use eximhub_auth::Role;
use eximhub_catalog::Product;
use eximhub_core::{ActorId, ImportId, ProductId};
use eximhub_ledger::ImportRecord;

use super::r#trait::{ActorRecord, RoleDirectory, StockDecrement, StockLedgerStore, StoreError};

/// Postgres implementation of [`StockLedgerStore`] and [`RoleDirectory`].
#[derive(Debug, Clone)]
pub struct PgStockLedger {
    pool: Arc<PgPool>,
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS products (
        product_id UUID PRIMARY KEY,
        owner_id UUID NOT NULL,
        name TEXT NOT NULL,
        origin TEXT NOT NULL,
        price_cents BIGINT NOT NULL CHECK (price_cents >= 0),
        rating SMALLINT,
        available_quantity BIGINT NOT NULL CHECK (available_quantity >= 0),
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS imports (
        import_id UUID PRIMARY KEY,
        product_id UUID NOT NULL,
        importer_id UUID NOT NULL,
        quantity BIGINT NOT NULL CHECK (quantity > 0),
        created_at TIMESTAMPTZ NOT NULL,
        reversed BOOLEAN NOT NULL DEFAULT FALSE
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_imports_importer ON imports (importer_id, created_at DESC)
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_imports_product ON imports (product_id, created_at DESC)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS actors (
        actor_id UUID PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        role TEXT NOT NULL CHECK (role IN ('exporter', 'importer')),
        registered_at TIMESTAMPTZ NOT NULL
    )
    "#,
];

impl PgStockLedger {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Apply the schema. Every statement is `IF NOT EXISTS`, so this is safe
    /// to run on every startup.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(self.pool.as_ref())
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        Ok(())
    }
}

#[derive(Debug)]
struct ProductRow {
    product_id: uuid::Uuid,
    owner_id: uuid::Uuid,
    name: String,
    origin: String,
    price_cents: i64,
    rating: Option<i16>,
    available_quantity: i64,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            product_id: row.try_get("product_id")?,
            owner_id: row.try_get("owner_id")?,
            name: row.try_get("name")?,
            origin: row.try_get("origin")?,
            price_cents: row.try_get("price_cents")?,
            rating: row.try_get("rating")?,
            available_quantity: row.try_get("available_quantity")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: ProductId::from_uuid(row.product_id),
            owner_id: ActorId::from_uuid(row.owner_id),
            name: row.name,
            origin: row.origin,
            price_cents: row.price_cents,
            rating: row.rating.map(|r| r as u8),
            available_quantity: row.available_quantity,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug)]
struct ImportRow {
    import_id: uuid::Uuid,
    product_id: uuid::Uuid,
    importer_id: uuid::Uuid,
    quantity: i64,
    created_at: DateTime<Utc>,
    reversed: bool,
}

impl<'r> FromRow<'r, PgRow> for ImportRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            import_id: row.try_get("import_id")?,
            product_id: row.try_get("product_id")?,
            importer_id: row.try_get("importer_id")?,
            quantity: row.try_get("quantity")?,
            created_at: row.try_get("created_at")?,
            reversed: row.try_get("reversed")?,
        })
    }
}

impl From<ImportRow> for ImportRecord {
    fn from(row: ImportRow) -> Self {
        ImportRecord {
            id: ImportId::from_uuid(row.import_id),
            product_id: ProductId::from_uuid(row.product_id),
            importer_id: ActorId::from_uuid(row.importer_id),
            quantity: row.quantity,
            created_at: row.created_at,
            reversed: row.reversed,
        }
    }
}

#[derive(Debug)]
struct ActorRow {
    actor_id: uuid::Uuid,
    email: String,
    role: String,
    registered_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ActorRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            actor_id: row.try_get("actor_id")?,
            email: row.try_get("email")?,
            role: row.try_get("role")?,
            registered_at: row.try_get("registered_at")?,
        })
    }
}

impl ActorRow {
    fn into_record(self) -> Result<ActorRecord, StoreError> {
        let role = self
            .role
            .parse::<Role>()
            .map_err(|e| StoreError::Backend(format!("actors row for {}: {e}", self.actor_id)))?;
        Ok(ActorRecord {
            actor_id: ActorId::from_uuid(self.actor_id),
            email: self.email,
            role,
            registered_at: self.registered_at,
        })
    }
}

#[async_trait]
impl StockLedgerStore for PgStockLedger {
    #[instrument(
        skip(self, product),
        fields(product_id = %product.id, owner_id = %product.owner_id),
        err
    )]
    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO products (
                product_id, owner_id, name, origin, price_cents, rating,
                available_quantity, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(product.owner_id.as_uuid())
        .bind(&product.name)
        .bind(&product.origin)
        .bind(product.price_cents)
        .bind(product.rating.map(|r| r as i16))
        .bind(product.available_quantity)
        .bind(product.created_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;
        Ok(())
    }

    async fn fetch_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT product_id, owner_id, name, origin, price_cents, rating,
                   available_quantity, created_at
            FROM products
            WHERE product_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| map_sqlx_error("fetch_product", e))?;
        Ok(row.map(Product::from))
    }

    async fn list_products(&self, owner: Option<ActorId>) -> Result<Vec<Product>, StoreError> {
        let rows = match owner {
            Some(owner) => {
                sqlx::query_as::<_, ProductRow>(
                    r#"
                    SELECT product_id, owner_id, name, origin, price_cents, rating,
                           available_quantity, created_at
                    FROM products
                    WHERE owner_id = $1
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(owner.as_uuid())
                .fetch_all(self.pool.as_ref())
                .await
            }
            None => {
                sqlx::query_as::<_, ProductRow>(
                    r#"
                    SELECT product_id, owner_id, name, origin, price_cents, rating,
                           available_quantity, created_at
                    FROM products
                    ORDER BY created_at DESC
                    "#,
                )
                .fetch_all(self.pool.as_ref())
                .await
            }
        }
        .map_err(|e| map_sqlx_error("list_products", e))?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn latest_products(&self, limit: i64) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT product_id, owner_id, name, origin, price_cents, rating,
                   available_quantity, created_at
            FROM products
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(|e| map_sqlx_error("latest_products", e))?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    #[instrument(skip(self), fields(product_id = %id, amount), err)]
    async fn try_decrement_stock(
        &self,
        id: ProductId,
        amount: i64,
    ) -> Result<StockDecrement, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE products
            SET available_quantity = available_quantity - $2
            WHERE product_id = $1 AND available_quantity >= $2
            RETURNING available_quantity
            "#,
        )
        .bind(id.as_uuid())
        .bind(amount)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| map_sqlx_error("try_decrement_stock", e))?;

        if let Some(row) = row {
            let remaining: i64 = row
                .try_get("available_quantity")
                .map_err(|e| map_sqlx_error("try_decrement_stock", e))?;
            return Ok(StockDecrement::Applied { remaining });
        }

        // Zero rows matched: distinguish a missing product from thin stock.
        let current = sqlx::query("SELECT available_quantity FROM products WHERE product_id = $1")
            .bind(id.as_uuid())
            .fetch_optional(self.pool.as_ref())
            .await
            .map_err(|e| map_sqlx_error("try_decrement_stock", e))?;

        match current {
            Some(row) => {
                let available: i64 = row
                    .try_get("available_quantity")
                    .map_err(|e| map_sqlx_error("try_decrement_stock", e))?;
                Ok(StockDecrement::Insufficient { available })
            }
            None => Ok(StockDecrement::Missing),
        }
    }

    #[instrument(skip(self), fields(product_id = %id, amount), err)]
    async fn credit_stock(&self, id: ProductId, amount: i64) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET available_quantity = available_quantity + $2
            WHERE product_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(amount)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| map_sqlx_error("credit_stock", e))?;
        Ok(result.rows_affected() == 1)
    }

    #[instrument(
        skip(self, record),
        fields(import_id = %record.id, product_id = %record.product_id),
        err
    )]
    async fn append_import(&self, record: &ImportRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO imports (
                import_id, product_id, importer_id, quantity, created_at, reversed
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.product_id.as_uuid())
        .bind(record.importer_id.as_uuid())
        .bind(record.quantity)
        .bind(record.created_at)
        .bind(record.reversed)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| map_sqlx_error("append_import", e))?;
        Ok(())
    }

    async fn fetch_import(&self, id: ImportId) -> Result<Option<ImportRecord>, StoreError> {
        let row = sqlx::query_as::<_, ImportRow>(
            r#"
            SELECT import_id, product_id, importer_id, quantity, created_at, reversed
            FROM imports
            WHERE import_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| map_sqlx_error("fetch_import", e))?;
        Ok(row.map(ImportRecord::from))
    }

    #[instrument(skip(self), fields(import_id = %id), err)]
    async fn mark_reversed_if_active(&self, id: ImportId) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE imports
            SET reversed = TRUE
            WHERE import_id = $1 AND reversed = FALSE
            "#,
        )
        .bind(id.as_uuid())
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| map_sqlx_error("mark_reversed_if_active", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn imports_by_importer(
        &self,
        importer: ActorId,
    ) -> Result<Vec<ImportRecord>, StoreError> {
        let rows = sqlx::query_as::<_, ImportRow>(
            r#"
            SELECT import_id, product_id, importer_id, quantity, created_at, reversed
            FROM imports
            WHERE importer_id = $1
            "#,
        )
        .bind(importer.as_uuid())
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(|e| map_sqlx_error("imports_by_importer", e))?;
        Ok(rows.into_iter().map(ImportRecord::from).collect())
    }

    async fn imports_for_product(
        &self,
        product: ProductId,
    ) -> Result<Vec<ImportRecord>, StoreError> {
        let rows = sqlx::query_as::<_, ImportRow>(
            r#"
            SELECT import_id, product_id, importer_id, quantity, created_at, reversed
            FROM imports
            WHERE product_id = $1
            "#,
        )
        .bind(product.as_uuid())
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(|e| map_sqlx_error("imports_for_product", e))?;
        Ok(rows.into_iter().map(ImportRecord::from).collect())
    }
}

#[async_trait]
impl RoleDirectory for PgStockLedger {
    #[instrument(skip(self, record), fields(actor_id = %record.actor_id), err)]
    async fn upsert_actor(&self, record: &ActorRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO actors (actor_id, email, role, registered_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (actor_id)
            DO UPDATE SET email = EXCLUDED.email, role = EXCLUDED.role
            "#,
        )
        .bind(record.actor_id.as_uuid())
        .bind(&record.email)
        .bind(record.role.as_str())
        .bind(record.registered_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| map_sqlx_error("upsert_actor", e))?;
        Ok(())
    }

    async fn fetch_actor(&self, actor: ActorId) -> Result<Option<ActorRecord>, StoreError> {
        let row = sqlx::query_as::<_, ActorRow>(
            r#"
            SELECT actor_id, email, role, registered_at
            FROM actors
            WHERE actor_id = $1
            "#,
        )
        .bind(actor.as_uuid())
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| map_sqlx_error("fetch_actor", e))?;
        row.map(ActorRow::into_record).transpose()
    }

    async fn role_of(&self, actor: ActorId) -> Result<Option<Role>, StoreError> {
        Ok(self.fetch_actor(actor).await?.map(|a| a.role))
    }
}

/// Map a SQLx error onto [`StoreError`], tagging the failing operation.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let message = format!(
                "database error in {operation}: {}",
                db_err.message()
            );
            match db_err.code() {
                Some(code) if code.as_ref() == "23505" => StoreError::Conflict(message),
                _ => StoreError::Backend(message),
            }
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Backend(format!("connection pool timed out in {operation}"))
        }
        other => StoreError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_non_database_errors_to_backend() {
        let err = map_sqlx_error("append_import", sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Backend(_)));

        let err = map_sqlx_error("fetch_import", sqlx::Error::RowNotFound);
        match err {
            StoreError::Backend(message) => assert!(message.contains("fetch_import")),
            other => panic!("unexpected mapping: {other:?}"),
        }
    }
}
