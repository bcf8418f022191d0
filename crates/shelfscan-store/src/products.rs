//! Product repository.

use async_trait::async_trait;
use metrics::counter;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use tracing::{debug, info};

use shelfscan_models::{Product, ProductSummary};

use crate::config::DatabaseConfig;
use crate::error::StoreResult;

// Integer columns are cast so INTEGER and BIGINT schemas decode the same.
const FIND_BY_NAME: &str = r#"
    SELECT CAST(id AS BIGINT) AS id, product_name, category, barcode, CAST(price AS BIGINT) AS price
    FROM products
    WHERE product_name = $1
    ORDER BY id
    LIMIT 1
"#;

const LIST_ALL: &str = r#"
    SELECT CAST(id AS BIGINT) AS id, product_name, CAST(price AS BIGINT) AS price
    FROM products
    ORDER BY product_name
"#;

const UPDATE_PRICE: &str = r#"
    UPDATE products
    SET price = $1
    WHERE id = $2
"#;

/// Product lookup and mutation.
///
/// Every method is a single statement; nothing is cached between calls.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Exact-match lookup on `product_name`.
    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Product>>;

    /// Every product, ordered by `product_name`.
    async fn list_all(&self) -> StoreResult<Vec<ProductSummary>>;

    /// Set the price of `product_id`. Returns rows affected; an unknown id
    /// is not an error and inserts nothing.
    async fn update_price(&self, product_id: i64, new_price: i64) -> StoreResult<u64>;

    /// Connectivity check for readiness probes.
    async fn ping(&self) -> StoreResult<()>;
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: i64,
    product_name: String,
    category: String,
    barcode: String,
    price: i64,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            product_name: row.product_name,
            category: row.category,
            barcode: row.barcode,
            price: row.price,
        }
    }
}

#[derive(Debug, FromRow)]
struct SummaryRow {
    id: i64,
    product_name: String,
    price: i64,
}

impl From<SummaryRow> for ProductSummary {
    fn from(row: SummaryRow) -> Self {
        ProductSummary {
            id: row.id,
            product_name: row.product_name,
            price: row.price,
        }
    }
}

/// `ProductStore` on a PostgreSQL pool.
///
/// Each call checks out one connection and returns it when the guard drops,
/// on success and error paths alike.
#[derive(Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    /// Build the pool without connecting. A malformed URL fails here;
    /// an unreachable server fails on first use.
    pub fn connect_lazy(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_lazy(&config.url)?;

        info!(
            url = %config.redacted_url(),
            max_connections = config.max_connections,
            "Product store configured"
        );

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query_as::<_, ProductRow>(FIND_BY_NAME)
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;

        counter!("shelfscan_db_queries_total", "operation" => "find_by_name").increment(1);
        debug!(name, found = row.is_some(), "Product lookup");

        Ok(row.map(Product::from))
    }

    async fn list_all(&self) -> StoreResult<Vec<ProductSummary>> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query_as::<_, SummaryRow>(LIST_ALL)
            .fetch_all(&mut *conn)
            .await?;

        counter!("shelfscan_db_queries_total", "operation" => "list_all").increment(1);
        debug!(count = rows.len(), "Listed products");

        Ok(rows.into_iter().map(ProductSummary::from).collect())
    }

    async fn update_price(&self, product_id: i64, new_price: i64) -> StoreResult<u64> {
        let mut conn = self.pool.acquire().await?;
        let result = sqlx::query(UPDATE_PRICE)
            .bind(new_price)
            .bind(product_id)
            .execute(&mut *conn)
            .await?;

        counter!("shelfscan_db_queries_total", "operation" => "update_price").increment(1);
        let rows = result.rows_affected();
        info!(product_id, new_price, rows, "Price update executed");

        Ok(rows)
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("SELECT 1").execute(&mut *conn).await?;
        Ok(())
    }
}
