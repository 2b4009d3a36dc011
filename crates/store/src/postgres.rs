use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, UserId, Version};
use domain::{Address, Money, Order, OrderItem, OrderParts, OrderStatus, PaymentDetails};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::order::{OrderFilter, OrderPage, OrderStore};
use crate::{Result, StoreError};

const ORDER_COLUMNS: &str = "id, user_id, items, total_amount_cents, status, shipping_address, \
     billing_address, payment_details, created_at, updated_at, version";

/// PostgreSQL-backed order store.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let id = OrderId::from_uuid(row.try_get::<Uuid, _>("id")?);

        let status_text: String = row.try_get("status")?;
        let status = OrderStatus::from_str(&status_text)
            .map_err(|e| StoreError::CorruptRecord(format!("order {id}: {e}")))?;

        let items: Vec<OrderItem> = serde_json::from_value(row.try_get("items")?)
            .map_err(|e| StoreError::CorruptRecord(format!("order {id} items: {e}")))?;

        let shipping_address: Address = serde_json::from_value(row.try_get("shipping_address")?)?;
        let billing_address: Address = serde_json::from_value(row.try_get("billing_address")?)?;
        let payment_details: PaymentDetails =
            serde_json::from_value(row.try_get("payment_details")?)?;

        Ok(Order::from_parts(OrderParts {
            id,
            user_id: UserId::new(row.try_get::<String, _>("user_id")?),
            items,
            total_amount: Money::from_cents(row.try_get("total_amount_cents")?),
            status,
            shipping_address,
            billing_address,
            payment_details,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
            version: Version::new(row.try_get("version")?),
        }))
    }

    /// Explains why a conditional update touched no row.
    async fn missed_update(&self, id: OrderId, expected_version: Version) -> StoreError {
        let current: std::result::Result<Option<i64>, sqlx::Error> =
            sqlx::query_scalar("SELECT version FROM orders WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await;

        match current {
            Ok(Some(actual)) => StoreError::VersionConflict {
                order_id: id,
                expected: expected_version,
                actual: Version::new(actual),
            },
            Ok(None) => StoreError::NotFound(format!("order {id}")),
            Err(e) => StoreError::Database(e),
        }
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    #[tracing::instrument(skip(self, draft), fields(user_id = %draft.user_id()))]
    async fn create(&self, draft: &Order) -> Result<OrderId> {
        let id = OrderId::new();

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, items, total_amount_cents, status, shipping_address,
                                billing_address, payment_details, created_at, updated_at, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(id.as_uuid())
        .bind(draft.user_id().as_str())
        .bind(serde_json::to_value(draft.items())?)
        .bind(draft.total_amount().cents())
        .bind(draft.status().as_str())
        .bind(serde_json::to_value(draft.shipping_address())?)
        .bind(serde_json::to_value(draft.billing_address())?)
        .bind(serde_json::to_value(draft.payment_details())?)
        .bind(draft.created_at())
        .bind(draft.updated_at())
        .bind(Version::first().as_i64())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn get_by_id(&self, id: OrderId) -> Result<Order> {
        let row: Option<PgRow> =
            sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => Self::row_to_order(row),
            None => Err(StoreError::NotFound(format!("order {id}"))),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn update_status(
        &self,
        id: OrderId,
        new_status: OrderStatus,
        expected_version: Version,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $1, updated_at = NOW(), version = version + 1
            WHERE id = $2 AND version = $3
            "#,
        )
        .bind(new_status.as_str())
        .bind(id.as_uuid())
        .bind(expected_version.as_i64())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.missed_update(id, expected_version).await);
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, details))]
    async fn update_payment_details(
        &self,
        id: OrderId,
        details: &PaymentDetails,
        new_status: Option<OrderStatus>,
        expected_version: Version,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET payment_details = $1,
                status = COALESCE($2, status),
                updated_at = NOW(),
                version = version + 1
            WHERE id = $3 AND version = $4
            "#,
        )
        .bind(serde_json::to_value(details)?)
        .bind(new_status.map(|s| s.as_str()))
        .bind(id.as_uuid())
        .bind(expected_version.as_i64())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.missed_update(id, expected_version).await);
        }
        Ok(())
    }

    async fn list(&self, filter: &OrderFilter) -> Result<OrderPage> {
        let mut where_clause = String::from(" WHERE 1=1");
        let mut param_count = 0;

        if filter.user_id.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND user_id = ${param_count}"));
        }
        if filter.status.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND status = ${param_count}"));
        }

        let count_sql = format!("SELECT COUNT(*) FROM orders{where_clause}");
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(ref user_id) = filter.user_id {
            count_query = count_query.bind(user_id.as_str());
        }
        if let Some(status) = filter.status {
            count_query = count_query.bind(status.as_str());
        }
        let total_count = count_query.fetch_one(&self.pool).await?;

        // Column and direction come from closed enums, never from input text.
        let pagination = filter.pagination;
        let list_sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders{where_clause} ORDER BY {} {}, id ASC LIMIT ${} OFFSET ${}",
            pagination.sort_by.column(),
            pagination.sort_order.as_sql(),
            param_count + 1,
            param_count + 2,
        );
        let mut list_query = sqlx::query(&list_sql);
        if let Some(ref user_id) = filter.user_id {
            list_query = list_query.bind(user_id.as_str());
        }
        if let Some(status) = filter.status {
            list_query = list_query.bind(status.as_str());
        }
        list_query = list_query
            .bind(pagination.limit() as i64)
            .bind(pagination.offset() as i64);

        let rows = list_query.fetch_all(&self.pool).await?;
        let orders = rows
            .into_iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>>>()?;

        Ok(OrderPage {
            orders,
            total_count: total_count.max(0) as u64,
            page: pagination.page,
            page_size: pagination.page_size,
        })
    }
}
