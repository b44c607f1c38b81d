use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use sqlx::{FromRow, Postgres, QueryBuilder};
use tracing::{debug, info};

use crate::models::{Checkpoint, PaymentMethod, Product, RecordDraft, RecordError, TransactionRecord};
use crate::provisioner::ConnectionInfo;
use crate::storage::schema::{ColumnInfo, TableSchema};
use crate::storage::{StorageError, TransactionStore};
use crate::types::{TableName, TransactionId};

/// Ten columns per row keeps a statement well below the 65535 bind limit.
const MAX_ROWS_PER_STATEMENT: usize = 1_000;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// The transactions table in a PostgreSQL compatible instance.
///
/// Holds a single connection: stages run one statement at a time and each
/// stage opens its own store.
pub struct PostgresStore {
    pool: PgPool,
    schema: TableSchema
}

#[derive(Debug, FromRow)]
struct TransactionRow {
    transaction_id: TransactionId,
    timestamp: NaiveDateTime,
    customer_name: Option<String>,
    email: Option<String>,
    product: Option<String>,
    quantity: Option<i32>,
    price_per_unit: Option<Decimal>,
    payment_method: Option<String>,
    city: Option<String>,
    country: Option<String>
}

impl TryFrom<TransactionRow> for TransactionRecord {
    type Error = RecordError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        fn required<T>(field: &'static str, value: Option<T>) -> Result<T, RecordError> {
            value.ok_or_else(|| RecordError::empty(field))
        }

        let product: Product = required("product", row.product)?.parse()?;
        let payment_method: PaymentMethod = required("payment_method", row.payment_method)?.parse()?;

        TransactionRecord::try_from(RecordDraft {
            transaction_id: row.transaction_id,
            timestamp: row.timestamp,
            customer_name: required("customer_name", row.customer_name)?,
            email: required("email", row.email)?,
            product,
            quantity: required("quantity", row.quantity)?,
            price_per_unit: required("price_per_unit", row.price_per_unit)?,
            payment_method,
            city: required("city", row.city)?,
            country: required("country", row.country)?
        })
    }
}

impl PostgresStore {
    pub async fn connect(connection: &ConnectionInfo, table: TableName) -> Result<Self, StorageError> {
        let ssl_mode = if connection.require_tls { PgSslMode::Require } else { PgSslMode::Prefer };
        let options = PgConnectOptions::new()
            .host(&connection.host)
            .port(connection.port)
            .database(&connection.database)
            .username(&connection.user)
            .password(&connection.password)
            .ssl_mode(ssl_mode)
            .application_name("lakebase-demo");

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|error| StorageError::connectivity(connection.to_string(), error))?;

        info!("Connected to [{connection}] for table [{table}]");

        Ok(Self {
            pool,
            schema: TableSchema::new(table)
        })
    }

    fn into_records(&self, rows: Vec<TransactionRow>) -> Result<Vec<TransactionRecord>, StorageError> {
        rows.into_iter()
            .map(|row| TransactionRecord::try_from(row).map_err(|error| StorageError::invalid_row(self.schema.table(), error)))
            .collect()
    }
}

#[async_trait]
impl TransactionStore for PostgresStore {
    fn table(&self) -> &TableName {
        self.schema.table()
    }

    async fn ensure_schema(&self) -> Result<(), StorageError> {
        let table = self.schema.table();

        sqlx::query(&self.schema.create_table_sql())
            .execute(&self.pool)
            .await
            .map_err(|error| StorageError::schema(table, error))?;

        sqlx::query(&self.schema.create_index_sql())
            .execute(&self.pool)
            .await
            .map_err(|error| StorageError::schema(table, error))?;

        debug!("Schema for [{table}] is in place");

        Ok(())
    }

    async fn describe_columns(&self) -> Result<Vec<ColumnInfo>, StorageError> {
        let table = self.schema.table();
        let columns: Vec<(String, String)> = sqlx::query_as(self.schema.describe_columns_sql())
            .bind(table.schema())
            .bind(table.table())
            .fetch_all(&self.pool)
            .await
            .map_err(|error| StorageError::schema(table, error))?;

        Ok(columns.into_iter()
            .map(|(name, data_type)| ColumnInfo { name, data_type })
            .collect())
    }

    async fn insert_batch(&self, records: &[TransactionRecord]) -> Result<u64, StorageError> {
        if records.is_empty() {
            return Ok(0);
        }

        let table = self.schema.table();
        let insert_error = |error: sqlx::Error| StorageError::insert(table, records.len(), error);

        let mut transaction = self.pool.begin().await.map_err(insert_error)?;
        let mut inserted = 0;

        for chunk in records.chunks(MAX_ROWS_PER_STATEMENT) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(self.schema.insert_prefix());

            builder.push_values(chunk, |mut row, record| {
                row.push_bind(record.transaction_id())
                    .push_bind(record.timestamp())
                    .push_bind(record.customer_name())
                    .push_bind(record.email())
                    .push_bind(record.product().as_str())
                    .push_bind(record.quantity())
                    .push_bind(record.price_per_unit())
                    .push_bind(record.payment_method().as_str())
                    .push_bind(record.city())
                    .push_bind(record.country());
            });

            let result = builder.build()
                .execute(&mut *transaction)
                .await
                .map_err(insert_error)?;

            inserted += result.rows_affected();
        }

        //NOTE: Dropping an uncommitted transaction rolls it back, so an error above never leaves a partial batch behind.
        transaction.commit().await.map_err(insert_error)?;

        Ok(inserted)
    }

    async fn fetch_recent(&self, limit: usize) -> Result<Vec<TransactionRecord>, StorageError> {
        let table = self.schema.table();
        let sql = self.schema.select_recent_sql();
        let mut rows: Vec<TransactionRow> = sqlx::query_as(&sql)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| StorageError::query(table, error))?;

        rows.reverse();

        self.into_records(rows)
    }

    async fn fetch_since(&self, checkpoint: &Checkpoint, limit: usize) -> Result<Vec<TransactionRecord>, StorageError> {
        let table = self.schema.table();
        let sql = self.schema.select_since_sql();
        let rows: Vec<TransactionRow> = sqlx::query_as(&sql)
            .bind(checkpoint.timestamp)
            .bind(checkpoint.transaction_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| StorageError::query(table, error))?;

        self.into_records(rows)
    }

    async fn fetch_by_ids(&self, ids: &[TransactionId]) -> Result<Vec<TransactionRecord>, StorageError> {
        let table = self.schema.table();
        let sql = self.schema.select_by_ids_sql();
        let rows: Vec<TransactionRow> = sqlx::query_as(&sql)
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await
            .map_err(|error| StorageError::query(table, error))?;

        self.into_records(rows)
    }

    async fn count(&self) -> Result<u64, StorageError> {
        let table = self.schema.table();
        let sql = self.schema.count_sql();
        let count: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|error| StorageError::query(table, error))?;

        Ok(count.max(0) as u64)
    }
}
