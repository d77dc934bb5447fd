use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};

use crate::config::DbConfig;
use crate::models::{Account, Transaction, TransactionKind, TransactionStatus};

/// DbConnection owns the connection pool and all SQL. Created once at
/// startup and handed to each service; cloning shares the pool.
#[derive(Clone)]
pub struct DbConnection {
    pool: PgPool,
}

#[derive(FromRow)]
struct AccountRow {
    id: i64,
    balance: f64,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: row.id.to_string(),
            balance: row.balance,
        }
    }
}

#[derive(FromRow)]
struct TransactionRow {
    id: i64,
    account_id: i64,
    amount: f64,
    #[sqlx(rename = "type")]
    kind: String,
    status: String,
    description: Option<String>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = sqlx::Error;

    fn try_from(row: TransactionRow) -> Result<Self, sqlx::Error> {
        // Status values are only ever written from the closed set; anything
        // else in the column is a corrupt row.
        let status: TransactionStatus = row
            .status
            .parse()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(Transaction {
            id: row.id.to_string(),
            account_id: row.account_id.to_string(),
            amount: row.amount,
            kind: TransactionKind::from(row.kind),
            status,
            description: row.description,
        })
    }
}

impl DbConnection {
    /// Open the pool and verify the database is reachable. Any failure here
    /// is fatal to the caller; there is no retry or degraded mode.
    pub async fn connect(config: &DbConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_with(config.connect_options())
            .await?;

        let db = Self { pool };
        db.ping().await?;
        db.ensure_schema().await?;
        Ok(db)
    }

    /// Connect by URL. Used by the end-to-end tests, which point this at a
    /// scratch database.
    pub async fn connect_url(url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new().max_connections(5).connect(url).await?;

        let db = Self { pool };
        db.ping().await?;
        db.ensure_schema().await?;
        Ok(db)
    }

    /// Build a pool without touching the network. Router-level tests use
    /// this to exercise everything that never reaches storage.
    pub fn connect_lazy(config: &DbConfig) -> Self {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_lazy_with(config.connect_options());
        Self { pool }
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Bootstrap the two tables if they do not exist. Deliberately not a
    /// migration system; the schema is fixed.
    async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id BIGSERIAL PRIMARY KEY,
                balance DOUBLE PRECISION NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transactions (
                id BIGSERIAL PRIMARY KEY,
                account_id BIGINT NOT NULL,
                amount DOUBLE PRECISION NOT NULL,
                type TEXT NOT NULL,
                status TEXT NOT NULL,
                description TEXT
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Release the pool. Called on the ordinary exit path.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>, sqlx::Error> {
        let rows = sqlx::query_as::<_, AccountRow>("SELECT id, balance FROM accounts")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Account::from).collect())
    }

    pub async fn insert_account(&self, balance: f64) -> Result<i64, sqlx::Error> {
        let (id,): (i64,) =
            sqlx::query_as("INSERT INTO accounts (balance) VALUES ($1) RETURNING id")
                .bind(balance)
                .fetch_one(&self.pool)
                .await?;
        Ok(id)
    }

    pub async fn fetch_account(&self, id: i64) -> Result<Option<Account>, sqlx::Error> {
        let row = sqlx::query_as::<_, AccountRow>("SELECT id, balance FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Account::from))
    }

    /// Overwrite the balance. Returns the affected-row count; updating a
    /// missing id affects zero rows and is not an error.
    pub async fn update_account_balance(&self, id: i64, balance: f64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE accounts SET balance = $1 WHERE id = $2")
            .bind(balance)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_account(&self, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn account_exists(&self, id: i64) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM accounts WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    pub async fn list_transactions(&self) -> Result<Vec<Transaction>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            "SELECT id, account_id, amount, type, status, description FROM transactions",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Transaction::try_from).collect()
    }

    /// Insert a new transaction. Status is always `pending` at this point;
    /// the caller moves it afterwards.
    pub async fn insert_transaction(
        &self,
        account_id: i64,
        amount: f64,
        kind: &str,
        description: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO transactions (account_id, amount, type, status, description) \
             VALUES ($1, $2, $3, 'pending', $4) RETURNING id",
        )
        .bind(account_id)
        .bind(amount)
        .bind(kind)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn fetch_transaction(&self, id: i64) -> Result<Option<Transaction>, sqlx::Error> {
        let row = sqlx::query_as::<_, TransactionRow>(
            "SELECT id, account_id, amount, type, status, description \
             FROM transactions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Transaction::try_from).transpose()
    }

    pub async fn set_transaction_status(
        &self,
        id: i64,
        status: TransactionStatus,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE transactions SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn apply_deposit(&self, account_id: i64, amount: f64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE accounts SET balance = balance + $1 WHERE id = $2")
            .bind(amount)
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Conditionally deduct `amount`. The predicate runs inside the single
    /// UPDATE, so two concurrent withdrawals against the same account cannot
    /// both pass the balance check. Returns whether the deduction landed.
    pub async fn try_withdraw(&self, account_id: i64, amount: f64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE accounts SET balance = balance - $1 WHERE id = $2 AND balance >= $1",
        )
        .bind(amount)
        .bind(account_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
