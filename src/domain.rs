use tracing::info;

use crate::db::DbConnection;
use crate::error::ApiError;
use crate::models::{
    Account, CreateTransactionRequest, Transaction, TransactionKind, TransactionStatus,
};

fn parse_id(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

/// Account CRUD over the shared connection.
#[derive(Clone)]
pub struct AccountStore {
    db: DbConnection,
}

impl AccountStore {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<Account>, ApiError> {
        Ok(self.db.list_accounts().await?)
    }

    pub async fn create(&self, balance: f64) -> Result<Account, ApiError> {
        let id = self.db.insert_account(balance).await?;
        info!("created account {id} with balance {balance}");
        Ok(Account {
            id: id.to_string(),
            balance,
        })
    }

    pub async fn fetch(&self, id: &str) -> Result<Account, ApiError> {
        // A non-numeric id cannot name a row, so it reads as absent rather
        // than as a server error.
        let Some(id) = parse_id(id) else {
            return Err(ApiError::NotFound("Account"));
        };
        match self.db.fetch_account(id).await? {
            Some(account) => Ok(account),
            None => Err(ApiError::NotFound("Account")),
        }
    }

    /// Overwrite the balance and echo the result. Zero affected rows is
    /// deliberately not surfaced: updating a missing id reports success,
    /// matching the service's historical no-op tolerance.
    pub async fn update(&self, id: &str, balance: f64) -> Result<Account, ApiError> {
        let parsed =
            parse_id(id).ok_or_else(|| ApiError::bad_request("invalid account id"))?;
        let affected = self.db.update_account_balance(parsed, balance).await?;
        if affected == 0 {
            info!("balance update for account {id} matched no rows");
        }
        Ok(Account {
            id: id.to_string(),
            balance,
        })
    }

    /// Delete the account if it exists. Succeeds whether or not a row was
    /// actually removed.
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let parsed =
            parse_id(id).ok_or_else(|| ApiError::bad_request("invalid account id"))?;
        let affected = self.db.delete_account(parsed).await?;
        info!("delete account {id}: {affected} row(s) removed");
        Ok(())
    }
}

/// Transaction listing, lookup and the one stateful algorithm in the
/// service: creating a transaction and applying its balance effect.
#[derive(Clone)]
pub struct TransactionService {
    db: DbConnection,
}

impl TransactionService {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<Transaction>, ApiError> {
        Ok(self.db.list_transactions().await?)
    }

    pub async fn fetch(&self, id: &str) -> Result<Transaction, ApiError> {
        let Some(id) = parse_id(id) else {
            return Err(ApiError::NotFound("Transaction"));
        };
        match self.db.fetch_transaction(id).await? {
            Some(tx) => Ok(tx),
            None => Err(ApiError::NotFound("Transaction")),
        }
    }

    /// Record a transaction and apply its effect:
    ///
    /// 1. the referenced account must exist, otherwise nothing is written;
    /// 2. the row is inserted as `pending`;
    /// 3. a deposit adds to the balance unconditionally; a withdrawal is a
    ///    single conditional deduction that fails on insufficient funds; any
    ///    other kind has no balance effect and stays `pending`;
    /// 4. the status written to storage is mirrored into the returned record.
    ///
    /// The balance write and the status write are independent statements:
    /// a failure between them leaves the row `pending` with the balance
    /// already moved, and there is no compensating rollback.
    pub async fn create(&self, req: CreateTransactionRequest) -> Result<Transaction, ApiError> {
        let account_id = parse_id(&req.account_id)
            .ok_or_else(|| ApiError::bad_request("Account not found"))?;
        if !self.db.account_exists(account_id).await? {
            return Err(ApiError::bad_request("Account not found"));
        }

        let id = self
            .db
            .insert_transaction(account_id, req.amount, req.kind.as_str(), req.description.as_deref())
            .await?;

        let status = match req.kind {
            TransactionKind::Deposit => {
                self.db.apply_deposit(account_id, req.amount).await?;
                self.db
                    .set_transaction_status(id, TransactionStatus::Completed)
                    .await?;
                TransactionStatus::Completed
            }
            TransactionKind::Withdrawal => {
                let status = if self.db.try_withdraw(account_id, req.amount).await? {
                    TransactionStatus::Completed
                } else {
                    TransactionStatus::Failed
                };
                self.db.set_transaction_status(id, status).await?;
                status
            }
            TransactionKind::Other(ref kind) => {
                info!("transaction {id} has kind {kind:?}; no balance effect");
                TransactionStatus::Pending
            }
        };

        info!(
            "transaction {id} ({}) for account {account_id}: {status}",
            req.kind.as_str()
        );

        Ok(Transaction {
            id: id.to_string(),
            account_id: req.account_id,
            amount: req.amount,
            kind: req.kind,
            status,
            description: req.description,
        })
    }

    /// Overwrite the status field. The value must be one of the recognized
    /// statuses; balance effects are never re-applied here, so this can
    /// desynchronize status from balance by design of the original surface.
    pub async fn update_status(
        &self,
        id: &str,
        status: &str,
    ) -> Result<TransactionStatus, ApiError> {
        let status: TransactionStatus = status
            .parse()
            .map_err(|e| ApiError::bad_request(format!("{e}")))?;
        let parsed =
            parse_id(id).ok_or_else(|| ApiError::bad_request("invalid transaction id"))?;

        let affected = self.db.set_transaction_status(parsed, status).await?;
        if affected == 0 {
            info!("status update for transaction {id} matched no rows");
        }
        Ok(status)
    }
}
