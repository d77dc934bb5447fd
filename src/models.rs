use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A balance-holding entity. The id is assigned by storage and travels as a
/// string on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub balance: f64,
}

/// A recorded balance-affecting (or no-op) operation against one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub account_id: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// What a transaction does to the account balance.
///
/// Unrecognized values are kept verbatim in `Other`: they are recorded but
/// have no balance effect and the transaction stays pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Other(String),
}

impl TransactionKind {
    pub fn as_str(&self) -> &str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
            TransactionKind::Other(raw) => raw,
        }
    }
}

impl From<String> for TransactionKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "deposit" => TransactionKind::Deposit,
            "withdrawal" => TransactionKind::Withdrawal,
            _ => TransactionKind::Other(raw),
        }
    }
}

impl From<TransactionKind> for String {
    fn from(kind: TransactionKind) -> Self {
        kind.as_str().to_owned()
    }
}

/// Lifecycle status of a transaction. Every row is inserted as `Pending`;
/// the create handler moves it to `Completed` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "completed" => Ok(TransactionStatus::Completed),
            "failed" => Ok(TransactionStatus::Failed),
            _ => Err(UnknownStatus(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transaction status: {0}")]
pub struct UnknownStatus(pub String);

/// Body for POST /accounts/. Storage assigns the id; any client-supplied id
/// is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccountRequest {
    pub balance: f64,
}

/// Body for PUT /accounts/:id. Only the balance is replaceable.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAccountRequest {
    pub balance: f64,
}

/// Body for POST /transactions/. Status is never client-supplied; every new
/// transaction starts out pending.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTransactionRequest {
    pub account_id: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body for PUT /transactions/:id. The status is carried as a raw string so
/// the handler can reject unknown values with a client error instead of a
/// deserialization failure.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTransactionRequest {
    pub status: String,
}

/// Response for PUT /transactions/:id: the fields the endpoint actually
/// touched.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionStatusUpdate {
    pub id: String,
    pub status: TransactionStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_maps_known_values() {
        assert_eq!(TransactionKind::from("deposit".to_string()), TransactionKind::Deposit);
        assert_eq!(
            TransactionKind::from("withdrawal".to_string()),
            TransactionKind::Withdrawal
        );
    }

    #[test]
    fn kind_keeps_unrecognized_value_verbatim() {
        let kind = TransactionKind::from("transfer".to_string());
        assert_eq!(kind, TransactionKind::Other("transfer".to_string()));
        assert_eq!(kind.as_str(), "transfer");
    }

    #[test]
    fn status_parses_the_closed_set_only() {
        assert_eq!("pending".parse(), Ok(TransactionStatus::Pending));
        assert_eq!("completed".parse(), Ok(TransactionStatus::Completed));
        assert_eq!("failed".parse(), Ok(TransactionStatus::Failed));
        assert!("refunded".parse::<TransactionStatus>().is_err());
        // Case-sensitive, like the stored values.
        assert!("Pending".parse::<TransactionStatus>().is_err());
    }

    #[test]
    fn transaction_serializes_kind_under_type_key() {
        let tx = Transaction {
            id: "7".to_string(),
            account_id: "3".to_string(),
            amount: 25.0,
            kind: TransactionKind::Deposit,
            status: TransactionStatus::Completed,
            description: None,
        };

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "deposit");
        assert_eq!(json["status"], "completed");
        assert_eq!(json["id"], "7");
        assert!(json.get("description").is_none());
    }

    #[test]
    fn create_request_ignores_client_supplied_id() {
        let body = r#"{"id":"999","balance":12.5}"#;
        let req: CreateAccountRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.balance, 12.5);
    }

    #[test]
    fn create_transaction_request_decodes_unknown_kind() {
        let body = r#"{"account_id":"1","amount":5.0,"type":"gift"}"#;
        let req: CreateTransactionRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.kind, TransactionKind::Other("gift".to_string()));
        assert!(req.description.is_none());
    }
}
