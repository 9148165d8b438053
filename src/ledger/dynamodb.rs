use super::{Ledger, LedgerError, TransferRecord};
use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use tracing::debug;

/// Partition key attribute of the ledger table
const KEY_ATTRIBUTE: &str = "filename";

/// DynamoDB backed ledger
pub struct DynamoLedger {
    client: Client,
    table: String,
}

impl DynamoLedger {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    /// Create from AWS SDK config loaded from environment
    pub async fn from_env(table: impl Into<String>) -> Self {
        let aws_config = aws_config::load_from_env().await;
        Self::new(Client::new(&aws_config), table)
    }

    fn map_error(err: impl std::fmt::Display) -> LedgerError {
        let msg = err.to_string();
        if msg.contains("ResourceNotFound") || msg.contains("dispatch failure") {
            LedgerError::Unavailable(msg)
        } else {
            LedgerError::Other(msg)
        }
    }
}

#[async_trait]
impl Ledger for DynamoLedger {
    async fn get(&self, filename: &str) -> Result<Option<TransferRecord>, LedgerError> {
        debug!(table = %self.table, filename, "Ledger lookup");

        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key(KEY_ATTRIBUTE, AttributeValue::S(filename.to_string()))
            .send()
            .await
            .map_err(Self::map_error)?;

        Ok(output.item().map(|_| TransferRecord::new(filename)))
    }

    async fn put(&self, filename: &str) -> Result<(), LedgerError> {
        debug!(table = %self.table, filename, "Ledger write");

        self.client
            .put_item()
            .table_name(&self.table)
            .item(KEY_ATTRIBUTE, AttributeValue::S(filename.to_string()))
            .send()
            .await
            .map_err(Self::map_error)?;

        Ok(())
    }
}
