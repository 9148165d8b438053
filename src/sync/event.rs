use crate::error::Result;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Storage event notification document: `{"Records": [...]}`
///
/// Records are kept as raw JSON so one malformed record does not reject the
/// whole batch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct S3Event {
    #[serde(rename = "Records", default)]
    records: Option<Vec<Value>>,
    #[serde(skip)]
    raw: String,
}

impl S3Event {
    pub fn from_json(data: &str) -> Result<Self> {
        let mut event: S3Event = serde_json::from_str(data)?;
        event.raw = data.to_string();
        Ok(event)
    }

    /// Read and parse a document from `path`, or from stdin when `None`
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let data = match path {
            Some(path) => tokio::fs::read_to_string(path).await?,
            None => {
                let mut data = String::new();
                tokio::io::stdin().read_to_string(&mut data).await?;
                data
            }
        };
        Self::from_json(&data)
    }

    /// The document as it was received
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// One notification per record, in document order
    pub fn records(&self) -> Vec<NotificationRecord> {
        self.records
            .iter()
            .flatten()
            .map(NotificationRecord::from_value)
            .collect()
    }
}

/// A single object notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRecord {
    object_key: Option<String>,
}

impl NotificationRecord {
    pub fn new(object_key: impl Into<String>) -> Self {
        Self {
            object_key: Some(object_key.into()),
        }
    }

    /// A record that names no object
    pub fn malformed() -> Self {
        Self { object_key: None }
    }

    fn from_value(record: &Value) -> Self {
        Self {
            object_key: record
                .pointer("/s3/object/key")
                .and_then(Value::as_str)
                .map(str::to_owned),
        }
    }

    /// The object key, used verbatim as the file identifier
    pub fn object_key(&self) -> Option<&str> {
        self.object_key.as_deref().filter(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_records() {
        let event = S3Event::from_json(
            r#"{"Records": [
                {"s3": {"bucket": {"name": "b"}, "object": {"key": "class1/roster.csv", "size": 12}}},
                {"s3": {"object": {}}},
                {"eventSource": "aws:s3"},
                {"s3": {"object": {"key": ""}}},
                42
            ]}"#,
        )
        .unwrap();

        let keys: Vec<_> = event.records().iter().map(|r| r.object_key().map(str::to_owned)).collect();

        assert_eq!(
            keys,
            vec![Some("class1/roster.csv".to_string()), None, None, None, None]
        );
    }

    #[test]
    fn test_missing_records_is_empty_batch() {
        assert!(S3Event::from_json("{}").unwrap().records().is_empty());
        assert!(S3Event::from_json(r#"{"Records": null}"#)
            .unwrap()
            .records()
            .is_empty());
    }

    #[test]
    fn test_invalid_document() {
        assert!(matches!(
            S3Event::from_json("[1, 2"),
            Err(crate::Error::Event(_))
        ));
    }

    #[test]
    fn test_keeps_raw_document() {
        let data = r#"{"Records": [{"s3": {"object": {"key": "a.csv"}}}]}"#;
        let event = S3Event::from_json(data).unwrap();

        assert_eq!(event.raw(), data);
        assert_eq!(event.records(), vec![NotificationRecord::new("a.csv")]);
    }

    #[tokio::test]
    async fn test_load_missing_file_is_io_error() {
        let result = S3Event::load(Some(Path::new("/nonexistent/s3-event.json"))).await;

        assert!(matches!(result, Err(crate::Error::Io(_))));
    }
}
