use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::RemoteError;
use crate::models::{RemoteDocument, TransactionType};

/// Read access to the documents already saved on the ledger API.
pub trait RemoteLedger: Send + Sync {
    fn list_documents(
        &self,
        token: &str,
        transaction_type: TransactionType,
    ) -> impl Future<Output = Result<Vec<RemoteDocument>, RemoteError>> + Send;
}

impl<T: RemoteLedger> RemoteLedger for Arc<T> {
    async fn list_documents(
        &self,
        token: &str,
        transaction_type: TransactionType,
    ) -> Result<Vec<RemoteDocument>, RemoteError> {
        self.as_ref().list_documents(token, transaction_type).await
    }
}

pub struct HttpLedgerClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLedgerClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpLedgerClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl RemoteLedger for HttpLedgerClient {
    async fn list_documents(
        &self,
        token: &str,
        transaction_type: TransactionType,
    ) -> Result<Vec<RemoteDocument>, RemoteError> {
        let url = format!("{}/transactions", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&[("type", transaction_type.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status { status, body });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        parse_documents(body)
    }
}

/// Ledger used when no API is configured: there is never any history.
pub struct OfflineLedger;

impl RemoteLedger for OfflineLedger {
    async fn list_documents(
        &self,
        _token: &str,
        _transaction_type: TransactionType,
    ) -> Result<Vec<RemoteDocument>, RemoteError> {
        Ok(Vec::new())
    }
}

/// Ledger selected at runtime from the settings.
pub enum LedgerBackend {
    Http(HttpLedgerClient),
    Offline(OfflineLedger),
}

impl RemoteLedger for LedgerBackend {
    async fn list_documents(
        &self,
        token: &str,
        transaction_type: TransactionType,
    ) -> Result<Vec<RemoteDocument>, RemoteError> {
        match self {
            LedgerBackend::Http(client) => client.list_documents(token, transaction_type).await,
            LedgerBackend::Offline(offline) => offline.list_documents(token, transaction_type).await,
        }
    }
}

/// Accepts a bare array of records or an object with the array under `data`.
/// Records that are not objects of the expected shape are skipped.
pub fn parse_documents(body: Value) -> Result<Vec<RemoteDocument>, RemoteError> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(RemoteError::Decode(
                    "expected an array under `data`".to_string(),
                ))
            }
        },
        other => {
            return Err(RemoteError::Decode(format!(
                "expected an array or object, got {}",
                other
            )))
        }
    };

    let total = items.len();
    let documents: Vec<RemoteDocument> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    if documents.len() < total {
        debug!(
            skipped = total - documents.len(),
            "Skipped malformed ledger records"
        );
    }
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn parses_bare_array() {
        let docs = parse_documents(json!([
            {"billNumber": "PAY-001"},
            {"billNumber": "PAY-002", "amount": 10}
        ]))
        .unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].bill_number.as_deref(), Some("PAY-002"));
    }

    #[test]
    fn parses_data_envelope() {
        let docs = parse_documents(json!({
            "success": true,
            "data": [{"invoiceNumber": "INV-010"}]
        }))
        .unwrap();
        assert_eq!(docs[0].invoice_number.as_deref(), Some("INV-010"));
    }

    #[test]
    fn skips_malformed_records() {
        let docs = parse_documents(json!([
            "garbage",
            {"receiptNumber": 12},
            {"receiptNumber": "REC-003"}
        ]))
        .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].receipt_number.as_deref(), Some("REC-003"));
    }

    #[test]
    fn rejects_unexpected_bodies() {
        assert!(matches!(
            parse_documents(json!({"message": "ok"})),
            Err(RemoteError::Decode(_))
        ));
        assert!(matches!(parse_documents(json!(42)), Err(RemoteError::Decode(_))));
    }

    /// Serves one canned HTTP response and hands back the raw request.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let mut request = Vec::new();
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if n == 0 || request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).to_string()
        });
        (format!("http://{}", addr), handle)
    }

    #[tokio::test]
    async fn http_client_sends_token_and_type() {
        let (base_url, server) =
            serve_once("HTTP/1.1 200 OK", r#"{"data":[{"billNumber":"PAY-004"}]}"#).await;
        let client = HttpLedgerClient::new(&base_url, Duration::from_secs(5)).unwrap();

        let docs = client
            .list_documents("tok-123", TransactionType::Debit)
            .await
            .unwrap();
        assert_eq!(docs[0].bill_number.as_deref(), Some("PAY-004"));

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /transactions?type=debit "), "{request}");
        assert!(
            request.to_lowercase().contains("authorization: bearer tok-123"),
            "{request}"
        );
    }

    #[tokio::test]
    async fn http_client_maps_error_status() {
        let (base_url, server) =
            serve_once("HTTP/1.1 401 Unauthorized", r#"{"message":"expired"}"#).await;
        let client = HttpLedgerClient::new(&base_url, Duration::from_secs(5)).unwrap();

        let result = client.list_documents("tok", TransactionType::Credit).await;
        match result {
            Err(RemoteError::Status { status, body }) => {
                assert_eq!(status, 401);
                assert!(body.contains("expired"));
            }
            other => panic!("expected status error, got {:?}", other),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn offline_ledger_has_no_history() {
        let docs = OfflineLedger
            .list_documents("tok", TransactionType::Credit)
            .await
            .unwrap();
        assert!(docs.is_empty());
    }
}
