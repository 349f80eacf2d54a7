//! IPFS node backend.
//!
//! Talks to a local IPFS node through its RPC API (`/api/v0/dag/*`). When
//! the node cannot export a complete DAG, the CAR is fetched from the
//! configured gateway and imported into the node before traversal.

use std::time::Duration;

use async_trait::async_trait;
use dispatch_core::link::{canonical_bytes, parse_cid};
use dispatch_core::{ObjectStore, StoreError};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct PutResponse {
    #[serde(rename = "Cid")]
    cid: dispatch_core::Link,
}

pub struct IpfsStore {
    /// Base URL of the node's RPC API, e.g. `http://127.0.0.1:5001`
    api_url: String,
    /// Gateway used to complete DAGs the node cannot export
    gateway: Option<String>,
    http_client: reqwest::Client,
}

impl IpfsStore {
    pub fn new(
        api_url: impl Into<String>,
        gateway: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Backend(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            gateway: gateway.map(|g| g.trim_end_matches('/').to_string()),
            http_client,
        })
    }

    fn rpc_url(&self, command: &str) -> String {
        format!("{}/api/v0/{}", self.api_url, command)
    }

    fn check_cid(cid: &str) -> Result<(), StoreError> {
        parse_cid(cid).map(|_| ()).map_err(|e| StoreError::InvalidCid {
            cid: cid.to_string(),
            reason: e.to_string(),
        })
    }

    /// Export the DAG from the local node; succeeds only if it is complete.
    async fn export_local(&self, cid: &str) -> Result<usize, String> {
        let response = self
            .http_client
            .post(self.rpc_url("dag/export"))
            .query(&[("arg", cid)])
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("dag export returned {}", response.status()));
        }
        let car = response.bytes().await.map_err(|e| e.to_string())?;
        Ok(car.len())
    }

    /// Fetch the CAR for `cid` from the gateway and import it locally.
    async fn import_from_gateway(&self, cid: &str) -> Result<(), StoreError> {
        let gateway = self
            .gateway
            .as_deref()
            .ok_or_else(|| StoreError::UnknownGateway(cid.to_string()))?;

        let url = format!("{gateway}/api/v0/dag/export");
        debug!(cid = %cid, url = %url, "Fetching DAG from gateway");
        let response = self
            .http_client
            .get(&url)
            .query(&[("arg", cid)])
            .send()
            .await
            .map_err(|e| StoreError::unavailable(cid, e))?;
        if !response.status().is_success() {
            return Err(StoreError::unavailable(
                cid,
                format!("unexpected gateway response: {}", response.status()),
            ));
        }
        let car = response
            .bytes()
            .await
            .map_err(|e| StoreError::unavailable(cid, e))?;
        let size = car.len();

        let form = Form::new().part("file", Part::bytes(car.to_vec()).file_name("dag.car"));
        let response = self
            .http_client
            .post(self.rpc_url("dag/import"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| StoreError::unavailable(cid, e))?;
        if !response.status().is_success() {
            return Err(StoreError::unavailable(
                cid,
                format!("dag import returned {}", response.status()),
            ));
        }

        info!(cid = %cid, url = %url, size, "Imported DAG from gateway");
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for IpfsStore {
    async fn get(&self, cid: &str) -> Result<Value, StoreError> {
        Self::check_cid(cid)?;
        let response = self
            .http_client
            .post(self.rpc_url("dag/get"))
            .query(&[("arg", cid)])
            .send()
            .await
            .map_err(|e| StoreError::unavailable(cid, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::unavailable(cid, format!("dag get returned {status}: {}", body.trim())));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| StoreError::unavailable(cid, e))
    }

    async fn put(&self, value: &Value) -> Result<String, StoreError> {
        let bytes = canonical_bytes(value)?;
        let form = Form::new().part("file", Part::bytes(bytes).file_name("record.json"));
        let response = self
            .http_client
            .post(self.rpc_url("dag/put"))
            .query(&[
                ("store-codec", "dag-json"),
                ("input-codec", "dag-json"),
                ("pin", "true"),
            ])
            .multipart(form)
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Backend(format!(
                "dag put returned {}",
                response.status()
            )));
        }

        let put: PutResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        debug!(cid = %put.cid.cid(), "Stored record");
        Ok(put.cid.cid)
    }

    async fn ensure_full_dag(&self, cid: &str) -> Result<(), StoreError> {
        Self::check_cid(cid)?;
        match self.export_local(cid).await {
            Ok(size) => {
                debug!(cid = %cid, size, "DAG available locally");
                Ok(())
            }
            Err(reason) => {
                warn!(cid = %cid, reason = %reason, "Local DAG export failed, trying gateway");
                self.import_from_gateway(cid).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(gateway: Option<&str>) -> IpfsStore {
        IpfsStore::new(
            "http://127.0.0.1:1/",
            gateway.map(str::to_string),
            Duration::from_millis(200),
        )
        .unwrap()
    }

    #[test]
    fn test_rpc_url() {
        assert_eq!(store(None).rpc_url("dag/get"), "http://127.0.0.1:1/api/v0/dag/get");
    }

    #[tokio::test]
    async fn test_invalid_cid_rejected_before_request() {
        let err = store(None).get("not-a-cid").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidCid { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_node_without_gateway() {
        let cid = dispatch_core::compute_cid(&serde_json::json!({"format": "tool", "content": "x"})).unwrap();

        let err = store(None).ensure_full_dag(&cid).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownGateway(ref c) if *c == cid));

        let err = store(None).get(&cid).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_gateway() {
        let cid = dispatch_core::compute_cid(&serde_json::json!({"format": "tool", "content": "y"})).unwrap();

        let err = store(Some("http://127.0.0.1:1"))
            .ensure_full_dag(&cid)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { ref cid, .. } if !cid.is_empty()));
    }
}
