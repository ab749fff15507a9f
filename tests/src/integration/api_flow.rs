//! # API Flow
//!
//! The full runtime (scan loop + retrieval API) over a temporary node data
//! directory, queried over real HTTP.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use ix_02_block_scanner::test_utils::{legacy_tx, TestBlock};
    use ix_03_mempool_cache::{HealthProbe, MempoolError};
    use ix_04_retrieval_api::{RetrievalError, TransactionRelay};
    use node_runtime::{Collaborators, IndexerConfig, IndexerRuntime, ServiceContext};
    use serde_json::{json, Value};

    use crate::integration::fixtures::{append, block_files, MAGIC};

    struct HealthyNode;

    #[async_trait]
    impl HealthProbe for HealthyNode {
        async fn safe_mode(&self) -> Result<bool, MempoolError> {
            Ok(false)
        }
    }

    #[async_trait]
    impl TransactionRelay for HealthyNode {
        async fn broadcast(&self, raw_hex: &str) -> Result<String, RetrievalError> {
            let raw = hex::decode(raw_hex).map_err(|e| RetrievalError::Relay(e.to_string()))?;
            Ok(shared_types::to_hex(&shared_types::display_hash256(&raw)))
        }
    }

    async fn start(root: &std::path::Path) -> IndexerRuntime {
        let mut config = IndexerConfig::default();
        config.storage.data_dir = root.join("node");
        config.storage.index_dir = root.join("index");
        config.storage.sync_writes = false;
        config.scanner.idle_interval_ms = 5;
        config.api.bind_address = "127.0.0.1:0".into();
        config.rpc.username = "user".into();
        config.rpc.password = "pass".into();

        let node = Arc::new(HealthyNode);
        let mut runtime = IndexerRuntime::new(ServiceContext::open(config).unwrap());
        runtime
            .start(Collaborators::new(node.clone()).with_relay(node))
            .await
            .unwrap();
        runtime
    }

    async fn get_json(client: &reqwest::Client, url: String) -> Value {
        client
            .get(url)
            .basic_auth("user", Some("pass"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_runtime_serves_indexed_blocks() {
        let root = tempfile::tempdir().unwrap();
        let files = block_files(root.path());
        let block = TestBlock::new(&[legacy_tx(1), legacy_tx(2)], 3);
        append(&files, 0, &block.record(MAGIC));

        let runtime = start(root.path()).await;
        let base = format!("http://{}", runtime.api_addr().unwrap());
        let client = reqwest::Client::new();
        let id = shared_types::to_hex(&block.hash);

        let mut info = Value::Null;
        for _ in 0..200 {
            info = get_json(&client, format!("{}/obj/info?q={}", base, id)).await;
            if info["size"] != json!(0) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(info, json!({ "size": block.payload.len(), "pending": false }));

        let chunk = client
            .get(format!(
                "{}/obj/chunk?q={}&chunk_index=1&chunk_size=80",
                base, id
            ))
            .basic_auth("user", Some("pass"))
            .send()
            .await
            .unwrap();
        assert_eq!(chunk.status(), 200);
        assert_eq!(
            chunk.bytes().await.unwrap().to_vec(),
            block.payload[80..160.min(block.payload.len())].to_vec()
        );

        runtime.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_runtime_enforces_credentials() {
        let root = tempfile::tempdir().unwrap();
        let files = block_files(root.path());
        append(&files, 0, &TestBlock::new(&[legacy_tx(1)], 1).record(MAGIC));

        let runtime = start(root.path()).await;
        let base = format!("http://{}", runtime.api_addr().unwrap());
        let client = reqwest::Client::new();
        let id = "00".repeat(32);

        let anonymous = client
            .get(format!("{}/obj/info?q={}", base, id))
            .send()
            .await
            .unwrap();
        assert_eq!(anonymous.status(), 401);

        let wrong = client
            .get(format!("{}/obj/info?q={}", base, id))
            .basic_auth("user", Some("nope"))
            .send()
            .await
            .unwrap();
        assert_eq!(wrong.status(), 401);

        let health = client.get(format!("{}/health", base)).send().await.unwrap();
        assert_eq!(health.status(), 200);

        let bad_id = client
            .get(format!("{}/obj/info?q=xyz", base))
            .basic_auth("user", Some("pass"))
            .send()
            .await
            .unwrap();
        assert_eq!(bad_id.status(), 400);

        runtime.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_broadcast_goes_through_relay() {
        let root = tempfile::tempdir().unwrap();
        let files = block_files(root.path());
        append(&files, 0, &TestBlock::new(&[legacy_tx(1)], 1).record(MAGIC));

        let runtime = start(root.path()).await;
        let base = format!("http://{}", runtime.api_addr().unwrap());
        let raw = legacy_tx(5);

        let response: Value = reqwest::Client::new()
            .post(format!("{}/tx/broadcast", base))
            .basic_auth("user", Some("pass"))
            .json(&json!({ "hex": hex::encode(&raw) }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(
            response,
            json!({
                "txid": shared_types::to_hex(&shared_types::display_hash256(&raw)),
                "message": "ok"
            })
        );

        runtime.shutdown().await;
    }
}
