use std::{collections::HashMap, hash::Hash, io::ErrorKind, path::PathBuf, sync::Arc};
use tokio::{fs, sync::RwLock};

use crate::errors::ServiceError;

/// Generic JSON file-backed key-value map store.
///
/// Persists a `HashMap<K, V>` as a single pretty-printed JSON document and
/// keeps the working copy in memory behind an `RwLock`. Intended for small
/// tables where a database is overkill.
#[derive(Clone)]
pub struct JsonMapStore<K, V> {
    inner: Arc<RwLock<HashMap<K, V>>>,
    file_path: PathBuf,
}

impl<K, V> JsonMapStore<K, V>
where
    K: Eq + Hash + serde::Serialize + serde::de::DeserializeOwned + Clone,
    V: serde::Serialize + serde::de::DeserializeOwned + Clone,
{
    /// Initialize the store from a path.
    ///
    /// A missing file is a first run: parent directories are created and the
    /// empty table is written out immediately. A file that exists but cannot
    /// be read or parsed fails construction; callers are expected to abort
    /// startup on that error rather than continue with a fresh table.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ServiceError::Storage(format!("create {}: {}", parent.display(), e)))?;
        }

        let map: HashMap<K, V> = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| ServiceError::Storage(format!("parse {}: {}", file_path.display(), e)))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // first run: persist the empty table so the file exists
                let empty: HashMap<K, V> = HashMap::new();
                let data = serde_json::to_vec_pretty(&empty)
                    .map_err(|e| ServiceError::Storage(e.to_string()))?;
                fs::write(&file_path, data)
                    .await
                    .map_err(|e| ServiceError::Storage(format!("write {}: {}", file_path.display(), e)))?;
                empty
            }
            Err(e) => {
                return Err(ServiceError::Storage(format!("read {}: {}", file_path.display(), e)));
            }
        };

        Ok(Arc::new(Self { inner: Arc::new(RwLock::new(map)), file_path }))
    }

    async fn save(&self) -> Result<(), ServiceError> {
        let map = self.inner.read().await;
        // one JSON object for the whole table, 2-space indent
        let data = serde_json::to_vec_pretty(&*map).map_err(|e| ServiceError::Storage(e.to_string()))?;
        fs::write(&self.file_path, data)
            .await
            .map_err(|e| ServiceError::Storage(format!("write {}: {}", self.file_path.display(), e)))?;
        Ok(())
    }

    /// Snapshot of all entries as `(key, value)` pairs.
    pub async fn list(&self) -> Vec<(K, V)> {
        let map = self.inner.read().await;
        map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Get value by key.
    pub async fn get(&self, key: &K) -> Option<V> {
        let map = self.inner.read().await;
        map.get(key).cloned()
    }

    /// Insert or update a value by key and persist.
    pub async fn insert(&self, key: K, value: V) -> Result<(), ServiceError> {
        let mut map = self.inner.write().await;
        map.insert(key, value);
        drop(map);
        self.save().await
    }

    /// Apply a mutation to the map, then persist. The mutation stays visible
    /// to readers even when the following write to disk fails.
    pub async fn update_map<F, T>(&self, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut HashMap<K, V>) -> Result<T, ServiceError>,
    {
        let mut map = self.inner.write().await;
        let out = f(&mut map)?;
        drop(map);
        self.save().await?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{}_{}.json", tag, uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn json_map_store_crud_persists() -> Result<(), anyhow::Error> {
        let tmp = temp_path("json_map_store");
        let store = JsonMapStore::<String, String>::new(&tmp).await?;

        // initially empty, but the file now exists
        assert_eq!(store.list().await.len(), 0);
        assert!(tokio::fs::metadata(&tmp).await.is_ok());

        store.insert("a".into(), "1".into()).await?;
        store.insert("b".into(), "2".into()).await?;
        assert_eq!(store.get(&"a".into()).await.unwrap(), "1");

        let len = store
            .update_map(|m| {
                if let Some(v) = m.get_mut(&"a".to_string()) { *v = "10".into(); }
                Ok(m.len())
            })
            .await?;
        assert_eq!(len, 2);

        // reload from disk and compare
        let reloaded = JsonMapStore::<String, String>::new(&tmp).await?;
        assert_eq!(reloaded.get(&"a".into()).await.unwrap(), "10");
        assert_eq!(reloaded.list().await.len(), 2);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn json_map_store_writes_pretty_document() -> Result<(), anyhow::Error> {
        let tmp = temp_path("json_map_store_pretty");
        let store = JsonMapStore::<String, String>::new(&tmp).await?;
        store.insert("a".into(), "1".into()).await?;

        let text = tokio::fs::read_to_string(&tmp).await?;
        assert!(text.starts_with("{\n  \""));

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn json_map_store_rejects_corrupt_file() {
        let tmp = temp_path("json_map_store_corrupt");
        tokio::fs::write(&tmp, b"not json").await.expect("seed corrupt file");

        let res = JsonMapStore::<String, String>::new(&tmp).await;
        assert!(matches!(res, Err(ServiceError::Storage(_))));

        let _ = tokio::fs::remove_file(&tmp).await;
    }
}
