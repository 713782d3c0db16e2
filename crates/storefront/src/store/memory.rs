//! In-process document tree.

use std::sync::Arc;

use rand::Rng;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::{StoreError, StorePath};

/// Alphabet for generated push keys, in ASCII order so keys sort by time.
const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

/// A JSON tree guarded by a single lock.
#[derive(Clone)]
pub struct MemoryStore {
    root: Arc<RwLock<Value>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Arc::new(RwLock::new(Value::Object(Map::new()))),
        }
    }

    pub(super) async fn get(&self, path: &StorePath) -> Option<Value> {
        let root = self.root.read().await;
        lookup(&root, path)
            .filter(|node| !node.is_null())
            .cloned()
    }

    pub(super) async fn set(&self, path: &StorePath, value: Value) {
        let mut root = self.root.write().await;
        write_at(&mut root, path, value);
    }

    pub(super) async fn update(&self, path: &StorePath, fields: Map<String, Value>) {
        let mut root = self.root.write().await;
        for (key, value) in fields {
            if let Ok(child) = path.child(&key) {
                write_at(&mut root, &child, value);
            }
        }
    }

    pub(super) async fn remove(&self, path: &StorePath) {
        let mut root = self.root.write().await;
        let segments: Vec<&str> = path.segments().collect();
        remove_at(&mut root, &segments);
    }

    pub(super) async fn push(&self, path: &StorePath, value: Value) -> String {
        let key = push_key(chrono::Utc::now().timestamp_millis());
        if let Ok(child) = path.child(&key) {
            self.set(&child, value).await;
        }
        key
    }

    pub(super) async fn increment(&self, path: &StorePath, delta: i64) -> Result<i64, StoreError> {
        let mut root = self.root.write().await;

        let current = match lookup(&root, path) {
            None | Some(Value::Null) => 0,
            Some(node) => node
                .as_i64()
                .ok_or_else(|| StoreError::NotACounter(path.to_string()))?,
        };

        let next = current + delta;
        write_at(&mut root, path, Value::from(next));
        Ok(next)
    }
}

fn lookup<'a>(root: &'a Value, path: &StorePath) -> Option<&'a Value> {
    let mut node = root;
    for segment in path.segments() {
        node = node.as_object()?.get(segment)?;
    }
    Some(node)
}

/// Store `value` at `path`, creating intermediate objects.
fn write_at(root: &mut Value, path: &StorePath, value: Value) {
    if value.is_null() {
        let segments: Vec<&str> = path.segments().collect();
        remove_at(root, &segments);
        return;
    }

    let mut node = root;
    for segment in path.segments() {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let Value::Object(map) = node else {
            return;
        };
        node = map.entry(segment).or_insert(Value::Null);
    }
    *node = value;
}

/// Remove the value at `segments`, pruning parents left empty.
///
/// Returns whether `node` is now an empty object.
fn remove_at(node: &mut Value, segments: &[&str]) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        return false;
    };
    let Value::Object(map) = node else {
        return false;
    };

    if rest.is_empty() {
        map.remove(*first);
    } else if let Some(child) = map.get_mut(*first)
        && remove_at(child, rest)
    {
        map.remove(*first);
    }
    map.is_empty()
}

/// A 20-character key: 8 characters of timestamp then 12 random ones.
fn push_key(timestamp_ms: i64) -> String {
    let mut key = String::with_capacity(20);

    let mut ts = timestamp_ms;
    let mut time_chars = [b'-'; 8];
    for slot in time_chars.iter_mut().rev() {
        let idx = usize::try_from(ts.rem_euclid(64)).unwrap_or(0);
        *slot = PUSH_CHARS.get(idx).copied().unwrap_or(b'-');
        ts = ts.div_euclid(64);
    }
    key.extend(time_chars.iter().map(|&b| char::from(b)));

    let mut rng = rand::rng();
    for _ in 0..12 {
        let idx = rng.random_range(0..PUSH_CHARS.len());
        key.push(char::from(PUSH_CHARS.get(idx).copied().unwrap_or(b'-')));
    }
    key
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn path(s: &str) -> StorePath {
        StorePath::new(s.split('/')).unwrap()
    }

    #[tokio::test]
    async fn test_set_get_nested() {
        let store = MemoryStore::new();
        store.set(&path("a/b/c"), json!(1)).await;

        assert_eq!(store.get(&path("a/b/c")).await, Some(json!(1)));
        assert_eq!(store.get(&path("a/b")).await, Some(json!({ "c": 1 })));
        assert_eq!(store.get(&path("a/x")).await, None);
        assert_eq!(store.get(&path("a/b/c/d")).await, None);
    }

    #[tokio::test]
    async fn test_set_null_removes() {
        let store = MemoryStore::new();
        store.set(&path("a/b"), json!("x")).await;
        store.set(&path("a/b"), Value::Null).await;
        assert_eq!(store.get(&path("a")).await, None);
    }

    #[tokio::test]
    async fn test_update_merges_and_deletes() {
        let store = MemoryStore::new();
        store
            .set(&path("users/u"), json!({ "name": "A", "orders": 1, "note": "n" }))
            .await;

        let mut fields = Map::new();
        fields.insert("orders".to_owned(), json!(2));
        fields.insert("note".to_owned(), Value::Null);
        store.update(&path("users/u"), fields).await;

        assert_eq!(
            store.get(&path("users/u")).await,
            Some(json!({ "name": "A", "orders": 2 }))
        );
    }

    #[tokio::test]
    async fn test_remove_prunes_empty_parents() {
        let store = MemoryStore::new();
        store.set(&path("carts/u/item1"), json!({ "q": 1 })).await;
        store.set(&path("orders/o"), json!({ "q": 1 })).await;

        store.remove(&path("carts/u/item1")).await;
        assert_eq!(store.get(&path("carts")).await, None);
        assert!(store.get(&path("orders/o")).await.is_some());

        // Removing an absent value is fine.
        store.remove(&path("carts/u/item1")).await;
    }

    #[tokio::test]
    async fn test_push_keys_are_ordered_and_unique() {
        let store = MemoryStore::new();
        let first = store.push(&path("list"), json!(1)).await;
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let second = store.push(&path("list"), json!(2)).await;

        assert_eq!(first.len(), 20);
        assert_ne!(first, second);
        assert!(first < second);
        assert_eq!(store.get(&path("list")).await.unwrap().as_object().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_increment() {
        let store = MemoryStore::new();
        assert_eq!(store.increment(&path("counters/d"), 1).await.unwrap(), 1);
        assert_eq!(store.increment(&path("counters/d"), 1).await.unwrap(), 2);
        assert_eq!(store.increment(&path("counters/d"), 5).await.unwrap(), 7);

        store.set(&path("counters/s"), json!("seven")).await;
        assert!(matches!(
            store.increment(&path("counters/s"), 1).await,
            Err(StoreError::NotACounter(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_distinct() {
        let store = MemoryStore::new();
        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.increment(&path("counters/day"), 1).await.unwrap()
            }));
        }

        let mut seen = Vec::new();
        for handle in handles {
            seen.push(handle.await.unwrap());
        }
        seen.sort_unstable();
        assert_eq!(seen, (1..=50).collect::<Vec<_>>());
    }

    #[test]
    fn test_push_key_time_prefix_sorts() {
        let a = push_key(1_700_000_000_000);
        let b = push_key(1_700_000_000_001);
        assert!(a.get(..8) < b.get(..8));
    }
}
