//! In-memory [`SecretStore`] for exercising the dispatcher without Vault.

use crate::vault::{Fields, SecretStore, StoreError, TransportError};
use serde_json::Value;
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

#[derive(Debug, Clone)]
enum Node {
    Dir(Vec<String>),
    Leaf(Option<Fields>),
    FailingDir,
    FailingLeaf,
}

#[derive(Debug, Default)]
pub struct Calls {
    lists: AtomicUsize,
    reads: AtomicUsize,
}

impl Calls {
    pub fn lists(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    nodes: HashMap<String, Node>,
    calls: Arc<Calls>,
}

pub fn leaf(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

fn failure(key: &str) -> StoreError {
    StoreError::Transport(TransportError::Base(format!("simulated failure for {key}")))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dir(mut self, key: &str, children: &[&str]) -> Self {
        let children = children.iter().map(ToString::to_string).collect();
        self.nodes.insert(key.to_string(), Node::Dir(children));
        self
    }

    pub fn leaf(mut self, key: &str, fields: Fields) -> Self {
        self.nodes.insert(key.to_string(), Node::Leaf(Some(fields)));
        self
    }

    pub fn empty_leaf(mut self, key: &str) -> Self {
        self.nodes.insert(key.to_string(), Node::Leaf(None));
        self
    }

    pub fn failing_dir(mut self, key: &str) -> Self {
        self.nodes.insert(key.to_string(), Node::FailingDir);
        self
    }

    pub fn failing_leaf(mut self, key: &str) -> Self {
        self.nodes.insert(key.to_string(), Node::FailingLeaf);
        self
    }

    pub fn calls(&self) -> Arc<Calls> {
        Arc::clone(&self.calls)
    }

    // Yield a key-dependent number of times so sibling tasks finish out of
    // order.
    async fn jitter(key: &str) {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        for _ in 0..(hasher.finish() % 5) {
            tokio::task::yield_now().await;
        }
    }
}

impl SecretStore for MemoryStore {
    async fn list(&self, key: &str) -> Result<Vec<String>, StoreError> {
        self.calls.lists.fetch_add(1, Ordering::SeqCst);
        Self::jitter(key).await;
        match self.nodes.get(key.trim_end_matches('/')) {
            Some(Node::Dir(children)) => Ok(children.clone()),
            Some(Node::FailingDir) => Err(failure(key)),
            _ => Err(StoreError::NotFound),
        }
    }

    async fn read(&self, key: &str) -> Result<Option<Fields>, StoreError> {
        self.calls.reads.fetch_add(1, Ordering::SeqCst);
        Self::jitter(key).await;
        match self.nodes.get(key) {
            Some(Node::Leaf(fields)) => Ok(fields.clone()),
            Some(Node::FailingLeaf) => Err(failure(key)),
            _ => Err(StoreError::NotFound),
        }
    }
}
