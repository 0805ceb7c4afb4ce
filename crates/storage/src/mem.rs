//! In-memory storage backend
//!
//! Plain maps behind a `parking_lot::RwLock`. Suitable for tests and
//! single-process demos; everything is lost on process exit.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::RwLock;

use courier_protocol::{Message, QueueId, Timestamp, Token};

use crate::error::{Result, StorageError};
use crate::Storage;

/// One queue registration
#[derive(Debug, Clone)]
struct QueueRecord {
    token: Token,
    domain: String,
    /// Registration order, used to supersede earlier domain registrations
    seq: u64,
}

/// One registered edge node
#[derive(Debug, Clone)]
struct EdgeNode {
    address: String,
    load: u32,
}

#[derive(Debug, Default)]
struct Inner {
    tokens: HashSet<Token>,
    queues: HashMap<QueueId, QueueRecord>,
    messages: HashMap<QueueId, Vec<Message>>,
    /// Insertion order doubles as the load tie-break
    nodes: Vec<EdgeNode>,
    next_seq: u64,
}

impl Inner {
    /// Latest personal queue (empty domain) registered for a token
    fn personal_queue(&self, token: &Token) -> Option<QueueId> {
        self.queues
            .iter()
            .filter(|(_, rec)| rec.token == *token && rec.domain.is_empty())
            .max_by_key(|(_, rec)| rec.seq)
            .map(|(id, _)| id.clone())
    }
}

/// In-memory storage
#[derive(Debug, Default)]
pub struct MemStorage {
    inner: RwLock<Inner>,
}

impl MemStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemStorage {
    async fn new_token(&self) -> Result<Token> {
        let mut inner = self.inner.write();
        loop {
            let token = Token::generate();
            if inner.tokens.insert(token.clone()) {
                return Ok(token);
            }
        }
    }

    async fn new_queue(&self, queue_id: &QueueId, token: &Token, domain: &str) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.queues.contains_key(queue_id) {
            // Idempotent per id; callers generate fresh ids per registration
            return Ok(());
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.queues.insert(
            queue_id.clone(),
            QueueRecord {
                token: token.clone(),
                domain: domain.to_string(),
                seq,
            },
        );
        Ok(())
    }

    async fn user_owns_queue(&self, token: &Token, queue_id: &QueueId) -> Result<bool> {
        let inner = self.inner.read();
        Ok(inner
            .queues
            .get(queue_id)
            .is_some_and(|rec| rec.token == *token))
    }

    async fn domain_owns_queue(&self, domain: &str, queue_id: &QueueId) -> Result<bool> {
        let inner = self.inner.read();
        Ok(inner
            .queues
            .get(queue_id)
            .is_some_and(|rec| rec.domain == domain))
    }

    async fn get_user_for_queue(&self, queue_id: &QueueId) -> Result<Option<Token>> {
        let inner = self.inner.read();
        Ok(inner.queues.get(queue_id).map(|rec| rec.token.clone()))
    }

    async fn get_queues(&self, token: &Token) -> Result<BTreeMap<String, QueueId>> {
        let inner = self.inner.read();
        let mut owned: Vec<&QueueRecord> = Vec::new();
        let mut ids: Vec<&QueueId> = Vec::new();
        for (id, rec) in &inner.queues {
            if rec.token == *token && !rec.domain.is_empty() {
                owned.push(rec);
                ids.push(id);
            }
        }
        // Ascending registration order so a later registration for the same
        // domain supersedes the earlier one in the map
        let mut indexed: Vec<usize> = (0..owned.len()).collect();
        indexed.sort_by_key(|&i| owned[i].seq);

        let mut map = BTreeMap::new();
        for i in indexed {
            map.insert(owned[i].domain.clone(), ids[i].clone());
        }
        Ok(map)
    }

    async fn delete_queue(&self, queue_id: &QueueId) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.queues.remove(queue_id).is_none() {
            return Err(StorageError::QueueNotFound);
        }
        inner.messages.remove(queue_id);
        Ok(())
    }

    async fn new_message(&self, queue_id: &QueueId, body: serde_json::Value) -> Result<Message> {
        let mut inner = self.inner.write();
        let owner = inner
            .queues
            .get(queue_id)
            .map(|rec| rec.token.clone())
            .ok_or(StorageError::QueueNotFound)?;

        let message = Message::new(queue_id, body);
        inner
            .messages
            .entry(queue_id.clone())
            .or_default()
            .push(message.clone());

        // Surface in the owner's personal history as well
        if let Some(personal) = inner.personal_queue(&owner) {
            if personal != *queue_id {
                inner
                    .messages
                    .entry(personal)
                    .or_default()
                    .push(message.clone());
            }
        }

        Ok(message)
    }

    async fn get_messages(
        &self,
        queue_id: &QueueId,
        since: Option<Timestamp>,
    ) -> Result<Vec<Message>> {
        let inner = self.inner.read();
        if !inner.queues.contains_key(queue_id) {
            return Err(StorageError::QueueNotFound);
        }
        let mut messages: Vec<Message> = inner
            .messages
            .get(queue_id)
            .map(|msgs| {
                msgs.iter()
                    .filter(|m| since.is_none_or(|ts| m.timestamp > ts))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        messages.sort_by(|a, b| {
            (a.timestamp, a.key.as_str()).cmp(&(b.timestamp, b.key.as_str()))
        });
        Ok(messages)
    }

    async fn add_edge_node(&self, address: &str, load: u32) -> Result<()> {
        let mut inner = self.inner.write();
        if let Some(node) = inner.nodes.iter_mut().find(|n| n.address == address) {
            node.load = load;
        } else {
            inner.nodes.push(EdgeNode {
                address: address.to_string(),
                load,
            });
        }
        Ok(())
    }

    async fn get_edge_nodes(&self) -> Result<Vec<String>> {
        let inner = self.inner.read();
        let mut nodes = inner.nodes.clone();
        // Stable sort keeps registration order for equal loads
        nodes.sort_by_key(|n| n.load);
        Ok(nodes.into_iter().map(|n| n.address).collect())
    }
}

#[cfg(test)]
#[path = "mem_test.rs"]
mod tests;
