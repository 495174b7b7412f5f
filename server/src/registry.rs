//! Connection registry for the multiplexed server
//!
//! Tracks every accepted client channel and is the sole authority for who
//! receives snapshot broadcasts. Each entry is the sending half of an
//! unbounded channel consumed by that connection's writer task; a failed
//! send means the writer is gone, so the client is deregistered on the
//! spot. Delivery is not transactional: one dead client never blocks or
//! rolls back delivery to the others.

use log::info;
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;

pub struct ClientRegistry {
    /// Writer-task handles indexed by client id.
    clients: HashMap<u32, UnboundedSender<Vec<u8>>>,
    /// Next id handed out on accept.
    next_client_id: u32,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
        }
    }

    /// Registers a freshly accepted connection and returns its id.
    pub fn add(&mut self, outbox: UnboundedSender<Vec<u8>>) -> u32 {
        let client_id = self.next_client_id;
        self.next_client_id += 1;
        self.clients.insert(client_id, outbox);
        client_id
    }

    /// Deregisters a connection. Returns false if it was already gone,
    /// which happens when a write failure raced the reader's EOF report.
    pub fn remove(&mut self, client_id: u32) -> bool {
        if self.clients.remove(&client_id).is_some() {
            info!("client {} disconnected", client_id);
            true
        } else {
            false
        }
    }

    /// Queues a payload for one client. Deregisters it on failure.
    pub fn send_to(&mut self, client_id: u32, payload: Vec<u8>) -> bool {
        match self.clients.get(&client_id) {
            Some(outbox) if outbox.send(payload).is_ok() => true,
            Some(_) => {
                self.remove(client_id);
                false
            }
            None => false,
        }
    }

    /// Queues a payload for every registered client, deregistering any
    /// whose writer has gone away.
    pub fn broadcast(&mut self, payload: &[u8]) {
        self.fan_out(payload, None);
    }

    /// Peer-relay: forwards a client's raw bytes to everyone but the
    /// sender, so every viewer sees every other viewer's commands.
    pub fn relay(&mut self, payload: &[u8], from_client_id: u32) {
        self.fan_out(payload, Some(from_client_id));
    }

    fn fan_out(&mut self, payload: &[u8], exclude: Option<u32>) {
        let mut dead = Vec::new();
        for (client_id, outbox) in &self.clients {
            if Some(*client_id) == exclude {
                continue;
            }
            if outbox.send(payload.to_vec()).is_err() {
                dead.push(*client_id);
            }
        }
        for client_id in dead {
            self.remove(client_id);
        }
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}
