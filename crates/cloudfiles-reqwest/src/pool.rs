//! Per-shape connection pool.

use std::collections::BTreeMap;

use cloudfiles_core::{RequestShape, Result};
use reqwest::Client;
use tokio::sync::Mutex;

use crate::TRACING_TARGET_POOL;

/// One lazily opened client per request shape.
///
/// Clients are never shared across shapes: each carries options fixed at
/// build time (timeouts, default headers, TLS roots, verbosity).
#[derive(Debug, Default)]
pub(crate) struct ConnectionPool {
    clients: Mutex<BTreeMap<RequestShape, Client>>,
}

impl ConnectionPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the client for `shape`, opening it with `open` on first use.
    pub async fn get_or_open<F>(&self, shape: RequestShape, open: F) -> Result<Client>
    where
        F: FnOnce(RequestShape) -> Result<Client>,
    {
        let mut clients = self.clients.lock().await;
        if let Some(client) = clients.get(&shape) {
            return Ok(client.clone());
        }

        let client = open(shape)?;
        clients.insert(shape, client.clone());

        tracing::debug!(
            target: TRACING_TARGET_POOL,
            shape = %shape,
            open = clients.len(),
            "Opened pooled connection"
        );

        Ok(client)
    }

    /// Rebuilds every open client with `open`, keeping the set of open shapes.
    pub async fn rebuild<F>(&self, mut open: F) -> Result<()>
    where
        F: FnMut(RequestShape) -> Result<Client>,
    {
        let mut clients = self.clients.lock().await;
        for (shape, client) in clients.iter_mut() {
            *client = open(*shape)?;
        }

        if !clients.is_empty() {
            tracing::debug!(
                target: TRACING_TARGET_POOL,
                open = clients.len(),
                "Rebuilt pooled connections"
            );
        }
        Ok(())
    }

    /// Drops every client, returning how many were open.
    pub async fn close(&self) -> usize {
        let mut clients = self.clients.lock().await;
        let closed = clients.len();
        clients.clear();
        closed
    }

    /// Returns the shapes that currently have an open client.
    pub async fn open_shapes(&self) -> Vec<RequestShape> {
        self.clients.lock().await.keys().copied().collect()
    }
}
