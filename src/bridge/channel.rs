// SPDX-License-Identifier: GPL-3.0-only

//! Request/reply transport
//!
//! The bridge only needs two operations: wait for the next request and send
//! one reply to it. [`ZmqReplyChannel`] provides them over a ZeroMQ REP
//! socket; tests substitute an in-memory channel.

use bytes::Bytes;
use tracing::info;
use zeromq::{RepSocket, Socket, SocketRecv, SocketSend, ZmqMessage};

use crate::errors::{BridgeError, BridgeResult};

/// One inbound request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub payload: Vec<u8>,
}

impl Request {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Payload as text for logging, cut to at most `limit` bytes
    pub fn preview(&self, limit: usize) -> String {
        let end = self.payload.len().min(limit);
        let mut text = String::from_utf8_lossy(&self.payload[..end]).into_owned();
        if self.payload.len() > limit {
            text.push_str("...");
        }
        text
    }
}

/// Synchronous request/reply rendezvous
#[allow(async_fn_in_trait)]
pub trait RequestChannel {
    /// Wait for the next request
    async fn recv(&mut self) -> BridgeResult<Request>;

    /// Send the reply to the request last received
    async fn send(&mut self, reply: Vec<u8>) -> BridgeResult<()>;
}

/// ZeroMQ REP socket bound to a local endpoint
pub struct ZmqReplyChannel {
    socket: RepSocket,
    endpoint: String,
}

impl ZmqReplyChannel {
    /// Bind a REP socket to `endpoint` (e.g. `tcp://127.0.0.1:5555`)
    pub async fn bind(endpoint: &str) -> BridgeResult<Self> {
        let mut socket = RepSocket::new();
        let bound = socket
            .bind(endpoint)
            .await
            .map_err(|e| BridgeError::Channel(format!("Failed to bind {}: {}", endpoint, e)))?;
        let endpoint = bound.to_string();
        info!(endpoint = %endpoint, "Reply socket bound");
        Ok(Self { socket, endpoint })
    }

    /// Endpoint actually bound, with any wildcard port resolved
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl RequestChannel for ZmqReplyChannel {
    async fn recv(&mut self) -> BridgeResult<Request> {
        let message = self.socket.recv().await?;
        let payload = message
            .into_vec()
            .into_iter()
            .flat_map(|frame| frame.to_vec())
            .collect::<Vec<u8>>();
        Ok(Request { payload })
    }

    async fn send(&mut self, reply: Vec<u8>) -> BridgeResult<()> {
        self.socket.send(ZmqMessage::from(Bytes::from(reply))).await?;
        Ok(())
    }
}
