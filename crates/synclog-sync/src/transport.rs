//! Transport abstraction between agents and the authority.
//!
//! Loss is decided by each agent's channels before anything is sent, so a
//! transport only has to deliver what it is given and hand back the reply.

use std::sync::Arc;

use async_trait::async_trait;

use synclog_core::{CatchUpResponse, Message};

use crate::authority::SyncAuthority;
use crate::error::Result;

/// Delivers agent messages to the authority.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a message. Probes get `Some(update)`; records get `None`.
    async fn send(&self, message: Message) -> Result<Option<CatchUpResponse>>;
}

/// Calls straight into a shared authority.
#[derive(Debug, Clone)]
pub struct LocalTransport {
    authority: Arc<SyncAuthority>,
}

impl LocalTransport {
    /// Create a transport over `authority`.
    pub fn new(authority: Arc<SyncAuthority>) -> Self {
        Self { authority }
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn send(&self, message: Message) -> Result<Option<CatchUpResponse>> {
        Ok(self.authority.handle(Some(message))?)
    }
}

/// An in-memory transport that serializes every message.
///
/// A service task owns the authority handle and serves CBOR requests from a
/// channel, so agents running as separate tasks share nothing but messages.
pub mod memory {
    use super::*;
    use synclog_core::ProtocolError;
    use tokio::sync::{mpsc, oneshot};
    use tokio::task::JoinHandle;

    use crate::error::SyncError;

    type Reply = std::result::Result<Option<Vec<u8>>, ProtocolError>;

    /// A request in flight to the service task.
    struct Request {
        bytes: Vec<u8>,
        reply: oneshot::Sender<Reply>,
    }

    /// Task serving encoded messages against an authority.
    pub struct AuthorityService {
        authority: Arc<SyncAuthority>,
        receiver: mpsc::Receiver<Request>,
    }

    impl AuthorityService {
        /// Spawn the service on the current runtime.
        ///
        /// The task ends once every [`MemoryTransport`] clone is dropped.
        pub fn spawn(
            authority: Arc<SyncAuthority>,
            capacity: usize,
        ) -> (MemoryTransport, JoinHandle<()>) {
            let (sender, receiver) = mpsc::channel(capacity.max(1));
            let service = Self {
                authority,
                receiver,
            };
            let handle = tokio::spawn(service.run());
            (MemoryTransport { sender }, handle)
        }

        async fn run(mut self) {
            while let Some(request) = self.receiver.recv().await {
                let result = self.authority.handle_bytes(&request.bytes);
                if let Err(e) = &result {
                    tracing::warn!("Rejected message: {}", e);
                }
                // The sender may have given up waiting; nothing to do then.
                let _ = request.reply.send(result);
            }
            tracing::debug!("authority service stopped");
        }
    }

    /// Client end of an [`AuthorityService`].
    #[derive(Clone)]
    pub struct MemoryTransport {
        sender: mpsc::Sender<Request>,
    }

    impl MemoryTransport {
        /// Send pre-encoded bytes and return the encoded reply.
        pub async fn send_bytes(&self, bytes: Vec<u8>) -> Result<Option<Vec<u8>>> {
            let (reply, response) = oneshot::channel();
            self.sender
                .send(Request { bytes, reply })
                .await
                .map_err(|_| SyncError::TransportError("authority service stopped".into()))?;

            let reply = response
                .await
                .map_err(|_| SyncError::TransportError("authority dropped request".into()))?;
            Ok(reply?)
        }
    }

    #[async_trait]
    impl Transport for MemoryTransport {
        async fn send(&self, message: Message) -> Result<Option<CatchUpResponse>> {
            let bytes = message.to_bytes()?;
            let Some(reply) = self.send_bytes(bytes).await? else {
                return Ok(None);
            };

            match Message::from_bytes(&reply)? {
                Message::Update(response) => Ok(Some(response)),
                other => Err(ProtocolError::UnexpectedKind {
                    kind: other.kind(),
                    receiver: "agent",
                }
                .into()),
            }
        }
    }
}
