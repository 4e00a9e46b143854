use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::{Error, RpcError, TransportError};
use crate::jsonrpc::{unexpected_response, BatchReply, JsonRpcRequest, JsonRpcResponse};

pub const DEFAULT_BATCH_INTERVAL: Duration = Duration::from_millis(50);

/// Sends one JSON-RPC batch as a single network round trip.
#[async_trait]
pub trait BatchTransport: Send + Sync {
    async fn send_batch(&self, batch: Vec<JsonRpcRequest>) -> Result<BatchReply, TransportError>;
}

/// JSON-RPC over HTTP POST.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

#[cfg(feature = "http")]
impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl BatchTransport for HttpTransport {
    async fn send_batch(&self, batch: Vec<JsonRpcRequest>) -> Result<BatchReply, TransportError> {
        let response = self
            .client
            .post(&self.url)
            .json(&batch)
            .send()
            .await
            .map_err(|e| TransportError::Send(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        response
            .json::<BatchReply>()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))
    }
}

type Reply = Result<Value, Error>;

struct QueuedRequest {
    request: JsonRpcRequest,
    reply: oneshot::Sender<Reply>,
}

struct Shared {
    chain_id: u64,
    interval: Duration,
    transport: Arc<dyn BatchTransport>,
    next_id: AtomicU64,
    queue: Mutex<Vec<QueuedRequest>>,
}

/// Coalesces requests issued within one batch window into a single
/// JSON-RPC batch call.
///
/// Cloning is cheap; clones share the same queue.
#[derive(Clone)]
pub struct BatchingProvider {
    shared: Arc<Shared>,
}

impl fmt::Debug for BatchingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchingProvider")
            .field("chain_id", &self.shared.chain_id)
            .field("interval", &self.shared.interval)
            .finish_non_exhaustive()
    }
}

impl BatchingProvider {
    pub fn new(chain_id: u64, transport: Arc<dyn BatchTransport>) -> Self {
        Self::with_interval(chain_id, transport, DEFAULT_BATCH_INTERVAL)
    }

    pub fn with_interval(chain_id: u64, transport: Arc<dyn BatchTransport>, interval: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                chain_id,
                interval,
                transport,
                next_id: AtomicU64::new(1),
                queue: Mutex::new(Vec::new()),
            }),
        }
    }

    #[cfg(feature = "http")]
    pub fn http(chain_id: u64, url: impl Into<String>, interval: Duration) -> Self {
        Self::with_interval(chain_id, Arc::new(HttpTransport::new(url)), interval)
    }

    pub fn chain_id(&self) -> u64 {
        self.shared.chain_id
    }

    pub fn batch_interval(&self) -> Duration {
        self.shared.interval
    }

    /// Queue `method` for the current batch window.
    ///
    /// The request is admitted immediately; the returned future only waits
    /// for the reply. `eth_chainId` is answered from configuration.
    pub fn request(&self, method: &str, params: Value) -> PendingRequest {
        if method == "eth_chainId" {
            let id = format!("0x{:x}", self.shared.chain_id);
            return PendingRequest::ready(Ok(Value::String(id)));
        }

        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        let queued = QueuedRequest {
            request: JsonRpcRequest::new(id, method, params),
            reply: tx,
        };

        let mut queue = self.shared.queue.lock().unwrap_or_else(PoisonError::into_inner);
        queue.push(queued);
        if queue.len() == 1 {
            let Ok(handle) = tokio::runtime::Handle::try_current() else {
                queue.clear();
                return PendingRequest::ready(Err(TransportError::NoRuntime.into()));
            };
            let shared = Arc::clone(&self.shared);
            handle.spawn(async move {
                tokio::time::sleep(shared.interval).await;
                shared.flush().await;
            });
        }

        PendingRequest::waiting(rx)
    }
}

impl Shared {
    async fn flush(&self) {
        let batch = {
            let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *queue)
        };
        if batch.is_empty() {
            return;
        }

        debug!(chain_id = self.chain_id, size = batch.len(), "flushing rpc batch");

        let (requests, replies): (Vec<_>, Vec<_>) = batch
            .into_iter()
            .map(|q| {
                let method = q.request.method.clone();
                let id = q.request.id;
                (q.request, (id, method, q.reply))
            })
            .unzip();

        match self.transport.send_batch(requests).await {
            Err(err) => {
                warn!(chain_id = self.chain_id, error = %err, "rpc batch failed");
                for (_, _, reply) in replies {
                    let _ = reply.send(Err(err.clone().into()));
                }
            }
            Ok(BatchReply::Single(response)) => {
                let err: Error = match response.error {
                    Some(error) => RpcError::from(error).into(),
                    None => TransportError::InvalidResponse(
                        "expected an array reply to a batch request".to_string(),
                    )
                    .into(),
                };
                warn!(chain_id = self.chain_id, error = %err, "rpc batch rejected");
                for (_, _, reply) in replies {
                    let _ = reply.send(Err(err.clone()));
                }
            }
            Ok(BatchReply::Batch(responses)) => {
                let mut by_position: Vec<Option<JsonRpcResponse>> = Vec::with_capacity(responses.len());
                let mut by_id = HashMap::with_capacity(responses.len());
                for response in responses {
                    match response.id {
                        Some(id) => {
                            by_id.insert(id, response);
                            by_position.push(None);
                        }
                        None => by_position.push(Some(response)),
                    }
                }

                for (position, (id, method, reply)) in replies.into_iter().enumerate() {
                    let response = by_id
                        .remove(&id)
                        .or_else(|| by_position.get_mut(position).and_then(Option::take));
                    let outcome = match response {
                        Some(response) => response.into_result(&method),
                        None => Err(unexpected_response(&method)),
                    };
                    if let Err(e) = &outcome {
                        debug!(id, code = e.code, message = %e.message, "rpc request failed");
                    }
                    let _ = reply.send(outcome.map_err(Error::from));
                }
            }
        }
    }
}

/// The eventual reply to a single batched request. Resolves exactly once.
pub struct PendingRequest {
    state: PendingState,
}

enum PendingState {
    Ready(Option<Reply>),
    Waiting(oneshot::Receiver<Reply>),
}

impl PendingRequest {
    fn ready(reply: Reply) -> Self {
        Self {
            state: PendingState::Ready(Some(reply)),
        }
    }

    fn waiting(rx: oneshot::Receiver<Reply>) -> Self {
        Self {
            state: PendingState::Waiting(rx),
        }
    }
}

impl Future for PendingRequest {
    type Output = Reply;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().state {
            PendingState::Ready(reply) => Poll::Ready(
                reply
                    .take()
                    .unwrap_or_else(|| Err(TransportError::Dropped.into())),
            ),
            PendingState::Waiting(rx) => Pin::new(rx)
                .poll(cx)
                .map(|r| r.unwrap_or_else(|_| Err(TransportError::Dropped.into()))),
        }
    }
}

impl fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            PendingState::Ready(_) => "ready",
            PendingState::Waiting(_) => "waiting",
        };
        f.debug_struct("PendingRequest").field("state", &state).finish()
    }
}
