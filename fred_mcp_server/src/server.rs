//! The MCP session loop: framing, state machine, dispatch, worker pool,
//! and cancellation.
//!
//! One session per process lifetime, newline-delimited JSON-RPC over a
//! reader/writer pair (stdio in production, in-memory duplex in tests).
//! Framing errors close the session; handler errors are per-request and
//! never do. Tool calls run on a bounded worker pool and may complete out
//! of order; responses are correlated by request id.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;

use crate::protocol::{
    CancelledParams, INVALID_PARAMS, INVALID_REQUEST, IncomingMessage, JsonRpcError,
    METHOD_NOT_FOUND, PARSE_ERROR, REQUEST_CANCELLED, RequestId, ResourceReadParams, Response,
    ToolCallParams, initialize_result, tool_text_result,
};
use crate::resources;
use crate::tools::{ToolContext, ToolRegistry};

/// Session lifecycle. The only gate is pre-initialize traffic: requests
/// other than `initialize` are rejected until the handshake completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Uninitialized,
    Initialized,
    Open,
}

pub struct McpServer {
    ctx: Arc<ToolContext>,
    registry: Arc<ToolRegistry>,
    worker_limit: usize,
}

impl McpServer {
    pub fn new(ctx: Arc<ToolContext>, registry: ToolRegistry) -> Self {
        let worker_limit = ctx.config.worker_limit;
        Self {
            ctx,
            registry: Arc::new(registry),
            worker_limit,
        }
    }

    /// Runs the session until the transport closes or a framing error
    /// occurs. In-flight handlers are cancelled on exit.
    pub async fn run<R, W>(&self, reader: R, writer: W) -> anyhow::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<String>(64);
        let writer_task = tokio::spawn(async move {
            let mut writer = writer;
            while let Some(line) = rx.recv().await {
                if writer.write_all(line.as_bytes()).await.is_err()
                    || writer.write_all(b"\n").await.is_err()
                    || writer.flush().await.is_err()
                {
                    break;
                }
            }
        });

        let semaphore = Arc::new(Semaphore::new(self.worker_limit));
        let inflight: Arc<DashMap<RequestId, CancellationToken>> = Arc::new(DashMap::new());
        let mut state = SessionState::Uninitialized;

        let mut lines = BufReader::new(reader).lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let message: IncomingMessage = match serde_json::from_str(line) {
                Ok(m) => m,
                Err(e) => {
                    tracing::error!(error = %e, "malformed frame, closing session");
                    send(
                        &tx,
                        Response::failure(
                            None,
                            JsonRpcError::new(PARSE_ERROR, format!("parse error: {e}")),
                        ),
                    )
                    .await;
                    break;
                }
            };
            self.dispatch(message, &mut state, tx.clone(), &semaphore, &inflight)
                .await;
        }

        // Transport gone: cancel whatever is still running so handlers
        // release their resources and clean partial artifacts.
        for entry in inflight.iter() {
            entry.value().cancel();
        }
        drop(tx);
        let _ = writer_task.await;
        Ok(())
    }

    async fn dispatch(
        &self,
        message: IncomingMessage,
        state: &mut SessionState,
        tx: mpsc::Sender<String>,
        semaphore: &Arc<Semaphore>,
        inflight: &Arc<DashMap<RequestId, CancellationToken>>,
    ) {
        match (message.id, message.method.as_str()) {
            (Some(id), "initialize") => {
                if *state != SessionState::Uninitialized {
                    send(
                        &tx,
                        Response::failure(
                            Some(id),
                            JsonRpcError::new(INVALID_REQUEST, "initialize already completed"),
                        ),
                    )
                    .await;
                    return;
                }
                *state = SessionState::Initialized;
                send(&tx, Response::success(id, initialize_result())).await;
            }

            (None, "notifications/initialized") => {
                if *state == SessionState::Initialized {
                    *state = SessionState::Open;
                }
            }

            (None, "notifications/cancelled") => {
                match serde_json::from_value::<CancelledParams>(message.params) {
                    Ok(params) => {
                        if let Some(entry) = inflight.get(&params.request_id) {
                            tracing::info!(request_id = %params.request_id, "cancelling request");
                            entry.value().cancel();
                        } else {
                            tracing::debug!(
                                request_id = %params.request_id,
                                "cancel for unknown or completed request"
                            );
                        }
                    }
                    Err(e) => tracing::debug!(error = %e, "unparseable cancel notification"),
                }
            }

            (Some(id), method) if *state == SessionState::Uninitialized => {
                send(
                    &tx,
                    Response::failure(
                        Some(id),
                        JsonRpcError::new(
                            INVALID_REQUEST,
                            format!("{method} before initialize"),
                        ),
                    ),
                )
                .await;
            }
            (None, _) if *state == SessionState::Uninitialized => {}

            (Some(id), "tools/list") => {
                send(
                    &tx,
                    Response::success(id, json!({ "tools": self.registry.descriptors() })),
                )
                .await;
            }

            (Some(id), "tools/call") => {
                let params = match serde_json::from_value::<ToolCallParams>(message.params) {
                    Ok(p) => p,
                    Err(e) => {
                        send(
                            &tx,
                            Response::failure(
                                Some(id),
                                JsonRpcError::new(INVALID_PARAMS, e.to_string()),
                            ),
                        )
                        .await;
                        return;
                    }
                };
                let Some(entry) = self.registry.get(&params.name) else {
                    send(
                        &tx,
                        Response::failure(
                            Some(id),
                            JsonRpcError::new(
                                METHOD_NOT_FOUND,
                                format!("Unknown tool: {}", params.name),
                            ),
                        ),
                    )
                    .await;
                    return;
                };

                let handler = Arc::clone(&entry.handler);
                let ctx = Arc::clone(&self.ctx);
                let tool = params.name.clone();
                let token = CancellationToken::new();
                inflight.insert(id.clone(), token.clone());
                let inflight = Arc::clone(inflight);
                let semaphore = Arc::clone(semaphore);
                let tx = tx.clone();

                tokio::spawn(async move {
                    let work = async {
                        let _permit = semaphore
                            .acquire_owned()
                            .await
                            .expect("worker semaphore is never closed");
                        (handler.as_ref())(ctx, params.arguments).await
                    };
                    let outcome = tokio::select! {
                        _ = token.cancelled() => None,
                        result = work => Some(result),
                    };
                    inflight.remove(&id);
                    let response = match outcome {
                        None => {
                            tracing::info!(tool = %tool, request_id = %id, "request cancelled");
                            Response::failure(
                                Some(id),
                                JsonRpcError::new(
                                    REQUEST_CANCELLED,
                                    "request cancelled by client",
                                ),
                            )
                        }
                        Some(Ok(text)) => Response::success(id, tool_text_result(text)),
                        Some(Err(err)) => {
                            tracing::warn!(tool = %tool, request_id = %id, "tool failed");
                            Response::failure(Some(id), err.into_rpc_error())
                        }
                    };
                    send(&tx, response).await;
                });
            }

            (Some(id), "resources/list") => {
                send(
                    &tx,
                    Response::success(id, json!({ "resources": resources::descriptors() })),
                )
                .await;
            }

            (Some(id), "resources/read") => {
                let params = match serde_json::from_value::<ResourceReadParams>(message.params) {
                    Ok(p) => p,
                    Err(e) => {
                        send(
                            &tx,
                            Response::failure(
                                Some(id),
                                JsonRpcError::new(INVALID_PARAMS, e.to_string()),
                            ),
                        )
                        .await;
                        return;
                    }
                };
                let response = match resources::read(&self.ctx.catalog, &params.uri) {
                    Some(contents) => Response::success(id, contents),
                    None => Response::failure(
                        Some(id),
                        JsonRpcError::new(
                            METHOD_NOT_FOUND,
                            format!("Unknown resource: {}", params.uri),
                        ),
                    ),
                };
                send(&tx, response).await;
            }

            (Some(id), method) => {
                send(
                    &tx,
                    Response::failure(
                        Some(id),
                        JsonRpcError::new(METHOD_NOT_FOUND, format!("Unknown method: {method}")),
                    ),
                )
                .await;
            }

            (None, method) => {
                tracing::debug!(method, "ignoring unknown notification");
            }
        }
    }
}

async fn send(tx: &mpsc::Sender<String>, response: Response) {
    match serde_json::to_string(&response) {
        Ok(line) => {
            let _ = tx.send(line).await;
        }
        Err(e) => tracing::error!(error = %e, "failed to serialize response"),
    }
}
