//! Consumer session: one connected customer ordering burgers.
//!
//! Each `ORDER` becomes one claim on the ledger. While a claim is waiting for
//! stock the session keeps reading from the customer, so a customer that
//! leaves is noticed before anything is claimed on its behalf. Orders that
//! arrive while waiting are queued and served in turn.
//!
//! Failures here (customer gone, socket errors) end this session only; they
//! never reach the ledger or other sessions.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;

use crate::allocation::{ClaimOutcome, Ledger, RunState, Unit};
use crate::bridge::codec::{CodecError, ShopCodec};
use crate::bridge::protocol::{ProtocolError, Request, Response, SessionId};
use crate::config::DEFAULT_REQUEST_QUOTA;
use crate::pacing::Pacing;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Burgers this connection may receive before it is turned away.
    pub request_quota: u32,
    /// Delay after each served burger before the next order is read.
    pub pacing: Pacing,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            request_quota: DEFAULT_REQUEST_QUOTA,
            pacing: Pacing::consumption(),
        }
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEnd {
    /// The shop ran out; the customer was told `SOLD_OUT`.
    SoldOut,
    /// The customer used up its quota.
    QuotaReached,
    /// The customer closed the connection.
    Disconnected,
    /// The connection failed; see `SessionReport::error`.
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub id: SessionId,
    pub served: Vec<Unit>,
    pub end: SessionEnd,
    /// Claimed but never confirmed delivered because the write failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub undelivered: Option<Unit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Peer failures. Local to one session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to read order: {0}")]
    Read(#[source] CodecError),
    #[error("failed to deliver burger {unit}: {source}")]
    Delivery {
        unit: Unit,
        #[source]
        source: CodecError,
    },
    #[error("failed to reply: {0}")]
    Reply(#[source] CodecError),
}

enum Incoming {
    Request(Result<Request, ProtocolError>),
    /// The customer closed its side.
    Closed,
    /// The ledger left `Running` while the customer was idle.
    ShopClosed(RunState),
}

enum Wait {
    Outcome(ClaimOutcome),
    CustomerGone,
}

pub struct ConsumerSession<S> {
    id: SessionId,
    ledger: Arc<Ledger>,
    config: SessionConfig,
    framed: Framed<S, ShopCodec>,
    backlog: VecDeque<Result<Request, ProtocolError>>,
    served: Vec<Unit>,
    undelivered: Option<Unit>,
}

impl<S> ConsumerSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(id: SessionId, ledger: Arc<Ledger>, config: SessionConfig, stream: S) -> Self {
        Self {
            id,
            ledger,
            config,
            framed: Framed::new(stream, ShopCodec::new()),
            backlog: VecDeque::new(),
            served: Vec::new(),
            undelivered: None,
        }
    }

    /// Serve the customer until the shop sells out, the quota is used up,
    /// or the connection ends.
    pub async fn run(mut self) -> SessionReport {
        let (end, error) = match self.serve().await {
            Ok(end) => {
                tracing::info!(
                    session = %self.id,
                    served = self.served.len(),
                    ?end,
                    "Session finished"
                );
                (end, None)
            }
            Err(e) => {
                tracing::warn!(
                    session = %self.id,
                    served = self.served.len(),
                    error = %e,
                    "Session failed"
                );
                (SessionEnd::Failed, Some(e.to_string()))
            }
        };

        SessionReport {
            id: self.id,
            served: self.served,
            end,
            undelivered: self.undelivered,
            error,
        }
    }

    async fn serve(&mut self) -> Result<SessionEnd, SessionError> {
        loop {
            let request = match self.next_request().await? {
                Incoming::Request(request) => request,
                Incoming::Closed => return Ok(SessionEnd::Disconnected),
                Incoming::ShopClosed(state) => {
                    tracing::debug!(session = %self.id, %state, "Shop closed while customer idle");
                    self.reply(Response::SoldOut).await?;
                    return Ok(SessionEnd::SoldOut);
                }
            };

            match request {
                Err(e) => {
                    tracing::debug!(session = %self.id, error = %e, "Rejecting request");
                    self.reply(Response::Error(e.to_string())).await?;
                }
                Ok(Request::Order) => {
                    if self.served.len() >= self.config.request_quota as usize {
                        self.reply(Response::QuotaReached).await?;
                        return Ok(SessionEnd::QuotaReached);
                    }

                    match self.claim_while_connected().await? {
                        Wait::Outcome(ClaimOutcome::Claimed(unit)) => {
                            self.deliver(unit).await?;
                            tokio::time::sleep(self.config.pacing.pick()).await;
                        }
                        Wait::Outcome(ClaimOutcome::Exhausted) => {
                            self.reply(Response::SoldOut).await?;
                            return Ok(SessionEnd::SoldOut);
                        }
                        Wait::CustomerGone => return Ok(SessionEnd::Disconnected),
                    }
                }
            }
        }
    }

    /// Next queued or incoming request, or notice that the shop has closed.
    async fn next_request(&mut self) -> Result<Incoming, SessionError> {
        if let Some(request) = self.backlog.pop_front() {
            return Ok(Incoming::Request(request));
        }

        let ledger = Arc::clone(&self.ledger);
        tokio::select! {
            biased;

            frame = self.framed.next() => match frame {
                Some(Ok(request)) => Ok(Incoming::Request(request)),
                Some(Err(e)) => Err(SessionError::Read(e)),
                None => Ok(Incoming::Closed),
            },
            state = ledger.closed() => Ok(Incoming::ShopClosed(state)),
        }
    }

    /// Claim a unit, abandoning the claim if the customer leaves first.
    async fn claim_while_connected(&mut self) -> Result<Wait, SessionError> {
        let ledger = Arc::clone(&self.ledger);
        let claim = ledger.claim();
        tokio::pin!(claim);

        // A full quota of queued requests is all this customer can ever be
        // served; anything read past that is dropped, but the read side stays
        // watched so a hang-up is still noticed.
        let backlog_limit = self.config.request_quota as usize;

        loop {
            tokio::select! {
                biased;

                frame = self.framed.next() => match frame {
                    Some(Ok(request)) if self.backlog.len() < backlog_limit => {
                        self.backlog.push_back(request);
                    }
                    Some(Ok(_)) => {
                        tracing::debug!(session = %self.id, "Backlog full, dropping request");
                    }
                    Some(Err(e)) => return Err(SessionError::Read(e)),
                    None => {
                        tracing::info!(session = %self.id, "Customer left while waiting for a burger");
                        return Ok(Wait::CustomerGone);
                    }
                },
                outcome = &mut claim => return Ok(Wait::Outcome(outcome)),
            }
        }
    }

    async fn deliver(&mut self, unit: Unit) -> Result<(), SessionError> {
        if let Err(source) = self.framed.send(Response::Served(unit)).await {
            self.undelivered = Some(unit);
            return Err(SessionError::Delivery { unit, source });
        }
        tracing::info!(session = %self.id, %unit, "Served burger");
        self.served.push(unit);
        Ok(())
    }

    async fn reply(&mut self, response: Response) -> Result<(), SessionError> {
        self.framed
            .send(response)
            .await
            .map_err(SessionError::Reply)
    }
}
