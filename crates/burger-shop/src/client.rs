//! Customer side: connect to a shop and order burgers until full or sold out.

use std::io;

use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use crate::allocation::Unit;
use crate::bridge::codec::{CodecError, CustomerCodec};
use crate::bridge::protocol::{ProtocolError, Request, Response};
use crate::pacing::Pacing;
use crate::transport::tcp::DEFAULT_PORT;

pub const DEFAULT_MAX_ORDERS: u32 = 10;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub max_orders: u32,
    /// Time spent eating each burger before ordering the next.
    pub eat_pacing: Pacing,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            max_orders: DEFAULT_MAX_ORDERS,
            eat_pacing: Pacing::none(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientEnd {
    /// Every order the customer wanted was served.
    OrderComplete,
    SoldOut,
    QuotaReached,
    /// The shop hung up without a final word.
    ServerClosed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientReport {
    pub served: Vec<Unit>,
    pub end: ClientEnd,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("unexpected reply from shop: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("shop rejected order: {0}")]
    Rejected(String),
}

/// Connect to the shop and run the order loop.
pub async fn run_client(config: ClientConfig) -> Result<ClientReport, ClientError> {
    tracing::info!(
        host = %config.host,
        port = config.port,
        max_orders = config.max_orders,
        "Connecting to burger shop"
    );
    let stream = TcpStream::connect((config.host.as_str(), config.port))
        .await
        .map_err(|source| ClientError::Connect {
            addr: format!("{}:{}", config.host, config.port),
            source,
        })?;

    order_loop(stream, config.max_orders, &config.eat_pacing).await
}

/// Order up to `max_orders` burgers over an established connection.
pub async fn order_loop<S>(
    stream: S,
    max_orders: u32,
    eat_pacing: &Pacing,
) -> Result<ClientReport, ClientError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut framed = Framed::new(stream, CustomerCodec::new());
    let mut served = Vec::new();

    for order in 1..=max_orders {
        if let Err(e) = framed.send(Request::Order).await {
            if is_hangup(&e) {
                return Ok(finish(served, ClientEnd::ServerClosed));
            }
            return Err(e.into());
        }
        tracing::debug!(order, "Ordered burger");

        let response = match framed.next().await {
            Some(Ok(response)) => response?,
            Some(Err(e)) if is_hangup(&e) => return Ok(finish(served, ClientEnd::ServerClosed)),
            Some(Err(e)) => return Err(e.into()),
            None => return Ok(finish(served, ClientEnd::ServerClosed)),
        };

        match response {
            Response::Served(unit) => {
                let eat_time = eat_pacing.pick();
                tokio::time::sleep(eat_time).await;
                tracing::info!(
                    %unit,
                    eat_ms = eat_time.as_millis() as u64,
                    left = max_orders - order,
                    "Finished eating burger"
                );
                served.push(unit);
            }
            Response::SoldOut => return Ok(finish(served, ClientEnd::SoldOut)),
            Response::QuotaReached => return Ok(finish(served, ClientEnd::QuotaReached)),
            Response::Error(reason) => return Err(ClientError::Rejected(reason)),
        }
    }

    Ok(finish(served, ClientEnd::OrderComplete))
}

fn finish(served: Vec<Unit>, end: ClientEnd) -> ClientReport {
    tracing::info!(served = served.len(), ?end, "Leaving the shop");
    ClientReport { served, end }
}

fn is_hangup(e: &CodecError) -> bool {
    matches!(
        e,
        CodecError::Io(io) if matches!(
            io.kind(),
            io::ErrorKind::BrokenPipe
                | io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
        )
    )
}
