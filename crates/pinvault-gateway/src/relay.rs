//! Download stream relay
//!
//! A producer task pulls chunks from Drive and pushes them through a bounded
//! channel; the response body drains the channel. Upstream failures and idle
//! timeouts are forwarded as body errors, which makes hyper abort the
//! response rather than leave it open. A dropped client closes the channel and
//! stops the producer.

use axum::body::Body;
use bytes::Bytes;
use futures::{channel::mpsc, SinkExt, StreamExt};
use pinvault_drive::{ByteStream, DriveError};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

/// Chunks buffered between Drive and the client
const RELAY_CAPACITY: usize = 8;

/// Why a relayed download stopped early
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("upstream stream failed: {0}")]
    Upstream(#[from] DriveError),

    #[error("no data from upstream for {0:?}")]
    IdleTimeout(Duration),
}

/// Start relaying `upstream` into a response body
///
/// The first chunk is read before returning so that a stream that fails
/// immediately can still be answered with a regular error response.
pub async fn relay(mut upstream: ByteStream, idle_timeout: Duration) -> Result<Body, RelayError> {
    let first = next_chunk(&mut upstream, idle_timeout).await?;

    let (mut tx, rx) = mpsc::channel::<Result<Bytes, RelayError>>(RELAY_CAPACITY);

    match first {
        Some(first) => {
            tokio::spawn(async move {
                if tx.send(Ok(first)).await.is_err() {
                    return;
                }
                loop {
                    match next_chunk(&mut upstream, idle_timeout).await {
                        Ok(Some(chunk)) => {
                            if tx.send(Ok(chunk)).await.is_err() {
                                debug!("Client went away, stopping download relay");
                                return;
                            }
                        }
                        Ok(None) => return,
                        Err(e) => {
                            error!(error = %e, "Error streaming file");
                            let _ = tx.send(Err(e)).await;
                            return;
                        }
                    }
                }
            });
        }
        // Empty file: closing the sender ends the body at once
        None => drop(tx),
    }

    Ok(Body::from_stream(rx))
}

async fn next_chunk(
    upstream: &mut ByteStream,
    idle_timeout: Duration,
) -> Result<Option<Bytes>, RelayError> {
    match tokio::time::timeout(idle_timeout, upstream.next()).await {
        Ok(Some(Ok(chunk))) => Ok(Some(chunk)),
        Ok(Some(Err(e))) => Err(e.into()),
        Ok(None) => Ok(None),
        Err(_) => Err(RelayError::IdleTimeout(idle_timeout)),
    }
}
