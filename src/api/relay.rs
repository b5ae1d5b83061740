//! Forwards a completion to a response body.

use anyhow::Error;
use async_stream::stream;
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::ai::services::DeltaStream;

/// Send each delta to `tx` as soon as it arrives, in order. An
/// upstream error is forwarded as the final item so the response
/// body ends in an error instead of looking complete. If the
/// receiver goes away the upstream stream is dropped, which cancels
/// the completion request.
pub async fn relay(mut deltas: DeltaStream, tx: mpsc::UnboundedSender<Result<String, Error>>) {
    let mut forwarded = 0;

    loop {
        tokio::select! {
            _ = tx.closed() => {
                tracing::info!("Client disconnected after {} chunks, cancelling completion", forwarded);
                return;
            }
            next = deltas.next() => {
                match next {
                    Some(Ok(delta)) => {
                        if tx.send(Ok(delta)).is_err() {
                            tracing::info!("Client disconnected after {} chunks, cancelling completion", forwarded);
                            return;
                        }
                        forwarded += 1;
                    }
                    Some(Err(e)) => {
                        tracing::error!("Completion failed after {} chunks: {}", forwarded, e);
                        let _ = tx.send(Err(e));
                        return;
                    }
                    None => {
                        tracing::debug!("Completion finished after {} chunks", forwarded);
                        return;
                    }
                }
            }
        }
    }
}

/// Turn the receiving end of a relay into a response body stream.
///
/// Hyper aborts the connection as soon as the body yields an error,
/// dropping any chunks it has buffered but not yet written. Before
/// passing the error on, yield back once so the chunks already handed
/// over are flushed to the client.
pub fn body_stream(
    rx: mpsc::UnboundedReceiver<Result<String, Error>>,
) -> impl Stream<Item = Result<String, Error>> + Send + 'static {
    let mut items = UnboundedReceiverStream::new(rx);

    stream! {
        while let Some(item) = items.next().await {
            match item {
                Ok(delta) => yield Ok(delta),
                Err(e) => {
                    tokio::task::yield_now().await;
                    yield Err(e);
                    return;
                }
            }
        }
    }
}
