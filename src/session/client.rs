use anyhow::{Error, Result};
use futures_util::StreamExt;

use super::state::{Event, Session};

/// Send `text` to the chat endpoint at `url` and feed the streamed
/// reply into the session. `render` is called after every change so
/// the caller can redraw. Request and stream failures settle the
/// session with an error instead of returning one, only a rejected
/// submission is an `Err`.
pub async fn exchange<F>(
    client: &reqwest::Client,
    url: &str,
    session: &Session,
    text: &str,
    mut render: F,
) -> Result<Session, Error>
where
    F: FnMut(&Session),
{
    let mut session = session.apply(Event::Submit(text.to_string()))?;
    render(&session);

    let response = client.post(url).json(session.outgoing()).send().await;
    let response = match response {
        Ok(resp) if resp.status().is_success() => resp,
        Ok(resp) => {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            tracing::error!("Chat request failed with {}: {}", status, body);
            session = session.apply(Event::StreamFailed(format!("{}: {}", status, body)))?;
            render(&session);
            return Ok(session);
        }
        Err(e) => {
            tracing::error!("Error sending message: {}", e);
            session = session.apply(Event::StreamFailed(e.to_string()))?;
            render(&session);
            return Ok(session);
        }
    };

    let mut bytes = response.bytes_stream();
    while let Some(chunk) = bytes.next().await {
        match chunk {
            Ok(chunk) => {
                session = session.apply(Event::ChunkReceived(chunk.to_vec()))?;
                render(&session);
            }
            Err(e) => {
                tracing::error!("Reply stream failed: {}", e);
                session = session.apply(Event::StreamFailed(e.to_string()))?;
                render(&session);
                return Ok(session);
            }
        }
    }

    session = session.apply(Event::StreamSettled)?;
    render(&session);
    Ok(session)
}
