//! Assistant reply stream.
//!
//! DESIGN
//! ======
//! `MessageStream` turns the chunked body of `POST /api/Message/complete`
//! into text pieces. It ends with `None` when the backend closes the body;
//! on a transport or decode error it yields one `Err` and then `None`.
//! There is no reconnect: the caller decides what to do with a broken reply.

#[cfg(test)]
#[path = "stream_test.rs"]
mod tests;

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{BoxStream, Stream, StreamExt};

use crate::error::ApiError;

// =============================================================================
// UTF-8 DECODER
// =============================================================================

/// Incremental UTF-8 decoder tolerant of characters split across chunks.
#[derive(Debug, Default)]
pub(crate) struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Append `chunk` and return all complete text decoded so far.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Result<String, ApiError> {
        self.pending.extend_from_slice(chunk);
        match std::str::from_utf8(&self.pending) {
            Ok(text) => {
                let text = text.to_owned();
                self.pending.clear();
                Ok(text)
            }
            Err(e) if e.error_len().is_none() => {
                // Incomplete trailing sequence: emit the valid prefix, keep the rest.
                let tail = self.pending.split_off(e.valid_up_to());
                let text = String::from_utf8(std::mem::replace(&mut self.pending, tail))
                    .map_err(|e| ApiError::Decode(e.to_string()))?;
                Ok(text)
            }
            Err(e) => Err(ApiError::Decode(e.to_string())),
        }
    }

    /// Fail if the stream ended inside a multi-byte character.
    pub(crate) fn finish(&mut self) -> Result<(), ApiError> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            let len = self.pending.len();
            self.pending.clear();
            Err(ApiError::Decode(format!("stream ended with {len} byte(s) of an incomplete character")))
        }
    }
}

// =============================================================================
// MESSAGE STREAM
// =============================================================================

/// Live assistant reply, consumed until the backend closes it.
pub struct MessageStream {
    chunks: Option<BoxStream<'static, Result<Vec<u8>, ApiError>>>,
    decoder: Utf8Decoder,
}

impl MessageStream {
    pub(crate) fn from_response(response: reqwest::Response) -> Self {
        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(ApiError::from));
        Self::from_chunks(chunks)
    }

    pub(crate) fn from_chunks<S>(chunks: S) -> Self
    where
        S: Stream<Item = Result<Vec<u8>, ApiError>> + Send + 'static,
    {
        Self { chunks: Some(chunks.boxed()), decoder: Utf8Decoder::default() }
    }

    /// Stop reading and close the connection.
    pub fn cancel(mut self) {
        if self.chunks.take().is_some() {
            tracing::debug!("message stream cancelled");
        }
    }

    /// Drain the stream into one string.
    ///
    /// # Errors
    ///
    /// Returns the first transport or decode error; text read before it is discarded.
    pub async fn collect_text(mut self) -> Result<String, ApiError> {
        let mut text = String::new();
        while let Some(piece) = self.next().await {
            text.push_str(&piece?);
        }
        Ok(text)
    }
}

impl Stream for MessageStream {
    type Item = Result<String, ApiError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            let Some(chunks) = this.chunks.as_mut() else {
                return Poll::Ready(None);
            };
            match chunks.poll_next_unpin(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(Ok(bytes))) => match this.decoder.push(&bytes) {
                    Ok(text) if text.is_empty() => {}
                    Ok(text) => return Poll::Ready(Some(Ok(text))),
                    Err(e) => {
                        this.chunks = None;
                        return Poll::Ready(Some(Err(e)));
                    }
                },
                Poll::Ready(Some(Err(e))) => {
                    this.chunks = None;
                    tracing::warn!(error = %e, "message stream failed");
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    this.chunks = None;
                    return Poll::Ready(this.decoder.finish().err().map(Err));
                }
            }
        }
    }
}

impl std::fmt::Debug for MessageStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageStream")
            .field("open", &self.chunks.is_some())
            .finish_non_exhaustive()
    }
}
