//! Wire-level helpers shared by the streaming clients.
//!
//! Providers stream either newline-delimited JSON (Ollama) or server-sent
//! events (Gemini, OpenAI). Both are line oriented, so the response body is
//! first re-chunked into lines and each provider maps lines to [`Fragment`]s.

use std::pin::Pin;

use futures::{Stream, StreamExt, TryStreamExt, future, stream};

use crate::{
    chat::{Fragment, FragmentStream},
    config::llm_provider::LlmProvider,
    error_handler::{AiLlmError, ProviderError, ProviderErrorKind},
};

/// Splits a byte stream into text lines without the `\n` / `\r\n` terminator.
///
/// Chunk boundaries may fall anywhere, including inside a multi-byte UTF-8
/// sequence. A trailing line without terminator is yielded at end of stream.
/// The first transport error ends the stream.
pub(crate) fn lines<S, B, E>(bytes: S) -> impl Stream<Item = Result<String, AiLlmError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Into<AiLlmError> + Send,
{
    let reader = LineReader {
        inner: Box::pin(bytes),
        buf: Vec::new(),
        finished: false,
    };
    stream::unfold(reader, |mut reader| async move {
        reader.next_line().await.map(|item| (item, reader))
    })
}

struct LineReader<S> {
    inner: Pin<Box<S>>,
    buf: Vec<u8>,
    finished: bool,
}

impl<S, B, E> LineReader<S>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<AiLlmError>,
{
    async fn next_line(&mut self) -> Option<Result<String, AiLlmError>> {
        loop {
            if let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
                let raw: Vec<u8> = self.buf.drain(..=pos).collect();
                return Some(Ok(decode_line(&raw)));
            }
            if self.finished {
                if self.buf.is_empty() {
                    return None;
                }
                let raw = std::mem::take(&mut self.buf);
                return Some(Ok(decode_line(&raw)));
            }
            match self.inner.next().await {
                Some(Ok(chunk)) => self.buf.extend_from_slice(chunk.as_ref()),
                Some(Err(err)) => {
                    self.finished = true;
                    self.buf.clear();
                    return Some(Err(err.into()));
                }
                None => self.finished = true,
            }
        }
    }
}

fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(['\n', '\r'])
        .to_string()
}

/// Maps lines to fragments with a provider-specific parser.
///
/// The parser returns `Ok(None)` for lines that are not events (blank SSE
/// separators, comments, `[DONE]`).
pub(crate) fn fragments<L, F>(lines: L, provider: LlmProvider, parse: F) -> FragmentStream
where
    L: Stream<Item = Result<String, AiLlmError>> + Send + 'static,
    F: Fn(&str) -> Result<Option<Fragment>, ProviderErrorKind> + Send + Sync + 'static,
{
    lines
        .try_filter_map(move |line| {
            future::ready(
                parse(&line).map_err(|kind| AiLlmError::from(ProviderError::new(provider, kind))),
            )
        })
        .boxed()
}

/// Returns the payload of an SSE `data:` line, or `None` for any other line.
pub(crate) fn sse_payload(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("data:")?;
    Some(rest.strip_prefix(' ').unwrap_or(rest).trim_end())
}
