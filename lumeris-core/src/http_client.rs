use std::time::Instant;

use reqwest::{Client, StatusCode};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{CoreResult, LumerisError};

/// A boxed stream of decoded text fragments from a streaming response body.
pub type FragmentStream =
    std::pin::Pin<Box<dyn futures_util::stream::Stream<Item = CoreResult<String>> + Send>>;

/// Thin wrapper around reqwest::Client with defaults and helpers.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    user_agent: String,
}

impl HttpClient {
    pub fn new_default() -> CoreResult<Self> {
        Self::with_timeouts(std::time::Duration::from_secs(5), std::time::Duration::from_secs(60), Some(8))
    }

    pub fn with_timeouts(
        connect: std::time::Duration,
        request: std::time::Duration,
        pool_max_idle_per_host: Option<usize>,
    ) -> CoreResult<Self> {
        let mut builder = Client::builder().connect_timeout(connect).timeout(request);
        if let Some(max) = pool_max_idle_per_host {
            builder = builder.pool_max_idle_per_host(max);
        }
        let inner = builder
            .build()
            .map_err(|e| LumerisError::Other(anyhow::anyhow!("http client build failed: {e}")))?;
        Ok(Self {
            inner,
            user_agent: "lumeris/0.1".to_string(),
        })
    }

    pub async fn post_json<T: Serialize, R: DeserializeOwned>(
        &self,
        url: &str,
        body: &T,
        headers: &[(&str, &str)],
    ) -> CoreResult<R> {
        let start = Instant::now();
        let mut req = self
            .inner
            .post(url)
            .json(body)
            .header("User-Agent", &self.user_agent);
        for (k, v) in headers {
            req = req.header(*k, *v);
        }

        let resp = req.send().await.map_err(|e| {
            tracing::warn!(url, error = %e, "backend request failed");
            LumerisError::BackendUnavailable
        })?;

        let status = resp.status();
        let resp_headers = resp.headers().clone();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let ra = parse_retry_after(&resp_headers);
            return Err(map_http_error(status, ra, &text));
        }

        let parsed = resp.json::<R>().await.map_err(|e| LumerisError::BackendError {
            code: status.as_u16().to_string(),
            message: format!("json decode error: {e}"),
        })?;
        tracing::debug!(url, latency_ms = start.elapsed().as_millis() as u64, "POST ok");
        Ok(parsed)
    }

    pub async fn get_json<R: DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> CoreResult<R> {
        let start = Instant::now();
        let mut req = self.inner.get(url).header("User-Agent", &self.user_agent);
        for (k, v) in headers {
            req = req.header(*k, *v);
        }

        let resp = req.send().await.map_err(|e| {
            tracing::warn!(url, error = %e, "backend request failed");
            LumerisError::BackendUnavailable
        })?;

        let status = resp.status();
        let resp_headers = resp.headers().clone();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let ra = parse_retry_after(&resp_headers);
            return Err(map_http_error(status, ra, &text));
        }

        let parsed = resp.json::<R>().await.map_err(|e| LumerisError::BackendError {
            code: status.as_u16().to_string(),
            message: format!("json decode error: {e}"),
        })?;
        tracing::debug!(url, latency_ms = start.elapsed().as_millis() as u64, "GET ok");
        Ok(parsed)
    }

    pub async fn delete_json<R: DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> CoreResult<R> {
        let mut req = self.inner.delete(url).header("User-Agent", &self.user_agent);
        for (k, v) in headers {
            req = req.header(*k, *v);
        }

        let resp = req.send().await.map_err(|e| {
            tracing::warn!(url, error = %e, "backend request failed");
            LumerisError::BackendUnavailable
        })?;

        let status = resp.status();
        let resp_headers = resp.headers().clone();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let ra = parse_retry_after(&resp_headers);
            return Err(map_http_error(status, ra, &text));
        }

        resp.json::<R>().await.map_err(|e| LumerisError::BackendError {
            code: status.as_u16().to_string(),
            message: format!("json decode error: {e}"),
        })
    }

    /// POST and return the response body as a stream of decoded UTF-8 text
    /// fragments, in arrival order.
    pub async fn post_text_stream<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        headers: &[(&str, &str)],
    ) -> CoreResult<FragmentStream> {
        let mut req = self
            .inner
            .post(url)
            .json(body)
            .header("User-Agent", &self.user_agent);
        for (k, v) in headers {
            req = req.header(*k, *v);
        }

        let resp = req.send().await.map_err(|e| {
            tracing::warn!(url, error = %e, "backend request failed");
            LumerisError::BackendUnavailable
        })?;

        let status = resp.status();
        if !status.is_success() {
            let resp_headers = resp.headers().clone();
            let ra = parse_retry_after(&resp_headers);
            let body = resp.text().await.unwrap_or_default();
            return Err(map_http_error(status, ra, &body));
        }

        let byte_stream = resp.bytes_stream();
        Ok(Box::pin(TextStream::new(Box::pin(byte_stream))))
    }
}

fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    if let Some(v) = headers.get("retry-after")
        && let Ok(s) = v.to_str()
        && let Ok(secs) = s.trim().parse::<u64>()
    {
        return Some(secs);
    }
    // Non-numeric (HTTP-date) forms are ignored.
    None
}

fn map_http_error(status: StatusCode, retry_after: Option<u64>, body: &str) -> LumerisError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LumerisError::Unauthorized {
            message: truncate(body, 300),
        },
        StatusCode::NOT_FOUND => LumerisError::NotFound {
            message: truncate(body, 300),
        },
        StatusCode::TOO_MANY_REQUESTS => LumerisError::RateLimited { retry_after },
        s if s.is_server_error() => LumerisError::BackendUnavailable,
        s => LumerisError::BackendError {
            code: s.as_u16().to_string(),
            message: truncate(body, 300),
        },
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() > max {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        let mut t = s[..end].to_string();
        t.push_str("...");
        t
    } else {
        s.to_string()
    }
}

/// Incremental UTF-8 decoder over a byte stream.
///
/// Yields the maximal decodable prefix of the bytes received so far, keeping
/// an incomplete trailing multi-byte sequence buffered until the rest of it
/// arrives. The reconciler downstream compares strings, so a code point must
/// never be split across two yielded fragments. Invalid sequences decode to
/// U+FFFD; a still-incomplete tail at end of stream is flushed the same way.
struct TextStream {
    inner: std::pin::Pin<
        Box<dyn futures_util::stream::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send>,
    >,
    carry: Vec<u8>,
    flushed_tail: bool,
}

impl TextStream {
    fn new(
        inner: std::pin::Pin<
            Box<dyn futures_util::stream::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send>,
        >,
    ) -> Self {
        Self {
            inner,
            carry: Vec::new(),
            flushed_tail: false,
        }
    }

    /// Drains everything decodable from `carry`, leaving only a trailing
    /// incomplete sequence (at most 3 bytes) behind.
    fn take_decodable(&mut self) -> String {
        let mut out = String::new();
        let mut buf = std::mem::take(&mut self.carry);
        loop {
            match std::str::from_utf8(&buf) {
                Ok(s) => {
                    out.push_str(s);
                    return out;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(
                        std::str::from_utf8(&buf[..valid]).unwrap_or_default(),
                    );
                    match e.error_len() {
                        Some(bad) => {
                            // Invalid bytes, not a chunk boundary.
                            out.push('\u{FFFD}');
                            buf.drain(..valid + bad);
                        }
                        None => {
                            // Incomplete tail; wait for the next chunk.
                            self.carry = buf.split_off(valid);
                            return out;
                        }
                    }
                }
            }
        }
    }
}

impl futures_util::stream::Stream for TextStream {
    type Item = CoreResult<String>;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        use std::task::Poll;
        loop {
            match self.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    self.carry.extend_from_slice(&chunk);
                    let fragment = self.take_decodable();
                    if fragment.is_empty() {
                        continue;
                    }
                    return Poll::Ready(Some(Ok(fragment)));
                }
                Poll::Ready(Some(Err(e))) => {
                    tracing::warn!(error = %e, "chat stream interrupted");
                    return Poll::Ready(Some(Err(LumerisError::BackendUnavailable)));
                }
                Poll::Ready(None) => {
                    if !self.flushed_tail && !self.carry.is_empty() {
                        self.flushed_tail = true;
                        let tail = std::mem::take(&mut self.carry);
                        let fragment = String::from_utf8_lossy(&tail).into_owned();
                        return Poll::Ready(Some(Ok(fragment)));
                    }
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
