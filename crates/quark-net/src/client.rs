use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use reqwest::{Client, Response};
use tracing::{debug, trace};
use url::Url;

use crate::{
    error::{NetError, NetResult},
    progress::FetchProgress,
    traits::Net,
    types::NetOptions,
};

/// Upper bound for buffer preallocation taken from `Content-Length`.
const MAX_PREALLOC: u64 = 8 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct HttpClient {
    inner: Client,
    options: NetOptions,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns [`NetError::Http`] if the underlying client cannot be built.
    pub fn new(options: NetOptions) -> NetResult<Self> {
        let inner = Client::builder()
            .pool_max_idle_per_host(options.pool_max_idle_per_host)
            .build()?;
        Ok(Self { inner, options })
    }

    pub fn options(&self) -> &NetOptions {
        &self.options
    }

    async fn send(&self, url: &Url) -> NetResult<Response> {
        debug!(%url, "http get");
        let resp = self
            .inner
            .get(url.clone())
            .timeout(self.options.request_timeout)
            .send()
            .await?;
        let status = resp.status();

        if !status.is_success() {
            return Err(NetError::http_status(status.as_u16(), url.clone()));
        }
        Ok(resp)
    }
}

#[async_trait]
impl Net for HttpClient {
    async fn get_bytes(&self, url: Url) -> NetResult<Bytes> {
        Ok(self.send(&url).await?.bytes().await?)
    }

    async fn get_bytes_with_progress(&self, url: Url, progress: &FetchProgress) -> NetResult<Bytes> {
        let resp = self.send(&url).await?;
        let total = resp.content_length();
        if let Some(total) = total {
            progress.set_total(total);
        }

        let mut body = BytesMut::with_capacity(total.unwrap_or(0).min(MAX_PREALLOC) as usize);
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            progress.add_received(chunk.len() as u64);
            body.extend_from_slice(&chunk);
        }
        trace!(%url, len = body.len(), "http body received");

        progress.finish(body.len() as u64);
        Ok(body.freeze())
    }
}
