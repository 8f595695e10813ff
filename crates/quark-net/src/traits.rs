use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::{error::NetResult, progress::FetchProgress};

/// Async transport that downloads a whole blob.
#[async_trait]
pub trait Net: Send + Sync {
    async fn get_bytes(&self, url: Url) -> NetResult<Bytes>;

    /// Like [`Net::get_bytes`], reporting received bytes as they arrive.
    ///
    /// Transports that cannot stream report once, on success.
    async fn get_bytes_with_progress(&self, url: Url, progress: &FetchProgress) -> NetResult<Bytes> {
        let bytes = self.get_bytes(url).await?;
        progress.finish(bytes.len() as u64);
        Ok(bytes)
    }
}

#[async_trait]
impl<N: Net + ?Sized> Net for std::sync::Arc<N> {
    async fn get_bytes(&self, url: Url) -> NetResult<Bytes> {
        (**self).get_bytes(url).await
    }

    async fn get_bytes_with_progress(&self, url: Url, progress: &FetchProgress) -> NetResult<Bytes> {
        (**self).get_bytes_with_progress(url, progress).await
    }
}
