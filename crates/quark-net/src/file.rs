use async_trait::async_trait;
use bytes::Bytes;
use quark_pool::byte_pool;
use tokio::io::AsyncReadExt;
use tracing::trace;
use url::Url;

use crate::{
    error::{NetError, NetResult},
    traits::Net,
};

/// Reads `file://` URLs from the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileNet;

impl FileNet {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Net for FileNet {
    async fn get_bytes(&self, url: Url) -> NetResult<Bytes> {
        let path = url
            .to_file_path()
            .map_err(|()| NetError::InvalidUrl(url.to_string()))?;

        let mut file = tokio::fs::File::open(&path).await?;
        let mut buf = byte_pool().get();
        file.read_to_end(&mut buf).await?;
        trace!(path = %path.display(), len = buf.len(), "file read");

        Ok(Bytes::copy_from_slice(&buf))
    }
}
