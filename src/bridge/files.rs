//! File transfer handlers. Content travels as base64.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::protocol::to_json_text;

use super::Bridge;
use super::dispatch::Reply;

#[derive(Serialize)]
struct FileContent<'a> {
    path: &'a str,
    size: usize,
    content: String,
}

#[derive(Serialize)]
struct FileWritten<'a> {
    path: &'a str,
    size: usize,
}

impl Bridge {
    pub(crate) async fn file_read(&self, path: &str) -> Result<Reply> {
        let data = self.inner.hosts.files.read(path).await?;
        debug!(path, size = data.len(), "File read");
        to_json_text(&FileContent {
            path,
            size: data.len(),
            content: Base64Standard.encode(&data),
        })
        .map(Some)
    }

    pub(crate) async fn file_write(&self, path: &str, content: &str) -> Result<Reply> {
        let data = Base64Standard.decode(content)?;
        let size = data.len();
        self.inner.hosts.files.write(path, data).await?;
        debug!(path, size, "File written");
        to_json_text(&FileWritten { path, size }).map(Some)
    }
}
