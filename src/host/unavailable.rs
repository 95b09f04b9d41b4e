//! Fallback host for capabilities the embedder does not provide.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use image::RgbaImage;
use tokio::sync::mpsc;

use crate::error::{Error, Result};

use super::{
    FileHost, Rasterizer, ShellExit, ShellHost, ShellOutput, ShellRequest, StorageHost,
    StorageScope, TelemetryHost, TelemetryStream,
};

// ============================================================================
// Unavailable
// ============================================================================

/// Answers every call with [`Error::Unsupported`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

#[async_trait]
impl ShellHost for Unavailable {
    async fn run(
        &self,
        _request: ShellRequest,
        _output: mpsc::UnboundedSender<ShellOutput>,
    ) -> Result<ShellExit> {
        Err(Error::unsupported("shell"))
    }
}

impl StorageHost for Unavailable {
    fn entries(&self, _scope: StorageScope) -> Result<Vec<(String, String)>> {
        Err(Error::unsupported("storage"))
    }

    fn get(&self, _scope: StorageScope, _key: &str) -> Result<Option<String>> {
        Err(Error::unsupported("storage"))
    }

    fn set(&self, _scope: StorageScope, _key: &str, _value: &str) -> Result<()> {
        Err(Error::unsupported("storage"))
    }

    fn remove(&self, _scope: StorageScope, _key: &str) -> Result<()> {
        Err(Error::unsupported("storage"))
    }

    fn clear(&self, _scope: StorageScope) -> Result<()> {
        Err(Error::unsupported("storage"))
    }
}

impl Rasterizer for Unavailable {
    fn rasterize(&self, _svg: &str, _width: u32, _height: u32) -> Result<RgbaImage> {
        Err(Error::unsupported("rasterizer"))
    }
}

impl TelemetryHost for Unavailable {
    fn subscribe(&self, stream: TelemetryStream) -> Result<()> {
        Err(Error::unsupported(format!("telemetry stream {stream:?}")))
    }

    fn unsubscribe(&self, _stream: TelemetryStream) {}
}

#[async_trait]
impl FileHost for Unavailable {
    async fn read(&self, _path: &str) -> Result<Vec<u8>> {
        Err(Error::unsupported("files"))
    }

    async fn write(&self, _path: &str, _data: Vec<u8>) -> Result<()> {
        Err(Error::unsupported("files"))
    }
}
