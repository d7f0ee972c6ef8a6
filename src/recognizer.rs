use anyhow::Result;
use async_trait::async_trait;
use image::RgbaImage;
use mtg_vision::RecognizerReply;
use std::sync::Arc;

/// The external vision model that names the card in a frame.
///
/// Implementations own the transport (HTTP client, credentials, prompt) and
/// return the parsed reply. Raw model text can go through
/// [`mtg_vision::parse_reply`]. An `Err` counts as a failed call for
/// backoff purposes.
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn recognize(&self, frame: &RgbaImage) -> Result<RecognizerReply>;
}

#[async_trait]
impl<R: Recognizer + ?Sized> Recognizer for Arc<R> {
    async fn recognize(&self, frame: &RgbaImage) -> Result<RecognizerReply> {
        (**self).recognize(frame).await
    }
}

#[async_trait]
impl<R: Recognizer + ?Sized> Recognizer for Box<R> {
    async fn recognize(&self, frame: &RgbaImage) -> Result<RecognizerReply> {
        (**self).recognize(frame).await
    }
}
