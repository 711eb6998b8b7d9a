//! The host environment seam: canvas geometry, frame scheduling, clock,
//! storage, and fetch.
//!
//! The viewer core never touches DOM or windowing APIs directly. Whatever
//! binding layer embeds the core (wasm glue, a winit shell, a test
//! harness) implements [`HostWindow`] and drives [`crate::App::tick`] from
//! its animation-frame callback.

use std::future::Future;
use std::pin::Pin;

use crate::api::GlApi;
use crate::error::Error;

/// The canvas bounding rectangle in host viewport space.
///
/// Captured at event-handling time, never cached: layout and scrolling can
/// move the canvas between events.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CanvasRect {
    /// Left edge in host viewport coordinates.
    pub left: f32,
    /// Top edge in host viewport coordinates.
    pub top: f32,
    /// Observed width in logical pixels.
    pub width: f32,
    /// Observed height in logical pixels.
    pub height: f32,
}

/// Identifier of a pending animation-frame request, used to cancel it on
/// teardown.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FrameRequest(pub u64);

/// Everything the viewer core consumes from its host environment.
///
/// Signatures only: the core treats all of this as external collaborators
/// and owns no wire protocol or storage format. Persisted state is opaque
/// key-value blobs passed through unmodified.
pub trait HostWindow {
    /// The graphics context type this host hands out.
    type Gl: GlApi;

    /// Acquire the graphics context for the canvas. Called once per
    /// `start`; failure is fatal to the application handle.
    ///
    /// # Errors
    /// [`Error::HostCall`] if the host cannot provide a context.
    fn acquire_gl(&mut self) -> Result<Self::Gl, Error>;

    /// Observed CSS size of the canvas in logical pixels.
    fn canvas_size(&self) -> (u32, u32);

    /// Ratio of backing-store pixels to logical pixels.
    fn device_pixel_ratio(&self) -> f64;

    /// Current bounding rectangle of the canvas.
    fn canvas_rect(&self) -> CanvasRect;

    /// Schedule one animation-frame callback, which should invoke
    /// [`crate::App::tick`].
    ///
    /// # Errors
    /// [`Error::HostCall`] if the host scheduler rejects the request.
    fn request_frame(&mut self) -> Result<FrameRequest, Error>;

    /// Cancel a previously scheduled frame callback.
    fn cancel_frame(&mut self, request: FrameRequest);

    /// High-resolution clock reading in milliseconds.
    fn now_ms(&self) -> f64;

    /// Read an opaque blob from persistent key-value storage.
    fn storage_get(&self, key: &str) -> Option<Vec<u8>>;

    /// Write an opaque blob to persistent key-value storage.
    ///
    /// # Errors
    /// [`Error::HostCall`] if the host store rejects the write.
    fn storage_set(&mut self, key: &str, value: &[u8]) -> Result<(), Error>;

    /// Fetch an opaque byte payload, e.g. the initial scene asset.
    fn fetch(&mut self, url: &str)
        -> Pin<Box<dyn Future<Output = Result<Vec<u8>, Error>> + '_>>;
}
