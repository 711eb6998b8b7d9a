//! An embeddable renderer core for interactive SDF (signed distance field)
//! viewing, built on OpenGL via [glow].
//!
//! The crate owns everything between the host's canvas callbacks and the
//! GL draw calls: a generation-checked [GPU resource
//! registry](ResourceRegistry), a memoizing [shader program
//! cache](ProgramCache), a tick-driven [frame renderer](FrameRenderer)
//! with an orbit [camera](CameraController), an [input
//! bridge](InputBridge) that normalizes host events, and the
//! [application handle](App) the embedder drives.
//!
//! # Features
//!
//! - **Generation-checked resource handles**: a recycled slot index never
//!   validates a stale handle, so use-after-delete is rejected instead of
//!   silently aliasing a newer object.
//! - **Compile-at-most-once programs**: each distinct shader source pair
//!   is compiled and linked once; failures are terminal and cached with
//!   their diagnostic log.
//! - **Coalesced resizes**: only the last resize observed before a tick
//!   produces a frame, so resize bursts never draw intermediate sizes.
//! - **Crash containment**: panics inside the frame tick are caught at
//!   the host boundary and recorded as a queryable fault; they never
//!   unwind into the embedder.
//!
//! # Hosting
//!
//! The crate ships no DOM or windowing glue. An embedder implements
//! [`HostWindow`] (and hands out a [`GlApi`] context), feeds its event
//! callbacks into the [`InputBridge`], and calls [`App::tick`] from its
//! animation-frame callback. The scheduling model is cooperative
//! single-threaded throughout.
//!
//! [glow]: https://docs.rs/glow

mod api;
mod app;
mod camera;
mod error;
mod host;
mod input;
mod program;
mod registry;
mod render;
mod shaders;
#[cfg(test)]
mod testutil;

pub use api::GlApi;
pub use app::{App, AppConfig};
pub use camera::CameraController;
pub use error::{CompileStage, Error};
pub use host::{CanvasRect, FrameRequest, HostWindow};
pub use input::{InputBridge, InputEvent, Key, Modifiers, MouseButton};
pub use program::{LinkedProgram, ProgramCache};
pub use registry::{ResourceHandle, ResourceKind, ResourceRegistry};
pub use render::{FrameRenderer, Phase};
pub use shaders::{SDF_FRAGMENT_SRC, SDF_VERTEX_SRC};
