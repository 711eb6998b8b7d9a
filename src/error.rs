//! Error taxonomy for the viewer core.
//!
//! The renderer distinguishes recoverable per-frame failures (allocation
//! refused under a transient context loss) from structural faults that
//! promote the frame loop to its terminal crashed state. Errors never cross
//! the host boundary as unwinds; the application handle converts them into
//! a queryable panic flag.

use crate::registry::{ResourceHandle, ResourceKind};

/// Which shader pipeline stage produced a diagnostic.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CompileStage {
    /// Vertex shader compilation.
    Vertex,
    /// Fragment shader compilation.
    Fragment,
    /// Program linking.
    Link,
}

impl std::fmt::Display for CompileStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex shader",
            Self::Fragment => "fragment shader",
            Self::Link => "program link",
        })
    }
}

/// All failures surfaced by the viewer core.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The host graphics context refused to create an object, typically
    /// because the context was lost. Recoverable: the frame tick aborts
    /// cleanly and the renderer retries on the next tick.
    #[error("allocation of {kind:?} refused by host context: {reason}")]
    Allocation {
        /// The kind of object that could not be created.
        kind: ResourceKind,
        /// Host-reported reason text.
        reason: String,
    },

    /// A deleted, unknown, or kind-mismatched resource handle was used.
    /// This indicates a bug in the core itself and promotes the renderer
    /// to the crashed state.
    #[error("invalid resource handle {handle:?}")]
    InvalidHandle {
        /// The offending handle.
        handle: ResourceHandle,
    },

    /// Shader compilation or program linking failed. Fatal only when the
    /// failing program is essential to the frame.
    #[error("{stage} failed:\n{log}")]
    Compile {
        /// The stage that reported the diagnostic.
        stage: CompileStage,
        /// The host-retrieved info log.
        log: String,
    },

    /// A bridged host call (frame scheduling, fetch, storage) reported an
    /// exception. Non-critical paths degrade; context acquisition crashes.
    #[error("host call failed: {0}")]
    HostCall(String),
}

impl Error {
    /// Whether the frame loop may keep running and retry next tick.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Allocation { .. })
    }
}
