//! Generation-checked registry for host-side GPU objects.
//!
//! Every graphics object the viewer creates is owned by a
//! [`ResourceRegistry`] and referred to through a [`ResourceHandle`] (slot
//! index plus generation). A slot's generation is bumped when its object is
//! deleted, so a recycled index never validates a stale handle: use after
//! delete is detected and rejected instead of silently aliasing a new
//! object. Deleting an already-invalid handle is a no-op to tolerate
//! double-cleanup during teardown.

use crate::api::GlApi;
use crate::error::Error;

/// The kinds of host graphics objects the registry tracks.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ResourceKind {
    /// Vertex or index buffer.
    Buffer,
    /// Texture object.
    Texture,
    /// Framebuffer object.
    Framebuffer,
    /// Shader object (vertex or fragment stage).
    Shader,
    /// Linked shader program.
    Program,
    /// Vertex array object.
    VertexArray,
}

/// Opaque reference to a registry-owned graphics object.
///
/// Valid from the `create` call that returned it until the matching
/// `delete`; afterwards every use fails with [`Error::InvalidHandle`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ResourceHandle {
    index: u32,
    generation: u32,
    kind: ResourceKind,
}

impl ResourceHandle {
    /// The kind of object this handle refers to.
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    #[cfg(test)]
    pub(crate) fn from_raw_parts(index: u32, generation: u32, kind: ResourceKind) -> Self {
        Self {
            index,
            generation,
            kind,
        }
    }
}

/// The host object stored in a slot, tagged by kind.
enum RawObject<G: GlApi> {
    Buffer(G::Buffer),
    Texture(G::Texture),
    Framebuffer(G::Framebuffer),
    Shader(G::Shader),
    Program(G::Program),
    VertexArray(G::VertexArray),
}

struct Slot<G: GlApi> {
    generation: u32,
    object: Option<RawObject<G>>,
}

/// Owner of every live host graphics object.
///
/// The registry is the sole creator and deleter of host objects; the
/// renderer and program cache go through it so that `destroy_all` can
/// reclaim everything deterministically on shutdown.
pub struct ResourceRegistry<G: GlApi> {
    slots: Vec<Slot<G>>,
    free: Vec<u32>,
}

impl<G: GlApi> Default for ResourceRegistry<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: GlApi> ResourceRegistry<G> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Number of live objects.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.object.is_some()).count()
    }

    /// Whether `handle` still refers to a live object.
    pub fn contains(&self, handle: ResourceHandle) -> bool {
        self.raw(handle).is_ok()
    }

    /// Allocate a host object of the given kind and register it.
    ///
    /// Shader objects need a pipeline stage at creation time; use
    /// [`create_shader`](Self::create_shader) for those.
    ///
    /// # Errors
    /// [`Error::Allocation`] if the host context refuses creation.
    pub fn create(&mut self, api: &G, kind: ResourceKind) -> Result<ResourceHandle, Error> {
        let object = match kind {
            ResourceKind::Buffer => api.create_buffer().map(RawObject::Buffer),
            ResourceKind::Texture => api.create_texture().map(RawObject::Texture),
            ResourceKind::Framebuffer => api.create_framebuffer().map(RawObject::Framebuffer),
            ResourceKind::Program => api.create_program().map(RawObject::Program),
            ResourceKind::VertexArray => api.create_vertex_array().map(RawObject::VertexArray),
            ResourceKind::Shader => {
                return Err(Error::Allocation {
                    kind,
                    reason: "shader objects require a stage; use create_shader".into(),
                })
            }
        };
        let object = object.map_err(|reason| Error::Allocation { kind, reason })?;
        Ok(self.insert(kind, object))
    }

    /// Allocate a shader object for `stage` (`glow::VERTEX_SHADER` or
    /// `glow::FRAGMENT_SHADER`) and register it.
    ///
    /// # Errors
    /// [`Error::Allocation`] if the host context refuses creation.
    pub fn create_shader(&mut self, api: &G, stage: u32) -> Result<ResourceHandle, Error> {
        let shader = api.create_shader(stage).map_err(|reason| Error::Allocation {
            kind: ResourceKind::Shader,
            reason,
        })?;
        Ok(self.insert(ResourceKind::Shader, RawObject::Shader(shader)))
    }

    fn insert(&mut self, kind: ResourceKind, object: RawObject<G>) -> ResourceHandle {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.object = Some(object);
            ResourceHandle {
                index,
                generation: slot.generation,
                kind,
            }
        } else {
            let index = u32::try_from(self.slots.len()).expect("registry slot count overflow");
            self.slots.push(Slot {
                generation: 1,
                object: Some(object),
            });
            ResourceHandle {
                index,
                generation: 1,
                kind,
            }
        }
    }

    /// Release the host object behind `handle` and invalidate the handle.
    ///
    /// Deleting an unknown or already-deleted handle is a no-op, so
    /// double-cleanup during teardown never double-frees.
    pub fn delete(&mut self, api: &G, handle: ResourceHandle) {
        let Some(slot) = self.slots.get_mut(handle.index as usize) else {
            return;
        };
        if slot.generation != handle.generation {
            return;
        }
        let Some(object) = slot.object.take() else {
            return;
        };
        delete_raw(api, object);
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
    }

    /// Activate the object behind `handle` against a pipeline binding
    /// point (`target` is a GL binding enum such as `glow::ARRAY_BUFFER`;
    /// it is ignored for vertex arrays and programs, which have implicit
    /// binding points).
    ///
    /// # Errors
    /// [`Error::InvalidHandle`] if the handle is unknown, deleted, or
    /// refers to a shader object, which has no binding point.
    pub fn bind(&self, api: &G, handle: ResourceHandle, target: u32) -> Result<(), Error> {
        match self.raw(handle)? {
            RawObject::Buffer(b) => api.bind_buffer(target, Some(*b)),
            RawObject::Texture(t) => api.bind_texture(target, Some(*t)),
            RawObject::Framebuffer(f) => api.bind_framebuffer(target, Some(*f)),
            RawObject::VertexArray(v) => api.bind_vertex_array(Some(*v)),
            RawObject::Program(p) => api.use_program(Some(*p)),
            RawObject::Shader(_) => return Err(Error::InvalidHandle { handle }),
        }
        Ok(())
    }

    /// Raw buffer object behind a live handle.
    ///
    /// # Errors
    /// [`Error::InvalidHandle`] for stale, unknown, or mismatched handles.
    pub fn buffer(&self, handle: ResourceHandle) -> Result<G::Buffer, Error> {
        match self.raw(handle)? {
            RawObject::Buffer(b) => Ok(*b),
            _ => Err(Error::InvalidHandle { handle }),
        }
    }

    /// Raw texture object behind a live handle.
    ///
    /// # Errors
    /// [`Error::InvalidHandle`] for stale, unknown, or mismatched handles.
    pub fn texture(&self, handle: ResourceHandle) -> Result<G::Texture, Error> {
        match self.raw(handle)? {
            RawObject::Texture(t) => Ok(*t),
            _ => Err(Error::InvalidHandle { handle }),
        }
    }

    /// Raw framebuffer object behind a live handle.
    ///
    /// # Errors
    /// [`Error::InvalidHandle`] for stale, unknown, or mismatched handles.
    pub fn framebuffer(&self, handle: ResourceHandle) -> Result<G::Framebuffer, Error> {
        match self.raw(handle)? {
            RawObject::Framebuffer(f) => Ok(*f),
            _ => Err(Error::InvalidHandle { handle }),
        }
    }

    /// Raw shader object behind a live handle.
    ///
    /// # Errors
    /// [`Error::InvalidHandle`] for stale, unknown, or mismatched handles.
    pub fn shader(&self, handle: ResourceHandle) -> Result<G::Shader, Error> {
        match self.raw(handle)? {
            RawObject::Shader(s) => Ok(*s),
            _ => Err(Error::InvalidHandle { handle }),
        }
    }

    /// Raw program object behind a live handle.
    ///
    /// # Errors
    /// [`Error::InvalidHandle`] for stale, unknown, or mismatched handles.
    pub fn program(&self, handle: ResourceHandle) -> Result<G::Program, Error> {
        match self.raw(handle)? {
            RawObject::Program(p) => Ok(*p),
            _ => Err(Error::InvalidHandle { handle }),
        }
    }

    /// Raw vertex array object behind a live handle.
    ///
    /// # Errors
    /// [`Error::InvalidHandle`] for stale, unknown, or mismatched handles.
    pub fn vertex_array(&self, handle: ResourceHandle) -> Result<G::VertexArray, Error> {
        match self.raw(handle)? {
            RawObject::VertexArray(v) => Ok(*v),
            _ => Err(Error::InvalidHandle { handle }),
        }
    }

    /// Delete every live object. Complete, in unspecified order; safe to
    /// call more than once.
    pub fn destroy_all(&mut self, api: &G) {
        for slot in &mut self.slots {
            if let Some(object) = slot.object.take() {
                delete_raw(api, object);
                slot.generation = slot.generation.wrapping_add(1);
            }
        }
        self.free.clear();
        self.free
            .extend((0..self.slots.len()).map(|i| i as u32).rev());
    }

    fn raw(&self, handle: ResourceHandle) -> Result<&RawObject<G>, Error> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.object.as_ref())
            .ok_or(Error::InvalidHandle { handle })
    }
}

fn delete_raw<G: GlApi>(api: &G, object: RawObject<G>) {
    match object {
        RawObject::Buffer(b) => api.delete_buffer(b),
        RawObject::Texture(t) => api.delete_texture(t),
        RawObject::Framebuffer(f) => api.delete_framebuffer(f),
        RawObject::Shader(s) => api.delete_shader(s),
        RawObject::Program(p) => api.delete_program(p),
        RawObject::VertexArray(v) => api.delete_vertex_array(v),
    }
}
