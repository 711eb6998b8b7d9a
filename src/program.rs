//! Shader program compilation and memoization.
//!
//! Programs are keyed by the hash of their vertex/fragment source pair and
//! compiled at most once per distinct pair for the process lifetime. A
//! compile or link failure is terminal for its source pair: the diagnostic
//! is cached and returned on every subsequent request, never recompiled.
//! Transient shader objects never outlive a failed build, so the error
//! path leaks nothing.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::api::GlApi;
use crate::error::{CompileStage, Error};
use crate::registry::{ResourceHandle, ResourceKind, ResourceRegistry};

/// A successfully linked program with its introspected location tables.
///
/// Attribute and uniform locations are stable for the life of a program,
/// so they are queried once right after linking and cached forever.
pub struct LinkedProgram<G: GlApi> {
    /// Registry handle of the linked program object.
    pub handle: ResourceHandle,
    attributes: HashMap<String, u32>,
    uniforms: HashMap<String, G::UniformLocation>,
}

impl<G: GlApi> LinkedProgram<G> {
    /// Location of a named vertex attribute, if active.
    pub fn attribute(&self, name: &str) -> Option<u32> {
        self.attributes.get(name).copied()
    }

    /// Location of a named uniform, if active.
    pub fn uniform(&self, name: &str) -> Option<&G::UniformLocation> {
        self.uniforms.get(name)
    }
}

// Manual impl: a derive would bound `G: Debug`, but only the associated
// types need to format.
impl<G: GlApi> fmt::Debug for LinkedProgram<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedProgram")
            .field("handle", &self.handle)
            .field("attributes", &self.attributes)
            .field("uniforms", &self.uniforms)
            .finish()
    }
}

enum Entry<G: GlApi> {
    Linked(LinkedProgram<G>),
    /// Terminal: the diagnostic for this source pair, never retried.
    Failed(Error),
}

/// Memoizing compiler for shader programs.
pub struct ProgramCache<G: GlApi> {
    entries: HashMap<(u64, u64), Entry<G>>,
}

impl<G: GlApi> Default for ProgramCache<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: GlApi> ProgramCache<G> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Forget every entry. The program objects themselves belong to the
    /// registry and are reclaimed by its teardown.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Return the linked program for this source pair, compiling and
    /// linking it on first request.
    ///
    /// # Errors
    /// [`Error::Compile`] with the host diagnostic if compilation or
    /// linking fails (cached, terminal for this pair);
    /// [`Error::Allocation`] if the context refuses object creation
    /// (transient, not cached).
    pub fn get_or_compile(
        &mut self,
        api: &G,
        registry: &mut ResourceRegistry<G>,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<&LinkedProgram<G>, Error> {
        let key = (source_hash(vertex_src), source_hash(fragment_src));

        if !self.entries.contains_key(&key) {
            match build_program(api, registry, vertex_src, fragment_src) {
                Ok(linked) => {
                    self.entries.insert(key, Entry::Linked(linked));
                }
                Err(err @ Error::Compile { .. }) => {
                    log::warn!("program build failed: {err}");
                    self.entries.insert(key, Entry::Failed(err));
                }
                // Allocation failures are transient (context loss); leave
                // the pair uncached so the next tick can retry.
                Err(err) => return Err(err),
            }
        }

        match &self.entries[&key] {
            Entry::Linked(linked) => Ok(linked),
            Entry::Failed(err) => Err(err.clone()),
        }
    }
}

fn source_hash(source: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    source.hash(&mut hasher);
    hasher.finish()
}

/// Compile one shader stage; the shader object is deleted before returning
/// on failure.
fn compile_stage<G: GlApi>(
    api: &G,
    registry: &mut ResourceRegistry<G>,
    stage: CompileStage,
    source: &str,
) -> Result<ResourceHandle, Error> {
    let gl_stage = match stage {
        CompileStage::Vertex => glow::VERTEX_SHADER,
        CompileStage::Fragment | CompileStage::Link => glow::FRAGMENT_SHADER,
    };
    let handle = registry.create_shader(api, gl_stage)?;
    let shader = registry.shader(handle)?;

    api.shader_source(shader, source);
    api.compile_shader(shader);
    // The host performs compilation synchronously from our perspective;
    // poll the status exactly once.
    if !api.shader_compile_status(shader) {
        let log = api.shader_info_log(shader);
        registry.delete(api, handle);
        return Err(Error::Compile { stage, log });
    }
    Ok(handle)
}

fn build_program<G: GlApi>(
    api: &G,
    registry: &mut ResourceRegistry<G>,
    vertex_src: &str,
    fragment_src: &str,
) -> Result<LinkedProgram<G>, Error> {
    let vs = compile_stage(api, registry, CompileStage::Vertex, vertex_src)?;
    let fs = match compile_stage(api, registry, CompileStage::Fragment, fragment_src) {
        Ok(fs) => fs,
        Err(err) => {
            registry.delete(api, vs);
            return Err(err);
        }
    };

    let link = |api: &G, registry: &mut ResourceRegistry<G>| -> Result<LinkedProgram<G>, Error> {
        let handle = registry.create(api, ResourceKind::Program)?;
        let program = registry.program(handle)?;
        let vs_raw = registry.shader(vs)?;
        let fs_raw = registry.shader(fs)?;

        api.attach_shader(program, vs_raw);
        api.attach_shader(program, fs_raw);
        api.link_program(program);

        if !api.program_link_status(program) {
            let log = api.program_info_log(program);
            registry.delete(api, handle);
            return Err(Error::Compile {
                stage: CompileStage::Link,
                log,
            });
        }

        // Shaders can be detached and deleted after successful linking;
        // only the program object stays live.
        api.detach_shader(program, vs_raw);
        api.detach_shader(program, fs_raw);

        let mut attributes = HashMap::new();
        for index in 0..api.active_attribute_count(program) {
            if let Some(name) = api.active_attribute_name(program, index) {
                if let Some(location) = api.attrib_location(program, &name) {
                    attributes.insert(name, location);
                }
            }
        }

        let mut uniforms = HashMap::new();
        for index in 0..api.active_uniform_count(program) {
            if let Some(name) = api.active_uniform_name(program, index) {
                if let Some(location) = api.uniform_location(program, &name) {
                    uniforms.insert(name, location);
                }
            }
        }

        Ok(LinkedProgram {
            handle,
            attributes,
            uniforms,
        })
    };

    let result = link(api, registry);
    registry.delete(api, vs);
    registry.delete(api, fs);
    result
}
