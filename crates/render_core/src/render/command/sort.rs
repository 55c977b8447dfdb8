//! Dependency-respecting command sorting
//!
//! Reordering a command list must never change what ends up on screen. Each
//! command is described by the resources it touches and how:
//!
//! - **read**: consumes the current contents (a draw reading its vertex
//!   buffer, material and viewport)
//! - **write**: replaces the contents (uploads, clears, state changes)
//! - **accumulate**: adds to the contents without depending on other
//!   accumulations (draws into a render target)
//!
//! Any pair except read/read and accumulate/accumulate keeps its recorded
//! order. Everything else is free to move, and is emitted by ascending
//! [`SortKey`] with ties broken by recorded position, which makes the result
//! stable and deterministic.
//!
//! Draws into the same target are treated as commutative. Callers that rely
//! on submission order for blending should give those draws explicit sort
//! keys or submit without sorting.

use super::{Command, FrameBufferBinding};
use crate::render::handle::{
    FrameBufferHandle, IndexBufferHandle, MaterialHandle, ProgramHandle, TextureHandle, VertexBufferHandle,
};
use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap};

/// Device state the sorter needs to resolve indirect dependencies
pub trait SortContext {
    /// Program used by a material
    fn material_program(&self, material: MaterialHandle) -> Option<ProgramHandle>;

    /// Textures bound by a material's parameters
    fn material_textures(&self, material: MaterialHandle) -> Vec<TextureHandle>;

    /// Textures attached to a frame buffer at creation
    fn frame_buffer_textures(&self, frame_buffer: FrameBufferHandle) -> Vec<TextureHandle>;
}

/// Context with no materials or frame buffers
impl SortContext for () {
    fn material_program(&self, _material: MaterialHandle) -> Option<ProgramHandle> {
        None
    }

    fn material_textures(&self, _material: MaterialHandle) -> Vec<TextureHandle> {
        Vec::new()
    }

    fn frame_buffer_textures(&self, _frame_buffer: FrameBufferHandle) -> Vec<TextureHandle> {
        Vec::new()
    }
}

/// Coarse class of a command within one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Buffer uploads, mipmap generation, material updates
    Upload,
    /// Binding, viewport, scissor, clear
    State,
    /// Draw calls
    Draw,
}

/// Ordering key for commands that have no dependency between them
///
/// Compared field by field: target first so work for one frame buffer is
/// grouped, then phase, then program and material to minimize pipeline
/// switches, then the draw's own sort key (typically depth).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SortKey {
    /// Render target the command applies to; `None` is the surface
    pub target: Option<FrameBufferHandle>,
    /// Command class
    pub phase: Phase,
    /// Program of the draw's material
    pub program: Option<ProgramHandle>,
    /// Draw material
    pub material: Option<MaterialHandle>,
    /// Client-supplied key
    pub depth: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Tracked {
    VertexBuffer(VertexBufferHandle),
    IndexBuffer(IndexBufferHandle),
    Texture(TextureHandle),
    Material(MaterialHandle),
    Target(Option<FrameBufferHandle>),
    Binding,
    Viewport,
    Scissor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
    Accumulate,
}

#[derive(Debug, Default)]
struct History {
    last_write: Option<usize>,
    readers: Vec<usize>,
    accumulators: Vec<usize>,
}

/// Walks the list in recorded order, tracking the state that changes which
/// resources a command touches.
#[derive(Default)]
struct Analyzer {
    target: Option<FrameBufferHandle>,
    attachments: HashMap<FrameBufferHandle, Vec<TextureHandle>>,
    material_textures: HashMap<MaterialHandle, Vec<TextureHandle>>,
}

impl Analyzer {
    fn target_textures(&mut self, ctx: &impl SortContext) -> Vec<TextureHandle> {
        match self.target {
            Some(fb) => self.attachments.entry(fb).or_insert_with(|| ctx.frame_buffer_textures(fb)).clone(),
            None => Vec::new(),
        }
    }

    fn textures_of(&mut self, material: MaterialHandle, ctx: &impl SortContext) -> Vec<TextureHandle> {
        self.material_textures.entry(material).or_insert_with(|| ctx.material_textures(material)).clone()
    }

    fn analyze(&mut self, command: &Command, ctx: &impl SortContext) -> (SortKey, Vec<(Tracked, Access)>) {
        let mut key = SortKey { target: self.target, phase: Phase::State, program: None, material: None, depth: 0 };
        let mut accesses = Vec::new();

        match command {
            Command::Clear(_) => {
                accesses.push((Tracked::Binding, Access::Read));
                accesses.push((Tracked::Scissor, Access::Read));
                accesses.push((Tracked::Target(self.target), Access::Write));
                for texture in self.target_textures(ctx) {
                    accesses.push((Tracked::Texture(texture), Access::Write));
                }
            }
            Command::Draw(draw) => {
                key.phase = Phase::Draw;
                key.program = ctx.material_program(draw.material);
                key.material = Some(draw.material);
                key.depth = draw.sort_key.unwrap_or(0);

                accesses.push((Tracked::VertexBuffer(draw.vertex_buffer), Access::Read));
                if let Some(index_buffer) = draw.index_buffer {
                    accesses.push((Tracked::IndexBuffer(index_buffer), Access::Read));
                }
                accesses.push((Tracked::Material(draw.material), Access::Read));
                for texture in self.textures_of(draw.material, ctx) {
                    accesses.push((Tracked::Texture(texture), Access::Read));
                }
                accesses.push((Tracked::Binding, Access::Read));
                accesses.push((Tracked::Viewport, Access::Read));
                accesses.push((Tracked::Scissor, Access::Read));
                accesses.push((Tracked::Target(self.target), Access::Accumulate));
                for texture in self.target_textures(ctx) {
                    accesses.push((Tracked::Texture(texture), Access::Accumulate));
                }
            }
            Command::Viewport(_) => accesses.push((Tracked::Viewport, Access::Write)),
            Command::Scissor(_) => accesses.push((Tracked::Scissor, Access::Write)),
            Command::FillVertexBuffer(fill) => {
                key.phase = Phase::Upload;
                accesses.push((Tracked::VertexBuffer(fill.buffer), Access::Write));
            }
            Command::FillIndexBuffer(fill) => {
                key.phase = Phase::Upload;
                accesses.push((Tracked::IndexBuffer(fill.buffer), Access::Write));
            }
            Command::FrameBuffer(bind) => {
                accesses.push((Tracked::Binding, Access::Write));
                if bind.binding.affects_draws() {
                    self.target = bind.frame_buffer;
                    key.target = bind.frame_buffer;
                }
                if bind.binding == FrameBufferBinding::Read {
                    accesses.push((Tracked::Target(bind.frame_buffer), Access::Read));
                }
            }
            Command::FrameBufferTexture(attach) => {
                let fb = attach.frame_buffer;
                key.target = Some(fb);
                accesses.push((Tracked::Target(Some(fb)), Access::Write));
                accesses.push((Tracked::Texture(attach.texture), Access::Write));

                let attached = self.attachments.entry(fb).or_insert_with(|| ctx.frame_buffer_textures(fb));
                if !attached.contains(&attach.texture) {
                    attached.push(attach.texture);
                }
            }
            Command::GenerateMipmaps(mipmaps) => {
                key.phase = Phase::Upload;
                accesses.push((Tracked::Texture(mipmaps.texture), Access::Write));
            }
            Command::SetMaterialParameters(update) => {
                key.phase = Phase::Upload;
                key.material = Some(update.material);
                accesses.push((Tracked::Material(update.material), Access::Write));

                let new_textures: Vec<TextureHandle> = update.parameters.textures().collect();
                for texture in &new_textures {
                    accesses.push((Tracked::Texture(*texture), Access::Read));
                }
                let known = self.textures_of(update.material, ctx);
                let merged = known.into_iter().chain(new_textures).collect::<BTreeSet<_>>();
                self.material_textures.insert(update.material, merged.into_iter().collect());
            }
        }

        (key, accesses)
    }
}

/// Compute the dispatch order for `commands`
///
/// Returns a permutation of `0..commands.len()`.
pub fn sort_order(commands: &[Command], ctx: &impl SortContext) -> Vec<usize> {
    let mut analyzer = Analyzer::default();
    let mut histories: HashMap<Tracked, History> = HashMap::new();
    let mut predecessors: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); commands.len()];
    let mut keys = Vec::with_capacity(commands.len());

    for (index, command) in commands.iter().enumerate() {
        let (key, accesses) = analyzer.analyze(command, ctx);
        keys.push(key);

        for (resource, access) in accesses {
            let history = histories.entry(resource).or_default();
            let preds = &mut predecessors[index];
            preds.extend(history.last_write);

            match access {
                Access::Read => {
                    preds.extend(history.accumulators.iter().copied());
                    history.readers.push(index);
                }
                Access::Accumulate => {
                    preds.extend(history.readers.iter().copied());
                    history.accumulators.push(index);
                }
                Access::Write => {
                    preds.extend(history.readers.iter().copied());
                    preds.extend(history.accumulators.iter().copied());
                    history.readers.clear();
                    history.accumulators.clear();
                    history.last_write = Some(index);
                }
            }
            preds.remove(&index);
        }
    }

    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); commands.len()];
    let mut pending: Vec<usize> = predecessors.iter().map(BTreeSet::len).collect();
    for (index, preds) in predecessors.iter().enumerate() {
        for &pred in preds {
            successors[pred].push(index);
        }
    }

    let mut ready: BinaryHeap<Reverse<(SortKey, usize)>> = pending
        .iter()
        .enumerate()
        .filter(|(_, count)| **count == 0)
        .map(|(index, _)| Reverse((keys[index], index)))
        .collect();

    // Edges only point forward in recorded order, so the graph is acyclic
    // and every command is eventually released.
    let mut order = Vec::with_capacity(commands.len());
    while let Some(Reverse((_, index))) = ready.pop() {
        order.push(index);
        for &next in &successors[index] {
            pending[next] -= 1;
            if pending[next] == 0 {
                ready.push(Reverse((keys[next], next)));
            }
        }
    }

    order
}

/// Reorder `commands` for dispatch without breaking any dependency
pub fn sort_commands(commands: Vec<Command>, ctx: &impl SortContext) -> Vec<Command> {
    let order = sort_order(&commands, ctx);
    let mut slots: Vec<Option<Command>> = commands.into_iter().map(Some).collect();
    order.into_iter().filter_map(|index| slots[index].take()).collect()
}
