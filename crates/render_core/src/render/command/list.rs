//! Command list recording
//!
//! A [`CommandList`] is an ordered sequence of [`Command`]s. The recording
//! methods hand back a [`Recorder`] that derefs to the command being built;
//! the command is appended when the recorder goes out of scope, so a whole
//! command can be recorded in one statement:
//!
//! ```
//! use render_core::render::CommandList;
//!
//! let mut list = CommandList::new();
//! list.clear().set_color(0.1, 0.1, 0.1, 1.0).set_clear_color(true);
//! list.viewport().set_rectangle(0, 0, 800, 600);
//! assert_eq!(list.len(), 2);
//! ```

use super::{
    ClearCommand, Command, DrawCommand, FillIndexBufferCommand, FillVertexBufferCommand, FrameBufferCommand,
    FrameBufferTextureCommand, GenerateMipmapsCommand, ScissorCommand, SetMaterialParametersCommand,
    ViewportCommand,
};
use std::ops::{Deref, DerefMut};

/// Ordered, owned sequence of commands
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandList {
    commands: Vec<Command>,
}

impl CommandList {
    /// Empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty list with room for `capacity` commands
    pub fn with_capacity(capacity: usize) -> Self {
        Self { commands: Vec::with_capacity(capacity) }
    }

    /// Append an already built command
    pub fn push(&mut self, command: impl Into<Command>) {
        self.commands.push(command.into());
    }

    /// Record a clear
    pub fn clear(&mut self) -> Recorder<'_, ClearCommand> {
        Recorder::new(self)
    }

    /// Record a draw
    pub fn draw(&mut self) -> Recorder<'_, DrawCommand> {
        Recorder::new(self)
    }

    /// Record a viewport change
    pub fn viewport(&mut self) -> Recorder<'_, ViewportCommand> {
        Recorder::new(self)
    }

    /// Record a scissor change
    pub fn scissor(&mut self) -> Recorder<'_, ScissorCommand> {
        Recorder::new(self)
    }

    /// Record a vertex upload
    pub fn fill_vertex_buffer(&mut self) -> Recorder<'_, FillVertexBufferCommand> {
        Recorder::new(self)
    }

    /// Record an index upload
    pub fn fill_index_buffer(&mut self) -> Recorder<'_, FillIndexBufferCommand> {
        Recorder::new(self)
    }

    /// Record a frame buffer bind
    pub fn frame_buffer(&mut self) -> Recorder<'_, FrameBufferCommand> {
        Recorder::new(self)
    }

    /// Record a frame buffer attachment
    pub fn frame_buffer_texture(&mut self) -> Recorder<'_, FrameBufferTextureCommand> {
        Recorder::new(self)
    }

    /// Record mipmap generation
    pub fn generate_mipmaps(&mut self) -> Recorder<'_, GenerateMipmapsCommand> {
        Recorder::new(self)
    }

    /// Record a material parameter update
    pub fn set_material_parameters(&mut self) -> Recorder<'_, SetMaterialParametersCommand> {
        Recorder::new(self)
    }

    /// Number of recorded commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True when nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Recorded commands in order
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Iterate recorded commands in order
    pub fn iter(&self) -> std::slice::Iter<'_, Command> {
        self.commands.iter()
    }

    /// Take ownership of the recorded commands
    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }

    /// Drop every recorded command, keeping the allocation
    pub fn reset(&mut self) {
        self.commands.clear();
    }
}

impl From<Vec<Command>> for CommandList {
    fn from(commands: Vec<Command>) -> Self {
        Self { commands }
    }
}

impl FromIterator<Command> for CommandList {
    fn from_iter<I: IntoIterator<Item = Command>>(iter: I) -> Self {
        Self { commands: iter.into_iter().collect() }
    }
}

impl<'a> IntoIterator for &'a CommandList {
    type Item = &'a Command;
    type IntoIter = std::slice::Iter<'a, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

/// In-progress command that is appended to its list on drop
pub struct Recorder<'a, C: Into<Command> + Default> {
    list: &'a mut CommandList,
    command: C,
}

impl<'a, C: Into<Command> + Default> Recorder<'a, C> {
    fn new(list: &'a mut CommandList) -> Self {
        Self { list, command: C::default() }
    }

    /// Append now instead of at end of scope
    pub fn finish(self) {}
}

impl<C: Into<Command> + Default> Deref for Recorder<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.command
    }
}

impl<C: Into<Command> + Default> DerefMut for Recorder<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.command
    }
}

impl<C: Into<Command> + Default> Drop for Recorder<'_, C> {
    fn drop(&mut self) {
        let command = std::mem::take(&mut self.command);
        self.list.commands.push(command.into());
    }
}
