//! Command execution and undo/redo history
//!
//! [`CommandWrapper`] owns the document being edited: the selection, the
//! registry of named commands and two stacks of reciprocal commands. It is
//! single-threaded and synchronous; every operation takes `&mut self`.
//!
//! When a command runs:
//! 1. The reciprocal it returns is tagged with the command's display name
//! 2. Unless undo registration is inhibited, the reciprocal is pushed onto the
//!    undo stack and the redo stack is cleared
//! 3. The undo stack is trimmed to the configured history limit
//!
//! Undo pops and runs the top reciprocal, pushing whatever that returns onto
//! the redo stack under the same title. Redo mirrors it.

use crate::appearance::{AppearanceRewriter, TextOperatorRewriter};
use crate::command::{Command, EditContext};
use crate::config::EditorConfig;
use crate::error::CommandResult;
use crate::persistence::DocumentWriter;
use crate::registry::{CommandFactory, CommandRegistry};
use crate::selection::{AnnotationRef, SelectionSet};
use airmark_model::{Document, Rect};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// A recorded reciprocal and the title under which it is offered.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub command: Command,
    pub title: &'static str,
}

/// Interactive drag over the annotations selected when it began.
#[derive(Debug, Clone)]
struct DragSession {
    targets: Vec<AnnotationRef>,
    dx: f32,
    dy: f32,
}

pub struct CommandWrapper {
    document: Document,
    selection: SelectionSet,
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: VecDeque<HistoryEntry>,
    inhibited: bool,
    registry: CommandRegistry,
    config: EditorConfig,
    rewriter: Box<dyn AppearanceRewriter>,
    writer: Option<Box<dyn DocumentWriter>>,
    drag: Option<DragSession>,
}

impl CommandWrapper {
    pub fn new(document: Document) -> Self {
        Self::with_config(document, EditorConfig::default())
    }

    pub fn with_config(document: Document, config: EditorConfig) -> Self {
        Self {
            document,
            selection: SelectionSet::new(),
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            inhibited: false,
            registry: CommandRegistry::with_defaults(),
            config,
            rewriter: Box::new(TextOperatorRewriter),
            writer: None,
            drag: None,
        }
    }

    /// Replace the collaborator that refreshes appearances after text changes.
    pub fn with_rewriter(mut self, rewriter: impl AppearanceRewriter + 'static) -> Self {
        self.rewriter = Box::new(rewriter);
        self
    }

    /// Set the collaborator used by `Save`.
    pub fn with_writer(mut self, writer: impl DocumentWriter + 'static) -> Self {
        self.writer = Some(Box::new(writer));
        self
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn page_count(&self) -> usize {
        self.document.page_count()
    }

    /// Register an additional or replacement command under `name`.
    pub fn register(&mut self, name: impl Into<String>, factory: CommandFactory) {
        self.registry.register(name, factory);
    }

    /// Run the command registered under `name`.
    ///
    /// Returns true iff the command produced a reciprocal. Unknown names and
    /// malformed arguments are logged and reported as false.
    pub fn execute<I, S>(&mut self, name: &str, args: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args = args.into_iter().map(Into::into).collect();
        match self.try_execute(name, args) {
            Ok(changed) => changed,
            Err(err) => {
                warn!(%err, "command rejected");
                false
            }
        }
    }

    /// Like [`CommandWrapper::execute`] but hands back the error.
    pub fn try_execute(&mut self, name: &str, args: Vec<String>) -> CommandResult<bool> {
        let command = self.registry.resolve(name, args)?;
        self.execute_command(command)
    }

    /// Run an already constructed command with the usual history handling.
    pub fn execute_command(&mut self, command: Command) -> CommandResult<bool> {
        match command {
            Command::Undo => {
                self.undo();
                return Ok(false);
            }
            Command::Redo => {
                self.redo();
                return Ok(false);
            }
            _ => {}
        }

        let title = command.name();
        let Some(reciprocal) = self.run(&command)? else {
            return Ok(false);
        };

        if self.inhibited {
            debug!(title, "undo registration inhibited, reciprocal discarded");
        } else {
            self.record(HistoryEntry { command: reciprocal, title });
        }
        Ok(true)
    }

    fn run(&mut self, command: &Command) -> CommandResult<Option<Command>> {
        let mut ctx = EditContext {
            document: &mut self.document,
            selection: &mut self.selection,
            config: &self.config,
            rewriter: &*self.rewriter,
            writer: self.writer.as_deref(),
        };
        command.execute(&mut ctx)
    }

    /// Push a fresh reciprocal; a new edit invalidates everything redoable.
    fn record(&mut self, entry: HistoryEntry) {
        self.push_undo(entry);
        if !self.redo_stack.is_empty() {
            debug!(dropped = self.redo_stack.len(), "redo history cleared");
            self.redo_stack.clear();
        }
    }

    fn push_undo(&mut self, entry: HistoryEntry) {
        self.undo_stack.push_back(entry);
        if let Some(limit) = self.config.history_limit {
            while self.undo_stack.len() > limit {
                self.undo_stack.pop_front();
            }
        }
    }

    /// Replay the top undo entry. Returns false when there is nothing to undo
    /// or the entry no longer applies, in which case it is dropped.
    pub fn undo(&mut self) -> bool {
        let Some(entry) = self.undo_stack.pop_back() else {
            debug!("nothing to undo");
            return false;
        };
        match self.replay(&entry) {
            Some(reciprocal) => {
                self.redo_stack.push_back(reciprocal);
                true
            }
            None => false,
        }
    }

    /// Replay the top redo entry. Mirrors [`CommandWrapper::undo`].
    pub fn redo(&mut self) -> bool {
        let Some(entry) = self.redo_stack.pop_back() else {
            debug!("nothing to redo");
            return false;
        };
        match self.replay(&entry) {
            Some(reciprocal) => {
                self.push_undo(reciprocal);
                true
            }
            None => false,
        }
    }

    fn replay(&mut self, entry: &HistoryEntry) -> Option<HistoryEntry> {
        match self.run(&entry.command) {
            Ok(Some(command)) => Some(HistoryEntry { command, title: entry.title }),
            Ok(None) => {
                debug!(title = entry.title, "history entry had no effect, dropped");
                None
            }
            Err(err) => {
                warn!(title = entry.title, %err, "history entry failed, dropped");
                None
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Title of the entry `undo` would replay, or an empty string.
    pub fn suggested_undo_title(&self) -> String {
        self.undo_stack.back().map(|entry| entry.title.to_string()).unwrap_or_default()
    }

    /// Title of the entry `redo` would replay, or an empty string.
    pub fn suggested_redo_title(&self) -> String {
        self.redo_stack.back().map(|entry| entry.title.to_string()).unwrap_or_default()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// While set, commands still run but their reciprocals are not recorded.
    pub fn set_inhibited(&mut self, inhibited: bool) {
        self.inhibited = inhibited;
    }

    /// Add the top-most hittable annotation at the point to the selection.
    pub fn extend_selection_on_page_at_point(&mut self, page: usize, x: f32, y: f32) -> bool {
        self.selection.extend_at(&mut self.document, page, x, y)
    }

    pub fn deselect_all(&mut self) {
        self.selection.clear();
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn selection_count(&self) -> usize {
        self.selection.len()
    }

    pub fn selected_rects(&self) -> Vec<Rect> {
        self.selection.rects(&self.document)
    }

    pub fn selected_contents(&self) -> Vec<Option<String>> {
        self.selection.contents(&self.document)
    }

    /// Start dragging the current selection. False if nothing is selected
    /// or a drag is already under way.
    pub fn begin_drag(&mut self) -> bool {
        if self.drag.is_some() || self.selection.is_empty() {
            return false;
        }
        self.drag = Some(DragSession { targets: self.selection.refs().to_vec(), dx: 0.0, dy: 0.0 });
        true
    }

    /// Move the dragged annotations by an increment without recording it.
    pub fn drag_by(&mut self, dx: f32, dy: f32) -> bool {
        if !(dx.is_finite() && dy.is_finite()) {
            warn!(dx, dy, "drag increment is not finite");
            return false;
        }
        let Some(targets) = self.drag.as_ref().map(|drag| drag.targets.clone()) else {
            debug!("no drag in progress");
            return false;
        };

        let step = Command::MoveBound { targets, dx, dy };
        let moved = matches!(self.run(&step), Ok(Some(_)));
        if let Some(drag) = self.drag.as_mut().filter(|_| moved) {
            drag.dx += dx;
            drag.dy += dy;
        }
        moved
    }

    /// Finish the drag, recording the whole movement as one undo entry.
    pub fn end_drag(&mut self) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        if drag.dx == 0.0 && drag.dy == 0.0 {
            return false;
        }
        if self.inhibited {
            debug!("undo registration inhibited, drag not recorded");
            return true;
        }

        let command = Command::MoveBound { targets: drag.targets, dx: -drag.dx, dy: -drag.dy };
        let title = command.name();
        self.record(HistoryEntry { command, title });
        true
    }

    /// Abandon the drag, moving the annotations back to where it began.
    pub fn cancel_drag(&mut self) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        if drag.dx != 0.0 || drag.dy != 0.0 {
            let back = Command::MoveBound { targets: drag.targets, dx: -drag.dx, dy: -drag.dy };
            if let Err(err) = self.run(&back) {
                warn!(%err, "failed to revert drag");
            }
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }
}
