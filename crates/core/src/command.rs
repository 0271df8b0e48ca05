//! Editing commands as self-inverting operations
//!
//! A [`Command`] carries exactly the data it needs to apply itself. When it
//! succeeds, [`Command::execute`] returns the reciprocal command: executing
//! that reciprocal reverses the change and in turn yields a command that
//! re-applies it.
//!
//! Fresh, user-initiated invocations carry their raw string arguments and act
//! on the current selection or on whatever is under a point. Replays produced
//! as reciprocals are separate variants that name their targets explicitly
//! (`MoveBound`, `ChangeBoundText`, `ReplaceAnnotations`), so undo and redo
//! always affect the same annotations regardless of what is selected.

use crate::appearance::AppearanceRewriter;
use crate::config::EditorConfig;
use crate::error::{CommandError, CommandResult};
use crate::makers;
use crate::persistence::DocumentWriter;
use crate::registry::CommandFactory;
use crate::selection::{AnnotationRef, SelectionSet};
use airmark_model::{Annotation, Document, Rect};
use std::path::Path;
use tracing::{debug, error, info};

/// Everything a command may touch while it runs.
pub struct EditContext<'a> {
    pub document: &'a mut Document,
    pub selection: &'a mut SelectionSet,
    pub config: &'a EditorConfig,
    pub rewriter: &'a dyn AppearanceRewriter,
    pub writer: Option<&'a dyn DocumentWriter>,
}

/// The commands addressable by name at the engine boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    AddBoxAnnotation,
    AddCircleAnnotation,
    AddTextAnnotation,
    MoveSelectedAnnotation,
    MoveAnnotation,
    DeleteSelectedAnnotation,
    DeleteAnnotation,
    ChangeSelectedAnnotationText,
    Save,
    Undo,
    Redo,
}

impl CommandKind {
    pub const ALL: [CommandKind; 11] = [
        CommandKind::AddBoxAnnotation,
        CommandKind::AddCircleAnnotation,
        CommandKind::AddTextAnnotation,
        CommandKind::MoveSelectedAnnotation,
        CommandKind::MoveAnnotation,
        CommandKind::DeleteSelectedAnnotation,
        CommandKind::DeleteAnnotation,
        CommandKind::ChangeSelectedAnnotationText,
        CommandKind::Save,
        CommandKind::Undo,
        CommandKind::Redo,
    ];

    /// Registry name used by callers addressing commands by string.
    pub fn name(self) -> &'static str {
        match self {
            CommandKind::AddBoxAnnotation => "AddBoxAnnotation",
            CommandKind::AddCircleAnnotation => "AddCircleAnnotation",
            CommandKind::AddTextAnnotation => "AddTextAnnotation",
            CommandKind::MoveSelectedAnnotation => "MoveSelectedAnnotation",
            CommandKind::MoveAnnotation => "MoveAnnotation",
            CommandKind::DeleteSelectedAnnotation => "DeleteSelectedAnnotation",
            CommandKind::DeleteAnnotation => "DeleteAnnotation",
            CommandKind::ChangeSelectedAnnotationText => "ChangeSelectedAnnotationText",
            CommandKind::Save => "Save",
            CommandKind::Undo => "Undo",
            CommandKind::Redo => "Redo",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Constructor for a fresh invocation of this kind.
    pub fn factory(self) -> CommandFactory {
        match self {
            CommandKind::AddBoxAnnotation => Command::AddBox,
            CommandKind::AddCircleAnnotation => Command::AddEllipse,
            CommandKind::AddTextAnnotation => Command::AddText,
            CommandKind::MoveSelectedAnnotation => Command::MoveSelected,
            CommandKind::MoveAnnotation => Command::MoveAt,
            CommandKind::DeleteSelectedAnnotation => Command::DeleteSelected,
            CommandKind::DeleteAnnotation => Command::DeleteAt,
            CommandKind::ChangeSelectedAnnotationText => Command::ChangeSelectedText,
            CommandKind::Save => Command::Save,
            CommandKind::Undo => |_| Command::Undo,
            CommandKind::Redo => |_| Command::Redo,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// page, x, y, width, height
    AddBox(Vec<String>),
    /// page, x, y, width, height, text
    AddEllipse(Vec<String>),
    /// page, x, y, text  or  page, x, y, width, height, text
    AddText(Vec<String>),
    /// page, dx, dy; moves every selected annotation
    MoveSelected(Vec<String>),
    /// page, x, y, dx, dy; moves the annotation under the point
    MoveAt(Vec<String>),
    /// Replay of a move over explicit targets
    MoveBound { targets: Vec<AnnotationRef>, dx: f32, dy: f32 },
    /// page
    DeleteSelected(Vec<String>),
    /// page, x, y
    DeleteAt(Vec<String>),
    /// page (unused), text
    ChangeSelectedText(Vec<String>),
    /// Replay of a text change on an explicit target
    ChangeBoundText { target: AnnotationRef, text: Option<String> },
    /// Swap a page's whole annotation list. Listed annotations that are
    /// still on the page are kept as they are now.
    ReplaceAnnotations { page: usize, annotations: Vec<Annotation> },
    /// path
    Save(Vec<String>),
    Undo,
    Redo,
}

impl Command {
    /// Human-readable name, used to title undo and redo entries.
    pub fn name(&self) -> &'static str {
        match self {
            Command::AddBox(_) => "Add Box Annotation",
            Command::AddEllipse(_) => "Add Ellipse Annotation",
            Command::AddText(_) => "Add Text Annotation",
            Command::MoveSelected(_) | Command::MoveAt(_) | Command::MoveBound { .. } => {
                "Move Annotation"
            }
            Command::DeleteSelected(_) | Command::DeleteAt(_) => "Delete Annotation",
            Command::ChangeSelectedText(_) | Command::ChangeBoundText { .. } => {
                "Change Annotation Text"
            }
            Command::ReplaceAnnotations { .. } => "Replace Annotations",
            Command::Save(_) => "Save Document",
            Command::Undo => "Undo",
            Command::Redo => "Redo",
        }
    }

    /// Apply the command.
    ///
    /// Returns `Ok(Some(reciprocal))` on success and `Ok(None)` when there was
    /// nothing to do. Malformed arguments are reported as errors. In both of
    /// the latter cases the document is left untouched.
    ///
    /// `Undo` and `Redo` need the engine's stacks and are dispatched by
    /// [`crate::CommandWrapper`]; here they do nothing.
    pub fn execute(&self, ctx: &mut EditContext<'_>) -> CommandResult<Option<Command>> {
        match self {
            Command::AddBox(args) => add_box(ctx, Args::new("AddBoxAnnotation", args)),
            Command::AddEllipse(args) => add_ellipse(ctx, Args::new("AddCircleAnnotation", args)),
            Command::AddText(args) => add_text(ctx, Args::new("AddTextAnnotation", args)),
            Command::MoveSelected(args) => {
                move_selected(ctx, Args::new("MoveSelectedAnnotation", args))
            }
            Command::MoveAt(args) => move_at(ctx, Args::new("MoveAnnotation", args)),
            Command::MoveBound { targets, dx, dy } => Ok(translate(ctx, targets, *dx, *dy)),
            Command::DeleteSelected(args) => {
                delete_selected(ctx, Args::new("DeleteSelectedAnnotation", args))
            }
            Command::DeleteAt(args) => delete_at(ctx, Args::new("DeleteAnnotation", args)),
            Command::ChangeSelectedText(args) => {
                change_selected_text(ctx, Args::new("ChangeSelectedAnnotationText", args))
            }
            Command::ChangeBoundText { target, text } => Ok(set_text(ctx, *target, text.clone())),
            Command::ReplaceAnnotations { page, annotations } => {
                Ok(replace_annotations(ctx, *page, annotations.clone()))
            }
            Command::Save(args) => save(ctx, Args::new("Save", args)),
            Command::Undo | Command::Redo => Ok(None),
        }
    }
}

/// Positional string arguments of one invocation.
struct Args<'a> {
    command: &'static str,
    values: &'a [String],
}

impl<'a> Args<'a> {
    fn new(command: &'static str, values: &'a [String]) -> Self {
        Self { command, values }
    }

    fn expect_len(&self, expected: usize, label: &'static str) -> CommandResult<()> {
        if self.values.len() == expected {
            Ok(())
        } else {
            Err(self.arity(label))
        }
    }

    fn arity(&self, expected: &'static str) -> CommandError {
        CommandError::ArgumentArity {
            command: self.command,
            expected,
            received: self.values.len(),
        }
    }

    fn parse_error(&self, index: usize) -> CommandError {
        CommandError::ArgumentParse {
            command: self.command,
            index,
            value: self.values[index].clone(),
        }
    }

    fn page(&self, index: usize) -> CommandResult<usize> {
        self.values[index].trim().parse::<usize>().map_err(|_| self.parse_error(index))
    }

    fn number(&self, index: usize) -> CommandResult<f32> {
        self.values[index]
            .trim()
            .parse::<f32>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| self.parse_error(index))
    }

    fn text(&self, index: usize) -> &'a str {
        &self.values[index]
    }
}

/// Append `annotation` to `page`; the reciprocal restores the previous list.
fn append(ctx: &mut EditContext<'_>, page: usize, annotation: Annotation) -> Option<Command> {
    let Some(target) = ctx.document.page_mut(page) else {
        debug!(page, "page does not exist, nothing added");
        return None;
    };
    let previous = target.annotations.clone();
    target.annotations.push(annotation);
    Some(Command::ReplaceAnnotations { page, annotations: previous })
}

fn add_box(ctx: &mut EditContext<'_>, args: Args<'_>) -> CommandResult<Option<Command>> {
    args.expect_len(5, "5")?;
    let page = args.page(0)?;
    let rect = Rect::new(args.number(1)?, args.number(2)?, args.number(3)?, args.number(4)?);
    let annotation = makers::make_box(rect, ctx.config);
    Ok(append(ctx, page, annotation))
}

fn add_ellipse(ctx: &mut EditContext<'_>, args: Args<'_>) -> CommandResult<Option<Command>> {
    args.expect_len(6, "6")?;
    let page = args.page(0)?;
    let rect = Rect::new(args.number(1)?, args.number(2)?, args.number(3)?, args.number(4)?);
    let annotation = makers::make_ellipse(rect, args.text(5), ctx.config);
    Ok(append(ctx, page, annotation))
}

fn add_text(ctx: &mut EditContext<'_>, args: Args<'_>) -> CommandResult<Option<Command>> {
    let (size, text) = match args.values.len() {
        4 => (None, args.text(3)),
        6 => (Some((args.number(3)?, args.number(4)?)), args.text(5)),
        _ => return Err(args.arity("4 or 6")),
    };
    let page = args.page(0)?;
    let (x, y) = (args.number(1)?, args.number(2)?);
    let annotation = makers::make_text(x, y, size, text, ctx.config);
    Ok(append(ctx, page, annotation))
}

/// Translate every target that still exists; the reciprocal moves them back.
fn translate(ctx: &mut EditContext<'_>, targets: &[AnnotationRef], dx: f32, dy: f32) -> Option<Command> {
    let mut moved = Vec::with_capacity(targets.len());
    for target in targets {
        if let Some(annotation) = target.resolve_mut(ctx.document) {
            annotation.rect.translate(dx, dy);
            moved.push(*target);
        }
    }

    if moved.is_empty() {
        debug!("no annotations to move");
        return None;
    }
    Some(Command::MoveBound { targets: moved, dx: -dx, dy: -dy })
}

fn move_selected(ctx: &mut EditContext<'_>, args: Args<'_>) -> CommandResult<Option<Command>> {
    args.expect_len(3, "3")?;
    args.page(0)?;
    let (dx, dy) = (args.number(1)?, args.number(2)?);
    let targets = ctx.selection.refs().to_vec();
    Ok(translate(ctx, &targets, dx, dy))
}

fn move_at(ctx: &mut EditContext<'_>, args: Args<'_>) -> CommandResult<Option<Command>> {
    args.expect_len(5, "5")?;
    let page = args.page(0)?;
    let (x, y) = (args.number(1)?, args.number(2)?);
    let (dx, dy) = (args.number(3)?, args.number(4)?);

    let Some(target) = ctx.document.page_mut(page) else {
        return Ok(None);
    };
    let Some(index) = target.annotation_index_at(x, y) else {
        debug!(page, x, y, "no annotation under point");
        return Ok(None);
    };
    let id = target.annotations[index].ensure_id();
    Ok(translate(ctx, &[AnnotationRef::new(page, id)], dx, dy))
}

fn delete_selected(ctx: &mut EditContext<'_>, args: Args<'_>) -> CommandResult<Option<Command>> {
    args.expect_len(1, "1")?;
    let page = args.page(0)?;

    if ctx.selection.is_empty() {
        debug!("selection is empty, nothing deleted");
        return Ok(None);
    }
    let Some(target) = ctx.document.page_mut(page) else {
        return Ok(None);
    };

    target.ensure_ids();
    let previous = target.annotations.clone();
    let selection = &*ctx.selection;
    target
        .annotations
        .retain(|annotation| !annotation.id.is_some_and(|id| selection.contains(id)));
    ctx.selection.clear();
    Ok(Some(Command::ReplaceAnnotations { page, annotations: previous }))
}

fn delete_at(ctx: &mut EditContext<'_>, args: Args<'_>) -> CommandResult<Option<Command>> {
    args.expect_len(3, "3")?;
    let page = args.page(0)?;
    let (x, y) = (args.number(1)?, args.number(2)?);

    let Some(target) = ctx.document.page_mut(page) else {
        return Ok(None);
    };
    let Some(index) = target.annotation_index_at(x, y) else {
        debug!(page, x, y, "no annotation under point");
        return Ok(None);
    };
    let previous = target.annotations.clone();
    target.annotations.remove(index);
    ctx.selection.retain_existing(ctx.document);
    Ok(Some(Command::ReplaceAnnotations { page, annotations: previous }))
}

fn change_selected_text(
    ctx: &mut EditContext<'_>,
    args: Args<'_>,
) -> CommandResult<Option<Command>> {
    args.expect_len(2, "2")?;
    let Some(target) = ctx.selection.single() else {
        debug!(selected = ctx.selection.len(), "text change needs exactly one selected annotation");
        return Ok(None);
    };
    Ok(set_text(ctx, target, Some(args.text(1).to_owned())))
}

/// Set contents and refresh the appearance; the reciprocal restores the old text.
fn set_text(ctx: &mut EditContext<'_>, target: AnnotationRef, text: Option<String>) -> Option<Command> {
    let Some(annotation) = target.resolve_mut(ctx.document) else {
        debug!(page = target.page, id = %target.id, "annotation no longer exists");
        return None;
    };

    if let Err(err) = ctx.rewriter.rewrite(annotation, text.as_deref().unwrap_or_default()) {
        error!(id = %target.id, %err, "failed to rewrite annotation appearance");
    }
    let previous = std::mem::replace(&mut annotation.contents, text);
    Some(Command::ChangeBoundText { target, text: previous })
}

fn replace_annotations(
    ctx: &mut EditContext<'_>,
    page: usize,
    annotations: Vec<Annotation>,
) -> Option<Command> {
    let Some(current) = ctx.document.page(page) else {
        debug!(page, "page does not exist, annotations not replaced");
        return None;
    };
    // Entries still on the page keep their live state
    let merged = annotations
        .into_iter()
        .map(|snapshot| snapshot.id.and_then(|id| current.find(id)).cloned().unwrap_or(snapshot))
        .collect();

    match ctx.document.replace_annotations(page, merged) {
        Ok(previous) => {
            ctx.selection.retain_existing(ctx.document);
            Some(Command::ReplaceAnnotations { page, annotations: previous })
        }
        Err(err) => {
            debug!(%err, "annotations not replaced");
            None
        }
    }
}

fn save(ctx: &mut EditContext<'_>, args: Args<'_>) -> CommandResult<Option<Command>> {
    args.expect_len(1, "1")?;
    let path = Path::new(args.text(0));
    match ctx.writer {
        Some(writer) => match writer.write(ctx.document, path) {
            Ok(()) => info!(path = %path.display(), "document saved"),
            Err(err) => error!(path = %path.display(), %err, "failed to save document"),
        },
        None => error!("no document writer configured, save skipped"),
    }
    // Saving never lands on the undo stack
    Ok(None)
}
