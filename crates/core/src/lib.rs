//! Annotation editing core
//!
//! Reciprocal-command undo/redo engine for page annotations. Every command,
//! when executed, hands back the command that reverses it; the engine keeps
//! those reciprocals on undo/redo stacks.

pub mod appearance;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod makers;
pub mod persistence;
pub mod registry;
pub mod selection;

pub use appearance::{AppearanceError, AppearanceRewriter, TextOperatorRewriter};
pub use command::{Command, CommandKind, EditContext};
pub use config::{ConfigError, EditorConfig, TextMetrics};
pub use engine::{CommandWrapper, HistoryEntry};
pub use error::{CommandError, CommandResult};
pub use persistence::DocumentWriter;
pub use registry::{CommandFactory, CommandRegistry};
pub use selection::{hit_test, AnnotationRef, SelectionSet};
