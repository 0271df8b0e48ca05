//! Edit scripts replayed by `airmark apply`
//!
//! A script is a JSON array of steps, each tagged by `op`:
//!
//! ```json
//! [
//!   { "op": "execute", "name": "AddBoxAnnotation", "args": [0, 10, 10, 50, 20] },
//!   { "op": "select", "page": 0, "x": 20, "y": 20 },
//!   { "op": "drag", "moves": [{ "dx": 5, "dy": 0 }, { "dx": 5, "dy": 0 }] },
//!   { "op": "undo" }
//! ]
//! ```

use airmark_core::CommandWrapper;
use serde::Deserialize;
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScriptArg {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for ScriptArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptArg::Text(text) => f.write_str(text),
            ScriptArg::Number(number) => write!(f, "{number}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DragMove {
    pub dx: f32,
    pub dy: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Run a registered command by name.
    Execute {
        name: String,
        #[serde(default)]
        args: Vec<ScriptArg>,
    },
    /// Select at a point; replaces the selection unless `extend` is set.
    Select {
        page: usize,
        x: f32,
        y: f32,
        #[serde(default)]
        extend: bool,
    },
    Deselect,
    Undo,
    Redo,
    /// Drag the selection through `moves`, recorded as one undo entry.
    Drag { moves: Vec<DragMove> },
}

pub fn parse(source: &[u8]) -> serde_json::Result<Vec<Step>> {
    serde_json::from_slice(source)
}

/// Apply one step. Returns whether it had an effect.
pub fn run_step(engine: &mut CommandWrapper, step: &Step) -> bool {
    match step {
        Step::Execute { name, args } => engine.execute(name, args.iter().map(ToString::to_string)),
        Step::Select { page, x, y, extend } => {
            if !extend {
                engine.deselect_all();
            }
            engine.extend_selection_on_page_at_point(*page, *x, *y)
        }
        Step::Deselect => {
            engine.deselect_all();
            true
        }
        Step::Undo => engine.undo(),
        Step::Redo => engine.redo(),
        Step::Drag { moves } => {
            if !engine.begin_drag() {
                return false;
            }
            for (index, step) in moves.iter().enumerate() {
                if !engine.drag_by(step.dx, step.dy) {
                    warn!(index, dx = step.dx, dy = step.dy, "drag increment had no effect");
                }
            }
            engine.end_drag()
        }
    }
}
