pub mod config;
pub mod editor;
pub mod input;
pub mod scheduler;
pub mod shortcuts;
pub mod tools;

pub use config::{ConfigError, EditorConfig};
pub use editor::{EditError, Editor};
pub use input::{InputEvent, Modifiers};
pub use scheduler::RenderScheduler;
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use tools::{Cursor, DragMode, Tool, TransformTool};
