pub mod animation;
pub mod background;
pub mod command;
pub mod history;
pub mod input;
pub mod placement;
pub mod selection;
pub mod session;
pub mod transform;

pub use command::EditorCommand;
pub use session::EditorSession;
