pub mod edits;
pub mod moves;
pub mod session;

pub use edits::{EditError, TemplateEdit};
pub use moves::{MoveRejected, MoveRequest};
pub use session::EditSession;
