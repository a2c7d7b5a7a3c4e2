pub mod errors;
pub mod letters;
pub mod messages;
pub mod player;
pub mod room;

// Re-export all types
pub use errors::*;
pub use letters::*;
pub use messages::*;
pub use player::*;
pub use room::*;
