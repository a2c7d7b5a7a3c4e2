pub mod channel;
pub mod clock;
pub mod composer;
pub mod config;
pub mod driver;
pub mod events;
pub mod ids;
pub mod keyboard;
pub mod presence;
pub mod replication;
pub mod resume;
pub mod round;
pub mod scoring;
pub mod session;
pub mod word_validation;

// Re-export main components
pub use channel::*;
pub use clock::*;
pub use composer::*;
pub use config::*;
pub use driver::*;
pub use events::*;
pub use ids::*;
pub use keyboard::*;
pub use presence::*;
pub use replication::{Applied, ProtocolError};
pub use resume::*;
pub use round::*;
pub use scoring::*;
pub use session::*;
pub use word_validation::*;
