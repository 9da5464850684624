pub mod clock;
pub mod config;
pub mod error;
pub mod game_registry;
pub mod game_trait;
pub mod hub;
pub mod input;
pub mod surface;
pub mod time;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use error::{GameError, HubError};
pub use game_registry::{GameDescriptor, GameRegistry};
pub use game_trait::{ArcadeGame, GameConfig, GameKey, GameMetadata, GameStatus, SessionId};
pub use hub::{EndReason, HubController, HubEvent, HubPhase};
