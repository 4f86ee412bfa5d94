//! Use cases - relay operations
pub mod auth_usecase;
pub mod room_usecase;
pub mod signaling_usecase;

pub use auth_usecase::{AuthOutcome, AuthUseCase};
pub use room_usecase::RoomUseCase;
pub use signaling_usecase::SignalingUseCase;
