pub mod jwe;
pub mod maker;
pub mod payload;

pub use jwe::JweTokenMaker;
pub use maker::{TokenError, TokenMaker};
pub use payload::Payload;

/// Process-wide token maker handle shared by the router state and the access gate.
pub type SharedTokenMaker = std::sync::Arc<dyn TokenMaker>;
