// Portfolio sync common library - main library exports

pub mod amount;
pub mod caip;
pub mod chain;
pub mod commands;
pub mod messages;
pub mod publisher;
pub mod queries;
pub mod session;
pub mod staking;
pub mod types;
pub mod wallet;

// Flattened re-exports
pub use self::caip::{AssetId, ChainId, ParseError};
pub use self::chain::{ChainType, NetworkType};
pub use self::types::*;
