//! Message model shared by every fieldnet agent role.
//!
//! Messages are a closed tagged union keyed by category. On the wire they are
//! flat JSON records: `sender_role`, `sender_id`, a `category` tag and only
//! the fields that category defines.

pub mod codec;
pub mod types;

pub use codec::{decode, encode, WireError};
pub use types::{AgentId, Body, Category, Message, Position, Role};
