//! Shared identifier, money and pagination types.

pub mod money;
pub mod page;
pub mod types;

pub use money::Money;
pub use page::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT, PageRequest};
pub use types::{ItemId, OrderId, OrderLineId, UserId};
