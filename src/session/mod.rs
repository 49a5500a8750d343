mod storage;
mod store;
mod sweeper;

pub use storage::ExpiringStore;
pub use store::SessionStore;
pub use sweeper::{ExpirySweeper, SweeperHandle};
