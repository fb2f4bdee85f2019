mod exchange;
mod session_store;

pub use exchange::*;
pub use session_store::*;
