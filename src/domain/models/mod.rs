mod backend;
mod exchange;
mod message;
mod send_policy;
mod session;
mod slash_commands;

pub use backend::*;
pub use exchange::*;
pub use message::*;
pub use send_policy::*;
pub use session::*;
pub use slash_commands::*;
