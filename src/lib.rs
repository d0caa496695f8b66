pub mod checker;
pub mod completion;
pub mod config;
pub mod gate;
pub mod prompt;
pub mod server;
pub mod store;
