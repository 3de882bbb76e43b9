pub mod config;
pub mod retry;
pub mod state;
pub mod ws;
