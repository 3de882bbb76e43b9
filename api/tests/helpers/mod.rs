pub mod app;
pub mod ws;
