pub mod envelope;
pub mod event;
