//! Per-student push channel for notifications.
//!
//! One topic per student; every open tab subscribes to it, so a single
//! publish reaches all of them.

pub mod handlers;
pub mod topics;
pub mod ws_handlers;
