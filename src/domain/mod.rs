//! Records, their state transitions, and the ports the application talks through.

pub mod course;
pub mod enrollment;
pub mod events;
pub mod ports;
pub mod purchase;
pub mod user;
