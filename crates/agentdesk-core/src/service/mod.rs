//! Business logic services (use cases).
//!
//! Services orchestrate repository calls and business rules. They depend on
//! traits (ports), never on concrete infrastructure implementations.

pub mod agent;
pub mod hash;
pub mod role;
pub mod user;
