//! In-memory mocks for testing.
//!
//! [`MemoryStore`] implements every store trait against `HashMap`s so the
//! services can be exercised at memory speed, including their failure paths
//! via the simulated-outage switch.

mod store;

pub use store::MemoryStore;
