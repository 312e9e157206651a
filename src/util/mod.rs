//! Runtime utilities: signal handling and log subscriber setup.

pub mod sig_down;
pub mod telemetry;

pub use sig_down::SigDown;
