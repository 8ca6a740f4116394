//! RAII resource guards.

pub mod run_guard;

pub use run_guard::RunGuard;
