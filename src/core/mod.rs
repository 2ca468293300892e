/*!
 * Core Module
 * Synchronization primitives, limits and error types
 */

pub mod errors;
pub mod limits;
pub mod sync;

// Re-export for convenience
pub use errors::*;
