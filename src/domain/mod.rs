//! Domain layer - Pure business logic.

// Persisted records and their reported view
pub mod encoding;

// Frame size and crop/pad arithmetic
pub mod geometry;

// Recipe template rendering
pub mod recipe;

// Lifecycle state machine
pub mod state;

// Temp file layout
pub mod workspace;
