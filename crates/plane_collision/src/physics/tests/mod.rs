//! Multi-frame integration tests for the collision pipeline

mod pipeline;
