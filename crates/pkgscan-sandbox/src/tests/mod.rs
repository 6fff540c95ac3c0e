//! Unit tests for the sandbox wrapper.

mod snapshot;
