//! Tests for the storage context.
