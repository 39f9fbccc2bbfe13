//! Tests for the task context.
