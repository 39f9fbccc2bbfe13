//! Tests for the session context.
