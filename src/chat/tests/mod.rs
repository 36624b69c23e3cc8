//! Unit tests for chat message storage.

mod support;
