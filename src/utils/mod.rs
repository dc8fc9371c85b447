//! Process-level helpers for services embedding the store.

pub mod bootstrap;
