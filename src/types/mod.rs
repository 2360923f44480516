//! Common types used across the edgeX client library.

pub mod common;

pub use common::*;
