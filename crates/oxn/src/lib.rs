#![doc = include_str!("../../../README.md")]
//!

//! This crate re-exports the dashboard library: data model, result
//! normalization, upload pipeline and backend client.

pub use oxn_core::*;
