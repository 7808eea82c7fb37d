// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing and JSON export for lamina diagnostics.
//!
//! This crate provides [`TraceSink`](lamina_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`json::JsonLinesSink`]: one JSON object per line, for tooling.
//!
//! Install either with
//! [`LayerTree::set_trace_sink`](lamina_core::layer::LayerTree::set_trace_sink).
//! This crate enables `lamina_core`'s `trace` feature, so events are
//! delivered as soon as it is in the dependency graph.

pub mod json;
pub mod pretty;
