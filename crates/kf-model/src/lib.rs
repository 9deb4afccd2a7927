// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! kf-model - Shared types and call-surface traits for kf-lite
//!
//! This crate holds everything the other kf-lite crates agree on without
//! depending on each other: the CityJSON / tu3djson document model, the
//! validation tunables, the validation error codes and report, and the traits
//! that describe the bound module a harness drives.
//!
//! # Architecture
//!
//! - [`BoundModule`] - the full call surface of the native module
//! - [`Greeter`] / [`Named`] - capabilities of the two constructible types
//! - [`CityJson`] / [`Tu3dJson`] - typed views over parsed JSON documents
//! - [`ValidationOptions`] - tolerances passed to every validation call
//! - [`ValidationReport`] - per-feature, per-primitive validation outcome
//!
//! # Example
//!
//! ```ignore
//! use kf_model::{BoundModule, ValidationOptions};
//!
//! fn check(module: &dyn BoundModule, doc: &serde_json::Value) -> bool {
//!     module.vc(doc, &ValidationOptions::default()).validity
//! }
//! ```

pub mod cityjson;
pub mod codes;
pub mod error;
pub mod options;
pub mod report;
pub mod traits;

// Re-export all public types
pub use cityjson::*;
pub use codes::*;
pub use error::*;
pub use options::*;
pub use report::*;
pub use traits::*;
