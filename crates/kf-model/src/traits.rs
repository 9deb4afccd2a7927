// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Call-surface traits
//!
//! These traits describe the bound module as seen by a caller. The native
//! implementation lives in `kf-ffi`; tests and harnesses can substitute their
//! own.

use crate::{ValidationOptions, ValidationReport};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io;

/// Named arguments of `add_arg`
///
/// Field names are the parameter names, so `AddArgs { j: 8, i: 9 }` reads the
/// same as a keyword call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddArgs {
    pub i: i32,
    pub j: i32,
}

/// Read-only attributes exposed at module level
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleAttributes {
    pub age: i32,
    pub gender: String,
    pub name: String,
}

/// Object that can greet
pub trait Greeter {
    /// Write `text` followed by a newline
    fn say(&self, out: &mut dyn io::Write, text: &str) -> io::Result<()>;
}

/// Object that carries a name
pub trait Named {
    fn get_name(&self) -> String;
}

/// The bound module
///
/// One method per symbol of the module. Integer helpers use 32-bit signed
/// integers; arithmetic wraps on overflow.
///
/// # Example
///
/// ```ignore
/// use kf_model::{AddArgs, BoundModule};
///
/// fn demo(module: &dyn BoundModule) {
///     assert_eq!(module.add(8, 9), 17);
///     assert_eq!(module.add_arg(AddArgs { j: 8, i: 9 }), 17);
///     assert!(module.judge(8, 0));
/// }
/// ```
pub trait BoundModule {
    /// Positional addition
    fn add(&self, i: i32, j: i32) -> i32;

    /// Addition with named arguments
    fn add_arg(&self, args: AddArgs) -> i32;

    /// Positional subtraction `i - j`
    fn sub(&self, i: i32, j: i32) -> i32;

    /// True when `num1` is strictly greater than `num2`
    fn judge(&self, num1: i32, num2: i32) -> bool;

    /// Module-level attributes (`age`, `gender`, `name`)
    fn attributes(&self) -> ModuleAttributes;

    /// Construct a `Hello`
    fn hello(&self) -> Box<dyn Greeter>;

    /// Construct a `Pet` named `name`
    fn pet(&self, name: &str) -> Box<dyn Named>;

    /// `3 + k`
    fn sumsum(&self, k: i32) -> i32;

    /// Sum of the coordinates of two fixed points added together
    fn addpoint(&self) -> f64;

    /// Validate a parsed document
    ///
    /// Never fails: problems with the document are reported inside the
    /// returned report.
    fn vc(&self, document: &Value, options: &ValidationOptions) -> ValidationReport;
}
