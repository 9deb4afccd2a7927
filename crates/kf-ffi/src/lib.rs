//! kf-lite FFI - UniFFI bindings for the kf module
//!
//! Exposes the arithmetic helpers, the module attributes, the `Hello` and
//! `Pet` objects and CityJSON validation (`vc`) to foreign languages.
//! [`NativeModule`] offers the same surface to Rust callers through the
//! [`kf_model::BoundModule`] trait.

use kf_geometry::{Point3, Vector3};
use kf_model::{
    AddArgs, BoundModule, Greeter, ModuleAttributes, Named, ValidationOptions, ValidationReport,
};
use parking_lot::RwLock;
use serde_json::Value;
use std::io;

// Export UniFFI scaffolding
uniffi::setup_scaffolding!();

/// Library version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Age attribute of the bound module, returned by [`age`]
pub const AGE: i32 = 18;
/// Gender attribute of the bound module, returned by [`gender`]
pub const GENDER: &str = "male";
/// Name attribute of the bound module, returned by [`name`]
pub const NAME: &str = "Sam";

/// Get library version
#[uniffi::export]
pub fn get_version() -> String {
    VERSION.to_string()
}

/// Error type for FFI operations
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum KfError {
    #[error("Parse error: {msg}")]
    ParseError { msg: String },
    #[error("Report error: {msg}")]
    ReportError { msg: String },
}

impl From<kf_geometry::Error> for KfError {
    fn from(e: kf_geometry::Error) -> Self {
        KfError::ParseError { msg: e.to_string() }
    }
}

// ============================================================================
// Arithmetic
// ============================================================================

#[uniffi::export]
pub fn add(i: i32, j: i32) -> i32 {
    i.wrapping_add(j)
}

/// Same as [`add`]; bindings call it with named arguments
#[uniffi::export]
pub fn add_arg(i: i32, j: i32) -> i32 {
    i.wrapping_add(j)
}

/// Addition used by [`sumsum`]; not exported
fn add_default(i: i32, j: i32) -> i32 {
    add(i, j)
}

#[uniffi::export]
pub fn sub(i: i32, j: i32) -> i32 {
    i.wrapping_sub(j)
}

#[uniffi::export]
pub fn judge(num1: i32, num2: i32) -> bool {
    num1 > num2
}

#[uniffi::export]
pub fn dou_add(a: f64, b: f64) -> f64 {
    a + b
}

#[uniffi::export]
pub fn sumsum(k: i32) -> i32 {
    add(add_default(1, 2), k)
}

/// Add (0, 1, 1) to (1, 2, 3) and sum the coordinates of the result
#[uniffi::export]
pub fn addpoint() -> f64 {
    let p = Point3::new(1.0, 2.0, 3.0) + Vector3::new(0.0, 1.0, 1.0);
    p.x + p.y + p.z
}

// ============================================================================
// Attributes
// ============================================================================

#[uniffi::export]
pub fn age() -> i32 {
    AGE
}

#[uniffi::export]
pub fn gender() -> String {
    GENDER.to_string()
}

#[uniffi::export]
pub fn name() -> String {
    NAME.to_string()
}

// ============================================================================
// Objects
// ============================================================================

/// Prints what it is told
#[derive(Debug, Default, uniffi::Object)]
pub struct Hello;

#[uniffi::export]
impl Hello {
    #[uniffi::constructor]
    pub fn new() -> Self {
        Self
    }

    /// Print `s` and a newline to stdout
    pub fn say(&self, s: String) {
        println!("{}", s);
    }
}

impl Greeter for Hello {
    fn say(&self, out: &mut dyn io::Write, text: &str) -> io::Result<()> {
        writeln!(out, "{}", text)
    }
}

/// A named pet
#[derive(Debug, uniffi::Object)]
pub struct Pet {
    name: RwLock<String>,
}

#[uniffi::export]
impl Pet {
    #[uniffi::constructor]
    pub fn new(name: String) -> Self {
        Self {
            name: RwLock::new(name),
        }
    }

    pub fn get_name(&self) -> String {
        self.name.read().clone()
    }

    pub fn set_name(&self, name: String) {
        *self.name.write() = name;
    }
}

impl Named for Pet {
    fn get_name(&self) -> String {
        Pet::get_name(self)
    }
}

// ============================================================================
// Validation
// ============================================================================

fn validate_text(
    json: &str,
    tol_snap: f64,
    planarity_d2p_tol: f64,
    planarity_n_tol: f64,
    overlap_tol: f64,
) -> Result<ValidationReport, KfError> {
    let opts = ValidationOptions::new(tol_snap, planarity_d2p_tol, planarity_n_tol, overlap_tol);
    let report = kf_geometry::validate_str(json, &opts)?;
    log::debug!(
        "validated {} features, errors {:?}",
        report.features.len(),
        report.all_errors
    );
    Ok(report)
}

/// Validate CityJSON (or tu3djson) text and return its validity
///
/// Fails only when `json` is not JSON at all; a document that cannot be
/// validated is reported as invalid.
#[uniffi::export]
pub fn vc(
    json: String,
    tol_snap: f64,
    planarity_d2p_tol: f64,
    planarity_n_tol: f64,
    overlap_tol: f64,
) -> Result<bool, KfError> {
    validate_text(&json, tol_snap, planarity_d2p_tol, planarity_n_tol, overlap_tol)
        .map(|r| r.validity)
}

/// Validate like [`vc`] and return the full report as JSON text
#[uniffi::export]
pub fn vc_report(
    json: String,
    tol_snap: f64,
    planarity_d2p_tol: f64,
    planarity_n_tol: f64,
    overlap_tol: f64,
) -> Result<String, KfError> {
    let report = validate_text(&json, tol_snap, planarity_d2p_tol, planarity_n_tol, overlap_tol)?;
    report
        .to_json_string()
        .map_err(|e| KfError::ReportError { msg: e.to_string() })
}

// ============================================================================
// Rust-side module
// ============================================================================

/// The native module behind the [`BoundModule`] trait
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeModule;

impl BoundModule for NativeModule {
    fn add(&self, i: i32, j: i32) -> i32 {
        add(i, j)
    }

    fn add_arg(&self, args: AddArgs) -> i32 {
        add_arg(args.i, args.j)
    }

    fn sub(&self, i: i32, j: i32) -> i32 {
        sub(i, j)
    }

    fn judge(&self, num1: i32, num2: i32) -> bool {
        judge(num1, num2)
    }

    fn attributes(&self) -> ModuleAttributes {
        ModuleAttributes {
            age: age(),
            gender: gender(),
            name: name(),
        }
    }

    fn hello(&self) -> Box<dyn Greeter> {
        Box::new(Hello::new())
    }

    fn pet(&self, name: &str) -> Box<dyn Named> {
        Box::new(Pet::new(name.to_string()))
    }

    fn sumsum(&self, k: i32) -> i32 {
        sumsum(k)
    }

    fn addpoint(&self) -> f64 {
        addpoint()
    }

    fn vc(&self, document: &Value, options: &ValidationOptions) -> ValidationReport {
        kf_geometry::validate_json(document, options)
    }
}
