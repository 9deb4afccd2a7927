// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Demo harness for the kf module
//!
//! Drives every symbol of a [`BoundModule`] in a fixed order and prints each
//! result, then reads a CityJSON file and prints its validity. The first
//! failure stops the run.

use anyhow::{Context, Result};
use clap::Parser;
use kf_model::{AddArgs, BoundModule, ValidationOptions};
use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;

/// Input used when neither `--input` nor `KF_CITYJSON` is given
pub const DEFAULT_INPUT: &str = "/home/ziyanwu/data/cityjson/cube.json";

#[derive(Parser, Debug, Clone)]
#[command(name = "kf-demo", version, about = "Exercise the kf module and validate a CityJSON file")]
pub struct Config {
    /// CityJSON file to validate
    #[arg(long, env = "KF_CITYJSON", default_value = DEFAULT_INPUT)]
    pub input: PathBuf,

    /// Snap tolerance for vertices
    #[arg(long, default_value_t = ValidationOptions::DEFAULT_TOL_SNAP, allow_negative_numbers = true)]
    pub tol_snap: f64,

    /// Planarity tolerance: distance to plane
    #[arg(long, default_value_t = ValidationOptions::DEFAULT_PLANARITY_D2P_TOL, allow_negative_numbers = true)]
    pub planarity_d2p_tol: f64,

    /// Planarity tolerance: normals deviation, in degrees
    #[arg(long, default_value_t = ValidationOptions::DEFAULT_PLANARITY_N_TOL, allow_negative_numbers = true)]
    pub planarity_n_tol: f64,

    /// Overlap tolerance; negative disables overlap tests
    #[arg(long, default_value_t = ValidationOptions::DEFAULT_OVERLAP_TOL, allow_negative_numbers = true)]
    pub overlap_tol: f64,

    /// Also print the full validation report as JSON
    #[arg(long)]
    pub report: bool,
}

impl Config {
    /// Configuration of a plain run on `input`
    pub fn with_input(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            tol_snap: ValidationOptions::DEFAULT_TOL_SNAP,
            planarity_d2p_tol: ValidationOptions::DEFAULT_PLANARITY_D2P_TOL,
            planarity_n_tol: ValidationOptions::DEFAULT_PLANARITY_N_TOL,
            overlap_tol: ValidationOptions::DEFAULT_OVERLAP_TOL,
            report: false,
        }
    }

    pub fn options(&self) -> ValidationOptions {
        ValidationOptions::new(
            self.tol_snap,
            self.planarity_d2p_tol,
            self.planarity_n_tol,
            self.overlap_tol,
        )
    }
}

/// JSON kind of a value, as printed for the parsed document
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Run the whole call sequence against `module`, printing to `out`
pub fn run(module: &dyn BoundModule, cfg: &Config, out: &mut dyn Write) -> Result<()> {
    // simple functions
    writeln!(out, "add(8,9)= {}", module.add(8, 9))?;
    writeln!(out, "add_arg(8,9)= {}", module.add_arg(AddArgs { j: 8, i: 9 }))?;
    writeln!(out, "sub(8,9)= {}", module.sub(8, 9))?;
    writeln!(out, "judge(8,9)= {}", module.judge(8, 9))?;
    writeln!(out, "judge(8,0)= {}", module.judge(8, 0))?;

    // attributes
    let attrs = module.attributes();
    writeln!(out, "kf.age= {}", attrs.age)?;
    writeln!(out, "kf.gender= {}", attrs.gender)?;
    writeln!(out, "kf.name= {}", attrs.name)?;

    // objects
    let sam = module.hello();
    writeln!(out, "Sam.say(): ")?;
    sam.say(out, "my name is Sam")?;

    let pet = module.pet("cat");
    writeln!(out, "pet.getName():  {}", pet.get_name())?;

    writeln!(out, "kf.sumsum(3)= {}", module.sumsum(3))?;
    writeln!(out, "kf.addpoint= {}", module.addpoint())?;

    // validation
    let text = std::fs::read_to_string(&cfg.input)
        .with_context(|| format!("failed to read {}", cfg.input.display()))?;
    let document: Value = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse {} as JSON", cfg.input.display()))?;
    writeln!(out, "type(cityjson):  {}", json_kind(&document))?;

    let report = module.vc(&document, &cfg.options());
    log::info!(
        "{}: validity {}, errors {:?}",
        cfg.input.display(),
        report.validity,
        report.all_errors
    );
    writeln!(out, "{}", report.validity)?;

    if cfg.report {
        writeln!(out, "{}", report.to_json_string()?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kf_model::{Greeter, ModuleAttributes, Named, ValidationReport};
    use std::cell::Cell;
    use std::io;

    struct StubGreeter;

    impl Greeter for StubGreeter {
        fn say(&self, out: &mut dyn io::Write, text: &str) -> io::Result<()> {
            writeln!(out, "{}", text)
        }
    }

    struct StubPet(String);

    impl Named for StubPet {
        fn get_name(&self) -> String {
            self.0.clone()
        }
    }

    /// Module answering like the native one, recording `vc` calls
    #[derive(Default)]
    struct StubModule {
        vc_calls: Cell<usize>,
        valid: bool,
    }

    impl BoundModule for StubModule {
        fn add(&self, i: i32, j: i32) -> i32 {
            i + j
        }
        fn add_arg(&self, args: AddArgs) -> i32 {
            args.i + args.j
        }
        fn sub(&self, i: i32, j: i32) -> i32 {
            i - j
        }
        fn judge(&self, num1: i32, num2: i32) -> bool {
            num1 > num2
        }
        fn attributes(&self) -> ModuleAttributes {
            ModuleAttributes {
                age: 18,
                gender: "male".to_string(),
                name: "Sam".to_string(),
            }
        }
        fn hello(&self) -> Box<dyn Greeter> {
            Box::new(StubGreeter)
        }
        fn pet(&self, name: &str) -> Box<dyn Named> {
            Box::new(StubPet(name.to_string()))
        }
        fn sumsum(&self, k: i32) -> i32 {
            3 + k
        }
        fn addpoint(&self) -> f64 {
            8.0
        }
        fn vc(&self, _document: &Value, options: &ValidationOptions) -> ValidationReport {
            self.vc_calls.set(self.vc_calls.get() + 1);
            let mut report = ValidationReport::new(Some("CityJSON"), *options);
            if !self.valid {
                report.add_dataset_error(kf_model::ErrorCode::InvalidInputFile, "stub");
            }
            report.finish()
        }
    }

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_full_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "doc.json", r#"{"type": "CityJSON"}"#);
        let module = StubModule {
            valid: true,
            ..Default::default()
        };
        let mut out = Vec::new();
        run(&module, &Config::with_input(path), &mut out).unwrap();

        let expected = concat!(
            "add(8,9)= 17\n",
            "add_arg(8,9)= 17\n",
            "sub(8,9)= -1\n",
            "judge(8,9)= false\n",
            "judge(8,0)= true\n",
            "kf.age= 18\n",
            "kf.gender= male\n",
            "kf.name= Sam\n",
            "Sam.say(): \n",
            "my name is Sam\n",
            "pet.getName():  cat\n",
            "kf.sumsum(3)= 6\n",
            "kf.addpoint= 8\n",
            "type(cityjson):  object\n",
            "true\n",
        );
        assert_eq!(String::from_utf8(out).unwrap(), expected);
        assert_eq!(module.vc_calls.get(), 1);
    }

    #[test]
    fn test_invalid_document_prints_false() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "doc.json", "[]");
        let module = StubModule::default();
        let mut out = Vec::new();
        run(&module, &Config::with_input(path), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("type(cityjson):  array\nfalse\n"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let module = StubModule::default();
        let mut out = Vec::new();
        let err = run(&module, &Config::with_input(dir.path().join("absent.json")), &mut out)
            .unwrap_err();

        let io_err = err.downcast_ref::<io::Error>().expect("io error");
        assert_eq!(io_err.kind(), io::ErrorKind::NotFound);
        assert_eq!(module.vc_calls.get(), 0);
        // everything before the file step was printed
        assert!(String::from_utf8(out).unwrap().ends_with("kf.addpoint= 8\n"));
    }

    #[test]
    fn test_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "doc.json", "{\"type\": ");
        let module = StubModule::default();
        let mut out = Vec::new();
        let err = run(&module, &Config::with_input(path), &mut out).unwrap_err();

        assert!(err.downcast_ref::<serde_json::Error>().is_some());
        assert_eq!(module.vc_calls.get(), 0);
        assert!(!String::from_utf8(out).unwrap().contains("type(cityjson)"));
    }

    #[test]
    fn test_report_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "doc.json", "{}");
        let module = StubModule {
            valid: true,
            ..Default::default()
        };
        let mut cfg = Config::with_input(path);
        cfg.report = true;
        let mut out = Vec::new();
        run(&module, &cfg, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\"type\": \"validation_report\""));
    }

    #[test]
    fn test_config_defaults() {
        let cfg = Config::try_parse_from(["kf-demo", "--input", "x.json"]).unwrap();
        assert_eq!(cfg.input, PathBuf::from("x.json"));
        assert_eq!(cfg.options(), ValidationOptions::default());
        assert!(!cfg.report);

        let cfg = Config::try_parse_from(["kf-demo", "--input", "x.json", "--tol-snap", "-1"]).unwrap();
        assert_eq!(cfg.tol_snap, -1.0);
    }

    #[test]
    fn test_json_kind() {
        assert_eq!(json_kind(&serde_json::json!({})), "object");
        assert_eq!(json_kind(&serde_json::json!(null)), "null");
        assert_eq!(json_kind(&serde_json::json!(1.5)), "number");
    }
}
