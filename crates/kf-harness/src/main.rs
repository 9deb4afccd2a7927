// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use clap::Parser;
use kf_ffi::NativeModule;
use kf_harness::{run, Config};
use std::io::Write;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cfg = Config::parse();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let result = run(&NativeModule, &cfg, &mut out).and_then(|()| Ok(out.flush()?));
    if let Err(e) = result {
        let _ = out.flush();
        eprintln!("fatal: {e:#}");
        std::process::exit(1);
    }
}
