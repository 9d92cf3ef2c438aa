// apps/dm_cli/src/bin/pe_scan.rs

use std::process::ExitCode;

use clap::Parser;
use dm_cli::commands::pe_scan::{execute, ScanArgs};

fn main() -> ExitCode {
    let args = ScanArgs::parse();
    dm_cli::finish(args.common.init().and_then(|()| execute(args)))
}
