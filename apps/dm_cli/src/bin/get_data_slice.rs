// apps/dm_cli/src/bin/get_data_slice.rs

use std::process::ExitCode;

use clap::Parser;
use dm_cli::commands::get_data_slice::{execute, SliceArgs};

fn main() -> ExitCode {
    let args = SliceArgs::parse();
    dm_cli::finish(args.common.init().and_then(|()| execute(args)))
}
