// apps/dm_cli/src/bin/get_velocity.rs

use std::process::ExitCode;

use clap::Parser;
use dm_cli::commands::get_velocity::{execute, VelocityArgs};

fn main() -> ExitCode {
    let args = VelocityArgs::parse();
    dm_cli::finish(args.common.init().and_then(|()| execute(args)))
}
