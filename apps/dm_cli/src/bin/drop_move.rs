// apps/dm_cli/src/bin/drop_move.rs

use std::process::ExitCode;

use clap::Parser;
use dm_cli::commands::drop_move::{execute, DropMoveArgs};

fn main() -> ExitCode {
    let args = DropMoveArgs::parse();
    dm_cli::finish(args.common.init().and_then(|()| execute(args)))
}
