// apps/dm_cli/src/commands/mod.rs

//! 命令实现

pub mod drop_move;
pub mod get_data_slice;
pub mod get_velocity;
pub mod pe_scan;
