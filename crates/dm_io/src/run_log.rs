// crates/dm_io/src/run_log.rs

//! 运行日志 (`log.dat`)
//!
//! 首行表头 `i t ke dist`，之后每步一行。文件每次写入时打开、追加并关闭。
//!
//! 行格式与 C 的 `"%d %g %5.5e %5.5e"` 一致：
//!
//! ```text
//! 12 0.3 1.50000e-03 0.00000e+00
//! ```

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{IoError, IoResult};

/// 日志表头
pub const LOG_HEADER: &str = "i t ke dist";

/// 单步日志行
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogRow {
    /// 步号
    pub step: u64,
    /// 模拟时间
    pub time: f64,
    /// 动能
    pub kinetic_energy: f64,
    /// 质心位移
    pub displacement: f64,
}

impl std::fmt::Display for LogRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.step,
            general(self.time),
            scientific(self.kinetic_energy),
            scientific(self.displacement)
        )
    }
}

// ============================================================
// C printf 风格数值格式
// ============================================================

fn non_finite(v: f64) -> Option<String> {
    if v.is_nan() {
        Some("nan".into())
    } else if v.is_infinite() {
        Some(if v > 0.0 { "inf" } else { "-inf" }.into())
    } else {
        None
    }
}

/// 把 Rust 的 `{:e}` 结果拆成尾数与十进制指数
fn split_exp(formatted: &str) -> (&str, i32) {
    match formatted.split_once('e') {
        Some((mantissa, exp)) => (mantissa, exp.parse().unwrap_or(0)),
        None => (formatted, 0),
    }
}

fn with_c_exponent(mantissa: &str, exp: i32) -> String {
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exp.abs())
}

/// `%.5e`
fn scientific(v: f64) -> String {
    if let Some(s) = non_finite(v) {
        return s;
    }
    let formatted = format!("{v:.5e}");
    let (mantissa, exp) = split_exp(&formatted);
    with_c_exponent(mantissa, exp)
}

/// `%g`（6 位有效数字，去掉尾随零）
fn general(v: f64) -> String {
    if let Some(s) = non_finite(v) {
        return s;
    }
    if v == 0.0 {
        return "0".into();
    }
    let rounded = format!("{v:.5e}");
    let (mantissa, exp) = split_exp(&rounded);
    if !(-4..6).contains(&exp) {
        return with_c_exponent(trim_zeros(mantissa), exp);
    }
    let decimals = usize::try_from(5 - exp).unwrap_or(0);
    trim_zeros(&format!("{v:.decimals$}")).to_string()
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// 运行日志文件
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    /// 创建日志句柄（不触碰文件）
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 日志路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 截断文件并写入表头
    pub fn write_header(&self) -> IoResult<()> {
        std::fs::write(&self.path, format!("{LOG_HEADER}\n"))
            .map_err(|e| IoError::file(&self.path, e))
    }

    /// 追加一行
    pub fn append(&self, row: &LogRow) -> IoResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| IoError::file(&self.path, e))?;
        writeln!(file, "{row}").map_err(|e| IoError::file(&self.path, e))
    }
}
