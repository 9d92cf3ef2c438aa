// crates/dm_io/src/checkpoint.rs

//! 检查点保存/恢复
//!
//! 保存完整的网格与全部场，恢复时按名称重建 [`FlowState`]。
//!
//! # 文件格式 (v1)
//!
//! ```text
//! [魔数: 4 bytes] "DMCK"
//! [版本: u32]
//! [时间: f64]
//! [步数: u64]
//! [创建时间: i64]   Unix 秒
//! [计算域: 3 * f64] origin.x, origin.y, size
//! [叶单元数: u64]
//! [叶单元: n * (u8 level, u32 i, u32 j)]
//! [场个数: u32]
//! [每个场: u16 名称长度, 名称 UTF-8, n * f64]
//! [CRC32: u32]
//! ```
//!
//! 所有数值均为小端序。

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use dm_mesh::{AdaptiveMesh, CellId, Domain, ScalarField};
use dm_physics::{FieldKind, FieldSet, FlowState};
use glam::DVec2;

// ============================================================
// 错误类型
// ============================================================

/// 检查点错误
#[derive(Debug)]
pub enum CheckpointError {
    /// IO 错误
    Io(std::io::Error),
    /// 格式错误
    Format(String),
    /// 版本不兼容
    Version {
        /// 文件版本
        file: u32,
        /// 当前版本
        current: u32,
    },
    /// 校验和错误
    Checksum {
        /// 文件中记录的值
        expected: u32,
        /// 重新计算的值
        found: u32,
    },
    /// 数据损坏
    Corrupted(String),
}

impl std::fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckpointError::Io(e) => write!(f, "IO 错误: {}", e),
            CheckpointError::Format(msg) => write!(f, "格式错误: {}", msg),
            CheckpointError::Version { file, current } => {
                write!(f, "版本不兼容: 文件版本 {}, 当前版本 {}", file, current)
            }
            CheckpointError::Checksum { expected, found } => {
                write!(f, "校验和错误: 期望 {:08x}, 实际 {:08x}", expected, found)
            }
            CheckpointError::Corrupted(msg) => write!(f, "数据损坏: {}", msg),
        }
    }
}

impl std::error::Error for CheckpointError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CheckpointError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CheckpointError {
    fn from(e: std::io::Error) -> Self {
        CheckpointError::Io(e)
    }
}

/// 检查点操作结果
pub type CheckpointResult<T> = Result<T, CheckpointError>;

// ============================================================
// 常量
// ============================================================

/// 检查点文件格式版本
pub const CHECKPOINT_VERSION: u32 = 1;

/// 检查点魔数
const CHECKPOINT_MAGIC: &[u8; 4] = b"DMCK";

/// 魔数 + 版本 + 时间 + 步数 + 创建时间 + 计算域 + 叶单元数
const HEADER_LEN: usize = 4 + 4 + 8 + 8 + 8 + 24 + 8;

// ============================================================
// 检查点数据
// ============================================================

/// 检查点头部信息
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointHeader {
    /// 版本号
    pub version: u32,
    /// 模拟时间
    pub time: f64,
    /// 时间步数
    pub step: u64,
    /// 创建时间戳（Unix 秒）
    pub created_at: i64,
    /// 计算域
    pub domain: Domain,
    /// 叶单元数
    pub n_cells: usize,
}

/// 检查点数据
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    /// 版本号
    pub version: u32,
    /// 模拟时间
    pub time: f64,
    /// 时间步数
    pub step: u64,
    /// 创建时间戳（Unix 秒）
    pub created_at: i64,
    /// 计算域
    pub domain: Domain,
    /// 叶单元（网格存储顺序）
    pub leaves: Vec<CellId>,
    /// 命名场（与叶单元一一对应）
    pub fields: Vec<(String, Vec<f64>)>,
}

impl Checkpoint {
    /// 由流动状态创建检查点
    pub fn from_state(state: &FlowState, time: f64, step: u64) -> Self {
        let fields = state
            .fields()
            .iter()
            .map(|(kind, field)| (kind.name().to_string(), field.as_slice().to_vec()))
            .collect();
        Self {
            version: CHECKPOINT_VERSION,
            time,
            step,
            created_at: chrono::Utc::now().timestamp(),
            domain: *state.mesh().domain(),
            leaves: state.mesh().leaves().to_vec(),
            fields,
        }
    }

    /// 叶单元数
    pub fn n_cells(&self) -> usize {
        self.leaves.len()
    }

    /// 按名称查找场
    pub fn field(&self, name: &str) -> Option<&[f64]> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// 重建网格与全部场
    ///
    /// 8 个场必须全部存在，未知名称的场被忽略。
    pub fn restore(&self) -> CheckpointResult<FlowState> {
        let mesh = AdaptiveMesh::from_leaves(self.domain, self.leaves.clone())
            .map_err(|e| CheckpointError::Corrupted(e.to_string()))?;

        // 网格内部顺序可能与文件顺序不同，按单元标识重排
        let order: Vec<usize> = self
            .leaves
            .iter()
            .map(|id| {
                mesh.index_of(id)
                    .ok_or_else(|| CheckpointError::Corrupted(format!("重复的叶单元 {id}")))
            })
            .collect::<CheckpointResult<_>>()?;
        if mesh.len() != self.leaves.len() {
            return Err(CheckpointError::Corrupted("叶单元列表含重复项".into()));
        }

        let mut fields = FieldSet::zeros(mesh.len());
        for kind in FieldKind::ALL {
            let values = self
                .field(kind.name())
                .ok_or_else(|| CheckpointError::Corrupted(format!("缺少场 {kind}")))?;
            if values.len() != self.leaves.len() {
                return Err(CheckpointError::Corrupted(format!(
                    "场 {kind} 长度 {} 与叶单元数 {} 不一致",
                    values.len(),
                    self.leaves.len()
                )));
            }
            let mut remapped = vec![0.0; mesh.len()];
            for (&dst, &v) in order.iter().zip(values) {
                remapped[dst] = v;
            }
            fields.replace(kind, ScalarField::from_vec(remapped));
        }

        FlowState::from_parts(mesh, fields).map_err(|e| CheckpointError::Corrupted(e.to_string()))
    }

    /// 保存到文件（二进制格式）
    pub fn save(&self, path: &Path) -> CheckpointResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let n = self.leaves.len();
        for (name, values) in &self.fields {
            if values.len() != n {
                return Err(CheckpointError::Format(format!(
                    "场 {name} 长度 {} 与叶单元数 {n} 不一致",
                    values.len()
                )));
            }
        }

        let mut data = Vec::with_capacity(HEADER_LEN + n * 9 + self.fields.len() * (n * 8 + 16));
        data.extend_from_slice(CHECKPOINT_MAGIC);
        data.extend_from_slice(&self.version.to_le_bytes());
        data.extend_from_slice(&self.time.to_le_bytes());
        data.extend_from_slice(&self.step.to_le_bytes());
        data.extend_from_slice(&self.created_at.to_le_bytes());
        data.extend_from_slice(&self.domain.origin.x.to_le_bytes());
        data.extend_from_slice(&self.domain.origin.y.to_le_bytes());
        data.extend_from_slice(&self.domain.size.to_le_bytes());
        data.extend_from_slice(&(n as u64).to_le_bytes());

        for id in &self.leaves {
            data.push(id.level);
            data.extend_from_slice(&id.i.to_le_bytes());
            data.extend_from_slice(&id.j.to_le_bytes());
        }

        data.extend_from_slice(&(self.fields.len() as u32).to_le_bytes());
        for (name, values) in &self.fields {
            let bytes = name.as_bytes();
            let len = u16::try_from(bytes.len())
                .map_err(|_| CheckpointError::Format(format!("场名称过长: {name}")))?;
            data.extend_from_slice(&len.to_le_bytes());
            data.extend_from_slice(bytes);
            for v in values {
                data.extend_from_slice(&v.to_le_bytes());
            }
        }

        // 临时文件写入，成功后重命名
        let mut temp_name = path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = std::path::PathBuf::from(temp_name);
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            writer.write_all(&data)?;
            writer.write_all(&compute_crc32(&data).to_le_bytes())?;
            writer.flush()?;
        }
        std::fs::rename(&temp_path, path)?;

        log::debug!("检查点已保存: {} (t = {}, 单元 {})", path.display(), self.time, n);
        Ok(())
    }

    /// 从文件加载
    pub fn load(path: &Path) -> CheckpointResult<Self> {
        let mut all_data = Vec::new();
        BufReader::new(File::open(path)?).read_to_end(&mut all_data)?;

        if all_data.len() < HEADER_LEN + 4 {
            return Err(CheckpointError::Format("文件太小".into()));
        }

        let crc_offset = all_data.len() - 4;
        let data = &all_data[..crc_offset];
        let mut crc_bytes = [0u8; 4];
        crc_bytes.copy_from_slice(&all_data[crc_offset..]);
        let stored_crc = u32::from_le_bytes(crc_bytes);
        let computed_crc = compute_crc32(data);
        if stored_crc != computed_crc {
            return Err(CheckpointError::Checksum {
                expected: stored_crc,
                found: computed_crc,
            });
        }

        let mut reader = ByteReader::new(data);
        let header = parse_header(&mut reader)?;

        let mut leaves = Vec::with_capacity(reader.fits(header.n_cells, 9, "叶单元")?);
        for _ in 0..header.n_cells {
            let level = reader.u8()?;
            let i = reader.u32()?;
            let j = reader.u32()?;
            leaves.push(CellId::new(level, i, j));
        }

        let n_fields = reader.u32()? as usize;
        let mut fields = Vec::with_capacity(reader.fits(n_fields, 2, "场")?);
        for _ in 0..n_fields {
            let len = reader.u16()? as usize;
            let name = std::str::from_utf8(reader.bytes(len)?)
                .map_err(|_| CheckpointError::Corrupted("场名称不是合法 UTF-8".into()))?
                .to_string();
            let mut values = Vec::with_capacity(reader.fits(header.n_cells, 8, "场值")?);
            for _ in 0..header.n_cells {
                values.push(reader.f64()?);
            }
            fields.push((name, values));
        }

        if !reader.is_empty() {
            return Err(CheckpointError::Corrupted("文件末尾有多余数据".into()));
        }

        Ok(Self {
            version: header.version,
            time: header.time,
            step: header.step,
            created_at: header.created_at,
            domain: header.domain,
            leaves,
            fields,
        })
    }

    /// 仅读取头部信息（不加载网格与场）
    pub fn read_header(path: &Path) -> CheckpointResult<CheckpointHeader> {
        let mut buf = [0u8; HEADER_LEN];
        BufReader::new(File::open(path)?).read_exact(&mut buf)?;
        parse_header(&mut ByteReader::new(&buf))
    }
}

fn parse_header(reader: &mut ByteReader<'_>) -> CheckpointResult<CheckpointHeader> {
    if reader.bytes(4)? != CHECKPOINT_MAGIC {
        return Err(CheckpointError::Format("无效的检查点文件格式".into()));
    }
    let version = reader.u32()?;
    if version != CHECKPOINT_VERSION {
        return Err(CheckpointError::Version {
            file: version,
            current: CHECKPOINT_VERSION,
        });
    }
    let time = reader.f64()?;
    let step = reader.u64()?;
    let created_at = reader.i64()?;
    let origin = DVec2::new(reader.f64()?, reader.f64()?);
    let size = reader.f64()?;
    let n_cells = usize::try_from(reader.u64()?)
        .map_err(|_| CheckpointError::Corrupted("叶单元数溢出".into()))?;

    Ok(CheckpointHeader {
        version,
        time,
        step,
        created_at,
        domain: Domain { origin, size },
        n_cells,
    })
}

// ============================================================
// 字节读取
// ============================================================

struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn is_empty(&self) -> bool {
        self.offset >= self.data.len()
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    /// 确认剩余字节容得下 `count` 个至少 `item_len` 字节的条目
    fn fits(&self, count: usize, item_len: usize, what: &str) -> CheckpointResult<usize> {
        match count.checked_mul(item_len) {
            Some(total) if total <= self.remaining() => Ok(count),
            _ => Err(CheckpointError::Corrupted(format!(
                "{what}数 {count} 超出剩余数据 {} 字节",
                self.remaining()
            ))),
        }
    }

    fn bytes(&mut self, len: usize) -> CheckpointResult<&'a [u8]> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| CheckpointError::Corrupted(format!("在偏移 {} 处数据截断", self.offset)))?;
        let slice = &self.data[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> CheckpointResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> CheckpointResult<u8> {
        Ok(self.array::<1>()?[0])
    }

    fn u16(&mut self) -> CheckpointResult<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    fn u32(&mut self) -> CheckpointResult<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn u64(&mut self) -> CheckpointResult<u64> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    fn i64(&mut self) -> CheckpointResult<i64> {
        Ok(i64::from_le_bytes(self.array()?))
    }

    fn f64(&mut self) -> CheckpointResult<f64> {
        Ok(f64::from_le_bytes(self.array()?))
    }
}

// ============================================================
// CRC32
// ============================================================

/// 计算 CRC32 校验和（IEEE 多项式）
fn compute_crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in data {
        let index = ((crc ^ byte as u32) & 0xFF) as usize;
        crc = CRC32_TABLE[index] ^ (crc >> 8);
    }
    !crc
}

/// 生成 CRC32 查找表（编译期计算）
const fn generate_crc32_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = 0xEDB8_8320 ^ (crc >> 1);
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// CRC32 查找表
const CRC32_TABLE: [u32; 256] = generate_crc32_table();

// ============================================================
// 测试
// ============================================================
