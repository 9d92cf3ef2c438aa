// crates/dm_mesh/src/field.rs

//! 叶单元标量场与边界条件

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// 按叶单元索引的标量场
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalarField {
    values: Vec<f64>,
}

impl ScalarField {
    /// 全零场
    pub fn zeros(len: usize) -> Self {
        Self::filled(len, 0.0)
    }

    /// 常数场
    pub fn filled(len: usize, value: f64) -> Self {
        Self {
            values: vec![value; len],
        }
    }

    /// 由数值向量构造
    pub fn from_vec(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// 长度
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 只读切片
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// 可变切片
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// 取出底层向量
    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }

    /// 全部置为同一值
    pub fn fill(&mut self, value: f64) {
        self.values.fill(value);
    }

    /// 最大绝对值（空场为 0）
    pub fn max_abs(&self) -> f64 {
        self.values.iter().fold(0.0_f64, |m, v| m.max(v.abs()))
    }

    /// 是否所有值都有限
    pub fn all_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }
}

impl Index<usize> for ScalarField {
    type Output = f64;

    #[inline]
    fn index(&self, idx: usize) -> &f64 {
        &self.values[idx]
    }
}

impl IndexMut<usize> for ScalarField {
    #[inline]
    fn index_mut(&mut self, idx: usize) -> &mut f64 {
        &mut self.values[idx]
    }
}

/// 计算域边界条件
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Boundary {
    /// 给定边界值（虚单元取 `2v - 内部值`）
    Dirichlet(f64),
    /// 零法向梯度（虚单元取内部值）
    Neumann,
}

impl Boundary {
    /// 由相邻内部单元值构造虚单元值
    #[inline]
    pub fn ghost(self, interior: f64) -> f64 {
        match self {
            Boundary::Dirichlet(v) => 2.0 * v - interior,
            Boundary::Neumann => interior,
        }
    }
}

/// 加密时新单元取值的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Prolongation {
    /// 直接继承父单元值（守恒）
    Injection,
    /// 由父级双线性插值
    Bilinear,
}
