// crates/dm_physics/src/adaptation.rs

//! 每步网格自适应策略
//!
//! 先由距离场计算曲率，再对体积分数、两个速度分量、浓度和曲率
//! 五个场分别按各自的绝对容差发出加密/粗化请求。

use dm_config::AdaptConfig;
use dm_mesh::{AdaptLimits, AdaptStats};

use crate::engine::Engine;
use crate::error::PhysicsResult;
use crate::fields::{AdaptRequest, FieldKind};

/// 自适应控制器
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptationController {
    request: AdaptRequest,
}

impl AdaptationController {
    /// 由配置创建
    pub fn new(config: &AdaptConfig) -> Self {
        Self {
            request: AdaptRequest {
                criteria: vec![
                    (FieldKind::Fraction, config.fraction_tolerance),
                    (FieldKind::VelocityX, config.velocity_tolerance),
                    (FieldKind::VelocityY, config.velocity_tolerance),
                    (FieldKind::Concentration, config.concentration_tolerance),
                    (FieldKind::Curvature, config.curvature_tolerance),
                ],
                limits: AdaptLimits::new(config.min_level, config.max_level),
            },
        }
    }

    /// 自适应请求
    pub fn request(&self) -> &AdaptRequest {
        &self.request
    }

    /// 计算曲率并执行一次自适应
    pub fn step(&self, engine: &mut dyn Engine) -> PhysicsResult<AdaptStats> {
        engine.curvature_from_distance()?;
        let stats = engine.adapt(&self.request)?;
        log::trace!(
            "自适应: 加密 {}, 粗化 {}, 单元数 {}",
            stats.refined,
            stats.coarsened,
            stats.n_cells
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_covers_five_fields() {
        let controller = AdaptationController::new(&AdaptConfig::default());
        let kinds: Vec<FieldKind> = controller.request().criteria.iter().map(|c| c.0).collect();
        assert_eq!(
            kinds,
            vec![
                FieldKind::Fraction,
                FieldKind::VelocityX,
                FieldKind::VelocityY,
                FieldKind::Concentration,
                FieldKind::Curvature,
            ]
        );
        assert_eq!(controller.request().limits, AdaptLimits::new(0, 9));
    }

    #[test]
    fn test_per_field_tolerances() {
        let config = AdaptConfig {
            velocity_tolerance: 5e-3,
            curvature_tolerance: 0.1,
            ..AdaptConfig::default()
        };
        let controller = AdaptationController::new(&config);
        let tol = |kind| {
            controller
                .request()
                .criteria
                .iter()
                .find(|c| c.0 == kind)
                .map(|c| c.1)
        };
        assert_eq!(tol(FieldKind::VelocityY), Some(5e-3));
        assert_eq!(tol(FieldKind::Curvature), Some(0.1));
        assert_eq!(tol(FieldKind::Fraction), Some(1e-3));
    }
}
