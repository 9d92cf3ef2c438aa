// crates/dm_workflow/src/clock.rs

//! 模拟时钟
//!
//! 步号每步加一；时间按引擎实际步长前进，落在计划时刻容差内时对齐到该时刻。

use dm_io::TIME_EPS;

/// 模拟时钟
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SimulationClock {
    /// 当前步号，步 0 观察初始状态
    pub step: u64,
    /// 当前模拟时间
    pub time: f64,
}

impl SimulationClock {
    /// 从 `t = 0`、步 0 开始
    pub fn new() -> Self {
        Self::default()
    }

    /// 按步长 `dt` 推进时间，若接近 `target` 则对齐
    pub fn advance(&mut self, dt: f64, target: f64) {
        self.time += dt;
        if (self.time - target).abs() <= TIME_EPS {
            self.time = target;
        }
    }

    /// 进入下一步
    pub fn next_step(&mut self) {
        self.step += 1;
    }

    /// 是否已到达终止时间
    pub fn reached(&self, tmax: f64) -> bool {
        self.time >= tmax - TIME_EPS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_snaps_to_target() {
        let mut clock = SimulationClock::new();
        clock.advance(0.1 - 1e-12, 0.1);
        assert_eq!(clock.time, 0.1);
        clock.advance(0.05, 0.2);
        assert!((clock.time - 0.15).abs() < 1e-15);
    }

    #[test]
    fn test_reached() {
        let clock = SimulationClock { step: 3, time: 1.0 - 1e-12 };
        assert!(clock.reached(1.0));
        assert!(!clock.reached(1.1));
    }
}
