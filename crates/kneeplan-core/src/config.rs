//! 规划参数

use crate::error::PlanError;
use serde::{Deserialize, Serialize};

/// 规划参数
///
/// 构建截骨规划时使用的可配置数值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    /// 截骨平面相对远端内侧平面沿深度轴的初始偏移
    pub resection_depth: f64,

    /// 构建后立即施加的内外翻角度（度）
    pub initial_varus_degrees: f64,

    /// 构建后立即施加的屈曲角度（度）
    pub initial_flexion_degrees: f64,

    /// 前向参考线长度
    pub anterior_line_length: f64,

    /// 外侧参考线长度
    pub lateral_line_length: f64,

    /// 垂直平面、内外翻平面的显示边长
    pub reference_plane_size: f64,

    /// 其余平面的显示边长
    pub construct_plane_size: f64,

    /// 旋转步进（度）
    pub angle_step_degrees: f64,

    /// 平移步进
    pub depth_step: f64,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            resection_depth: 10.0,
            initial_varus_degrees: 0.0,
            initial_flexion_degrees: 0.0,
            anterior_line_length: 10.0,
            lateral_line_length: 100.0,
            reference_plane_size: 100.0,
            construct_plane_size: 10.0,
            angle_step_degrees: 1.0,
            depth_step: 1.0,
        }
    }
}

impl PlanConfig {
    /// 检查参数是否有效
    pub fn validate(&self) -> Result<(), PlanError> {
        let finite = [
            ("resection_depth", self.resection_depth),
            ("initial_varus_degrees", self.initial_varus_degrees),
            ("initial_flexion_degrees", self.initial_flexion_degrees),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(PlanError::InvalidConfig(format!(
                    "{} must be finite, got {}",
                    name, value
                )));
            }
        }

        let positive = [
            ("anterior_line_length", self.anterior_line_length),
            ("lateral_line_length", self.lateral_line_length),
            ("reference_plane_size", self.reference_plane_size),
            ("construct_plane_size", self.construct_plane_size),
            ("angle_step_degrees", self.angle_step_degrees),
            ("depth_step", self.depth_step),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(PlanError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}
