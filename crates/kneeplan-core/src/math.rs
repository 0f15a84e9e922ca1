//! 数学基础类型
//!
//! 基于 nalgebra 的三维类型别名与公共常量。

use crate::error::PlanError;
use nalgebra as na;

/// 三维点
pub type Point3 = na::Point3<f64>;

/// 三维向量
pub type Vector3 = na::Vector3<f64>;

/// 单位向量（方向）
pub type UnitVector3 = na::Unit<Vector3>;

/// 单位四元数（姿态）
pub type UnitQuaternion = na::UnitQuaternion<f64>;

/// 几何容差
pub const EPSILON: f64 = 1e-10;

/// 全局深度轴（截骨平面平移方向）
pub fn depth_axis() -> UnitVector3 {
    Vector3::z_axis()
}

/// 归一化向量，零长度时报告退化
pub fn normalize(v: Vector3, what: &'static str) -> Result<UnitVector3, PlanError> {
    UnitVector3::try_new(v, EPSILON).ok_or(PlanError::DegenerateGeometry(what))
}

/// 绕轴旋转（角度制）
pub fn rotation_degrees(axis: &UnitVector3, degrees: f64) -> UnitQuaternion {
    UnitQuaternion::from_axis_angle(axis, degrees.to_radians())
}
