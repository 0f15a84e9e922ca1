//! 几何图元定义
//!
//! 支持的基本图元：
//! - 线段 (Line3)：原点 + 局部坐标系下的有限线段
//! - 平面方程 (PlaneEquation)：单位法向 + 面上一点
//! - 定位平面 (PlaneFrame)：位置 + 姿态，平面方程由它按需推导

use crate::error::PlanError;
use crate::math::{
    normalize, rotation_degrees, Point3, UnitQuaternion, UnitVector3, Vector3, EPSILON,
};
use serde::{Deserialize, Serialize};

/// 线段
///
/// 线段存储在以起点为原点的局部坐标系中，方向总是从线段端点重新推导。
/// 构造时拒绝零长度线段，因此方向总是有定义的。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line3 {
    /// 局部坐标系原点（世界坐标下的起点）
    origin: Point3,
    /// 局部坐标系下的终点
    end_local: Vector3,
}

impl Line3 {
    /// 从两点创建线段，两点重合时报告退化
    pub fn through(p1: Point3, p2: Point3) -> Result<Self, PlanError> {
        let end_local = p2 - p1;
        if end_local.norm() < EPSILON {
            return Err(PlanError::DegenerateGeometry("line endpoints coincide"));
        }
        Ok(Self {
            origin: p1,
            end_local,
        })
    }

    /// 起点（世界坐标）
    pub fn start(&self) -> Point3 {
        self.origin
    }

    /// 终点（世界坐标）
    pub fn end(&self) -> Point3 {
        self.origin + self.end_local
    }

    /// 单位方向向量
    pub fn direction(&self) -> UnitVector3 {
        UnitVector3::new_normalize(self.end_local)
    }

    /// 局部坐标系下的终点
    pub fn end_local(&self) -> Vector3 {
        self.end_local
    }

    /// 线段长度
    pub fn length(&self) -> f64 {
        self.end_local.norm()
    }
}

/// 平面方程
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneEquation {
    /// 单位法向量
    pub normal: UnitVector3,
    /// 面上参考点
    pub point: Point3,
}

impl PlaneEquation {
    pub fn from_normal_and_point(normal: UnitVector3, point: Point3) -> Self {
        Self { normal, point }
    }

    /// 平面常数 d（n·x + d = 0）
    pub fn constant(&self) -> f64 {
        -self.normal.dot(&self.point.coords)
    }

    /// 有符号距离（法向一侧为正）
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        self.normal.dot(&(point - self.point))
    }

    /// 点到平面的距离
    pub fn distance_to_point(&self, point: &Point3) -> f64 {
        self.signed_distance(point).abs()
    }

    /// 点在平面上的垂足
    pub fn project_point(&self, point: &Point3) -> Point3 {
        *point - self.normal.into_inner() * self.signed_distance(point)
    }
}

/// 定位平面
///
/// 平面的唯一权威表示：位置与姿态。局部 +Z 为平面法向。
/// 平面方程只能经由 [`PlaneFrame::equation`] 推导，不单独推进。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaneFrame {
    /// 平面中心
    pub position: Point3,
    /// 姿态
    pub orientation: UnitQuaternion,
    /// 显示边长（不参与计算）
    pub size: f64,
}

impl PlaneFrame {
    /// 在原点创建未旋转的平面
    pub fn new(size: f64) -> Self {
        Self {
            position: Point3::origin(),
            orientation: UnitQuaternion::identity(),
            size,
        }
    }

    /// 在 `position` 处创建平面，并使其法向指向 `target`
    pub fn looking_at(position: Point3, target: Point3, size: f64) -> Result<Self, PlanError> {
        let facing = normalize(target - position, "plane target coincides with position")?;
        let orientation = UnitQuaternion::rotation_between_axis(&Vector3::z_axis(), &facing)
            .unwrap_or_else(|| {
                // 反向共线：绕任意垂直轴翻转
                UnitQuaternion::from_axis_angle(&Vector3::x_axis(), std::f64::consts::PI)
            });
        Ok(Self {
            position,
            orientation,
            size,
        })
    }

    /// 复制形状与姿态，放置到新位置
    pub fn copy_to(&self, position: Point3, size: f64) -> Self {
        Self {
            position,
            orientation: self.orientation,
            size,
        }
    }

    /// 单位法向（姿态作用于局部 +Z）
    pub fn normal(&self) -> UnitVector3 {
        self.orientation * Vector3::z_axis()
    }

    /// 由当前姿态和位置推导平面方程
    pub fn equation(&self) -> PlaneEquation {
        PlaneEquation::from_normal_and_point(self.normal(), self.position)
    }

    /// 绕世界坐标系中的轴旋转（位置不变）
    pub fn rotate_on_world_axis(&mut self, axis: &UnitVector3, degrees: f64) {
        self.orientation = rotation_degrees(axis, degrees) * self.orientation;
    }

    /// 平移
    pub fn translate(&mut self, offset: &Vector3) {
        self.position += *offset;
    }
}
