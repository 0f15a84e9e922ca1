//! 距离测量
//!
//! 固定解剖点到截骨平面的垂直距离。平面每次移动后都重新计算，不做缓存。

use crate::geometry::PlaneEquation;
use crate::landmark::Landmark;
use crate::math::Point3;
use serde::{Deserialize, Serialize};

/// 点到平面的测量结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// 被测标志点
    pub landmark: Landmark,
    /// 标志点坐标
    pub point: Point3,
    /// 垂足
    pub foot: Point3,
    /// 垂直距离
    pub distance: f64,
    /// 有符号距离（平面法向一侧为正）
    pub signed_distance: f64,
}

impl Measurement {
    /// 创建并立即计算
    pub fn new(landmark: Landmark, point: Point3, plane: &PlaneEquation) -> Self {
        let mut measurement = Self {
            landmark,
            point,
            foot: point,
            distance: 0.0,
            signed_distance: 0.0,
        };
        measurement.recompute(plane);
        measurement
    }

    /// 针对平面的当前位置重新计算
    pub fn recompute(&mut self, plane: &PlaneEquation) {
        self.foot = plane.project_point(&self.point);
        self.distance = (self.point - self.foot).norm();
        self.signed_distance = plane.signed_distance(&self.point);
    }
}
