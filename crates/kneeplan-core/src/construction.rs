//! 构造库
//!
//! 由已有图元推导新图元的无状态函数：
//! - 两点确定的垂直平面
//! - 线段在平面上的投影
//! - 由两方向叉积得到的共点垂线
//! - 由定位平面推导平面方程

use crate::error::PlanError;
use crate::geometry::{Line3, PlaneEquation, PlaneFrame};
use crate::math::{normalize, Point3, UnitVector3};

/// 位于 `p1`、法向指向 `p2` 的平面
///
/// 在股骨中心处构造与机械轴垂直的参考平面（法向朝向髋关节中心）。
pub fn perpendicular_plane(p1: Point3, p2: Point3, size: f64) -> Result<PlaneFrame, PlanError> {
    PlaneFrame::looking_at(p1, p2, size)
}

/// 将线段两端点投影到平面上，得到新线段
///
/// 线段与平面法向平行时投影退化为一点，报告退化。
pub fn project_line_onto_plane(line: &Line3, plane: &PlaneEquation) -> Result<Line3, PlanError> {
    let start = plane.project_point(&line.start());
    let end = plane.project_point(&line.end());
    Line3::through(start, end)
        .map_err(|_| PlanError::DegenerateGeometry("line is parallel to the plane normal"))
}

/// 过 `origin`、方向为 normalize(d1 × d2) 的共点垂线，长度 `length`
///
/// 输入方向的顺序决定结果的朝向，调用方必须保持固定顺序。
pub fn cocurrent_perpendicular_line(
    d1: &UnitVector3,
    d2: &UnitVector3,
    origin: Point3,
    length: f64,
) -> Result<Line3, PlanError> {
    let direction = normalize(d1.cross(&d2.into_inner()), "directions are parallel")?;
    Line3::through(origin, origin + direction.into_inner() * length)
}

/// 由定位平面的当前姿态和位置推导平面方程
///
/// 定位平面旋转或平移后，刷新平面方程的唯一途径。
pub fn plane_from_positioned(frame: &PlaneFrame) -> PlaneEquation {
    frame.equation()
}
