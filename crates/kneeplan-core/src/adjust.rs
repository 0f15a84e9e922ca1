//! 调整引擎
//!
//! 对规划图中特定节点施加旋转/平移，并按固定顺序传播到依赖节点：
//! - 内外翻：内外翻平面、屈曲平面、远端内侧平面、远端截骨平面
//!   绕前向参考线方向（世界轴）旋转
//! - 屈曲：屈曲平面、远端内侧平面、远端截骨平面绕外侧参考线方向（世界轴）旋转
//! - 截骨深度：远端截骨平面沿全局深度轴平移
//!
//! 截骨平面方程总是由定位平面重新推导，每次变换后刷新两个测量值。

use crate::config::PlanConfig;
use crate::error::PlanError;
use crate::geometry::PlaneEquation;
use crate::graph::{NodeId, PlanGraph};
use crate::landmark::{Landmark, LandmarkSet};
use crate::math::depth_axis;
use crate::measure::Measurement;
use serde::Serialize;

/// 累积调整量
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Adjustments {
    /// 累积内外翻角度（度）
    pub varus_degrees: f64,
    /// 累积屈曲角度（度）
    pub flexion_degrees: f64,
    /// 截骨平面相对构建位置的累积偏移
    pub resection_offset: f64,
}

/// 已构建的规划：规划图 + 测量 + 累积调整量
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    graph: PlanGraph,
    measurements: [Measurement; 2],
    adjustments: Adjustments,
}

impl Plan {
    /// 构建规划图与两个测量
    pub fn build(landmarks: &LandmarkSet, config: &PlanConfig) -> Result<Self, PlanError> {
        let graph = PlanGraph::build(landmarks, config)?;
        let resection = graph.resection_equation();
        let measurements = [
            Measurement::new(
                Landmark::DistalMedialPt,
                landmarks.require(Landmark::DistalMedialPt)?,
                &resection,
            ),
            Measurement::new(
                Landmark::DistalLateralPt,
                landmarks.require(Landmark::DistalLateralPt)?,
                &resection,
            ),
        ];
        Ok(Self {
            graph,
            measurements,
            adjustments: Adjustments::default(),
        })
    }

    pub fn graph(&self) -> &PlanGraph {
        &self.graph
    }

    pub fn measurements(&self) -> &[Measurement; 2] {
        &self.measurements
    }

    pub fn adjustments(&self) -> &Adjustments {
        &self.adjustments
    }

    /// 当前截骨平面方程
    pub fn resection_equation(&self) -> PlaneEquation {
        self.graph.resection_equation()
    }

    /// 内外翻旋转，返回被移动的节点
    pub fn rotate_varus(&mut self, degrees: f64) -> Vec<NodeId> {
        let axis = self.graph.anterior_line.direction();
        let graph = &mut self.graph;

        graph.varus_plane.rotate_on_world_axis(&axis, degrees);
        graph.flexion_plane.rotate_on_world_axis(&axis, degrees);
        graph.distal_medial_plane.rotate_on_world_axis(&axis, degrees);
        graph.distal_resection_plane.rotate_on_world_axis(&axis, degrees);

        self.adjustments.varus_degrees += degrees;
        self.refresh_measurements();
        tracing::debug!(
            "Varus rotated by {} deg (total {} deg)",
            degrees,
            self.adjustments.varus_degrees
        );

        vec![
            NodeId::VarusPlane,
            NodeId::FlexionPlane,
            NodeId::DistalMedialPlane,
            NodeId::DistalResectionPlane,
        ]
    }

    /// 屈曲旋转，返回被移动的节点
    pub fn rotate_flexion(&mut self, degrees: f64) -> Vec<NodeId> {
        let axis = self.graph.lateral_line.direction();
        let graph = &mut self.graph;

        graph.flexion_plane.rotate_on_world_axis(&axis, degrees);
        graph.distal_medial_plane.rotate_on_world_axis(&axis, degrees);
        graph.distal_resection_plane.rotate_on_world_axis(&axis, degrees);

        self.adjustments.flexion_degrees += degrees;
        self.refresh_measurements();
        tracing::debug!(
            "Flexion rotated by {} deg (total {} deg)",
            degrees,
            self.adjustments.flexion_degrees
        );

        vec![
            NodeId::FlexionPlane,
            NodeId::DistalMedialPlane,
            NodeId::DistalResectionPlane,
        ]
    }

    /// 截骨平面沿深度轴平移，返回被移动的节点
    pub fn translate_resection(&mut self, delta: f64) -> Vec<NodeId> {
        let offset = depth_axis().into_inner() * delta;
        self.graph.distal_resection_plane.translate(&offset);

        self.adjustments.resection_offset += delta;
        self.refresh_measurements();
        tracing::debug!(
            "Resection translated by {} (total offset {})",
            delta,
            self.adjustments.resection_offset
        );

        vec![NodeId::DistalResectionPlane]
    }

    /// 针对当前截骨平面重新计算两个测量值
    fn refresh_measurements(&mut self) {
        let resection = self.graph.resection_equation();
        for measurement in &mut self.measurements {
            measurement.recompute(&resection);
        }
        tracing::debug!(
            "Measurements: medial {:.3}, lateral {:.3}",
            self.measurements[0].distance,
            self.measurements[1].distance
        );
    }
}
