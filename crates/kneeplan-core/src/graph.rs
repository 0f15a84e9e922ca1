//! 规划图
//!
//! 由十个标志点一次性构建的派生构造集合（轴线、参考平面、截骨平面）。
//! 节点之间构成有向无环图，构建顺序固定，每一步只使用之前的输出。
//!
//! 构建顺序：
//! 1. 机械轴 = 股骨中心 → 髋关节中心
//! 2. 解剖轴 = 股骨近端髓腔 → 股骨远端髓腔（仅显示）
//! 3. 通髁轴 = 内上髁 → 外上髁
//! 4. 后髁轴 = 后内侧点 → 后外侧点（仅显示）
//! 5. 垂直平面：位于股骨中心、法向指向髋关节中心
//! 6. 投影通髁轴 = 通髁轴在垂直平面上的投影
//! 7. 前向参考线 = 机械轴 × 投影通髁轴
//! 8. 内外翻平面：与垂直平面同规则构造的独立实例
//! 9. 外侧参考线 = 机械轴 × 前向参考线
//! 10. 屈曲平面 = 内外翻平面的副本
//! 11. 远端内侧平面 = 屈曲平面的副本，移至远端内侧点
//! 12. 远端截骨平面 = 远端内侧平面的副本，沿深度轴偏移

use crate::config::PlanConfig;
use crate::construction::{
    cocurrent_perpendicular_line, perpendicular_plane, plane_from_positioned,
    project_line_onto_plane,
};
use crate::error::PlanError;
use crate::geometry::{Line3, PlaneEquation, PlaneFrame};
use crate::landmark::{Landmark, LandmarkSet};
use crate::math::depth_axis;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 规划图节点标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeId {
    MechanicalAxis,
    AnatomicalAxis,
    TeaAxis,
    PcaAxis,
    PerpendicularPlane,
    ProjectedTea,
    AnteriorLine,
    VarusPlane,
    LateralLine,
    FlexionPlane,
    DistalMedialPlane,
    DistalResectionPlane,
}

/// 节点依赖
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency {
    Landmark(Landmark),
    Node(NodeId),
}

impl NodeId {
    /// 构建顺序
    pub const BUILD_ORDER: [NodeId; 12] = [
        NodeId::MechanicalAxis,
        NodeId::AnatomicalAxis,
        NodeId::TeaAxis,
        NodeId::PcaAxis,
        NodeId::PerpendicularPlane,
        NodeId::ProjectedTea,
        NodeId::AnteriorLine,
        NodeId::VarusPlane,
        NodeId::LateralLine,
        NodeId::FlexionPlane,
        NodeId::DistalMedialPlane,
        NodeId::DistalResectionPlane,
    ];

    /// 直接依赖
    pub fn dependencies(&self) -> &'static [Dependency] {
        use Dependency::{Landmark as L, Node as N};
        match self {
            NodeId::MechanicalAxis => &[L(Landmark::FemurCenter), L(Landmark::HipCenter)],
            NodeId::AnatomicalAxis => {
                &[L(Landmark::FemurProximalCanal), L(Landmark::FemurDistalCanal)]
            }
            NodeId::TeaAxis => &[L(Landmark::MedialEpicondyle), L(Landmark::LateralEpicondyle)],
            NodeId::PcaAxis => &[L(Landmark::PosteriorMedialPt), L(Landmark::PosteriorLateralPt)],
            NodeId::PerpendicularPlane => &[L(Landmark::FemurCenter), L(Landmark::HipCenter)],
            NodeId::ProjectedTea => &[N(NodeId::TeaAxis), N(NodeId::PerpendicularPlane)],
            NodeId::AnteriorLine => &[
                N(NodeId::MechanicalAxis),
                N(NodeId::ProjectedTea),
                L(Landmark::FemurCenter),
            ],
            NodeId::VarusPlane => &[L(Landmark::FemurCenter), L(Landmark::HipCenter)],
            NodeId::LateralLine => &[
                N(NodeId::MechanicalAxis),
                N(NodeId::AnteriorLine),
                L(Landmark::FemurCenter),
            ],
            NodeId::FlexionPlane => &[N(NodeId::VarusPlane)],
            NodeId::DistalMedialPlane => &[N(NodeId::FlexionPlane), L(Landmark::DistalMedialPt)],
            NodeId::DistalResectionPlane => &[N(NodeId::DistalMedialPlane)],
        }
    }

    /// 是否直接或间接依赖 `dependency`
    pub fn depends_on(&self, dependency: Dependency) -> bool {
        self.dependencies().iter().any(|d| {
            *d == dependency
                || match d {
                    Dependency::Node(node) => node.depends_on(dependency),
                    Dependency::Landmark(_) => false,
                }
        })
    }

    /// 是否为平面节点
    pub fn is_plane(&self) -> bool {
        matches!(
            self,
            NodeId::PerpendicularPlane
                | NodeId::VarusPlane
                | NodeId::FlexionPlane
                | NodeId::DistalMedialPlane
                | NodeId::DistalResectionPlane
        )
    }
}

/// 受某标志点影响的全部节点（按构建顺序）
pub fn affected_nodes(landmark: Landmark) -> Vec<NodeId> {
    NodeId::BUILD_ORDER
        .into_iter()
        .filter(|n| n.depends_on(Dependency::Landmark(landmark)))
        .collect()
}

/// 节点几何
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Node {
    Line(Line3),
    Plane(PlaneFrame),
}

/// 节点的只读视图
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Line(&'a Line3),
    Plane(&'a PlaneFrame),
}

/// 规划图
///
/// 独占所有派生节点；各平面是互相独立的值，不存在别名。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanGraph {
    pub mechanical_axis: Line3,
    pub anatomical_axis: Line3,
    pub tea_axis: Line3,
    pub pca_axis: Line3,
    pub perpendicular_plane: PlaneFrame,
    pub projected_tea: Line3,
    pub anterior_line: Line3,
    pub varus_plane: PlaneFrame,
    pub lateral_line: Line3,
    pub flexion_plane: PlaneFrame,
    pub distal_medial_plane: PlaneFrame,
    pub distal_resection_plane: PlaneFrame,
}

impl PlanGraph {
    /// 由完整的标志点集合构建规划图
    ///
    /// 任一标志点缺失时返回 `IncompleteLandmarkSet`，不会部分构建。
    pub fn build(landmarks: &LandmarkSet, config: &PlanConfig) -> Result<Self, PlanError> {
        let missing = landmarks.missing();
        if !missing.is_empty() {
            return Err(PlanError::IncompleteLandmarkSet { missing });
        }

        let mut builder = PlanBuilder::new(landmarks, config);
        for id in NodeId::BUILD_ORDER {
            builder.build_node(id)?;
        }
        builder.finish()
    }

    /// 按标识取节点
    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        match id {
            NodeId::MechanicalAxis => NodeRef::Line(&self.mechanical_axis),
            NodeId::AnatomicalAxis => NodeRef::Line(&self.anatomical_axis),
            NodeId::TeaAxis => NodeRef::Line(&self.tea_axis),
            NodeId::PcaAxis => NodeRef::Line(&self.pca_axis),
            NodeId::PerpendicularPlane => NodeRef::Plane(&self.perpendicular_plane),
            NodeId::ProjectedTea => NodeRef::Line(&self.projected_tea),
            NodeId::AnteriorLine => NodeRef::Line(&self.anterior_line),
            NodeId::VarusPlane => NodeRef::Plane(&self.varus_plane),
            NodeId::LateralLine => NodeRef::Line(&self.lateral_line),
            NodeId::FlexionPlane => NodeRef::Plane(&self.flexion_plane),
            NodeId::DistalMedialPlane => NodeRef::Plane(&self.distal_medial_plane),
            NodeId::DistalResectionPlane => NodeRef::Plane(&self.distal_resection_plane),
        }
    }

    /// 按构建顺序遍历节点
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, NodeRef<'_>)> + '_ {
        NodeId::BUILD_ORDER.into_iter().map(move |id| (id, self.node(id)))
    }

    /// 截骨平面方程（由定位平面按需推导）
    pub fn resection_equation(&self) -> PlaneEquation {
        plane_from_positioned(&self.distal_resection_plane)
    }
}

/// 按依赖顺序逐个构造节点
struct PlanBuilder<'a> {
    landmarks: &'a LandmarkSet,
    config: &'a PlanConfig,
    nodes: BTreeMap<NodeId, Node>,
}

impl<'a> PlanBuilder<'a> {
    fn new(landmarks: &'a LandmarkSet, config: &'a PlanConfig) -> Self {
        Self {
            landmarks,
            config,
            nodes: BTreeMap::new(),
        }
    }

    fn build_node(&mut self, id: NodeId) -> Result<(), PlanError> {
        for dependency in id.dependencies() {
            match dependency {
                Dependency::Landmark(landmark) => {
                    self.landmarks.require(*landmark)?;
                }
                Dependency::Node(node) => {
                    if !self.nodes.contains_key(node) {
                        return Err(PlanError::MissingNode(*node));
                    }
                }
            }
        }

        let node = self.construct(id)?;
        tracing::debug!("Built plan node {:?}", id);
        self.nodes.insert(id, node);
        Ok(())
    }

    fn construct(&self, id: NodeId) -> Result<Node, PlanError> {
        let lm = |l: Landmark| self.landmarks.require(l);
        let config = self.config;

        let node = match id {
            NodeId::MechanicalAxis => Node::Line(Line3::through(
                lm(Landmark::FemurCenter)?,
                lm(Landmark::HipCenter)?,
            )?),
            NodeId::AnatomicalAxis => Node::Line(Line3::through(
                lm(Landmark::FemurProximalCanal)?,
                lm(Landmark::FemurDistalCanal)?,
            )?),
            NodeId::TeaAxis => Node::Line(Line3::through(
                lm(Landmark::MedialEpicondyle)?,
                lm(Landmark::LateralEpicondyle)?,
            )?),
            NodeId::PcaAxis => Node::Line(Line3::through(
                lm(Landmark::PosteriorMedialPt)?,
                lm(Landmark::PosteriorLateralPt)?,
            )?),
            NodeId::PerpendicularPlane | NodeId::VarusPlane => Node::Plane(perpendicular_plane(
                lm(Landmark::FemurCenter)?,
                lm(Landmark::HipCenter)?,
                config.reference_plane_size,
            )?),
            NodeId::ProjectedTea => {
                let plane = plane_from_positioned(self.plane(NodeId::PerpendicularPlane)?);
                Node::Line(project_line_onto_plane(self.line(NodeId::TeaAxis)?, &plane)?)
            }
            NodeId::AnteriorLine => Node::Line(cocurrent_perpendicular_line(
                &self.line(NodeId::MechanicalAxis)?.direction(),
                &self.line(NodeId::ProjectedTea)?.direction(),
                lm(Landmark::FemurCenter)?,
                config.anterior_line_length,
            )?),
            NodeId::LateralLine => Node::Line(cocurrent_perpendicular_line(
                &self.line(NodeId::MechanicalAxis)?.direction(),
                &self.line(NodeId::AnteriorLine)?.direction(),
                lm(Landmark::FemurCenter)?,
                config.lateral_line_length,
            )?),
            NodeId::FlexionPlane => {
                let varus = self.plane(NodeId::VarusPlane)?;
                Node::Plane(varus.copy_to(varus.position, config.construct_plane_size))
            }
            NodeId::DistalMedialPlane => Node::Plane(
                self.plane(NodeId::FlexionPlane)?
                    .copy_to(lm(Landmark::DistalMedialPt)?, config.construct_plane_size),
            ),
            NodeId::DistalResectionPlane => {
                let distal = self.plane(NodeId::DistalMedialPlane)?;
                let position = distal.position + depth_axis().into_inner() * config.resection_depth;
                Node::Plane(distal.copy_to(position, config.construct_plane_size))
            }
        };
        Ok(node)
    }

    fn line(&self, id: NodeId) -> Result<&Line3, PlanError> {
        match self.nodes.get(&id) {
            Some(Node::Line(line)) => Ok(line),
            _ => Err(PlanError::MissingNode(id)),
        }
    }

    fn plane(&self, id: NodeId) -> Result<&PlaneFrame, PlanError> {
        match self.nodes.get(&id) {
            Some(Node::Plane(plane)) => Ok(plane),
            _ => Err(PlanError::MissingNode(id)),
        }
    }

    fn take_line(&mut self, id: NodeId) -> Result<Line3, PlanError> {
        match self.nodes.remove(&id) {
            Some(Node::Line(line)) => Ok(line),
            _ => Err(PlanError::MissingNode(id)),
        }
    }

    fn take_plane(&mut self, id: NodeId) -> Result<PlaneFrame, PlanError> {
        match self.nodes.remove(&id) {
            Some(Node::Plane(plane)) => Ok(plane),
            _ => Err(PlanError::MissingNode(id)),
        }
    }

    fn finish(mut self) -> Result<PlanGraph, PlanError> {
        Ok(PlanGraph {
            mechanical_axis: self.take_line(NodeId::MechanicalAxis)?,
            anatomical_axis: self.take_line(NodeId::AnatomicalAxis)?,
            tea_axis: self.take_line(NodeId::TeaAxis)?,
            pca_axis: self.take_line(NodeId::PcaAxis)?,
            perpendicular_plane: self.take_plane(NodeId::PerpendicularPlane)?,
            projected_tea: self.take_line(NodeId::ProjectedTea)?,
            anterior_line: self.take_line(NodeId::AnteriorLine)?,
            varus_plane: self.take_plane(NodeId::VarusPlane)?,
            lateral_line: self.take_line(NodeId::LateralLine)?,
            flexion_plane: self.take_plane(NodeId::FlexionPlane)?,
            distal_medial_plane: self.take_plane(NodeId::DistalMedialPlane)?,
            distal_resection_plane: self.take_plane(NodeId::DistalResectionPlane)?,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::math::{Point3, Vector3};

    /// 一组合理的右膝标志点
    pub(crate) fn sample_landmarks() -> LandmarkSet {
        let mut set = LandmarkSet::new();
        let points = [
            (Landmark::FemurCenter, Point3::new(0.0, 0.0, 0.0)),
            (Landmark::HipCenter, Point3::new(0.0, 0.0, -500.0)),
            (Landmark::FemurProximalCanal, Point3::new(2.0, 5.0, -200.0)),
            (Landmark::FemurDistalCanal, Point3::new(1.0, 3.0, -40.0)),
            (Landmark::MedialEpicondyle, Point3::new(-40.0, 2.0, 10.0)),
            (Landmark::LateralEpicondyle, Point3::new(40.0, -2.0, 14.0)),
            (Landmark::DistalMedialPt, Point3::new(-20.0, 5.0, 30.0)),
            (Landmark::DistalLateralPt, Point3::new(20.0, 5.0, 28.0)),
            (Landmark::PosteriorMedialPt, Point3::new(-22.0, -25.0, 20.0)),
            (Landmark::PosteriorLateralPt, Point3::new(22.0, -25.0, 18.0)),
        ];
        for (landmark, point) in points {
            set.confirm(landmark, point);
        }
        set
    }

    /// 机械轴不与坐标轴平行的标志点集合
    pub(crate) fn oblique_landmarks() -> LandmarkSet {
        let mut set = sample_landmarks();
        set.confirm(Landmark::HipCenter, Point3::new(30.0, -20.0, -480.0));
        set
    }

    #[test]
    fn test_build_order_respects_dependencies() {
        for (index, id) in NodeId::BUILD_ORDER.iter().enumerate() {
            for dependency in id.dependencies() {
                if let Dependency::Node(node) = dependency {
                    let position = NodeId::BUILD_ORDER.iter().position(|n| n == node).unwrap();
                    assert!(position < index, "{:?} built before {:?}", id, node);
                }
            }
        }
    }

    #[test]
    fn test_build_produces_all_nodes() {
        let graph = PlanGraph::build(&sample_landmarks(), &PlanConfig::default()).unwrap();
        let ids: Vec<_> = graph.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, NodeId::BUILD_ORDER.to_vec());

        for (id, node) in graph.iter() {
            match node {
                NodeRef::Line(line) => {
                    let d = line.direction();
                    assert!((d.norm() - 1.0).abs() < 1e-9, "{:?}", id);
                }
                NodeRef::Plane(plane) => {
                    assert!(id.is_plane());
                    assert!((plane.normal().norm() - 1.0).abs() < 1e-9, "{:?}", id);
                }
            }
        }
    }

    #[test]
    fn test_reference_frame_is_orthogonal() {
        for landmarks in [sample_landmarks(), oblique_landmarks()] {
            let graph = PlanGraph::build(&landmarks, &PlanConfig::default()).unwrap();
            let mech = graph.mechanical_axis.direction().into_inner();
            let anterior = graph.anterior_line.direction().into_inner();
            let lateral = graph.lateral_line.direction().into_inner();
            let tea = graph.projected_tea.direction().into_inner();

            assert!(mech.dot(&anterior).abs() < 1e-9);
            assert!(mech.dot(&lateral).abs() < 1e-9);
            assert!(anterior.dot(&lateral).abs() < 1e-9);
            assert!(mech.dot(&tea).abs() < 1e-9);
            // 外侧参考线与投影通髁轴共线
            assert!(lateral.cross(&tea).norm() < 1e-9);
            // 垂直平面法向沿机械轴指向髋关节中心
            let normal = graph.perpendicular_plane.normal().into_inner();
            assert!((normal - mech).norm() < 1e-9);

            assert!((graph.anterior_line.length() - 10.0).abs() < 1e-9);
            assert!((graph.lateral_line.length() - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_plane_copies_are_independent() {
        let mut graph = PlanGraph::build(&sample_landmarks(), &PlanConfig::default()).unwrap();
        assert_eq!(graph.varus_plane.orientation, graph.perpendicular_plane.orientation);
        assert_eq!(graph.flexion_plane.position, graph.varus_plane.position);
        // 复制的平面沿用源平面姿态
        assert_eq!(graph.flexion_plane.orientation, graph.varus_plane.orientation);
        assert_eq!(graph.distal_medial_plane.orientation, graph.flexion_plane.orientation);
        assert_eq!(graph.distal_resection_plane.orientation, graph.flexion_plane.orientation);
        assert_eq!(graph.distal_medial_plane.position, Point3::new(-20.0, 5.0, 30.0));
        assert_eq!(graph.distal_resection_plane.position, Point3::new(-20.0, 5.0, 40.0));

        graph.varus_plane.rotate_on_world_axis(&Vector3::x_axis(), 10.0);
        assert_ne!(graph.varus_plane.orientation, graph.perpendicular_plane.orientation);
        assert_ne!(graph.varus_plane.orientation, graph.flexion_plane.orientation);
    }

    #[test]
    fn test_incomplete_landmarks() {
        let mut set = LandmarkSet::new();
        let partial = sample_landmarks();
        for (landmark, point) in partial.iter().filter(|(l, _)| *l != Landmark::DistalMedialPt) {
            set.confirm(landmark, point);
        }
        let result = PlanGraph::build(&set, &PlanConfig::default());
        assert_eq!(
            result,
            Err(PlanError::IncompleteLandmarkSet {
                missing: vec![Landmark::DistalMedialPt]
            })
        );
    }

    #[test]
    fn test_coincident_landmarks_are_degenerate() {
        let mut set = sample_landmarks();
        set.confirm(Landmark::HipCenter, Point3::origin());
        let result = PlanGraph::build(&set, &PlanConfig::default());
        assert!(matches!(result, Err(PlanError::DegenerateGeometry(_))));
    }

    #[test]
    fn test_affected_nodes() {
        assert_eq!(affected_nodes(Landmark::PosteriorLateralPt), vec![NodeId::PcaAxis]);
        assert_eq!(
            affected_nodes(Landmark::DistalMedialPt),
            vec![NodeId::DistalMedialPlane, NodeId::DistalResectionPlane]
        );
        // 通髁轴经由投影影响前向与外侧参考线
        assert_eq!(
            affected_nodes(Landmark::MedialEpicondyle),
            vec![NodeId::TeaAxis, NodeId::ProjectedTea, NodeId::AnteriorLine, NodeId::LateralLine]
        );
        assert!(affected_nodes(Landmark::FemurCenter).contains(&NodeId::DistalResectionPlane));
        assert!(affected_nodes(Landmark::DistalLateralPt).is_empty());
    }
}
