//! 规划引擎
//!
//! 外部界面调用的唯一入口：收集标志点、构建规划、执行步进调整命令、
//! 对外提供当前几何快照。所有操作在调用线程上同步执行完毕，
//! 出错时拒绝调用且不改变任何状态。

use crate::adjust::{Adjustments, Plan};
use crate::config::PlanConfig;
use crate::error::PlanError;
use crate::events::{ListenerSet, PlanEvent, PlanListener};
use crate::geometry::{Line3, PlaneEquation, PlaneFrame};
use crate::graph::{affected_nodes, NodeId, NodeRef};
use crate::landmark::{Landmark, LandmarkSet};
use crate::math::Point3;
use crate::measure::Measurement;
use serde::{Deserialize, Serialize};

/// 步进方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Minus,
    Plus,
}

impl Step {
    /// -1 或 +1
    pub fn sign(&self) -> f64 {
        match self {
            Step::Minus => -1.0,
            Step::Plus => 1.0,
        }
    }
}

/// 界面步进命令
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanCommand {
    RotateVarus(Step),
    RotateFlexion(Step),
    TranslateResection(Step),
    ToggleResectionClip(bool),
}

/// 交给渲染端的节点几何
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NodeGeometry {
    Line {
        start: Point3,
        end: Point3,
    },
    Plane {
        frame: PlaneFrame,
        equation: PlaneEquation,
    },
}

impl From<NodeRef<'_>> for NodeGeometry {
    fn from(node: NodeRef<'_>) -> Self {
        match node {
            NodeRef::Line(line) => line_geometry(line),
            NodeRef::Plane(frame) => NodeGeometry::Plane {
                frame: frame.clone(),
                equation: frame.equation(),
            },
        }
    }
}

fn line_geometry(line: &Line3) -> NodeGeometry {
    NodeGeometry::Line {
        start: line.start(),
        end: line.end(),
    }
}

/// 当前规划的完整快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanSnapshot {
    /// 按构建顺序排列的节点
    pub nodes: Vec<(NodeId, NodeGeometry)>,
    pub measurements: [Measurement; 2],
    pub adjustments: Adjustments,
    pub clip_enabled: bool,
    /// 构建后是否有标志点被重新放置
    pub stale: bool,
}

/// 规划引擎
///
/// 独占规划图与调整状态；不支持并发修改，跨线程使用时须由调用方串行化。
#[derive(Debug)]
pub struct PlanEngine {
    config: PlanConfig,
    landmarks: LandmarkSet,
    plan: Option<Plan>,
    clip_enabled: bool,
    stale: bool,
    listeners: ListenerSet,
}

impl PlanEngine {
    /// 创建引擎，参数无效时报错
    pub fn new(config: PlanConfig) -> Result<Self, PlanError> {
        config.validate()?;
        Ok(Self {
            config,
            landmarks: LandmarkSet::new(),
            plan: None,
            clip_enabled: false,
            stale: false,
            listeners: ListenerSet::new(),
        })
    }

    pub fn config(&self) -> &PlanConfig {
        &self.config
    }

    pub fn landmarks(&self) -> &LandmarkSet {
        &self.landmarks
    }

    /// 订阅变更通知
    pub fn subscribe(&mut self, listener: Box<dyn PlanListener>) {
        self.listeners.subscribe(listener);
    }

    /// 确认（或重新放置）一个标志点
    ///
    /// 坐标含 NaN 或无穷大时拒绝，标志点集合保持不变。
    pub fn confirm_landmark(
        &mut self,
        name: &str,
        position: Point3,
    ) -> Result<Landmark, PlanError> {
        let landmark: Landmark = name.parse()?;
        if !position.coords.iter().all(|c| c.is_finite()) {
            return Err(PlanError::NonFiniteLandmark(landmark));
        }
        let previous = self.landmarks.confirm(landmark, position);

        if self.plan.is_some() && previous != Some(position) {
            self.stale = true;
            tracing::warn!(
                "Landmark {} re-placed after plan was built; stale nodes: {:?}",
                landmark,
                affected_nodes(landmark)
            );
        } else {
            tracing::debug!("Landmark {} confirmed at {:?}", landmark, position);
        }
        Ok(landmark)
    }

    /// 构建规划
    ///
    /// 所有十个标志点都已确认时才会构建；重新构建会丢弃之前的调整。
    pub fn build_plan(&mut self) -> Result<&Plan, PlanError> {
        let mut plan = Plan::build(&self.landmarks, &self.config)?;

        if self.config.initial_varus_degrees != 0.0 {
            plan.rotate_varus(self.config.initial_varus_degrees);
        }
        if self.config.initial_flexion_degrees != 0.0 {
            plan.rotate_flexion(self.config.initial_flexion_degrees);
        }

        tracing::info!(
            "Plan built: {} nodes, medial {:.3}, lateral {:.3}",
            NodeId::BUILD_ORDER.len(),
            plan.measurements()[0].distance,
            plan.measurements()[1].distance
        );

        self.stale = false;
        self.listeners.publish(PlanEvent::PlanBuilt);
        if self.clip_enabled {
            self.listeners.publish(PlanEvent::ClippingChanged {
                plane: Some(plan.resection_equation()),
            });
        }

        Ok(&*self.plan.insert(plan))
    }

    /// 当前规划
    pub fn plan(&self) -> Result<&Plan, PlanError> {
        self.plan.as_ref().ok_or(PlanError::GraphNotBuilt)
    }

    pub fn is_built(&self) -> bool {
        self.plan.is_some()
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn clip_enabled(&self) -> bool {
        self.clip_enabled
    }

    /// 内外翻调整
    pub fn rotate_varus(&mut self, degrees: f64) -> Result<(), PlanError> {
        let plan = self.plan.as_mut().ok_or(PlanError::GraphNotBuilt)?;
        let moved = plan.rotate_varus(degrees);
        self.after_mutation(moved);
        Ok(())
    }

    /// 屈曲调整
    pub fn rotate_flexion(&mut self, degrees: f64) -> Result<(), PlanError> {
        let plan = self.plan.as_mut().ok_or(PlanError::GraphNotBuilt)?;
        let moved = plan.rotate_flexion(degrees);
        self.after_mutation(moved);
        Ok(())
    }

    /// 截骨深度调整
    pub fn translate_resection(&mut self, delta: f64) -> Result<(), PlanError> {
        let plan = self.plan.as_mut().ok_or(PlanError::GraphNotBuilt)?;
        let moved = plan.translate_resection(delta);
        self.after_mutation(moved);
        Ok(())
    }

    /// 切换骨模型裁剪
    ///
    /// 规划尚未构建时只能关闭裁剪。
    pub fn toggle_resection_clip(&mut self, enabled: bool) -> Result<(), PlanError> {
        let plane = match (&self.plan, enabled) {
            (Some(plan), true) => Some(plan.resection_equation()),
            (None, true) => return Err(PlanError::GraphNotBuilt),
            (_, false) => None,
        };
        self.clip_enabled = enabled;
        tracing::debug!("Resection clipping {}", if enabled { "enabled" } else { "disabled" });
        self.listeners.publish(PlanEvent::ClippingChanged { plane });
        Ok(())
    }

    /// 执行一个步进命令（1 度或 1 个深度单位，按配置步长）
    pub fn apply(&mut self, command: PlanCommand) -> Result<(), PlanError> {
        match command {
            PlanCommand::RotateVarus(step) => {
                self.rotate_varus(step.sign() * self.config.angle_step_degrees)
            }
            PlanCommand::RotateFlexion(step) => {
                self.rotate_flexion(step.sign() * self.config.angle_step_degrees)
            }
            PlanCommand::TranslateResection(step) => {
                self.translate_resection(step.sign() * self.config.depth_step)
            }
            PlanCommand::ToggleResectionClip(enabled) => self.toggle_resection_clip(enabled),
        }
    }

    /// 当前测量值
    pub fn measurements(&self) -> Result<&[Measurement; 2], PlanError> {
        Ok(self.plan()?.measurements())
    }

    /// 当前几何快照
    pub fn snapshot(&self) -> Result<PlanSnapshot, PlanError> {
        let plan = self.plan()?;
        Ok(PlanSnapshot {
            nodes: plan
                .graph()
                .iter()
                .map(|(id, node)| (id, NodeGeometry::from(node)))
                .collect(),
            measurements: *plan.measurements(),
            adjustments: *plan.adjustments(),
            clip_enabled: self.clip_enabled,
            stale: self.stale,
        })
    }

    fn after_mutation(&mut self, moved: Vec<NodeId>) {
        let Some(plan) = self.plan.as_ref() else {
            return;
        };
        let distances = [plan.measurements()[0].distance, plan.measurements()[1].distance];
        let resection = plan.resection_equation();

        self.listeners.publish(PlanEvent::NodesMoved { nodes: moved });
        self.listeners.publish(PlanEvent::MeasurementsUpdated { distances });
        if self.clip_enabled {
            self.listeners.publish(PlanEvent::ClippingChanged {
                plane: Some(resection),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::tests::drain;
    use crate::graph::tests::sample_landmarks;
    use futures::channel::mpsc;

    fn engine_with_landmarks() -> PlanEngine {
        let mut engine = PlanEngine::new(PlanConfig::default()).unwrap();
        for (landmark, point) in sample_landmarks().iter() {
            engine.confirm_landmark(landmark.name(), point).unwrap();
        }
        engine
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = PlanConfig {
            depth_step: -1.0,
            ..Default::default()
        };
        assert!(matches!(PlanEngine::new(config), Err(PlanError::InvalidConfig(_))));
    }

    #[test]
    fn test_unknown_landmark() {
        let mut engine = PlanEngine::new(PlanConfig::default()).unwrap();
        let result = engine.confirm_landmark("Tibial_Tubercle", Point3::origin());
        assert_eq!(result, Err(PlanError::UnknownLandmarkName("Tibial_Tubercle".to_string())));
        assert!(engine.landmarks().is_empty());
    }

    #[test]
    fn test_rejects_non_finite_position() {
        let mut engine = engine_with_landmarks();
        engine.build_plan().unwrap();
        let before = engine.landmarks().get(Landmark::HipCenter);

        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = engine.confirm_landmark("Hip_Center", Point3::new(0.0, bad, -500.0));
            assert_eq!(result, Err(PlanError::NonFiniteLandmark(Landmark::HipCenter)));
        }
        assert_eq!(engine.landmarks().get(Landmark::HipCenter), before);
        assert!(!engine.is_stale());
    }

    #[test]
    fn test_build_and_snapshot() {
        let mut engine = engine_with_landmarks();
        engine.build_plan().unwrap();
        let snapshot = engine.snapshot().unwrap();
        assert_eq!(snapshot.nodes.len(), 12);
        assert_eq!(snapshot.nodes[0].0, NodeId::MechanicalAxis);
        assert!(!snapshot.clip_enabled);
        assert!(!snapshot.stale);
        assert!(matches!(snapshot.nodes[11].1, NodeGeometry::Plane { .. }));
    }

    #[test]
    fn test_step_commands() {
        let mut engine = engine_with_landmarks();
        engine.build_plan().unwrap();
        engine.apply(PlanCommand::RotateVarus(Step::Plus)).unwrap();
        engine.apply(PlanCommand::RotateVarus(Step::Plus)).unwrap();
        engine.apply(PlanCommand::RotateFlexion(Step::Minus)).unwrap();
        engine.apply(PlanCommand::TranslateResection(Step::Minus)).unwrap();

        let adjustments = *engine.plan().unwrap().adjustments();
        assert_eq!(adjustments.varus_degrees, 2.0);
        assert_eq!(adjustments.flexion_degrees, -1.0);
        assert_eq!(adjustments.resection_offset, -1.0);
    }

    #[test]
    fn test_initial_rotations_from_config() {
        let config = PlanConfig {
            initial_varus_degrees: 3.0,
            initial_flexion_degrees: 3.0,
            ..Default::default()
        };
        let mut engine = PlanEngine::new(config).unwrap();
        for (landmark, point) in sample_landmarks().iter() {
            engine.confirm_landmark(landmark.name(), point).unwrap();
        }
        let plan = engine.build_plan().unwrap();
        assert_eq!(plan.adjustments().varus_degrees, 3.0);
        assert_eq!(plan.adjustments().flexion_degrees, 3.0);
        let resection = plan.resection_equation();
        for m in plan.measurements() {
            assert!((m.distance - resection.distance_to_point(&m.point)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_events_in_order() {
        let mut engine = engine_with_landmarks();
        let (sender, mut receiver) = mpsc::unbounded();
        engine.subscribe(Box::new(sender));

        engine.build_plan().unwrap();
        engine.toggle_resection_clip(true).unwrap();
        engine.translate_resection(2.0).unwrap();

        let events = drain(&mut receiver);
        assert_eq!(events.len(), 5);
        assert_eq!(events[0], PlanEvent::PlanBuilt);
        assert!(matches!(events[1], PlanEvent::ClippingChanged { plane: Some(_) }));
        assert_eq!(
            events[2],
            PlanEvent::NodesMoved {
                nodes: vec![NodeId::DistalResectionPlane]
            }
        );
        assert!(matches!(events[3], PlanEvent::MeasurementsUpdated { .. }));
        match &events[4] {
            PlanEvent::ClippingChanged { plane: Some(plane) } => {
                assert!((plane.point.z - 42.0).abs() < 1e-9);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_clip_before_build() {
        let mut engine = engine_with_landmarks();
        assert_eq!(engine.toggle_resection_clip(true), Err(PlanError::GraphNotBuilt));
        assert!(!engine.clip_enabled());
        assert!(engine.toggle_resection_clip(false).is_ok());
    }

    #[test]
    fn test_replacing_landmark_marks_stale() {
        let mut engine = engine_with_landmarks();
        engine.build_plan().unwrap();
        engine.rotate_varus(2.0).unwrap();

        // 同一位置重新确认不算变化
        engine.confirm_landmark("Distal_Medial_Pt", Point3::new(-20.0, 5.0, 30.0)).unwrap();
        assert!(!engine.is_stale());

        engine.confirm_landmark("Distal_Medial_Pt", Point3::new(-20.0, 5.0, 32.0)).unwrap();
        assert!(engine.is_stale());
        assert!(engine.snapshot().unwrap().stale);

        // 重新构建后调整量复位
        engine.build_plan().unwrap();
        assert!(!engine.is_stale());
        assert_eq!(engine.plan().unwrap().adjustments().varus_degrees, 0.0);
        assert!((engine.measurements().unwrap()[0].distance - 10.0).abs() < 1e-9);
    }
}
