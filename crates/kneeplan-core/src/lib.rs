//! KneePlan 核心几何引擎
//!
//! 膝关节置换截骨规划：由用户在骨模型上确认的十个解剖标志点，
//! 推导轴线、垂直参考平面、投影参考线和截骨平面，
//! 并在交互式旋转/平移时保持这些构造的一致性。
//!
//! # 架构设计
//!
//! - `geometry`: 线段、平面方程、定位平面
//! - `construction`: 由已有图元推导新图元的无状态函数
//! - `graph`: 按固定依赖顺序构建的规划图
//! - `adjust`: 旋转/平移及其向依赖节点的传播
//! - `measure`: 标志点到截骨平面的距离
//! - `engine`: 面向界面的入口
//!
//! 渲染、网格加载和标志点拾取都在本库之外，只与本库交换点和方向。
//!
//! # 示例
//!
//! ```rust
//! use kneeplan_core::prelude::*;
//!
//! let mut engine = PlanEngine::new(PlanConfig::default())?;
//! engine.confirm_landmark("Femur_Center", Point3::new(0.0, 0.0, 0.0))?;
//! engine.confirm_landmark("Hip_Center", Point3::new(0.0, 0.0, -500.0))?;
//!
//! // 十个标志点未齐全时拒绝构建
//! assert!(matches!(
//!     engine.build_plan(),
//!     Err(PlanError::IncompleteLandmarkSet { .. })
//! ));
//! # Ok::<(), PlanError>(())
//! ```

pub mod adjust;
pub mod config;
pub mod construction;
pub mod engine;
pub mod error;
pub mod events;
pub mod geometry;
pub mod graph;
pub mod landmark;
pub mod math;
pub mod measure;

pub mod prelude {
    //! 常用类型的便捷导入
    pub use crate::adjust::{Adjustments, Plan};
    pub use crate::config::PlanConfig;
    pub use crate::construction::{
        cocurrent_perpendicular_line, perpendicular_plane, plane_from_positioned,
        project_line_onto_plane,
    };
    pub use crate::engine::{NodeGeometry, PlanCommand, PlanEngine, PlanSnapshot, Step};
    pub use crate::error::PlanError;
    pub use crate::events::{PlanEvent, PlanListener};
    pub use crate::geometry::{Line3, PlaneEquation, PlaneFrame};
    pub use crate::graph::{affected_nodes, NodeId, NodeRef, PlanGraph};
    pub use crate::landmark::{Landmark, LandmarkSet};
    pub use crate::math::{Point3, UnitQuaternion, UnitVector3, Vector3, EPSILON};
    pub use crate::measure::Measurement;
}
