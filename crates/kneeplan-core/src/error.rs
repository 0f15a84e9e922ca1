//! 规划引擎错误定义

use crate::graph::NodeId;
use crate::landmark::Landmark;
use thiserror::Error;

/// 规划引擎错误
///
/// 所有错误都是局部、可恢复的：出错的调用被拒绝，之前的状态保持不变。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(&'static str),

    #[error("Incomplete landmark set, missing: {}", format_missing(.missing))]
    IncompleteLandmarkSet { missing: Vec<Landmark> },

    #[error("Plan graph has not been built")]
    GraphNotBuilt,

    #[error("Unknown landmark name: {0}")]
    UnknownLandmarkName(String),

    #[error("Landmark {0} has a non-finite position")]
    NonFiniteLandmark(Landmark),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Node {0:?} requested before it was built")]
    MissingNode(NodeId),
}

fn format_missing(missing: &[Landmark]) -> String {
    missing
        .iter()
        .map(|l| l.name())
        .collect::<Vec<_>>()
        .join(", ")
}
