//! 解剖标志点
//!
//! 十个固定名称的标志点，由用户在骨模型上放置并确认。
//! 重新放置同名标志点会覆盖之前的位置。

use crate::error::PlanError;
use crate::math::Point3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// 标志点名称
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Landmark {
    #[serde(rename = "Femur_Center")]
    FemurCenter,
    #[serde(rename = "Hip_Center")]
    HipCenter,
    #[serde(rename = "Femur_Proximal_Canal")]
    FemurProximalCanal,
    #[serde(rename = "Femur_Distal_Canal")]
    FemurDistalCanal,
    #[serde(rename = "Medial_Epicondyle")]
    MedialEpicondyle,
    #[serde(rename = "Lateral_Epicondyle")]
    LateralEpicondyle,
    #[serde(rename = "Distal_Medial_Pt")]
    DistalMedialPt,
    #[serde(rename = "Distal_Lateral_Pt")]
    DistalLateralPt,
    #[serde(rename = "Posterior_Medial_Pt")]
    PosteriorMedialPt,
    #[serde(rename = "Posterior_Lateral_Pt")]
    PosteriorLateralPt,
}

impl Landmark {
    /// 全部标志点（界面列表顺序）
    pub const ALL: [Landmark; 10] = [
        Landmark::FemurCenter,
        Landmark::HipCenter,
        Landmark::FemurProximalCanal,
        Landmark::FemurDistalCanal,
        Landmark::MedialEpicondyle,
        Landmark::LateralEpicondyle,
        Landmark::DistalMedialPt,
        Landmark::DistalLateralPt,
        Landmark::PosteriorMedialPt,
        Landmark::PosteriorLateralPt,
    ];

    /// 外部标识符
    pub fn name(&self) -> &'static str {
        match self {
            Landmark::FemurCenter => "Femur_Center",
            Landmark::HipCenter => "Hip_Center",
            Landmark::FemurProximalCanal => "Femur_Proximal_Canal",
            Landmark::FemurDistalCanal => "Femur_Distal_Canal",
            Landmark::MedialEpicondyle => "Medial_Epicondyle",
            Landmark::LateralEpicondyle => "Lateral_Epicondyle",
            Landmark::DistalMedialPt => "Distal_Medial_Pt",
            Landmark::DistalLateralPt => "Distal_Lateral_Pt",
            Landmark::PosteriorMedialPt => "Posterior_Medial_Pt",
            Landmark::PosteriorLateralPt => "Posterior_Lateral_Pt",
        }
    }
}

impl fmt::Display for Landmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Landmark {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Landmark::ALL
            .into_iter()
            .find(|l| l.name() == s)
            .ok_or_else(|| PlanError::UnknownLandmarkName(s.to_string()))
    }
}

/// 已确认的标志点集合
///
/// 派生构造只引用这里的坐标，不持有标志点本身。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandmarkSet {
    points: BTreeMap<Landmark, Point3>,
}

impl LandmarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 确认（或覆盖）一个标志点，返回被覆盖的旧位置
    pub fn confirm(&mut self, landmark: Landmark, position: Point3) -> Option<Point3> {
        self.points.insert(landmark, position)
    }

    /// 按外部名称确认标志点
    pub fn confirm_named(&mut self, name: &str, position: Point3) -> Result<Landmark, PlanError> {
        let landmark: Landmark = name.parse()?;
        self.confirm(landmark, position);
        Ok(landmark)
    }

    pub fn get(&self, landmark: Landmark) -> Option<Point3> {
        self.points.get(&landmark).copied()
    }

    /// 取标志点坐标，缺失时报告不完整
    pub fn require(&self, landmark: Landmark) -> Result<Point3, PlanError> {
        self.get(landmark).ok_or(PlanError::IncompleteLandmarkSet {
            missing: vec![landmark],
        })
    }

    /// 尚未确认的标志点
    pub fn missing(&self) -> Vec<Landmark> {
        Landmark::ALL
            .into_iter()
            .filter(|l| !self.points.contains_key(l))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.points.len() == Landmark::ALL.len()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Landmark, Point3)> + '_ {
        self.points.iter().map(|(l, p)| (*l, *p))
    }
}
