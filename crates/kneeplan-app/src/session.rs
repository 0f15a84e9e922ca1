//! 会话脚本
//!
//! JSON 格式：
//!
//! ```json
//! {
//!   "config": { "resection_depth": 9.0 },
//!   "landmarks": { "Femur_Center": [0.0, 0.0, 0.0], "...": [0.0, 0.0, 0.0] },
//!   "commands": [ { "rotate_varus": "plus" }, { "toggle_resection_clip": true } ]
//! }
//! ```

use anyhow::{Context, Result};
use kneeplan_core::prelude::*;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// 会话脚本内容
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Session {
    pub config: PlanConfig,
    /// 标志点名称 -> 坐标
    pub landmarks: BTreeMap<String, [f64; 3]>,
    /// 按顺序执行的步进命令
    pub commands: Vec<PlanCommand>,
}

impl Session {
    /// 从文件读取会话
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid session file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// 执行会话：确认标志点、构建规划、依次执行命令
    pub fn run(&self, engine: &mut PlanEngine) -> Result<PlanSnapshot> {
        for (name, [x, y, z]) in &self.landmarks {
            engine
                .confirm_landmark(name, Point3::new(*x, *y, *z))
                .with_context(|| format!("Rejected landmark {}", name))?;
        }

        engine.build_plan().context("Failed to build plan")?;

        for (index, command) in self.commands.iter().enumerate() {
            engine
                .apply(*command)
                .with_context(|| format!("Command #{} ({:?}) failed", index + 1, command))?;
        }

        Ok(engine.snapshot()?)
    }
}
