//! 变更通知
//!
//! 引擎在每个操作完整执行后，同步通知所有订阅者（通常是渲染端）。
//! 渲染端不会把数据写回引擎。

use crate::geometry::PlaneEquation;
use crate::graph::NodeId;
use serde::Serialize;
use futures::channel::mpsc;

/// 通知消息
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PlanEvent {
    /// 规划图已（重新）构建
    PlanBuilt,

    /// 节点的位置或姿态已改变
    NodesMoved { nodes: Vec<NodeId> },

    /// 测量值已刷新（远端内侧、远端外侧）
    MeasurementsUpdated { distances: [f64; 2] },

    /// 骨模型裁剪平面变化，`None` 表示关闭裁剪
    ClippingChanged { plane: Option<PlaneEquation> },
}

/// 订阅者
pub trait PlanListener {
    fn on_event(&mut self, event: &PlanEvent);
}

impl PlanListener for mpsc::UnboundedSender<PlanEvent> {
    fn on_event(&mut self, event: &PlanEvent) {
        // 接收端已关闭时静默丢弃
        let _ = self.unbounded_send(event.clone());
    }
}

/// 订阅者列表
#[derive(Default)]
pub struct ListenerSet {
    listeners: Vec<Box<dyn PlanListener>>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Box<dyn PlanListener>) {
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// 按订阅顺序广播
    pub fn publish(&mut self, event: PlanEvent) {
        for listener in &mut self.listeners {
            listener.on_event(&event);
        }
    }
}

impl std::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
