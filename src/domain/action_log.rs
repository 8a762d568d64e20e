// ==========================================
// 零售门店分货系统 - 操作日志领域模型
// ==========================================
// 约束: 所有生命周期写操作必须记录; 日志写入失败不阻断业务操作
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,             // 日志ID (UUID)
    pub allocation_id: Option<i64>,    // 关联分货单 (系统级操作可为空)
    pub action_type: String,           // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime,      // 操作时间戳
    pub actor: String,                 // 操作人
    pub payload_json: Option<JsonValue>, // 操作负载 (JSON)
    pub detail: Option<String>,        // 详细描述
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    RunAllocation, // 执行分货计算
    Override,      // 人工修正明细
    Approve,       // 审批
    Execute,       // 执行
    Cancel,        // 取消
}

impl ActionType {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::RunAllocation => "RunAllocation",
            ActionType::Override => "Override",
            ActionType::Approve => "Approve",
            ActionType::Execute => "Execute",
            ActionType::Cancel => "Cancel",
        }
    }

    /// 从字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "RunAllocation" => Some(ActionType::RunAllocation),
            "Override" => Some(ActionType::Override),
            "Approve" => Some(ActionType::Approve),
            "Execute" => Some(ActionType::Execute),
            "Cancel" => Some(ActionType::Cancel),
            _ => None,
        }
    }
}

// ==========================================
// ActionLog 辅助方法
// ==========================================
impl ActionLog {
    /// 创建新的操作日志
    ///
    /// # 参数
    /// - `action_id`: 日志ID (通常使用UUID)
    /// - `allocation_id`: 关联分货单ID (可选)
    /// - `action_type`: 操作类型
    /// - `actor`: 操作人
    pub fn new(
        action_id: String,
        allocation_id: Option<i64>,
        action_type: ActionType,
        actor: String,
    ) -> Self {
        Self {
            action_id,
            allocation_id,
            action_type: action_type.as_str().to_string(),
            action_ts: chrono::Utc::now().naive_utc(),
            actor,
            payload_json: None,
            detail: None,
        }
    }

    /// 设置操作负载 (转换为JSON)
    pub fn with_payload<T: Serialize>(mut self, payload: &T) -> Self {
        self.payload_json = serde_json::to_value(payload).ok();
        self
    }

    /// 设置详细描述
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
