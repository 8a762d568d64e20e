// ==========================================
// 零售门店分货系统 - 领域类型定义
// ==========================================
// 职责: 分货单类型/状态/分货依据的类型安全枚举
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 分货单类型 (Allocation Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationType {
    Initial,       // 首铺
    Replenishment, // 补货
    Transfer,      // 调拨
}

impl fmt::Display for AllocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl AllocationType {
    /// 从字符串解析分货单类型
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "INITIAL" => Some(AllocationType::Initial),
            "REPLENISHMENT" => Some(AllocationType::Replenishment),
            "TRANSFER" => Some(AllocationType::Transfer),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AllocationType::Initial => "INITIAL",
            AllocationType::Replenishment => "REPLENISHMENT",
            AllocationType::Transfer => "TRANSFER",
        }
    }
}

// ==========================================
// 分货单状态 (Allocation Status)
// ==========================================
// 状态机: 创建 → IN_PROGRESS → DRAFT → APPROVED → EXECUTED
//         任意非 EXECUTED 状态 → CANCELLED
// EXECUTED 为终态, 不可再变更
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationStatus {
    Draft,      // 草稿 (计算完成, 可人工修正)
    InProgress, // 计算中 (运行期间的过渡状态)
    Approved,   // 已审批
    Executed,   // 已执行 (终态)
    Cancelled,  // 已取消 (保留记录, 不物理删除)
}

impl fmt::Display for AllocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl AllocationStatus {
    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Some(AllocationStatus::Draft),
            "IN_PROGRESS" => Some(AllocationStatus::InProgress),
            "APPROVED" => Some(AllocationStatus::Approved),
            "EXECUTED" => Some(AllocationStatus::Executed),
            "CANCELLED" => Some(AllocationStatus::Cancelled),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AllocationStatus::Draft => "DRAFT",
            AllocationStatus::InProgress => "IN_PROGRESS",
            AllocationStatus::Approved => "APPROVED",
            AllocationStatus::Executed => "EXECUTED",
            AllocationStatus::Cancelled => "CANCELLED",
        }
    }

    /// 判断是否允许人工修正 (仅 DRAFT / IN_PROGRESS)
    pub fn is_editable(&self) -> bool {
        matches!(self, AllocationStatus::Draft | AllocationStatus::InProgress)
    }

    /// 判断是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, AllocationStatus::Executed | AllocationStatus::Cancelled)
    }
}

// ==========================================
// 分货依据 (Allocation Basis)
// ==========================================
// 记录每条明细由哪个分货策略产生
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationBasis {
    Ratio,         // 等级比例分货
    Sales,         // 销售占比分货
    SalesFallback, // 无销售历史时的比例兜底
    Stock,         // 库存缺口分货
    Manual,        // 人工指定
}

impl fmt::Display for AllocationBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl AllocationBasis {
    /// 从字符串解析分货依据
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "RATIO" => Some(AllocationBasis::Ratio),
            "SALES" => Some(AllocationBasis::Sales),
            "SALES_FALLBACK" => Some(AllocationBasis::SalesFallback),
            "STOCK" => Some(AllocationBasis::Stock),
            "MANUAL" => Some(AllocationBasis::Manual),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AllocationBasis::Ratio => "RATIO",
            AllocationBasis::Sales => "SALES",
            AllocationBasis::SalesFallback => "SALES_FALLBACK",
            AllocationBasis::Stock => "STOCK",
            AllocationBasis::Manual => "MANUAL",
        }
    }
}

impl Default for AllocationBasis {
    fn default() -> Self {
        AllocationBasis::Ratio
    }
}
