// ==========================================
// 零售门店分货系统 - 分货单领域模型
// ==========================================
// 约束: 明细是分货时点的快照, 门店等级变更不回写历史明细
// ==========================================

use crate::domain::types::{AllocationBasis, AllocationStatus, AllocationType};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// AllocationHeader - 分货单头
// ==========================================
// 约束: 汇总字段 (total_qty/total_stores/total_options) 始终等于
//       存活明细行的合计/去重计数, 由生命周期操作负责维护
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationHeader {
    pub id: i64,                          // 分货单ID (自增)
    pub allocation_code: String,          // 分货单号 (生成, 唯一)
    pub allocation_name: String,          // 分货单名称
    pub allocation_type: AllocationType,  // 类型 (首铺/补货/调拨)
    pub division_id: Option<i64>,         // 事业部范围 (可选)
    pub season: Option<String>,           // 季节范围 (可选)
    pub status: AllocationStatus,         // 状态机状态
    pub total_qty: i64,                   // 最终数量合计
    pub total_stores: i64,                // 覆盖门店数 (去重)
    pub total_options: i64,               // 覆盖SKU数 (去重)
    pub created_by: String,               // 创建人
    pub approved_by: Option<String>,      // 审批人
    pub executed_at: Option<NaiveDateTime>, // 执行时间
    pub created_at: NaiveDateTime,        // 创建时间
    pub updated_at: NaiveDateTime,        // 更新时间
}

// ==========================================
// AllocationDetail - 分货明细 (门店 × SKU)
// ==========================================
// 快照字段: store_grade 为分货时点的门店等级, 非实时外键
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationDetail {
    pub id: i64,                        // 明细ID (自增)
    pub allocation_id: i64,             // 所属分货单
    pub store_code: String,             // 门店代码
    pub store_grade: String,            // 门店等级快照 (A/B/C/D)
    pub gen_article_id: i64,            // 款ID
    pub gen_article_code: String,       // 款号
    pub variant_id: i64,                // SKU ID
    pub variant_code: String,           // SKU 代码
    pub size_code: String,              // 尺码
    pub color_code: String,             // 颜色
    pub allocated_qty: i64,             // 策略计算数量
    pub override_qty: Option<i64>,      // 人工修正数量 (可空)
    pub final_qty: i64,                 // 生效数量 = override_qty 或 allocated_qty
    pub allocation_basis: AllocationBasis, // 分货依据
    pub created_at: NaiveDateTime,      // 创建时间
    pub updated_at: NaiveDateTime,      // 更新时间
}

impl AllocationDetail {
    /// 判断该行是否已被人工修正
    pub fn is_overridden(&self) -> bool {
        self.override_qty.is_some()
    }
}

// ==========================================
// CandidateRow - 候选分货行
// ==========================================
// 策略/约束/封顶各阶段之间传递的中间记录, 行顺序有业务含义
// (比例分货按门店迭代顺序, 销售分货按销量降序)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRow {
    pub store_code: String,          // 门店代码
    pub store_grade: String,         // 门店等级快照
    pub gen_article_id: i64,         // 款ID
    pub gen_article_code: String,    // 款号
    pub variant_id: i64,             // SKU ID
    pub variant_code: String,        // SKU 代码
    pub size_code: String,           // 尺码
    pub color_code: String,          // 颜色
    pub qty: i64,                    // 候选数量
    pub basis: AllocationBasis,      // 产生该行的策略
}

impl CandidateRow {
    /// 候选表合计数量
    pub fn total_qty(rows: &[CandidateRow]) -> i64 {
        rows.iter().map(|r| r.qty).sum()
    }
}
