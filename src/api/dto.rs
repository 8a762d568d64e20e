// ==========================================
// 零售门店分货系统 - API 请求/响应对象
// ==========================================
// 职责: 定义对外操作的入参与出参结构
// ==========================================

use crate::domain::allocation::AllocationDetail;
use crate::domain::types::{AllocationBasis, AllocationType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// ==========================================
// 分货计算请求
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRunRequest {
    pub allocation_name: String,         // 分货单名称
    pub allocation_type: AllocationType, // 类型 (首铺/补货/调拨)
    pub created_by: String,              // 创建人

    // ===== 范围 =====
    pub division_id: Option<i64>, // 事业部范围
    pub season: Option<String>,   // 季节范围

    // ===== 策略 =====
    #[serde(default)]
    pub basis: AllocationBasis, // 分货依据 (默认 RATIO)

    // ===== 准入过滤 =====
    pub gen_article_ids: Option<Vec<i64>>,      // 款ID白名单
    pub gen_article_codes: Option<Vec<String>>, // 款号白名单
    pub store_codes: Option<Vec<String>>,       // 门店代码白名单
    pub store_grades: Option<Vec<String>>,      // 门店等级白名单
    pub warehouse_code: Option<String>,         // 仓库代码 (缺省回退配置)

    // ===== 分货参数 =====
    pub grade_ratios: Option<HashMap<String, f64>>, // 等级权重表
    pub size_curve: Option<HashMap<String, f64>>,   // 尺码曲线
    pub total_qty_limit: Option<i64>,               // 总量上限
    pub per_store_max: Option<i64>,                 // 单店上限
    pub per_store_min: Option<i64>,                 // 单店下限 (门槛)
    pub sales_lookback_days: Option<i64>,           // 销售回溯窗口 (天)
}

// ==========================================
// 分货计算响应
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRunResponse {
    pub allocation_id: i64,      // 分货单ID
    pub allocation_code: String, // 分货单号
    pub status: String,          // 完成后状态
    pub summary: RunSummary,     // 计算摘要
    pub duration_ms: i64,        // 计算耗时 (毫秒)
}

/// 计算摘要 (落库结果的汇总口径)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_qty: i64,      // 最终数量合计
    pub total_stores: i64,   // 覆盖门店数
    pub total_variants: i64, // 覆盖SKU数
}

// ==========================================
// 人工修正
// ==========================================
/// 单条修正项: 按 (门店, SKU) 定位明细行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideItem {
    pub store_code: String, // 门店代码
    pub variant_id: i64,    // SKU ID
    pub override_qty: i64,  // 修正数量 (≥ 0)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideResponse {
    pub applied_count: usize, // 实际应用的修正条数
    pub total_qty: i64,       // 回写后的分货单合计
}

// ==========================================
// 生命周期操作响应
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleResponse {
    pub allocation_id: i64, // 分货单ID
    pub status: String,     // 操作后状态
}

// ==========================================
// 明细分页查询
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailPageResponse {
    pub allocation_id: i64,          // 分货单ID
    pub rows: Vec<AllocationDetail>, // 当前页明细
    pub total: i64,                  // 过滤后总行数
    pub page: i64,                   // 页码 (1起)
    pub page_size: i64,              // 页大小
}

// ==========================================
// 汇总查询
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationSummaryResponse {
    pub total_qty: i64,                    // 最终数量合计
    pub total_stores: i64,                 // 覆盖门店数
    pub total_variants: i64,               // 覆盖SKU数
    pub qty_by_grade: BTreeMap<String, i64>, // 等级 → 数量
    pub qty_by_size: BTreeMap<String, i64>,  // 尺码 → 数量
    pub qty_by_color: BTreeMap<String, i64>, // 颜色 → 数量
    pub top_stores: Vec<TopStoreEntry>,    // Top 门店 (按数量降序)
}

/// Top 门店条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopStoreEntry {
    pub store_code: String, // 门店代码
    pub total_qty: i64,     // final_qty 合计
}
