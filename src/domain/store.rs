// ==========================================
// 零售门店分货系统 - 门店领域模型
// ==========================================
// 职责: 门店目录/门店库存/门店销售的只读参考实体
// 约束: 本系统只读取这些实体, 从不回写
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// Store - 门店 (目录数据)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub store_code: String,        // 门店代码
    pub store_name: String,        // 门店名称
    pub store_grade: String,       // 门店等级 (A/B/C/D, 目录未填时视为 C)
    pub region: Option<String>,    // 大区
    pub hub: Option<String>,       // 物流中心
    pub division_id: Option<i64>,  // 事业部
    pub is_active: bool,           // 有效标志
}

// ==========================================
// StoreStockLevel - 门店库存水位
// ==========================================
// 用途: 库存缺口策略输入, available = stock - reserved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStockLevel {
    pub store_code: String,   // 门店代码
    pub variant_code: String, // SKU 代码
    pub stock_qty: i64,       // 在库数量
    pub reserved_qty: i64,    // 预留数量
}

impl StoreStockLevel {
    /// 可用库存 (非负)
    pub fn available(&self) -> i64 {
        (self.stock_qty - self.reserved_qty).max(0)
    }
}

// ==========================================
// StoreSalesTotal - 门店销售汇总
// ==========================================
// 用途: 销售占比策略输入, 按回溯窗口聚合
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSalesTotal {
    pub store_code: String,   // 门店代码
    pub variant_code: String, // SKU 代码
    pub total_sold: i64,      // 窗口内销量合计
    pub window_start: NaiveDate, // 统计窗口起始日
}
