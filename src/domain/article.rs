// ==========================================
// 零售门店分货系统 - 商品领域模型
// ==========================================
// 职责: 款/SKU/大仓库存的只读参考实体
// 商品层级: 款 (gen_article) 1—* SKU (variant, 尺码×颜色)
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// GenArticle - 款
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenArticle {
    pub id: i64,                    // 款ID
    pub gen_article_code: String,   // 款号
    pub article_name: String,       // 款名
    pub division_id: Option<i64>,   // 事业部
    pub season: Option<String>,     // 季节
    pub is_active: bool,            // 有效标志
}

// ==========================================
// Variant - SKU (尺码 × 颜色)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub id: i64,                  // SKU ID
    pub variant_code: String,     // SKU 代码
    pub gen_article_id: i64,      // 所属款ID
    pub gen_article_code: String, // 所属款号 (冗余, 便于构造明细)
    pub size_code: String,        // 尺码
    pub color_code: String,       // 颜色
    pub is_active: bool,          // 有效标志
}

// ==========================================
// WarehouseStockLevel - 大仓库存水位
// ==========================================
// 供给口径: available = max(0, stock - reserved)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseStockLevel {
    pub warehouse_code: String, // 仓库代码
    pub variant_code: String,   // SKU 代码
    pub stock_qty: i64,         // 在库数量
    pub reserved_qty: i64,      // 预留数量
}

impl WarehouseStockLevel {
    /// 可分货供给量 (非负)
    pub fn available(&self) -> i64 {
        (self.stock_qty - self.reserved_qty).max(0)
    }
}
