// ==========================================
// 零售门店分货系统 - 供给解析器
// ==========================================
// 职责: 解析指定大仓下每个SKU的可分货供给量
// 口径: available = max(0, stock_qty - reserved_qty)
// 约束: 无库存记录或可用量为零的SKU不进入供给表 (隐式零供给)
// ==========================================

use crate::repository::error::RepositoryResult;
use crate::repository::stock_repo::WarehouseStockRepository;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

// ==========================================
// SupplyResolver - 供给解析器
// ==========================================
pub struct SupplyResolver {
    warehouse_stock_repo: Arc<WarehouseStockRepository>,
}

impl SupplyResolver {
    /// 创建新的 SupplyResolver 实例
    pub fn new(warehouse_stock_repo: Arc<WarehouseStockRepository>) -> Self {
        Self {
            warehouse_stock_repo,
        }
    }

    /// 解析每SKU可分货供给量
    ///
    /// # 参数
    /// - `warehouse_code`: 仓库代码
    ///
    /// # 返回
    /// - `Ok(HashMap<SKU代码, 可用量>)`: 仅包含可用量 > 0 的SKU
    pub fn resolve(&self, warehouse_code: &str) -> RepositoryResult<HashMap<String, i64>> {
        let levels = self
            .warehouse_stock_repo
            .levels_for_warehouse(warehouse_code)?;

        let supply: HashMap<String, i64> = levels
            .into_iter()
            .filter_map(|level| {
                let available = level.available();
                (available > 0).then(|| (level.variant_code, available))
            })
            .collect();

        debug!(
            warehouse_code = warehouse_code,
            skus_with_supply = supply.len(),
            "供给解析完成"
        );

        Ok(supply)
    }
}
