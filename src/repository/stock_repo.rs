// ==========================================
// 零售门店分货系统 - 库存/销售仓储
// ==========================================
// 职责: 大仓库存、门店库存、门店销售的只读访问
// 口径: 可用量 = max(0, 在库 - 预留); 聚合在 SQL 侧完成
// ==========================================

use crate::domain::article::WarehouseStockLevel;
use crate::domain::store::{StoreSalesTotal, StoreStockLevel};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// WarehouseStockRepository - 大仓库存仓储
// ==========================================
pub struct WarehouseStockRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WarehouseStockRepository {
    /// 创建新的WarehouseStockRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询指定仓库的全部库存水位
    ///
    /// 说明: SKU 范围的裁剪由供给解析器按候选 SKU 完成,
    /// 这里不展开 IN 列表 (SKU 数量可达数千)
    pub fn levels_for_warehouse(
        &self,
        warehouse_code: &str,
    ) -> RepositoryResult<Vec<WarehouseStockLevel>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT warehouse_code, variant_code, stock_qty, reserved_qty
               FROM warehouse_stock
               WHERE warehouse_code = ?"#,
        )?;
        let levels = stmt
            .query_map(params![warehouse_code], |row| {
                Ok(WarehouseStockLevel {
                    warehouse_code: row.get(0)?,
                    variant_code: row.get(1)?,
                    stock_qty: row.get(2)?,
                    reserved_qty: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(levels)
    }
}

// ==========================================
// StoreStockRepository - 门店库存仓储
// ==========================================
pub struct StoreStockRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StoreStockRepository {
    /// 创建新的StoreStockRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询全部门店库存水位
    ///
    /// 说明: 门店×SKU 的裁剪由策略按准入结果完成, 多余条目不参与计算
    pub fn list_all(&self) -> RepositoryResult<Vec<StoreStockLevel>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT store_code, variant_code, stock_qty, reserved_qty
               FROM store_stock"#,
        )?;
        let levels = stmt
            .query_map([], |row| {
                Ok(StoreStockLevel {
                    store_code: row.get(0)?,
                    variant_code: row.get(1)?,
                    stock_qty: row.get(2)?,
                    reserved_qty: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(levels)
    }
}

// ==========================================
// StoreSalesRepository - 门店销售仓储
// ==========================================
pub struct StoreSalesRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StoreSalesRepository {
    /// 创建新的StoreSalesRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按回溯窗口聚合门店×SKU 销量
    ///
    /// # 参数
    /// - `window_start`: 统计窗口起始日 (含当日)
    ///
    /// # 返回
    /// - `Ok(Vec<StoreSalesTotal>)`: 窗口内有销量的 (门店, SKU) 组合
    pub fn totals_since(&self, window_start: NaiveDate) -> RepositoryResult<Vec<StoreSalesTotal>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT store_code, variant_code, SUM(qty_sold) AS total_sold
               FROM store_sales
               WHERE sale_date >= ?
               GROUP BY store_code, variant_code"#,
        )?;
        let start = window_start.format("%Y-%m-%d").to_string();
        let totals = stmt
            .query_map(params![start], |row| {
                Ok(StoreSalesTotal {
                    store_code: row.get(0)?,
                    variant_code: row.get(1)?,
                    total_sold: row.get(2)?,
                    window_start,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(totals)
    }
}
