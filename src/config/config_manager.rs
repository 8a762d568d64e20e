// ==========================================
// 零售门店分货系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询, 提供枚举默认值兜底
// 存储: config_kv 表 (key-value + scope, 当前仅 global)
// ==========================================

use crate::config::allocation_config_trait::AllocationConfigReader;
use crate::config::allocation_profile::{
    DEFAULT_BASE_STOCK_QUOTA, DEFAULT_SALES_LOOKBACK_DAYS, DEFAULT_WAREHOUSE_CODE,
    default_grade_ratios,
};
use crate::db::configure_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// 配置键定义
// ==========================================
pub mod config_keys {
    /// 等级权重表 (JSON 对象: 等级 → 权重)
    pub const GRADE_RATIOS: &str = "allocation/grade_ratios";
    /// 尺码曲线 (JSON 对象: 尺码 → 系数)
    pub const SIZE_CURVE: &str = "allocation/size_curve";
    /// 库存缺口策略基准铺货量
    pub const BASE_STOCK_QUOTA: &str = "allocation/base_stock_quota";
    /// 销售占比策略回溯窗口 (天)
    pub const SALES_LOOKBACK_DAYS: &str = "allocation/sales_lookback_days";
    /// 默认大仓代码
    pub const DEFAULT_WAREHOUSE: &str = "allocation/default_warehouse";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    ///
    /// 说明: 为保证连接行为一致, 会对传入连接再次应用统一 PRAGMA (幂等)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值 (scope_id='global')
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入 global scope 配置值 (存在则覆盖)
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            r#"INSERT INTO config_kv (scope_id, key, value)
               VALUES ('global', ?1, ?2)
               ON CONFLICT(scope_id, key) DO UPDATE SET value = excluded.value,
                   updated_at = datetime('now')"#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取 JSON 权重表类配置 (解析失败记日志并回退默认值)
    fn get_weight_map(
        &self,
        key: &str,
        default: HashMap<String, f64>,
    ) -> Result<HashMap<String, f64>, Box<dyn Error>> {
        match self.get_config_value(key)? {
            Some(raw) => match serde_json::from_str::<HashMap<String, f64>>(&raw) {
                Ok(map) => Ok(map),
                Err(e) => {
                    warn!(key = key, error = %e, "配置值解析失败, 回退默认值");
                    Ok(default)
                }
            },
            None => Ok(default),
        }
    }
}

// ==========================================
// AllocationConfigReader 实现
// ==========================================
#[async_trait]
impl AllocationConfigReader for ConfigManager {
    async fn get_grade_ratios(&self) -> Result<HashMap<String, f64>, Box<dyn Error>> {
        self.get_weight_map(config_keys::GRADE_RATIOS, default_grade_ratios())
    }

    async fn get_size_curve(&self) -> Result<HashMap<String, f64>, Box<dyn Error>> {
        self.get_weight_map(config_keys::SIZE_CURVE, HashMap::new())
    }

    async fn get_base_stock_quota(&self) -> Result<f64, Box<dyn Error>> {
        match self.get_config_value(config_keys::BASE_STOCK_QUOTA)? {
            Some(raw) => Ok(raw.parse::<f64>().unwrap_or_else(|_| {
                warn!(value = %raw, "基准铺货量配置非法, 回退默认值");
                DEFAULT_BASE_STOCK_QUOTA
            })),
            None => Ok(DEFAULT_BASE_STOCK_QUOTA),
        }
    }

    async fn get_sales_lookback_days(&self) -> Result<i64, Box<dyn Error>> {
        match self.get_config_value(config_keys::SALES_LOOKBACK_DAYS)? {
            Some(raw) => Ok(raw.parse::<i64>().unwrap_or_else(|_| {
                warn!(value = %raw, "回溯窗口配置非法, 回退默认值");
                DEFAULT_SALES_LOOKBACK_DAYS
            })),
            None => Ok(DEFAULT_SALES_LOOKBACK_DAYS),
        }
    }

    async fn get_default_warehouse(&self) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_value(config_keys::DEFAULT_WAREHOUSE)?
            .unwrap_or_else(|| DEFAULT_WAREHOUSE_CODE.to_string()))
    }
}
