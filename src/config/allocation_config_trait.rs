// ==========================================
// 零售门店分货系统 - 分货配置读取 Trait
// ==========================================
// 职责: 定义分货引擎所需的配置读取接口 (不包含实现)
// 约束: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::collections::HashMap;
use std::error::Error;

// ==========================================
// AllocationConfigReader Trait
// ==========================================
// 用途: 分货引擎所需的配置读取接口
// 实现者: ConfigManager (从 config_kv 表读取)
#[async_trait]
pub trait AllocationConfigReader: Send + Sync {
    /// 获取等级权重表
    ///
    /// # 返回
    /// - HashMap<等级, 权重>
    ///
    /// # 默认值
    /// - A=1.0, B=0.7, C=0.4, D=0.2
    async fn get_grade_ratios(&self) -> Result<HashMap<String, f64>, Box<dyn Error>>;

    /// 获取尺码曲线
    ///
    /// # 返回
    /// - HashMap<尺码, 系数>; 空表表示所有尺码系数 1.0
    ///
    /// # 默认值
    /// - 空表 (不隐式套用参考曲线)
    async fn get_size_curve(&self) -> Result<HashMap<String, f64>, Box<dyn Error>>;

    /// 获取库存缺口策略的基准铺货量 (件/店)
    ///
    /// # 默认值
    /// - 10
    async fn get_base_stock_quota(&self) -> Result<f64, Box<dyn Error>>;

    /// 获取销售占比策略的回溯窗口 (天)
    ///
    /// # 默认值
    /// - 30
    async fn get_sales_lookback_days(&self) -> Result<i64, Box<dyn Error>>;

    /// 获取默认大仓代码
    ///
    /// # 默认值
    /// - WH001
    async fn get_default_warehouse(&self) -> Result<String, Box<dyn Error>>;
}
