// ==========================================
// 零售门店分货系统 - 配置层
// ==========================================
// 职责: 系统配置管理, 等级权重/尺码曲线等策略参数的默认值与覆写
// 存储: config_kv 表
// ==========================================

pub mod allocation_config_trait;
pub mod allocation_profile;
pub mod config_manager;

// 重导出核心配置类型
pub use allocation_config_trait::AllocationConfigReader;
pub use allocation_profile::{
    AllocationProfile, DEFAULT_BASE_STOCK_QUOTA, DEFAULT_SALES_LOOKBACK_DAYS,
    DEFAULT_WAREHOUSE_CODE, UNKNOWN_GRADE_RATIO, UNKNOWN_SIZE_FACTOR, default_grade_ratios,
    reference_size_curve,
};
pub use config_manager::{config_keys, ConfigManager};
