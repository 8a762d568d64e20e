// ==========================================
// 零售门店分货系统 - 核心库
// ==========================================
// 系统定位: 分货决策引擎 (大仓 → 门店的数量分配与生命周期管理)
// 技术栈: Rust + SQLite
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AllocationBasis, AllocationStatus, AllocationType};

// 领域实体
pub use domain::{
    ActionLog, ActionType, AllocationDetail, AllocationHeader, CandidateRow, GenArticle, Store,
    Variant,
};

// 引擎
pub use engine::{
    AllocationOrchestrator, ConstraintEnforcer, EligibilityEngine, EligibilityFilter, RunOutcome,
    RunParams, SupplyResolver, WarehouseCapper,
};

// 配置
pub use config::{AllocationConfigReader, AllocationProfile, ConfigManager};

// API
pub use api::{AllocationApi, ApiError, ApiResult};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "零售门店分货系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";
