// ==========================================
// 零售门店分货系统 - 数据仓储层
// ==========================================
// 职责: 提供数据访问接口, 屏蔽数据库细节
// 约束: Repository 不含业务逻辑; 所有查询使用参数化, 防止 SQL 注入
// ==========================================

pub mod action_log_repo;
pub mod allocation_repo;
pub mod article_repo;
pub mod error;
pub mod stock_repo;
pub mod store_repo;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use allocation_repo::{
    AllocationDetailRepository, AllocationHeaderRepository, DetailPage, SummaryAggregates,
};
pub use article_repo::VariantRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use stock_repo::{StoreSalesRepository, StoreStockRepository, WarehouseStockRepository};
pub use store_repo::StoreRepository;
