// ==========================================
// 零售门店分货系统 - 引擎层
// ==========================================
// 职责: 实现分货业务规则引擎, 不拼 SQL
// 约束: 引擎不落库; 所需数据由编排器通过仓储预取
// ==========================================

pub mod capper;
pub mod constraint;
pub mod eligibility;
pub mod orchestrator;
pub mod strategy;
pub mod supply;

// 重导出核心引擎
pub use capper::WarehouseCapper;
pub use constraint::ConstraintEnforcer;
pub use eligibility::{EligibilityEngine, EligibilityFilter, EligibleSet};
pub use orchestrator::{AllocationOrchestrator, RunError, RunOutcome, RunParams};
pub use strategy::{
    strategy_for, DistributionStrategy, RatioStrategy, SalesStrategy, StockNeedStrategy,
    StrategyInput,
};
pub use supply::SupplyResolver;
