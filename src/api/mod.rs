// ==========================================
// 零售门店分货系统 - API 层
// ==========================================
// 职责: 提供业务操作接口, 供上层传输层调用
// ==========================================

pub mod allocation_api;
pub mod dto;
pub mod error;

// 重导出核心类型
pub use allocation_api::AllocationApi;
pub use dto::{
    AllocationRunRequest, AllocationRunResponse, AllocationSummaryResponse, DetailPageResponse,
    LifecycleResponse, OverrideItem, OverrideResponse, RunSummary, TopStoreEntry,
};
pub use error::{ApiError, ApiResult};
