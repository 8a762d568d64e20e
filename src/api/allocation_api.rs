// ==========================================
// 零售门店分货系统 - 分货单 API
// ==========================================
// 职责: 分货计算、人工修正、审批/执行/取消、明细与汇总查询
// 状态机: 创建 → IN_PROGRESS → DRAFT → APPROVED → EXECUTED
//         任意非 EXECUTED 状态可 → CANCELLED; 计算失败自动 → CANCELLED
// 约束: 每次变更在单一事务/单一工作单元内完成; 审计失败不阻断业务
// ==========================================

mod lifecycle;
mod query;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::api::dto::{
    AllocationRunRequest, AllocationRunResponse, AllocationSummaryResponse, DetailPageResponse,
    LifecycleResponse, OverrideItem, OverrideResponse, RunSummary, TopStoreEntry,
};
use crate::api::error::{ApiError, ApiResult};
use crate::config::allocation_config_trait::AllocationConfigReader;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::allocation::{AllocationHeader, CandidateRow};
use crate::domain::types::AllocationStatus;
use crate::engine::eligibility::EligibilityFilter;
use crate::engine::orchestrator::{AllocationOrchestrator, RunParams};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::allocation_repo::{AllocationDetailRepository, AllocationHeaderRepository};
use crate::repository::error::RepositoryResult;

// ==========================================
// AllocationApi - 分货单 API
// ==========================================

/// 分货单API
///
/// 职责:
/// 1. 分货计算 (创建分货单头 → 引擎计算 → 明细落库 → 汇总回写)
/// 2. 人工修正 (单行 override, 回写分货单合计)
/// 3. 生命周期管理 (审批/执行/取消, 状态机守卫)
/// 4. 明细分页查询与汇总派生
pub struct AllocationApi<C>
where
    C: AllocationConfigReader,
{
    header_repo: Arc<AllocationHeaderRepository>,
    detail_repo: Arc<AllocationDetailRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    orchestrator: AllocationOrchestrator<C>,
}

impl<C> AllocationApi<C>
where
    C: AllocationConfigReader,
{
    /// 创建新的AllocationApi实例
    pub fn new(
        header_repo: Arc<AllocationHeaderRepository>,
        detail_repo: Arc<AllocationDetailRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        orchestrator: AllocationOrchestrator<C>,
    ) -> Self {
        Self {
            header_repo,
            detail_repo,
            action_log_repo,
            orchestrator,
        }
    }

    // ==========================================
    // 分货计算
    // ==========================================

    /// 执行一次完整的分货计算
    ///
    /// 流程:
    /// 1. 插入分货单头 (IN_PROGRESS) —— 失败的计算也要留痕, 单号先行存在
    /// 2. 编排器计算候选分货表
    /// 3. 明细批量落库 + 汇总回写 (DRAFT)
    /// 4. 写审计日志 (失败不阻断)
    ///
    /// 任何计算/落库失败都会把分货单置为 CANCELLED 后上抛;
    /// 准入空集以业务错误 (NotFound) 返回
    ///
    /// # 返回
    /// - Ok(AllocationRunResponse): 计算结果摘要与耗时
    pub async fn run(&self, request: AllocationRunRequest) -> ApiResult<AllocationRunResponse> {
        let start = Instant::now();

        // 参数验证
        if request.allocation_name.trim().is_empty() {
            return Err(ApiError::InvalidInput("分货单名称不能为空".to_string()));
        }
        if request.created_by.trim().is_empty() {
            return Err(ApiError::InvalidInput("创建人不能为空".to_string()));
        }
        for (name, value) in [
            ("per_store_min", request.per_store_min),
            ("per_store_max", request.per_store_max),
            ("total_qty_limit", request.total_qty_limit),
        ] {
            if let Some(v) = value {
                if v < 0 {
                    return Err(ApiError::InvalidInput(format!("{}不能为负数: {}", name, v)));
                }
            }
        }

        let now = Utc::now().naive_utc();
        let today = now.date();
        let allocation_code = Self::generate_code(today);

        info!(
            allocation_code = %allocation_code,
            allocation_name = %request.allocation_name,
            basis = %request.basis,
            "开始分货计算"
        );

        // 1. 插入分货单头 (IN_PROGRESS)
        let header = AllocationHeader {
            id: 0,
            allocation_code: allocation_code.clone(),
            allocation_name: request.allocation_name.clone(),
            allocation_type: request.allocation_type,
            division_id: request.division_id,
            season: request.season.clone(),
            status: AllocationStatus::InProgress,
            total_qty: 0,
            total_stores: 0,
            total_options: 0,
            created_by: request.created_by.clone(),
            approved_by: None,
            executed_at: None,
            created_at: now,
            updated_at: now,
        };
        let allocation_id = self.header_repo.insert(&header)?;

        // 2. 编排器计算
        let params = RunParams {
            basis: request.basis,
            filter: EligibilityFilter {
                store_codes: request.store_codes.clone(),
                store_grades: request.store_grades.clone(),
                division_id: request.division_id,
                gen_article_ids: request.gen_article_ids.clone(),
                gen_article_codes: request.gen_article_codes.clone(),
                season: request.season.clone(),
            },
            warehouse_code: request.warehouse_code.clone(),
            grade_ratios: request.grade_ratios.clone(),
            size_curve: request.size_curve.clone(),
            per_store_min: request.per_store_min,
            per_store_max: request.per_store_max,
            total_qty_limit: request.total_qty_limit,
            sales_lookback_days: request.sales_lookback_days,
        };

        let outcome = match self.orchestrator.execute_run(&params, today).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.cancel_after_failure(allocation_id, &allocation_code, &e.to_string());
                return Err(e.into());
            }
        };

        // 3. 明细落库 + 汇总回写
        let summary = match self.persist_outcome(allocation_id, &outcome.rows) {
            Ok(summary) => summary,
            Err(e) => {
                self.cancel_after_failure(allocation_id, &allocation_code, &e.to_string());
                return Err(e.into());
            }
        };

        // 4. 审计 (失败不阻断)
        self.write_audit(
            ActionLog::new(
                Uuid::new_v4().to_string(),
                Some(allocation_id),
                ActionType::RunAllocation,
                request.created_by.clone(),
            )
            .with_payload(&serde_json::json!({
                "allocation_code": allocation_code,
                "allocation_type": request.allocation_type.to_db_str(),
                "basis": request.basis.to_db_str(),
                "total_qty": summary.total_qty,
                "total_stores": summary.total_stores,
                "total_variants": summary.total_variants,
            })),
        );

        let duration_ms = start.elapsed().as_millis() as i64;
        info!(
            allocation_code = %allocation_code,
            total_qty = summary.total_qty,
            total_stores = summary.total_stores,
            duration_ms = duration_ms,
            "分货计算完成"
        );

        Ok(AllocationRunResponse {
            allocation_id,
            allocation_code,
            status: AllocationStatus::Draft.to_db_str().to_string(),
            summary,
            duration_ms,
        })
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    /// 明细批量落库并回写分货单汇总 (DRAFT)
    ///
    /// 零行结果不是错误: 分货单以 DRAFT + 合计 0 完成
    fn persist_outcome(
        &self,
        allocation_id: i64,
        rows: &[CandidateRow],
    ) -> RepositoryResult<RunSummary> {
        let now = Utc::now().naive_utc();

        if rows.is_empty() {
            self.header_repo
                .finalize_run(allocation_id, AllocationStatus::Draft, 0, 0, 0, &now)?;
            return Ok(RunSummary::default());
        }

        self.detail_repo.bulk_insert(allocation_id, rows, &now)?;

        let total_qty = CandidateRow::total_qty(rows);
        let total_stores = rows
            .iter()
            .map(|r| r.store_code.as_str())
            .collect::<HashSet<_>>()
            .len() as i64;
        let total_variants = rows
            .iter()
            .map(|r| r.variant_code.as_str())
            .collect::<HashSet<_>>()
            .len() as i64;

        self.header_repo.finalize_run(
            allocation_id,
            AllocationStatus::Draft,
            total_qty,
            total_stores,
            total_variants,
            &now,
        )?;

        Ok(RunSummary {
            total_qty,
            total_stores,
            total_variants,
        })
    }

    /// 计算失败后把分货单置为 CANCELLED (留痕, 不删除)
    fn cancel_after_failure(&self, allocation_id: i64, allocation_code: &str, reason: &str) {
        let now = Utc::now().naive_utc();
        match self
            .header_repo
            .update_status(allocation_id, AllocationStatus::Cancelled, &now)
        {
            Ok(()) => warn!(
                allocation_code = allocation_code,
                reason = reason,
                "分货计算失败, 分货单已取消"
            ),
            Err(e) => error!(
                allocation_code = allocation_code,
                reason = reason,
                error = %e,
                "分货计算失败, 且取消分货单时再次失败"
            ),
        }
    }

    /// 写审计日志 (失败只记日志, 不阻断业务操作)
    fn write_audit(&self, log: ActionLog) {
        if let Err(e) = self.action_log_repo.insert(&log) {
            warn!(action_type = %log.action_type, error = %e, "审计日志写入失败");
        }
    }

    /// 读取分货单头, 不存在则返回业务错误
    fn require_header(&self, allocation_id: i64) -> ApiResult<AllocationHeader> {
        self.header_repo
            .find_by_id(allocation_id)?
            .ok_or_else(|| ApiError::NotFound(format!("分货单(id={})不存在", allocation_id)))
    }

    /// 生成分货单号: ALLOC_{日期}_{6位随机后缀}
    fn generate_code(today: NaiveDate) -> String {
        let hex = Uuid::new_v4().simple().to_string();
        format!(
            "ALLOC_{}_{}",
            today.format("%Y%m%d"),
            hex[..6].to_uppercase()
        )
    }
}
