use super::*;

impl<C> AllocationApi<C>
where
    C: AllocationConfigReader,
{
    // ==========================================
    // 人工修正
    // ==========================================

    /// 批量应用人工修正
    ///
    /// 规则:
    /// - 仅 DRAFT / IN_PROGRESS 状态允许修正
    /// - 修正数量必须 ≥ 0 (final_qty 不变量)
    /// - 找不到对应 (门店, SKU) 明细的修正项跳过, 不计入 applied_count
    /// - 全部修正应用后按明细 final_qty 合计回写分货单 total_qty
    ///
    /// # 参数
    /// - `allocation_id`: 分货单ID
    /// - `overrides`: 修正项列表
    /// - `changed_by`: 操作人
    ///
    /// # 返回
    /// - Ok(OverrideResponse): 应用条数与回写后的合计
    pub fn apply_overrides(
        &self,
        allocation_id: i64,
        overrides: Vec<OverrideItem>,
        changed_by: &str,
    ) -> ApiResult<OverrideResponse> {
        if overrides.is_empty() {
            return Err(ApiError::InvalidInput("修正项列表不能为空".to_string()));
        }

        let header = self.require_header(allocation_id)?;
        if !header.status.is_editable() {
            return Err(ApiError::BusinessRuleViolation(format!(
                "状态{}的分货单不允许人工修正",
                header.status
            )));
        }

        // 修正数量不变量前置校验, 任一非法则整批拒绝
        for item in &overrides {
            if item.override_qty < 0 {
                return Err(ApiError::ValidationError(format!(
                    "修正数量不能为负数: store={}, variant_id={}, override_qty={}",
                    item.store_code, item.variant_id, item.override_qty
                )));
            }
        }

        let now = Utc::now().naive_utc();
        let mut applied_count = 0usize;

        for item in &overrides {
            let detail = match self
                .detail_repo
                .find_row(allocation_id, &item.store_code, item.variant_id)?
            {
                Some(detail) => detail,
                None => {
                    warn!(
                        allocation_id = allocation_id,
                        store_code = %item.store_code,
                        variant_id = item.variant_id,
                        "修正项无对应明细行, 已跳过"
                    );
                    continue;
                }
            };

            let old_final_qty = detail.final_qty;
            self.detail_repo
                .apply_override(detail.id, item.override_qty, &now)?;
            applied_count += 1;

            self.write_audit(
                ActionLog::new(
                    Uuid::new_v4().to_string(),
                    Some(allocation_id),
                    ActionType::Override,
                    changed_by.to_string(),
                )
                .with_payload(&serde_json::json!({
                    "detail_id": detail.id,
                    "store_code": item.store_code,
                    "variant_id": item.variant_id,
                    "old_final_qty": old_final_qty,
                    "new_final_qty": item.override_qty,
                })),
            );
        }

        // 批量修正后统一回写合计
        let total_qty = self.header_repo.recompute_total_qty(allocation_id, &now)?;

        info!(
            allocation_id = allocation_id,
            applied_count = applied_count,
            total_qty = total_qty,
            "人工修正完成"
        );

        Ok(OverrideResponse {
            applied_count,
            total_qty,
        })
    }

    // ==========================================
    // 生命周期操作
    // ==========================================

    /// 审批分货单 (仅 DRAFT 可审批)
    pub fn approve(&self, allocation_id: i64, approved_by: &str) -> ApiResult<LifecycleResponse> {
        let header = self.require_header(allocation_id)?;
        if header.status != AllocationStatus::Draft {
            return Err(ApiError::InvalidStateTransition {
                from: header.status.to_db_str().to_string(),
                to: AllocationStatus::Approved.to_db_str().to_string(),
            });
        }

        let now = Utc::now().naive_utc();
        self.header_repo
            .mark_approved(allocation_id, approved_by, &now)?;

        self.write_audit(
            ActionLog::new(
                Uuid::new_v4().to_string(),
                Some(allocation_id),
                ActionType::Approve,
                approved_by.to_string(),
            )
            .with_detail(format!("分货单{}审批通过", header.allocation_code)),
        );

        info!(allocation_id = allocation_id, approved_by = approved_by, "分货单已审批");

        Ok(LifecycleResponse {
            allocation_id,
            status: AllocationStatus::Approved.to_db_str().to_string(),
        })
    }

    /// 执行分货单 (仅 APPROVED 可执行, EXECUTED 为终态)
    ///
    /// 说明: 仓储作业指令的下发由外部 WMS 负责, 这里只记录执行时间
    pub fn execute(&self, allocation_id: i64, executed_by: &str) -> ApiResult<LifecycleResponse> {
        let header = self.require_header(allocation_id)?;
        if header.status != AllocationStatus::Approved {
            return Err(ApiError::InvalidStateTransition {
                from: header.status.to_db_str().to_string(),
                to: AllocationStatus::Executed.to_db_str().to_string(),
            });
        }

        let now = Utc::now().naive_utc();
        self.header_repo.mark_executed(allocation_id, &now)?;

        self.write_audit(
            ActionLog::new(
                Uuid::new_v4().to_string(),
                Some(allocation_id),
                ActionType::Execute,
                executed_by.to_string(),
            )
            .with_detail(format!("分货单{}已执行", header.allocation_code)),
        );

        info!(allocation_id = allocation_id, executed_by = executed_by, "分货单已执行");

        Ok(LifecycleResponse {
            allocation_id,
            status: AllocationStatus::Executed.to_db_str().to_string(),
        })
    }

    /// 取消分货单 (EXECUTED 不可取消; 记录保留, 不物理删除)
    pub fn cancel(&self, allocation_id: i64, cancelled_by: &str) -> ApiResult<LifecycleResponse> {
        let header = self.require_header(allocation_id)?;
        if header.status == AllocationStatus::Executed {
            return Err(ApiError::BusinessRuleViolation(
                "已执行的分货单不可取消".to_string(),
            ));
        }

        let now = Utc::now().naive_utc();
        self.header_repo
            .update_status(allocation_id, AllocationStatus::Cancelled, &now)?;

        self.write_audit(
            ActionLog::new(
                Uuid::new_v4().to_string(),
                Some(allocation_id),
                ActionType::Cancel,
                cancelled_by.to_string(),
            )
            .with_detail(format!("分货单{}已取消", header.allocation_code)),
        );

        info!(allocation_id = allocation_id, cancelled_by = cancelled_by, "分货单已取消");

        Ok(LifecycleResponse {
            allocation_id,
            status: AllocationStatus::Cancelled.to_db_str().to_string(),
        })
    }
}
