use super::*;

impl<C> AllocationApi<C>
where
    C: AllocationConfigReader,
{
    // ==========================================
    // 查询接口
    // ==========================================

    /// 查询分货单头
    pub fn get_header(&self, allocation_id: i64) -> ApiResult<AllocationHeader> {
        self.require_header(allocation_id)
    }

    /// 分页查询分货单列表, 按创建时间降序
    ///
    /// # 参数
    /// - `status`: 可选状态过滤
    /// - `page`: 页码 (1起)
    /// - `page_size`: 页大小 (1..=500)
    pub fn list_allocations(
        &self,
        status: Option<AllocationStatus>,
        page: i64,
        page_size: i64,
    ) -> ApiResult<Vec<AllocationHeader>> {
        let (limit, offset) = Self::validate_paging(page, page_size, 500)?;
        Ok(self.header_repo.list(status, limit, offset)?)
    }

    /// 分页查询分货明细, 支持门店/尺码过滤
    ///
    /// # 参数
    /// - `page`: 页码 (1起)
    /// - `page_size`: 页大小 (1..=1000)
    /// - `store_code` / `size_code`: 可选过滤条件
    pub fn get_details(
        &self,
        allocation_id: i64,
        page: i64,
        page_size: i64,
        store_code: Option<&str>,
        size_code: Option<&str>,
    ) -> ApiResult<DetailPageResponse> {
        let (limit, offset) = Self::validate_paging(page, page_size, 1000)?;

        // 分货单必须存在 (空明细是合法结果, 不存在的分货单是业务错误)
        self.require_header(allocation_id)?;

        let detail_page =
            self.detail_repo
                .page(allocation_id, store_code, size_code, limit, offset)?;

        Ok(DetailPageResponse {
            allocation_id,
            rows: detail_page.rows,
            total: detail_page.total,
            page,
            page_size,
        })
    }

    /// 汇总查询: 总量/覆盖数 + 等级/尺码/颜色分布 + Top10 门店
    ///
    /// 所有聚合在读取时从明细派生, 不缓存;
    /// 同一未变更分货单的两次汇总结果完全一致
    pub fn get_summary(&self, allocation_id: i64) -> ApiResult<AllocationSummaryResponse> {
        self.require_header(allocation_id)?;

        let agg = self.detail_repo.aggregates(allocation_id, 10)?;

        Ok(AllocationSummaryResponse {
            total_qty: agg.total_qty,
            total_stores: agg.total_stores,
            total_variants: agg.total_variants,
            qty_by_grade: agg.qty_by_grade.into_iter().collect(),
            qty_by_size: agg.qty_by_size.into_iter().collect(),
            qty_by_color: agg.qty_by_color.into_iter().collect(),
            top_stores: agg
                .top_stores
                .into_iter()
                .map(|(store_code, total_qty)| TopStoreEntry {
                    store_code,
                    total_qty,
                })
                .collect(),
        })
    }

    /// 分页参数校验, 返回 (limit, offset)
    fn validate_paging(page: i64, page_size: i64, max_page_size: i64) -> ApiResult<(i64, i64)> {
        if page < 1 {
            return Err(ApiError::InvalidInput(format!("页码必须≥1: {}", page)));
        }
        if page_size < 1 || page_size > max_page_size {
            return Err(ApiError::InvalidInput(format!(
                "页大小必须在1..={}之间: {}",
                max_page_size, page_size
            )));
        }
        Ok((page_size, (page - 1) * page_size))
    }
}
