// ==========================================
// 零售门店分货系统 - 分货编排器
// ==========================================
// 用途: 协调准入 → 供给 → 策略 → 约束 → 封顶的执行顺序
// 约束: 编排器只计算候选分货表, 落库与状态机由 API 层负责
// 约束: 供给在一次计算内只读取一次, 不做跨次预留
// ==========================================

use crate::config::allocation_config_trait::AllocationConfigReader;
use crate::config::allocation_profile::AllocationProfile;
use crate::domain::allocation::CandidateRow;
use crate::domain::types::AllocationBasis;
use crate::engine::capper::WarehouseCapper;
use crate::engine::constraint::ConstraintEnforcer;
use crate::engine::eligibility::{EligibilityEngine, EligibilityFilter};
use crate::engine::strategy::{strategy_for, StrategyInput};
use crate::engine::supply::SupplyResolver;
use crate::repository::error::RepositoryError;
use crate::repository::stock_repo::{StoreSalesRepository, StoreStockRepository};
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

// ==========================================
// RunError - 分货计算错误
// ==========================================
// 前两个变体是可预期的业务校验错误, 由调用方转换为用户可读消息
#[derive(Error, Debug)]
pub enum RunError {
    #[error("没有符合条件的门店")]
    NoEligibleStores,

    #[error("没有符合条件的商品")]
    NoEligibleProducts,

    #[error("配置读取失败: {0}")]
    Config(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

// ==========================================
// RunParams - 分货计算参数
// ==========================================
// 调用方入参优先; 为 None 的参数回退配置层默认值
#[derive(Debug, Clone, Default)]
pub struct RunParams {
    pub basis: AllocationBasis,                      // 分货依据
    pub filter: EligibilityFilter,                   // 准入过滤条件
    pub warehouse_code: Option<String>,              // 仓库代码
    pub grade_ratios: Option<HashMap<String, f64>>,  // 等级权重表
    pub size_curve: Option<HashMap<String, f64>>,    // 尺码曲线
    pub per_store_min: Option<i64>,                  // 单店下限
    pub per_store_max: Option<i64>,                  // 单店上限
    pub total_qty_limit: Option<i64>,                // 总量上限
    pub sales_lookback_days: Option<i64>,            // 销售回溯窗口 (天)
}

// ==========================================
// RunOutcome - 分货计算结果
// ==========================================
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub rows: Vec<CandidateRow>,     // 最终候选分货表 (已约束/封顶)
    pub warehouse_code: String,      // 实际使用的仓库
    pub eligible_store_count: usize, // 准入门店数
    pub eligible_variant_count: usize, // 准入SKU数
    pub supply_sku_count: usize,     // 有供给的SKU数
}

// ==========================================
// AllocationOrchestrator - 分货编排器
// ==========================================
pub struct AllocationOrchestrator<C>
where
    C: AllocationConfigReader,
{
    config: Arc<C>,
    eligibility: EligibilityEngine,
    supply_resolver: SupplyResolver,
    constraint: ConstraintEnforcer,
    capper: WarehouseCapper,
    sales_repo: Arc<StoreSalesRepository>,
    store_stock_repo: Arc<StoreStockRepository>,
}

impl<C> AllocationOrchestrator<C>
where
    C: AllocationConfigReader,
{
    /// 创建新的编排器实例
    ///
    /// # 参数
    /// - config: 配置读取器
    /// - eligibility: 准入引擎
    /// - supply_resolver: 供给解析器
    /// - sales_repo / store_stock_repo: 策略输入预取所需仓储
    pub fn new(
        config: Arc<C>,
        eligibility: EligibilityEngine,
        supply_resolver: SupplyResolver,
        sales_repo: Arc<StoreSalesRepository>,
        store_stock_repo: Arc<StoreStockRepository>,
    ) -> Self {
        Self {
            config,
            eligibility,
            supply_resolver,
            constraint: ConstraintEnforcer::new(),
            capper: WarehouseCapper::new(),
            sales_repo,
            store_stock_repo,
        }
    }

    /// 执行完整分货计算 (单次, 不落库)
    ///
    /// # 参数
    /// - `params`: 分货计算参数
    /// - `today`: 当前日期 (销售回溯窗口的基准日)
    ///
    /// # 返回
    /// 最终候选分货表与计算统计
    pub async fn execute_run(
        &self,
        params: &RunParams,
        today: NaiveDate,
    ) -> Result<RunOutcome, RunError> {
        // ==========================================
        // 步骤1: 解析分货参数集
        // ==========================================
        let profile = self.resolve_profile(params).await?;

        let warehouse_code = match &params.warehouse_code {
            Some(code) => code.clone(),
            None => self
                .config
                .get_default_warehouse()
                .await
                .map_err(|e| RunError::Config(e.to_string()))?,
        };

        info!(
            basis = %params.basis,
            warehouse_code = %warehouse_code,
            "开始执行分货计算"
        );

        // ==========================================
        // 步骤2: 准入判定
        // ==========================================
        debug!("步骤2: 解析准入门店与SKU");

        let eligible = self.eligibility.resolve(&params.filter)?;
        if eligible.stores.is_empty() {
            return Err(RunError::NoEligibleStores);
        }
        if eligible.variants.is_empty() {
            return Err(RunError::NoEligibleProducts);
        }

        info!(
            eligible_stores = eligible.stores.len(),
            eligible_variants = eligible.variants.len(),
            "准入判定完成"
        );

        // ==========================================
        // 步骤3: 供给解析
        // ==========================================
        debug!("步骤3: 解析大仓供给");

        let supply = self.supply_resolver.resolve(&warehouse_code)?;

        info!(supply_skus = supply.len(), "供给解析完成");

        // ==========================================
        // 步骤4: 策略输入预取 (策略不访问数据库)
        // ==========================================
        debug!("步骤4: 预取策略输入");

        let sales_by_variant = match params.basis {
            AllocationBasis::Sales | AllocationBasis::SalesFallback => {
                let window_start = today - Duration::days(profile.sales_lookback_days);
                self.fetch_sales(window_start)?
            }
            _ => HashMap::new(),
        };

        let store_stock_by_variant = match params.basis {
            AllocationBasis::Stock => self.fetch_store_stock()?,
            _ => HashMap::new(),
        };

        // ==========================================
        // 步骤5: 策略执行
        // ==========================================
        debug!("步骤5: 执行分货策略");

        let strategy = strategy_for(params.basis);
        let candidate_rows = strategy.distribute(&StrategyInput {
            stores: &eligible.stores,
            variants: &eligible.variants,
            supply: &supply,
            profile: &profile,
            sales_by_variant: &sales_by_variant,
            store_stock_by_variant: &store_stock_by_variant,
        });

        info!(
            candidate_rows = candidate_rows.len(),
            candidate_qty = CandidateRow::total_qty(&candidate_rows),
            "策略执行完成"
        );

        // ==========================================
        // 步骤6: 约束执行
        // ==========================================
        debug!("步骤6: 施加单店/总量约束");

        let constrained_rows = self.constraint.apply(
            candidate_rows,
            params.per_store_min,
            params.per_store_max,
            params.total_qty_limit,
        );

        // ==========================================
        // 步骤7: 大仓封顶
        // ==========================================
        debug!("步骤7: 按供给封顶");

        let final_rows = self.capper.cap(constrained_rows, &supply);

        info!(
            final_rows = final_rows.len(),
            final_qty = CandidateRow::total_qty(&final_rows),
            "分货计算完成"
        );

        Ok(RunOutcome {
            rows: final_rows,
            warehouse_code,
            eligible_store_count: eligible.stores.len(),
            eligible_variant_count: eligible.variants.len(),
            supply_sku_count: supply.len(),
        })
    }

    /// 解析分货参数集: 调用方入参优先, 缺省回退配置层
    async fn resolve_profile(&self, params: &RunParams) -> Result<AllocationProfile, RunError> {
        let grade_ratios = match &params.grade_ratios {
            Some(map) if !map.is_empty() => map.clone(),
            _ => self
                .config
                .get_grade_ratios()
                .await
                .map_err(|e| RunError::Config(e.to_string()))?,
        };

        let size_curve = match &params.size_curve {
            Some(map) => map.clone(),
            None => self
                .config
                .get_size_curve()
                .await
                .map_err(|e| RunError::Config(e.to_string()))?,
        };

        let base_stock_quota = self
            .config
            .get_base_stock_quota()
            .await
            .map_err(|e| RunError::Config(e.to_string()))?;

        let sales_lookback_days = match params.sales_lookback_days {
            Some(days) if days > 0 => days,
            _ => self
                .config
                .get_sales_lookback_days()
                .await
                .map_err(|e| RunError::Config(e.to_string()))?,
        };

        Ok(AllocationProfile {
            grade_ratios,
            size_curve,
            base_stock_quota,
            sales_lookback_days,
        })
    }

    /// 预取回溯窗口内销量, 整理为 SKU → (门店 → 销量)
    fn fetch_sales(
        &self,
        window_start: NaiveDate,
    ) -> Result<HashMap<String, HashMap<String, i64>>, RunError> {
        let totals = self.sales_repo.totals_since(window_start)?;

        let mut by_variant: HashMap<String, HashMap<String, i64>> = HashMap::new();
        for total in totals {
            by_variant
                .entry(total.variant_code)
                .or_default()
                .insert(total.store_code, total.total_sold);
        }
        Ok(by_variant)
    }

    /// 预取门店可用库存, 整理为 SKU → (门店 → 可用量)
    fn fetch_store_stock(&self) -> Result<HashMap<String, HashMap<String, i64>>, RunError> {
        let levels = self.store_stock_repo.list_all()?;

        let mut by_variant: HashMap<String, HashMap<String, i64>> = HashMap::new();
        for level in levels {
            let available = level.available();
            by_variant
                .entry(level.variant_code)
                .or_default()
                .insert(level.store_code, available);
        }
        Ok(by_variant)
    }
}
