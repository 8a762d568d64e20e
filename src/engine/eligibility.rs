// ==========================================
// 零售门店分货系统 - 准入引擎
// ==========================================
// 职责: 按过滤条件解析参与本次分货的门店集合与SKU集合
// 输入: 门店/商品过滤条件 (全部可选, 同时给出时取交集)
// 输出: 有效门店列表 + 有效SKU列表 (空集由编排器判定为业务错误)
// ==========================================

use crate::domain::article::Variant;
use crate::domain::store::Store;
use crate::repository::article_repo::VariantRepository;
use crate::repository::error::RepositoryResult;
use crate::repository::store_repo::StoreRepository;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

// ==========================================
// EligibilityFilter - 准入过滤条件
// ==========================================
// 省略的条件表示"不限制"
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EligibilityFilter {
    pub store_codes: Option<Vec<String>>,       // 门店代码白名单
    pub store_grades: Option<Vec<String>>,      // 门店等级白名单
    pub division_id: Option<i64>,               // 事业部范围 (门店与款同时生效)
    pub gen_article_ids: Option<Vec<i64>>,      // 款ID白名单
    pub gen_article_codes: Option<Vec<String>>, // 款号白名单
    pub season: Option<String>,                 // 季节范围
}

/// 准入解析结果
#[derive(Debug, Clone)]
pub struct EligibleSet {
    pub stores: Vec<Store>,
    pub variants: Vec<Variant>,
}

// ==========================================
// EligibilityEngine - 准入引擎
// ==========================================
// 约束: 只解析集合, 不做分货计算; 无效门店/商品始终排除
pub struct EligibilityEngine {
    store_repo: Arc<StoreRepository>,
    variant_repo: Arc<VariantRepository>,
}

impl EligibilityEngine {
    /// 创建新的 EligibilityEngine 实例
    pub fn new(store_repo: Arc<StoreRepository>, variant_repo: Arc<VariantRepository>) -> Self {
        Self {
            store_repo,
            variant_repo,
        }
    }

    /// 解析准入门店集合与SKU集合
    ///
    /// # 参数
    /// - `filter`: 准入过滤条件
    ///
    /// # 返回
    /// - `Ok(EligibleSet)`: 两个集合均可能为空, 空集的业务语义由调用方判定
    #[instrument(skip(self, filter))]
    pub fn resolve(&self, filter: &EligibilityFilter) -> RepositoryResult<EligibleSet> {
        let stores = self.store_repo.find_eligible(
            filter.store_codes.as_deref(),
            filter.store_grades.as_deref(),
            filter.division_id,
        )?;

        let variants = self.variant_repo.find_eligible(
            filter.gen_article_ids.as_deref(),
            filter.gen_article_codes.as_deref(),
            filter.division_id,
            filter.season.as_deref(),
        )?;

        Ok(EligibleSet { stores, variants })
    }
}
