// ==========================================
// 零售门店分货系统 - 分货策略
// ==========================================
// 职责: 把 (门店, SKU, 供给) 转换为候选分货表
// 共同契约: 对每个SKU, 候选合计不超过该SKU供给量 (策略边分配边自封顶)
// 取整口径: 比例份额四舍五入 (far-from-zero), 残差由剩余供给检查吸收
// ==========================================

use crate::config::allocation_profile::AllocationProfile;
use crate::domain::allocation::CandidateRow;
use crate::domain::article::Variant;
use crate::domain::store::Store;
use crate::domain::types::AllocationBasis;
use std::collections::HashMap;

// ==========================================
// StrategyInput - 策略输入
// ==========================================
// 约束: 策略不访问数据库, 所需数据由编排器预取后传入
pub struct StrategyInput<'a> {
    /// 准入门店 (迭代顺序有业务含义: 比例分货按此顺序吸收残差)
    pub stores: &'a [Store],
    /// 准入SKU
    pub variants: &'a [Variant],
    /// 每SKU可分货供给量 (缺失 = 零供给)
    pub supply: &'a HashMap<String, i64>,
    /// 分货参数集 (等级权重/尺码曲线/基准铺货量)
    pub profile: &'a AllocationProfile,
    /// 回溯窗口内销量: SKU代码 → (门店代码 → 销量), 仅销售占比策略使用
    pub sales_by_variant: &'a HashMap<String, HashMap<String, i64>>,
    /// 门店可用库存: SKU代码 → (门店代码 → 可用量), 仅库存缺口策略使用
    pub store_stock_by_variant: &'a HashMap<String, HashMap<String, i64>>,
}

// ==========================================
// DistributionStrategy - 分货策略接口
// ==========================================
pub trait DistributionStrategy: Send + Sync {
    /// 策略对应的分货依据标签
    fn basis(&self) -> AllocationBasis;

    /// 生成候选分货表
    fn distribute(&self, input: &StrategyInput<'_>) -> Vec<CandidateRow>;
}

/// 按分货依据取策略实现 (MANUAL 不对应计算策略)
pub fn strategy_for(basis: AllocationBasis) -> Box<dyn DistributionStrategy> {
    match basis {
        AllocationBasis::Sales | AllocationBasis::SalesFallback => Box::new(SalesStrategy),
        AllocationBasis::Stock => Box::new(StockNeedStrategy),
        AllocationBasis::Ratio | AllocationBasis::Manual => Box::new(RatioStrategy),
    }
}

/// 构造一条候选分货行
fn make_row(store: &Store, variant: &Variant, qty: i64, basis: AllocationBasis) -> CandidateRow {
    CandidateRow {
        store_code: store.store_code.clone(),
        store_grade: store.store_grade.clone(),
        gen_article_id: variant.gen_article_id,
        gen_article_code: variant.gen_article_code.clone(),
        variant_id: variant.id,
        variant_code: variant.variant_code.clone(),
        size_code: variant.size_code.clone(),
        color_code: variant.color_code.clone(),
        qty,
        basis,
    }
}

// ==========================================
// RatioStrategy - 等级比例分货
// ==========================================
// 规则: 每门店权重 = 等级权重 × 尺码系数, 按权重占比切分供给;
//       迭代顺序靠后的门店受剩余供给约束, 不会把SKU推超预算
pub struct RatioStrategy;

impl DistributionStrategy for RatioStrategy {
    fn basis(&self) -> AllocationBasis {
        AllocationBasis::Ratio
    }

    fn distribute(&self, input: &StrategyInput<'_>) -> Vec<CandidateRow> {
        let mut rows = Vec::new();

        for variant in input.variants {
            let available = match input.supply.get(&variant.variant_code) {
                Some(&qty) if qty > 0 => qty,
                _ => continue, // 无供给的SKU不产生候选
            };

            let size_factor = input.profile.size_factor(&variant.size_code);

            // 计算门店权重
            let weights: Vec<(&Store, f64)> = input
                .stores
                .iter()
                .map(|store| {
                    (
                        store,
                        input.profile.grade_ratio(&store.store_grade) * size_factor,
                    )
                })
                .collect();
            let total_weight: f64 = weights.iter().map(|(_, w)| w).sum();
            if total_weight <= 0.0 {
                continue;
            }

            // 按权重占比切分, 靠后门店受剩余供给约束
            let mut remaining = available;
            for (store, weight) in weights {
                if remaining <= 0 {
                    break;
                }
                let raw_qty = weight / total_weight * available as f64;
                let qty = (raw_qty.round() as i64).max(0).min(remaining);
                if qty > 0 {
                    rows.push(make_row(store, variant, qty, AllocationBasis::Ratio));
                    remaining -= qty;
                }
            }
        }

        rows
    }
}

// ==========================================
// SalesStrategy - 销售占比分货
// ==========================================
// 规则: 按回溯窗口内各门店销量占比切分供给, 销量高的门店优先
//       吸收取整残差; 该SKU窗口内无销量时退化为等级比例均分
//       (按门店数均分后乘以等级权重), 并以 SALES_FALLBACK 标记
pub struct SalesStrategy;

impl DistributionStrategy for SalesStrategy {
    fn basis(&self) -> AllocationBasis {
        AllocationBasis::Sales
    }

    fn distribute(&self, input: &StrategyInput<'_>) -> Vec<CandidateRow> {
        let mut rows = Vec::new();
        let store_count = input.stores.len() as f64;

        for variant in input.variants {
            let available = match input.supply.get(&variant.variant_code) {
                Some(&qty) if qty > 0 => qty,
                _ => continue,
            };

            // 该SKU在准入门店内的销量
            let variant_sales = input.sales_by_variant.get(&variant.variant_code);
            let mut ranked: Vec<(&Store, i64)> = input
                .stores
                .iter()
                .filter_map(|store| {
                    let sold = variant_sales
                        .and_then(|m| m.get(&store.store_code))
                        .copied()
                        .unwrap_or(0);
                    (sold > 0).then_some((store, sold))
                })
                .collect();
            let total_sold: i64 = ranked.iter().map(|(_, sold)| sold).sum();

            if total_sold == 0 {
                // 无销售历史: 等级比例均分兜底
                let mut remaining = available;
                for store in input.stores {
                    if remaining <= 0 {
                        break;
                    }
                    let ratio = input.profile.grade_ratio(&store.store_grade);
                    let raw_qty = ratio * available as f64 / store_count;
                    let qty = (raw_qty.round() as i64).max(0).min(remaining);
                    if qty > 0 {
                        rows.push(make_row(store, variant, qty, AllocationBasis::SalesFallback));
                        remaining -= qty;
                    }
                }
                continue;
            }

            // 销量降序, 同销量保持门店迭代顺序 (稳定排序)
            ranked.sort_by(|a, b| b.1.cmp(&a.1));

            let mut remaining = available;
            for (store, sold) in ranked {
                if remaining <= 0 {
                    break;
                }
                let proportion = sold as f64 / total_sold as f64;
                let qty = ((proportion * available as f64).round() as i64)
                    .max(0)
                    .min(remaining);
                if qty > 0 {
                    rows.push(make_row(store, variant, qty, AllocationBasis::Sales));
                    remaining -= qty;
                }
            }
        }

        rows
    }
}

// ==========================================
// StockNeedStrategy - 库存缺口分货
// ==========================================
// 规则: 目标水位 = 等级权重 × 基准铺货量; 缺口 = max(0, 目标 - 门店可用库存);
//       按缺口降序贪心补齐, 直至供给耗尽; 无缺口的门店不分货
pub struct StockNeedStrategy;

impl DistributionStrategy for StockNeedStrategy {
    fn basis(&self) -> AllocationBasis {
        AllocationBasis::Stock
    }

    fn distribute(&self, input: &StrategyInput<'_>) -> Vec<CandidateRow> {
        let mut rows = Vec::new();

        for variant in input.variants {
            let available = match input.supply.get(&variant.variant_code) {
                Some(&qty) if qty > 0 => qty,
                _ => continue,
            };

            let variant_stock = input.store_stock_by_variant.get(&variant.variant_code);

            // 计算每门店缺口 (目标水位取整时向零截断)
            let mut needs: Vec<(&Store, i64)> = input
                .stores
                .iter()
                .filter_map(|store| {
                    let target = input.profile.grade_ratio(&store.store_grade)
                        * input.profile.base_stock_quota;
                    let current = variant_stock
                        .and_then(|m| m.get(&store.store_code))
                        .copied()
                        .unwrap_or(0)
                        .max(0);
                    let need = ((target - current as f64).trunc() as i64).max(0);
                    (need > 0).then_some((store, need))
                })
                .collect();

            // 缺口降序, 同缺口保持门店迭代顺序 (稳定排序)
            needs.sort_by(|a, b| b.1.cmp(&a.1));

            let mut remaining = available;
            for (store, need) in needs {
                if remaining <= 0 {
                    break;
                }
                let qty = need.min(remaining);
                if qty > 0 {
                    rows.push(make_row(store, variant, qty, AllocationBasis::Stock));
                    remaining -= qty;
                }
            }
        }

        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::allocation_profile::AllocationProfile;

    fn store(code: &str, grade: &str) -> Store {
        Store {
            store_code: code.to_string(),
            store_name: format!("门店{}", code),
            store_grade: grade.to_string(),
            region: None,
            hub: None,
            division_id: None,
            is_active: true,
        }
    }

    fn variant(id: i64, code: &str, size: &str) -> Variant {
        Variant {
            id,
            variant_code: code.to_string(),
            gen_article_id: 1,
            gen_article_code: "GA001".to_string(),
            size_code: size.to_string(),
            color_code: "BLK".to_string(),
            is_active: true,
        }
    }

    fn empty_nested() -> HashMap<String, HashMap<String, i64>> {
        HashMap::new()
    }

    #[test]
    fn test_ratio_two_stores_supply_17() {
        // A/B 两店, 权重 1.0 : 0.7, 供给 17
        // A: round(17 × 1.0/1.7) = 10, B: round(17 × 0.7/1.7) = 7 (受剩余供给约束)
        let stores = vec![store("S001", "A"), store("S002", "B")];
        let variants = vec![variant(1, "V001", "M")];
        let supply = HashMap::from([("V001".to_string(), 17)]);
        let profile = AllocationProfile::default();
        let sales = empty_nested();
        let stock = empty_nested();

        let rows = RatioStrategy.distribute(&StrategyInput {
            stores: &stores,
            variants: &variants,
            supply: &supply,
            profile: &profile,
            sales_by_variant: &sales,
            store_stock_by_variant: &stock,
        });

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].store_code, "S001");
        assert_eq!(rows[0].qty, 10);
        assert_eq!(rows[1].store_code, "S002");
        assert_eq!(rows[1].qty, 7);
        assert_eq!(CandidateRow::total_qty(&rows), 17);
    }

    #[test]
    fn test_ratio_skips_variant_without_supply() {
        let stores = vec![store("S001", "A")];
        let variants = vec![variant(1, "V001", "M"), variant(2, "V002", "L")];
        let supply = HashMap::from([("V002".to_string(), 5)]);
        let profile = AllocationProfile::default();
        let sales = empty_nested();
        let stock = empty_nested();

        let rows = RatioStrategy.distribute(&StrategyInput {
            stores: &stores,
            variants: &variants,
            supply: &supply,
            profile: &profile,
            sales_by_variant: &sales,
            store_stock_by_variant: &stock,
        });

        assert!(rows.iter().all(|r| r.variant_code == "V002"));
    }

    #[test]
    fn test_ratio_never_exceeds_supply() {
        // 多门店同权重, 四舍五入残差不得推超供给
        let stores: Vec<Store> = (0..7).map(|i| store(&format!("S{:03}", i), "A")).collect();
        let variants = vec![variant(1, "V001", "M")];
        let supply = HashMap::from([("V001".to_string(), 10)]);
        let profile = AllocationProfile::default();
        let sales = empty_nested();
        let stock = empty_nested();

        let rows = RatioStrategy.distribute(&StrategyInput {
            stores: &stores,
            variants: &variants,
            supply: &supply,
            profile: &profile,
            sales_by_variant: &sales,
            store_stock_by_variant: &stock,
        });

        assert!(CandidateRow::total_qty(&rows) <= 10);
    }

    #[test]
    fn test_sales_proportional_with_rank_order() {
        // 销量 30:10, 供给 8 → 高销门店先拿 round(8×0.75)=6, 低销门店 round(8×0.25)=2
        let stores = vec![store("S001", "B"), store("S002", "A")];
        let variants = vec![variant(1, "V001", "M")];
        let supply = HashMap::from([("V001".to_string(), 8)]);
        let profile = AllocationProfile::default();
        let sales = HashMap::from([(
            "V001".to_string(),
            HashMap::from([("S001".to_string(), 30), ("S002".to_string(), 10)]),
        )]);
        let stock = empty_nested();

        let rows = SalesStrategy.distribute(&StrategyInput {
            stores: &stores,
            variants: &variants,
            supply: &supply,
            profile: &profile,
            sales_by_variant: &sales,
            store_stock_by_variant: &stock,
        });

        assert_eq!(rows.len(), 2);
        // 高销门店排在前
        assert_eq!(rows[0].store_code, "S001");
        assert_eq!(rows[0].qty, 6);
        assert_eq!(rows[0].basis, AllocationBasis::Sales);
        assert_eq!(rows[1].store_code, "S002");
        assert_eq!(rows[1].qty, 2);
    }

    #[test]
    fn test_sales_fallback_without_history() {
        // 无销量: 等级比例均分兜底, A店 round(1.0×6/2)=3, C店 round(0.4×6/2)=1
        let stores = vec![store("S001", "A"), store("S002", "C")];
        let variants = vec![variant(1, "V001", "M")];
        let supply = HashMap::from([("V001".to_string(), 6)]);
        let profile = AllocationProfile::default();
        let sales = empty_nested();
        let stock = empty_nested();

        let rows = SalesStrategy.distribute(&StrategyInput {
            stores: &stores,
            variants: &variants,
            supply: &supply,
            profile: &profile,
            sales_by_variant: &sales,
            store_stock_by_variant: &stock,
        });

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.basis == AllocationBasis::SalesFallback));
        assert_eq!(rows[0].qty, 3);
        assert_eq!(rows[1].qty, 1);
    }

    #[test]
    fn test_stock_need_greedy_by_gap() {
        // A店库存2 → 目标10 缺口8; C店库存0 → 目标4 缺口4; 供给5 → A店拿5, C店0
        let stores = vec![store("S001", "A"), store("S002", "C")];
        let variants = vec![variant(1, "V001", "M")];
        let supply = HashMap::from([("V001".to_string(), 5)]);
        let profile = AllocationProfile::default();
        let sales = empty_nested();
        let stock = HashMap::from([(
            "V001".to_string(),
            HashMap::from([("S001".to_string(), 2), ("S002".to_string(), 0)]),
        )]);

        let rows = StockNeedStrategy.distribute(&StrategyInput {
            stores: &stores,
            variants: &variants,
            supply: &supply,
            profile: &profile,
            sales_by_variant: &sales,
            store_stock_by_variant: &stock,
        });

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].store_code, "S001");
        assert_eq!(rows[0].qty, 5);
        assert_eq!(rows[0].basis, AllocationBasis::Stock);
    }

    #[test]
    fn test_stock_need_zero_gap_gets_nothing() {
        // 库存已达目标水位的门店不分货
        let stores = vec![store("S001", "A")];
        let variants = vec![variant(1, "V001", "M")];
        let supply = HashMap::from([("V001".to_string(), 5)]);
        let profile = AllocationProfile::default();
        let sales = empty_nested();
        let stock = HashMap::from([(
            "V001".to_string(),
            HashMap::from([("S001".to_string(), 12)]),
        )]);

        let rows = StockNeedStrategy.distribute(&StrategyInput {
            stores: &stores,
            variants: &variants,
            supply: &supply,
            profile: &profile,
            sales_by_variant: &sales,
            store_stock_by_variant: &stock,
        });

        assert!(rows.is_empty());
    }
}
