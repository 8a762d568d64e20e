// ==========================================
// 零售门店分货系统 - 约束执行器
// ==========================================
// 职责: 对候选分货表施加单店上下限与总量上限
// 执行顺序: (1) 低于下限的行整行剔除 (下限是门槛, 不向上补齐)
//           (2) 超过上限的行截断到上限
//           (3) 总量超上限时全表等比缩放取整
// 说明: 等比缩放可能暂时破坏供给充足性, 由大仓封顶器在下一步纠正
// ==========================================

use crate::domain::allocation::CandidateRow;

// ==========================================
// ConstraintEnforcer - 约束执行器
// ==========================================
pub struct ConstraintEnforcer {
    // 无状态引擎, 不需要注入依赖
}

impl ConstraintEnforcer {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 施加约束
    ///
    /// # 参数
    /// - `rows`: 候选分货表
    /// - `per_store_min`: 单店下限 (门槛语义)
    /// - `per_store_max`: 单店上限
    /// - `total_qty_limit`: 总量上限
    pub fn apply(
        &self,
        mut rows: Vec<CandidateRow>,
        per_store_min: Option<i64>,
        per_store_max: Option<i64>,
        total_qty_limit: Option<i64>,
    ) -> Vec<CandidateRow> {
        if rows.is_empty() {
            return rows;
        }

        if let Some(min) = per_store_min {
            rows.retain(|row| row.qty >= min);
        }

        if let Some(max) = per_store_max {
            for row in &mut rows {
                row.qty = row.qty.min(max);
            }
        }

        if let Some(limit) = total_qty_limit {
            let total = CandidateRow::total_qty(&rows);
            if total > limit && total > 0 {
                let scale = limit as f64 / total as f64;
                for row in &mut rows {
                    row.qty = (row.qty as f64 * scale).round() as i64;
                }
                // 取整后合计仍可能超上限, 从表尾回收残差
                let mut excess = CandidateRow::total_qty(&rows) - limit;
                for row in rows.iter_mut().rev() {
                    if excess <= 0 {
                        break;
                    }
                    let cut = excess.min(row.qty);
                    row.qty -= cut;
                    excess -= cut;
                }
            }
        }

        rows
    }
}

impl Default for ConstraintEnforcer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::AllocationBasis;

    fn row(store: &str, variant: &str, qty: i64) -> CandidateRow {
        CandidateRow {
            store_code: store.to_string(),
            store_grade: "A".to_string(),
            gen_article_id: 1,
            gen_article_code: "GA001".to_string(),
            variant_id: 1,
            variant_code: variant.to_string(),
            size_code: "M".to_string(),
            color_code: "BLK".to_string(),
            qty,
            basis: AllocationBasis::Ratio,
        }
    }

    #[test]
    fn test_min_is_threshold_not_floor() {
        // 低于下限的行整行剔除, 不向上补齐
        let rows = vec![row("S001", "V001", 2), row("S002", "V001", 5)];
        let enforcer = ConstraintEnforcer::new();

        let result = enforcer.apply(rows, Some(3), None, None);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].store_code, "S002");
        assert_eq!(result[0].qty, 5);
    }

    #[test]
    fn test_max_clips() {
        let rows = vec![row("S001", "V001", 12), row("S002", "V001", 4)];
        let enforcer = ConstraintEnforcer::new();

        let result = enforcer.apply(rows, None, Some(8), None);

        assert_eq!(result[0].qty, 8);
        assert_eq!(result[1].qty, 4);
    }

    #[test]
    fn test_total_limit_scales_and_never_exceeds() {
        // 合计150, 上限100 → 每行×(100/150)取整, 合计不得超过100
        let rows = vec![
            row("S001", "V001", 50),
            row("S002", "V001", 50),
            row("S003", "V001", 50),
        ];
        let enforcer = ConstraintEnforcer::new();

        let result = enforcer.apply(rows, None, None, Some(100));

        let total = CandidateRow::total_qty(&result);
        assert!(total <= 100, "合计{}超过上限100", total);
        assert!(total >= 99);
    }

    #[test]
    fn test_total_limit_rounding_residual_trimmed() {
        // 三行各1件, 上限2: 逐行 round(2/3)=1 合计3, 残差从表尾回收
        let rows = vec![
            row("S001", "V001", 1),
            row("S002", "V001", 1),
            row("S003", "V001", 1),
        ];
        let enforcer = ConstraintEnforcer::new();

        let result = enforcer.apply(rows, None, None, Some(2));

        assert_eq!(CandidateRow::total_qty(&result), 2);
        // 表尾的行被回收
        assert_eq!(result[2].qty, 0);
    }

    #[test]
    fn test_no_constraints_is_identity() {
        let rows = vec![row("S001", "V001", 7)];
        let enforcer = ConstraintEnforcer::new();

        let result = enforcer.apply(rows.clone(), None, None, None);

        assert_eq!(result, rows);
    }
}
