// ==========================================
// 零售门店分货系统 - 大仓封顶器
// ==========================================
// 职责: 落库前的最终校准, 任一SKU的候选合计不得超过其供给量
// 规则: 超供给的SKU按 (供给/合计) 等比缩放取整, 供给表外的SKU清零;
//       全部SKU处理完后剔除数量为零的行
// 性质: 幂等; SKU 级局部 (任何行不读取其他SKU的预算)
// ==========================================

use crate::domain::allocation::CandidateRow;
use std::collections::HashMap;

// ==========================================
// WarehouseCapper - 大仓封顶器
// ==========================================
pub struct WarehouseCapper {
    // 无状态引擎, 不需要注入依赖
}

impl WarehouseCapper {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 按供给量封顶
    ///
    /// # 参数
    /// - `rows`: 约束后的候选分货表
    /// - `supply`: 每SKU可分货供给量 (缺失 = 零供给)
    pub fn cap(
        &self,
        mut rows: Vec<CandidateRow>,
        supply: &HashMap<String, i64>,
    ) -> Vec<CandidateRow> {
        if rows.is_empty() {
            return rows;
        }

        // 按SKU分组行下标 (保持行序)
        let mut by_variant: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, row) in rows.iter().enumerate() {
            by_variant
                .entry(row.variant_code.clone())
                .or_default()
                .push(idx);
        }

        for (variant_code, indices) in by_variant {
            let available = supply.get(&variant_code).copied().unwrap_or(0);

            if available <= 0 {
                // 供给表外的SKU清零
                for &idx in &indices {
                    rows[idx].qty = 0;
                }
                continue;
            }

            let total: i64 = indices.iter().map(|&idx| rows[idx].qty).sum();
            if total <= available {
                continue;
            }

            let scale = available as f64 / total as f64;
            for &idx in &indices {
                rows[idx].qty = (rows[idx].qty as f64 * scale).round() as i64;
            }

            // 取整后合计仍可能超供给, 从该SKU的表尾行回收残差
            let mut excess: i64 =
                indices.iter().map(|&idx| rows[idx].qty).sum::<i64>() - available;
            for &idx in indices.iter().rev() {
                if excess <= 0 {
                    break;
                }
                let cut = excess.min(rows[idx].qty);
                rows[idx].qty -= cut;
                excess -= cut;
            }
        }

        // 剔除数量为零的行
        rows.retain(|row| row.qty > 0);
        rows
    }
}

impl Default for WarehouseCapper {
    fn default() -> Self {
        Self::new()
    }
}
