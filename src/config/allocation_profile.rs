// ==========================================
// 零售门店分货系统 - 分货参数集
// ==========================================
// 职责: 一次分货计算所使用的全部策略参数 (解析后的快照)
// 来源: 调用方入参优先, 缺省回退 config_kv, 再回退枚举默认值
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 目录未收录等级的兜底权重
pub const UNKNOWN_GRADE_RATIO: f64 = 0.3;

/// 尺码曲线未覆盖尺码的兜底系数
pub const UNKNOWN_SIZE_FACTOR: f64 = 1.0;

/// 库存缺口策略的基准铺货量 (件/店, 乘以等级权重得到目标水位)
pub const DEFAULT_BASE_STOCK_QUOTA: f64 = 10.0;

/// 销售占比策略的默认回溯窗口 (天)
pub const DEFAULT_SALES_LOOKBACK_DAYS: i64 = 30;

/// 默认大仓代码
pub const DEFAULT_WAREHOUSE_CODE: &str = "WH001";

/// 默认等级权重 (A/B/C/D)
pub fn default_grade_ratios() -> HashMap<String, f64> {
    HashMap::from([
        ("A".to_string(), 1.0),
        ("B".to_string(), 0.7),
        ("C".to_string(), 0.4),
        ("D".to_string(), 0.2),
    ])
}

/// 参考尺码曲线 (XS..XXL)
///
/// 说明: 仅作为调用方的参考模板, 系统不隐式套用;
/// 未提供尺码曲线时所有尺码系数为 1.0
pub fn reference_size_curve() -> HashMap<String, f64> {
    HashMap::from([
        ("XS".to_string(), 0.05),
        ("S".to_string(), 0.15),
        ("M".to_string(), 0.30),
        ("L".to_string(), 0.30),
        ("XL".to_string(), 0.15),
        ("XXL".to_string(), 0.05),
    ])
}

// ==========================================
// AllocationProfile - 分货参数集
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationProfile {
    /// 等级权重表 (等级 → 权重)
    pub grade_ratios: HashMap<String, f64>,

    /// 尺码曲线 (尺码 → 系数); 空表表示所有尺码系数 1.0
    #[serde(default)]
    pub size_curve: HashMap<String, f64>,

    /// 库存缺口策略基准铺货量
    pub base_stock_quota: f64,

    /// 销售占比策略回溯窗口 (天)
    pub sales_lookback_days: i64,
}

impl AllocationProfile {
    /// 查等级权重 (未收录等级按兜底权重)
    pub fn grade_ratio(&self, grade: &str) -> f64 {
        self.grade_ratios
            .get(grade)
            .copied()
            .unwrap_or(UNKNOWN_GRADE_RATIO)
    }

    /// 查尺码系数 (曲线为空或未覆盖的尺码按 1.0)
    pub fn size_factor(&self, size_code: &str) -> f64 {
        if self.size_curve.is_empty() {
            return UNKNOWN_SIZE_FACTOR;
        }
        self.size_curve
            .get(size_code)
            .copied()
            .unwrap_or(UNKNOWN_SIZE_FACTOR)
    }
}

impl Default for AllocationProfile {
    fn default() -> Self {
        Self {
            grade_ratios: default_grade_ratios(),
            size_curve: HashMap::new(),
            base_stock_quota: DEFAULT_BASE_STOCK_QUOTA,
            sales_lookback_days: DEFAULT_SALES_LOOKBACK_DAYS,
        }
    }
}
