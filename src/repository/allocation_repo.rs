// ==========================================
// 零售门店分货系统 - 分货单仓储
// ==========================================
// 拆分: header (分货单头) / detail (分货明细)
// 约束: Repository 不做业务逻辑, 只做数据映射
// ==========================================

mod detail;
mod header;

pub use detail::{AllocationDetailRepository, DetailPage, SummaryAggregates};
pub use header::AllocationHeaderRepository;

use chrono::NaiveDateTime;

/// 时间戳统一存储格式
pub(crate) const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 格式化时间戳为数据库字符串
pub(crate) fn fmt_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

/// 从数据库字符串解析时间戳 (列号用于错误定位)
pub(crate) fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TS_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// 枚举列解析失败时的统一错误构造
pub(crate) fn enum_parse_error(idx: usize, raw: &str, what: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        format!("无法解析{}: {}", what, raw).into(),
    )
}
