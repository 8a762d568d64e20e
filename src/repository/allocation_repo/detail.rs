use crate::domain::allocation::{AllocationDetail, CandidateRow};
use crate::domain::types::AllocationBasis;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, ToSql};
use std::sync::{Arc, Mutex};

use super::{enum_parse_error, fmt_ts, parse_ts};

// ==========================================
// AllocationDetailRepository - 分货明细仓储
// ==========================================
// 约束: 明细批量写入必须在单一事务内完成, 不允许半量落库
pub struct AllocationDetailRepository {
    conn: Arc<Mutex<Connection>>,
}

/// 分页查询结果
#[derive(Debug, Clone)]
pub struct DetailPage {
    pub rows: Vec<AllocationDetail>,
    pub total: i64,
}

/// 汇总聚合结果 (读取时派生, 不缓存)
#[derive(Debug, Clone)]
pub struct SummaryAggregates {
    pub total_qty: i64,
    pub total_stores: i64,
    pub total_variants: i64,
    pub qty_by_grade: Vec<(String, i64)>,
    pub qty_by_size: Vec<(String, i64)>,
    pub qty_by_color: Vec<(String, i64)>,
    pub top_stores: Vec<(String, i64)>,
}

impl AllocationDetailRepository {
    /// 创建新的AllocationDetailRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 批量插入候选行为分货明细 (单一事务)
    ///
    /// 写入时 allocated_qty = final_qty = 候选数量, override_qty 为空
    ///
    /// # 参数
    /// - `allocation_id`: 所属分货单ID
    /// - `rows`: 候选分货行 (约束/封顶后的最终结果)
    ///
    /// # 返回
    /// - `Ok(count)`: 插入的行数
    pub fn bulk_insert(
        &self,
        allocation_id: i64,
        rows: &[CandidateRow],
        now: &NaiveDateTime,
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let ts = fmt_ts(now);
        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO alloc_detail (
                    allocation_id, store_code, store_grade,
                    gen_article_id, gen_article_code, variant_id, variant_code,
                    size_code, color_code,
                    allocated_qty, override_qty, final_qty, allocation_basis,
                    created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, ?, ?, ?)"#,
            )?;

            for row in rows {
                stmt.execute(params![
                    allocation_id,
                    &row.store_code,
                    &row.store_grade,
                    row.gen_article_id,
                    &row.gen_article_code,
                    row.variant_id,
                    &row.variant_code,
                    &row.size_code,
                    &row.color_code,
                    row.qty,
                    row.qty,
                    row.basis.to_db_str(),
                    &ts,
                    &ts,
                ])?;
                count += 1;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(count)
    }

    /// 按 (分货单, 门店, SKU) 定位单条明细
    pub fn find_row(
        &self,
        allocation_id: i64,
        store_code: &str,
        variant_id: i64,
    ) -> RepositoryResult<Option<AllocationDetail>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!(
                "{} WHERE allocation_id = ? AND store_code = ? AND variant_id = ?",
                Self::SELECT_SQL
            ),
            params![allocation_id, store_code, variant_id],
            Self::map_row,
        ) {
            Ok(detail) => Ok(Some(detail)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 人工修正单条明细: 写入 override_qty 并同步 final_qty
    pub fn apply_override(
        &self,
        detail_id: i64,
        override_qty: i64,
        now: &NaiveDateTime,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let rows = conn.execute(
            r#"UPDATE alloc_detail
               SET override_qty = ?, final_qty = ?, updated_at = ?
               WHERE id = ?"#,
            params![override_qty, override_qty, fmt_ts(now), detail_id],
        )?;

        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "AllocationDetail".to_string(),
                id: detail_id.to_string(),
            });
        }
        Ok(())
    }

    /// 分页查询明细, 支持门店/尺码过滤
    ///
    /// # 参数
    /// - `store_code` / `size_code`: 可选过滤条件 (ANDed)
    /// - `limit` / `offset`: 分页参数
    ///
    /// # 返回
    /// - `Ok(DetailPage)`: 当前页行 + 过滤后总行数
    pub fn page(
        &self,
        allocation_id: i64,
        store_code: Option<&str>,
        size_code: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> RepositoryResult<DetailPage> {
        let conn = self.get_conn()?;

        let mut where_sql = String::from("WHERE allocation_id = ?");
        let mut filter_params: Vec<&dyn ToSql> = vec![&allocation_id];
        if let Some(ref sc) = store_code {
            where_sql.push_str(" AND store_code = ?");
            filter_params.push(sc);
        }
        if let Some(ref sz) = size_code {
            where_sql.push_str(" AND size_code = ?");
            filter_params.push(sz);
        }

        // 过滤后总行数
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM alloc_detail {}", where_sql),
            &filter_params[..],
            |row| row.get(0),
        )?;

        // 当前页 (按门店、SKU 稳定排序)
        let mut page_params = filter_params;
        page_params.push(&limit);
        page_params.push(&offset);

        let mut stmt = conn.prepare(&format!(
            "{} {} ORDER BY store_code, variant_code, id LIMIT ? OFFSET ?",
            Self::SELECT_SQL,
            where_sql
        ))?;
        let rows = stmt
            .query_map(&page_params[..], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DetailPage { rows, total })
    }

    /// 明细行数
    pub fn count(&self, allocation_id: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM alloc_detail WHERE allocation_id = ?",
            params![allocation_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 按 SKU 汇总 final_qty (供给不变量校验用)
    pub fn qty_by_variant(&self, allocation_id: i64) -> RepositoryResult<Vec<(String, i64)>> {
        self.group_sum(allocation_id, "variant_code")
    }

    /// 读取时派生汇总聚合: 总量/覆盖数 + 等级/尺码/颜色分布 + Top门店
    ///
    /// # 参数
    /// - `top_n`: Top 门店数量 (按 final_qty 合计降序)
    pub fn aggregates(&self, allocation_id: i64, top_n: i64) -> RepositoryResult<SummaryAggregates> {
        let qty_by_grade = self.group_sum(allocation_id, "store_grade")?;
        let qty_by_size = self.group_sum(allocation_id, "size_code")?;
        let qty_by_color = self.group_sum(allocation_id, "color_code")?;

        let conn = self.get_conn()?;

        let (total_qty, total_stores, total_variants): (i64, i64, i64) = conn.query_row(
            r#"SELECT IFNULL(SUM(final_qty), 0),
                      COUNT(DISTINCT store_code),
                      COUNT(DISTINCT variant_code)
               FROM alloc_detail WHERE allocation_id = ?"#,
            params![allocation_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let mut stmt = conn.prepare(
            r#"SELECT store_code, SUM(final_qty) AS qty
               FROM alloc_detail
               WHERE allocation_id = ?
               GROUP BY store_code
               ORDER BY qty DESC, store_code
               LIMIT ?"#,
        )?;
        let top_stores = stmt
            .query_map(params![allocation_id, top_n], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SummaryAggregates {
            total_qty,
            total_stores,
            total_variants,
            qty_by_grade,
            qty_by_size,
            qty_by_color,
            top_stores,
        })
    }

    /// 按指定快照列聚合 final_qty
    ///
    /// 说明: `column` 只接受本仓储内部传入的列名常量, 不接受外部输入
    fn group_sum(&self, allocation_id: i64, column: &str) -> RepositoryResult<Vec<(String, i64)>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            r#"SELECT {col}, IFNULL(SUM(final_qty), 0)
               FROM alloc_detail
               WHERE allocation_id = ?
               GROUP BY {col}
               ORDER BY {col}"#,
            col = column
        ))?;
        let rows = stmt
            .query_map(params![allocation_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    const SELECT_SQL: &'static str = r#"SELECT id, allocation_id, store_code, store_grade,
                      gen_article_id, gen_article_code, variant_id, variant_code,
                      size_code, color_code,
                      allocated_qty, override_qty, final_qty, allocation_basis,
                      created_at, updated_at
               FROM alloc_detail"#;

    /// 映射数据库行到AllocationDetail对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<AllocationDetail> {
        let basis_raw: String = row.get(13)?;

        Ok(AllocationDetail {
            id: row.get(0)?,
            allocation_id: row.get(1)?,
            store_code: row.get(2)?,
            store_grade: row.get(3)?,
            gen_article_id: row.get(4)?,
            gen_article_code: row.get(5)?,
            variant_id: row.get(6)?,
            variant_code: row.get(7)?,
            size_code: row.get(8)?,
            color_code: row.get(9)?,
            allocated_qty: row.get(10)?,
            override_qty: row.get(11)?,
            final_qty: row.get(12)?,
            allocation_basis: AllocationBasis::from_str(&basis_raw)
                .ok_or_else(|| enum_parse_error(13, &basis_raw, "分货依据"))?,
            created_at: parse_ts(14, &row.get::<_, String>(14)?)?,
            updated_at: parse_ts(15, &row.get::<_, String>(15)?)?,
        })
    }
}
