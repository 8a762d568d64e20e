use crate::domain::allocation::AllocationHeader;
use crate::domain::types::{AllocationStatus, AllocationType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

use super::{enum_parse_error, fmt_ts, parse_ts};

// ==========================================
// AllocationHeaderRepository - 分货单头仓储
// ==========================================
pub struct AllocationHeaderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AllocationHeaderRepository {
    /// 创建新的AllocationHeaderRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入分货单头, 返回自增ID
    ///
    /// # 参数
    /// - `header`: 分货单头对象 (id 字段忽略)
    ///
    /// # 返回
    /// - `Ok(id)`: 成功, 返回数据库生成的ID
    /// - `Err`: 失败, 返回错误信息
    pub fn insert(&self, header: &AllocationHeader) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO alloc_header (
                allocation_code, allocation_name, allocation_type,
                division_id, season, status,
                total_qty, total_stores, total_options,
                created_by, approved_by, executed_at,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &header.allocation_code,
                &header.allocation_name,
                header.allocation_type.to_db_str(),
                &header.division_id,
                &header.season,
                header.status.to_db_str(),
                header.total_qty,
                header.total_stores,
                header.total_options,
                &header.created_by,
                &header.approved_by,
                header.executed_at.as_ref().map(fmt_ts),
                fmt_ts(&header.created_at),
                fmt_ts(&header.updated_at),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// 按ID查询分货单头
    ///
    /// # 返回
    /// - `Ok(Some(AllocationHeader))`: 找到
    /// - `Ok(None)`: 未找到
    /// - `Err`: 数据库错误
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<AllocationHeader>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!("{} WHERE id = ?", Self::SELECT_SQL),
            params![id],
            Self::map_row,
        ) {
            Ok(header) => Ok(Some(header)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按分货单号查询
    pub fn find_by_code(&self, code: &str) -> RepositoryResult<Option<AllocationHeader>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!("{} WHERE allocation_code = ?", Self::SELECT_SQL),
            params![code],
            Self::map_row,
        ) {
            Ok(header) => Ok(Some(header)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 分页查询分货单列表, 按创建时间降序
    ///
    /// # 参数
    /// - `status`: 可选状态过滤
    /// - `limit` / `offset`: 分页参数
    pub fn list(
        &self,
        status: Option<AllocationStatus>,
        limit: i64,
        offset: i64,
    ) -> RepositoryResult<Vec<AllocationHeader>> {
        let conn = self.get_conn()?;

        let headers = match status {
            Some(s) => {
                let mut stmt = conn.prepare(&format!(
                    "{} WHERE status = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                    Self::SELECT_SQL
                ))?;
                let rows = stmt
                    .query_map(params![s.to_db_str(), limit, offset], Self::map_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "{} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                    Self::SELECT_SQL
                ))?;
                let rows = stmt
                    .query_map(params![limit, offset], Self::map_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };

        Ok(headers)
    }

    /// 更新状态
    ///
    /// 说明: 状态机校验由 API 层负责, 这里只落库
    pub fn update_status(
        &self,
        id: i64,
        status: AllocationStatus,
        now: &NaiveDateTime,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let rows = conn.execute(
            "UPDATE alloc_header SET status = ?, updated_at = ? WHERE id = ?",
            params![status.to_db_str(), fmt_ts(now), id],
        )?;

        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "AllocationHeader".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// 更新审批人并置为 APPROVED
    pub fn mark_approved(
        &self,
        id: i64,
        approved_by: &str,
        now: &NaiveDateTime,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let rows = conn.execute(
            "UPDATE alloc_header SET status = ?, approved_by = ?, updated_at = ? WHERE id = ?",
            params![
                AllocationStatus::Approved.to_db_str(),
                approved_by,
                fmt_ts(now),
                id
            ],
        )?;

        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "AllocationHeader".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// 记录执行时间并置为 EXECUTED
    pub fn mark_executed(&self, id: i64, now: &NaiveDateTime) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let rows = conn.execute(
            "UPDATE alloc_header SET status = ?, executed_at = ?, updated_at = ? WHERE id = ?",
            params![
                AllocationStatus::Executed.to_db_str(),
                fmt_ts(now),
                fmt_ts(now),
                id
            ],
        )?;

        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "AllocationHeader".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// 回写汇总字段并更新状态 (分货计算完成时调用)
    pub fn finalize_run(
        &self,
        id: i64,
        status: AllocationStatus,
        total_qty: i64,
        total_stores: i64,
        total_options: i64,
        now: &NaiveDateTime,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let rows = conn.execute(
            r#"UPDATE alloc_header
               SET status = ?, total_qty = ?, total_stores = ?, total_options = ?,
                   updated_at = ?
               WHERE id = ?"#,
            params![
                status.to_db_str(),
                total_qty,
                total_stores,
                total_options,
                fmt_ts(now),
                id
            ],
        )?;

        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "AllocationHeader".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// 按明细 final_qty 合计回写 total_qty (人工修正后调用)
    ///
    /// # 返回
    /// - `Ok(total_qty)`: 回写后的合计值
    pub fn recompute_total_qty(&self, id: i64, now: &NaiveDateTime) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"UPDATE alloc_header
               SET total_qty = (
                   SELECT IFNULL(SUM(final_qty), 0) FROM alloc_detail WHERE allocation_id = ?1
               ),
                   updated_at = ?2
               WHERE id = ?1"#,
            params![id, fmt_ts(now)],
        )?;

        let total: i64 = conn.query_row(
            "SELECT total_qty FROM alloc_header WHERE id = ?",
            params![id],
            |row| row.get(0),
        )?;

        Ok(total)
    }

    const SELECT_SQL: &'static str = r#"SELECT id, allocation_code, allocation_name, allocation_type,
                      division_id, season, status,
                      total_qty, total_stores, total_options,
                      created_by, approved_by, executed_at,
                      created_at, updated_at
               FROM alloc_header"#;

    /// 映射数据库行到AllocationHeader对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<AllocationHeader> {
        let type_raw: String = row.get(3)?;
        let status_raw: String = row.get(6)?;

        Ok(AllocationHeader {
            id: row.get(0)?,
            allocation_code: row.get(1)?,
            allocation_name: row.get(2)?,
            allocation_type: AllocationType::from_str(&type_raw)
                .ok_or_else(|| enum_parse_error(3, &type_raw, "分货单类型"))?,
            division_id: row.get(4)?,
            season: row.get(5)?,
            status: AllocationStatus::from_str(&status_raw)
                .ok_or_else(|| enum_parse_error(6, &status_raw, "分货单状态"))?,
            total_qty: row.get(7)?,
            total_stores: row.get(8)?,
            total_options: row.get(9)?,
            created_by: row.get(10)?,
            approved_by: row.get(11)?,
            executed_at: row
                .get::<_, Option<String>>(12)?
                .map(|raw| parse_ts(12, &raw))
                .transpose()?,
            created_at: parse_ts(13, &row.get::<_, String>(13)?)?,
            updated_at: parse_ts(14, &row.get::<_, String>(14)?)?,
        })
    }
}
