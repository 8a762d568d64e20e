// ==========================================
// 零售门店分货系统 - 操作日志仓储
// ==========================================
// 约束: Repository 不做业务逻辑, 只做数据映射
// 约束: 日志写入失败由调用方决定是否吞掉, 仓储如实上抛
// ==========================================

use crate::domain::action_log::ActionLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// ActionLogRepository - 操作日志仓储
// ==========================================
pub struct ActionLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ActionLogRepository {
    /// 创建新的操作日志仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入操作日志
    ///
    /// # 参数
    /// - `log`: 操作日志实体
    ///
    /// # 返回
    /// - `Ok(action_id)`: 成功插入, 返回action_id
    /// - `Err(...)`: 数据库错误
    pub fn insert(&self, log: &ActionLog) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO action_log (
                action_id, allocation_id, action_type, action_ts, actor,
                payload_json, detail
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                log.action_id,
                log.allocation_id,
                log.action_type,
                log.action_ts.format("%Y-%m-%d %H:%M:%S").to_string(),
                log.actor,
                log.payload_json.as_ref().map(|v| v.to_string()),
                log.detail,
            ],
        )?;

        Ok(log.action_id.clone())
    }

    /// 查询指定分货单的操作日志, 按时间升序
    pub fn list_by_allocation(&self, allocation_id: i64) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT action_id, allocation_id, action_type, action_ts, actor,
                      payload_json, detail
               FROM action_log
               WHERE allocation_id = ?
               ORDER BY action_ts, action_id"#,
        )?;
        let logs = stmt
            .query_map(params![allocation_id], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(logs)
    }

    /// 映射数据库行到ActionLog对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<ActionLog> {
        let ts_raw: String = row.get(3)?;
        let payload_raw: Option<String> = row.get(5)?;

        Ok(ActionLog {
            action_id: row.get(0)?,
            allocation_id: row.get(1)?,
            action_type: row.get(2)?,
            action_ts: NaiveDateTime::parse_from_str(&ts_raw, "%Y-%m-%d %H:%M:%S").map_err(
                |e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        3,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                },
            )?,
            actor: row.get(4)?,
            payload_json: payload_raw.and_then(|raw| serde_json::from_str(&raw).ok()),
            detail: row.get(6)?,
        })
    }
}
