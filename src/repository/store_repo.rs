// ==========================================
// 零售门店分货系统 - 门店目录仓储
// ==========================================
// 职责: 门店目录的只读访问, 供准入引擎筛选
// 约束: 所有查询使用参数化, 防止 SQL 注入
// ==========================================

use crate::domain::store::Store;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{Connection, ToSql};
use std::sync::{Arc, Mutex};

// ==========================================
// StoreRepository - 门店目录仓储
// ==========================================
pub struct StoreRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StoreRepository {
    /// 创建新的StoreRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询符合条件的有效门店
    ///
    /// 过滤条件全部为可选, 同时给出时取交集; 无效门店始终排除。
    ///
    /// # 参数
    /// - `store_codes`: 门店代码白名单
    /// - `store_grades`: 门店等级白名单
    /// - `division_id`: 事业部范围
    ///
    /// # 返回
    /// - `Ok(Vec<Store>)`: 按门店代码升序
    pub fn find_eligible(
        &self,
        store_codes: Option<&[String]>,
        store_grades: Option<&[String]>,
        division_id: Option<i64>,
    ) -> RepositoryResult<Vec<Store>> {
        let conn = self.get_conn()?;

        let mut sql = String::from(
            r#"SELECT store_code, store_name, store_grade, region, hub, division_id, is_active
               FROM store
               WHERE is_active = 1"#,
        );
        let mut params: Vec<&dyn ToSql> = Vec::new();

        if let Some(codes) = store_codes {
            if !codes.is_empty() {
                sql.push_str(&format!(
                    " AND store_code IN ({})",
                    vec!["?"; codes.len()].join(", ")
                ));
                for code in codes {
                    params.push(code);
                }
            }
        }
        if let Some(grades) = store_grades {
            if !grades.is_empty() {
                sql.push_str(&format!(
                    " AND store_grade IN ({})",
                    vec!["?"; grades.len()].join(", ")
                ));
                for grade in grades {
                    params.push(grade);
                }
            }
        }
        if let Some(ref div) = division_id {
            sql.push_str(" AND division_id = ?");
            params.push(div);
        }

        sql.push_str(" ORDER BY store_code");

        let mut stmt = conn.prepare(&sql)?;
        let stores = stmt
            .query_map(&params[..], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(stores)
    }

    /// 映射数据库行到Store对象
    ///
    /// 说明: 目录未维护等级的门店按 C 级对待 (与分货权重的缺省口径一致)
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Store> {
        Ok(Store {
            store_code: row.get(0)?,
            store_name: row.get(1)?,
            store_grade: row
                .get::<_, Option<String>>(2)?
                .filter(|g| !g.is_empty())
                .unwrap_or_else(|| "C".to_string()),
            region: row.get(3)?,
            hub: row.get(4)?,
            division_id: row.get(5)?,
            is_active: row.get::<_, i64>(6)? != 0,
        })
    }
}
