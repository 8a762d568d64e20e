// ==========================================
// 零售门店分货系统 - 商品目录仓储
// ==========================================
// 职责: 款/SKU 目录的只读访问, 供准入引擎筛选
// 商品层级: SKU 必须关联有效的款, 两级 is_active 同时生效
// ==========================================

use crate::domain::article::Variant;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{Connection, ToSql};
use std::sync::{Arc, Mutex};

// ==========================================
// VariantRepository - SKU 目录仓储
// ==========================================
pub struct VariantRepository {
    conn: Arc<Mutex<Connection>>,
}

impl VariantRepository {
    /// 创建新的VariantRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询符合条件的有效 SKU (关联款)
    ///
    /// 过滤条件全部为可选, 同时给出时取交集;
    /// SKU 与所属款任一无效则排除。
    ///
    /// # 参数
    /// - `gen_article_ids`: 款ID白名单
    /// - `gen_article_codes`: 款号白名单
    /// - `division_id`: 款所属事业部
    /// - `season`: 款所属季节
    ///
    /// # 返回
    /// - `Ok(Vec<Variant>)`: 按款号、SKU代码升序
    pub fn find_eligible(
        &self,
        gen_article_ids: Option<&[i64]>,
        gen_article_codes: Option<&[String]>,
        division_id: Option<i64>,
        season: Option<&str>,
    ) -> RepositoryResult<Vec<Variant>> {
        let conn = self.get_conn()?;

        let mut sql = String::from(
            r#"SELECT v.id, v.variant_code, v.gen_article_id, g.gen_article_code,
                      v.size_code, v.color_code, v.is_active
               FROM variant_article v
               JOIN gen_article g ON g.id = v.gen_article_id
               WHERE v.is_active = 1 AND g.is_active = 1"#,
        );
        let mut params: Vec<&dyn ToSql> = Vec::new();

        if let Some(ids) = gen_article_ids {
            if !ids.is_empty() {
                sql.push_str(&format!(
                    " AND g.id IN ({})",
                    vec!["?"; ids.len()].join(", ")
                ));
                for id in ids {
                    params.push(id);
                }
            }
        }
        if let Some(codes) = gen_article_codes {
            if !codes.is_empty() {
                sql.push_str(&format!(
                    " AND g.gen_article_code IN ({})",
                    vec!["?"; codes.len()].join(", ")
                ));
                for code in codes {
                    params.push(code);
                }
            }
        }
        if let Some(ref div) = division_id {
            sql.push_str(" AND g.division_id = ?");
            params.push(div);
        }
        if let Some(ref s) = season {
            sql.push_str(" AND g.season = ?");
            params.push(s);
        }

        sql.push_str(" ORDER BY g.gen_article_code, v.variant_code");

        let mut stmt = conn.prepare(&sql)?;
        let variants = stmt
            .query_map(&params[..], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(variants)
    }

    /// 映射数据库行到Variant对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Variant> {
        Ok(Variant {
            id: row.get(0)?,
            variant_code: row.get(1)?,
            gen_article_id: row.get(2)?,
            gen_article_code: row.get(3)?,
            size_code: row.get(4)?,
            color_code: row.get(5)?,
            is_active: row.get::<_, i64>(6)? != 0,
        })
    }
}
