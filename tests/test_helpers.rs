// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、基础数据播种、API 装配
// ==========================================

#![allow(dead_code)]

use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

use store_allocation::api::dto::AllocationRunRequest;
use store_allocation::api::AllocationApi;
use store_allocation::config::ConfigManager;
use store_allocation::domain::types::{AllocationBasis, AllocationType};
use store_allocation::engine::{AllocationOrchestrator, EligibilityEngine, SupplyResolver};
use store_allocation::repository::{
    ActionLogRepository, AllocationDetailRepository, AllocationHeaderRepository,
    StoreRepository, StoreSalesRepository, StoreStockRepository, VariantRepository,
    WarehouseStockRepository,
};

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - Arc<Mutex<Connection>>: 共享连接
pub fn create_test_db() -> Result<(NamedTempFile, Arc<Mutex<Connection>>), Box<dyn Error>> {
    store_allocation::logging::init_test();

    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = store_allocation::db::open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, Arc::new(Mutex::new(conn))))
}

/// 初始化数据库 schema
fn init_schema(conn: &Connection) -> Result<(), Box<dyn Error>> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        INSERT OR IGNORE INTO schema_version (version) VALUES (1);

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS store (
            store_code TEXT PRIMARY KEY,
            store_name TEXT NOT NULL,
            store_grade TEXT,
            region TEXT,
            hub TEXT,
            division_id INTEGER,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS gen_article (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            gen_article_code TEXT NOT NULL UNIQUE,
            article_name TEXT NOT NULL,
            division_id INTEGER,
            season TEXT,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS variant_article (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            variant_code TEXT NOT NULL UNIQUE,
            gen_article_id INTEGER NOT NULL REFERENCES gen_article(id),
            size_code TEXT NOT NULL,
            color_code TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS warehouse_stock (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            warehouse_code TEXT NOT NULL,
            variant_code TEXT NOT NULL,
            stock_qty INTEGER NOT NULL DEFAULT 0,
            reserved_qty INTEGER NOT NULL DEFAULT 0,
            UNIQUE(warehouse_code, variant_code)
        );

        CREATE TABLE IF NOT EXISTS store_stock (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            store_code TEXT NOT NULL,
            variant_code TEXT NOT NULL,
            stock_qty INTEGER NOT NULL DEFAULT 0,
            reserved_qty INTEGER NOT NULL DEFAULT 0,
            UNIQUE(store_code, variant_code)
        );

        CREATE TABLE IF NOT EXISTS store_sales (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            store_code TEXT NOT NULL,
            variant_code TEXT NOT NULL,
            sale_date TEXT NOT NULL,
            qty_sold INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS alloc_header (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            allocation_code TEXT NOT NULL UNIQUE,
            allocation_name TEXT NOT NULL,
            allocation_type TEXT NOT NULL,
            division_id INTEGER,
            season TEXT,
            status TEXT NOT NULL,
            total_qty INTEGER NOT NULL DEFAULT 0,
            total_stores INTEGER NOT NULL DEFAULT 0,
            total_options INTEGER NOT NULL DEFAULT 0,
            created_by TEXT NOT NULL,
            approved_by TEXT,
            executed_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS alloc_detail (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            allocation_id INTEGER NOT NULL REFERENCES alloc_header(id),
            store_code TEXT NOT NULL,
            store_grade TEXT NOT NULL,
            gen_article_id INTEGER NOT NULL,
            gen_article_code TEXT NOT NULL,
            variant_id INTEGER NOT NULL,
            variant_code TEXT NOT NULL,
            size_code TEXT NOT NULL,
            color_code TEXT NOT NULL,
            allocated_qty INTEGER NOT NULL DEFAULT 0,
            override_qty INTEGER,
            final_qty INTEGER NOT NULL DEFAULT 0,
            allocation_basis TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_alloc_detail_allocation
            ON alloc_detail(allocation_id);

        CREATE TABLE IF NOT EXISTS action_log (
            action_id TEXT PRIMARY KEY,
            allocation_id INTEGER,
            action_type TEXT NOT NULL,
            action_ts TEXT NOT NULL,
            actor TEXT NOT NULL,
            payload_json TEXT,
            detail TEXT
        );
        "#,
    )?;

    Ok(())
}

// ==========================================
// 基础数据播种
// ==========================================

/// 插入门店
pub fn seed_store(conn: &Arc<Mutex<Connection>>, store_code: &str, grade: &str) {
    let conn = conn.lock().unwrap();
    conn.execute(
        "INSERT INTO store (store_code, store_name, store_grade, is_active) VALUES (?, ?, ?, 1)",
        params![store_code, format!("门店{}", store_code), grade],
    )
    .expect("插入门店失败");
}

/// 插入无效门店 (准入应排除)
pub fn seed_inactive_store(conn: &Arc<Mutex<Connection>>, store_code: &str, grade: &str) {
    let conn = conn.lock().unwrap();
    conn.execute(
        "INSERT INTO store (store_code, store_name, store_grade, is_active) VALUES (?, ?, ?, 0)",
        params![store_code, format!("门店{}", store_code), grade],
    )
    .expect("插入门店失败");
}

/// 插入款, 返回款ID
pub fn seed_gen_article(conn: &Arc<Mutex<Connection>>, code: &str, season: Option<&str>) -> i64 {
    let conn = conn.lock().unwrap();
    conn.execute(
        "INSERT INTO gen_article (gen_article_code, article_name, season, is_active) VALUES (?, ?, ?, 1)",
        params![code, format!("商品{}", code), season],
    )
    .expect("插入款失败");
    conn.last_insert_rowid()
}

/// 插入SKU, 返回SKU ID
pub fn seed_variant(
    conn: &Arc<Mutex<Connection>>,
    gen_article_id: i64,
    variant_code: &str,
    size_code: &str,
    color_code: &str,
) -> i64 {
    let conn = conn.lock().unwrap();
    conn.execute(
        "INSERT INTO variant_article (variant_code, gen_article_id, size_code, color_code, is_active) VALUES (?, ?, ?, ?, 1)",
        params![variant_code, gen_article_id, size_code, color_code],
    )
    .expect("插入SKU失败");
    conn.last_insert_rowid()
}

/// 插入大仓库存
pub fn seed_warehouse_stock(
    conn: &Arc<Mutex<Connection>>,
    warehouse_code: &str,
    variant_code: &str,
    stock_qty: i64,
    reserved_qty: i64,
) {
    let conn = conn.lock().unwrap();
    conn.execute(
        "INSERT INTO warehouse_stock (warehouse_code, variant_code, stock_qty, reserved_qty) VALUES (?, ?, ?, ?)",
        params![warehouse_code, variant_code, stock_qty, reserved_qty],
    )
    .expect("插入大仓库存失败");
}

/// 插入门店库存
pub fn seed_store_stock(
    conn: &Arc<Mutex<Connection>>,
    store_code: &str,
    variant_code: &str,
    stock_qty: i64,
) {
    let conn = conn.lock().unwrap();
    conn.execute(
        "INSERT INTO store_stock (store_code, variant_code, stock_qty, reserved_qty) VALUES (?, ?, ?, 0)",
        params![store_code, variant_code, stock_qty],
    )
    .expect("插入门店库存失败");
}

/// 插入门店销售记录 (days_ago 天前)
pub fn seed_store_sales(
    conn: &Arc<Mutex<Connection>>,
    store_code: &str,
    variant_code: &str,
    days_ago: i64,
    qty_sold: i64,
) {
    let sale_date = (chrono::Utc::now().date_naive() - chrono::Duration::days(days_ago))
        .format("%Y-%m-%d")
        .to_string();
    let conn = conn.lock().unwrap();
    conn.execute(
        "INSERT INTO store_sales (store_code, variant_code, sale_date, qty_sold) VALUES (?, ?, ?, ?)",
        params![store_code, variant_code, sale_date, qty_sold],
    )
    .expect("插入销售记录失败");
}

/// 写入 global scope 配置
pub fn seed_config(conn: &Arc<Mutex<Connection>>, key: &str, value: &str) {
    let conn = conn.lock().unwrap();
    conn.execute(
        "INSERT OR REPLACE INTO config_kv (scope_id, key, value) VALUES ('global', ?, ?)",
        params![key, value],
    )
    .expect("写入配置失败");
}

// ==========================================
// 请求构造
// ==========================================

/// 构造基础分货计算请求 (RATIO, 默认仓库, 无约束)
pub fn base_run_request(name: &str) -> AllocationRunRequest {
    AllocationRunRequest {
        allocation_name: name.to_string(),
        allocation_type: AllocationType::Initial,
        created_by: "tester".to_string(),
        division_id: None,
        season: None,
        basis: AllocationBasis::Ratio,
        gen_article_ids: None,
        gen_article_codes: None,
        store_codes: None,
        store_grades: None,
        warehouse_code: Some("WH001".to_string()),
        grade_ratios: None,
        size_curve: None,
        total_qty_limit: None,
        per_store_max: None,
        per_store_min: None,
        sales_lookback_days: None,
    }
}

// ==========================================
// API 装配
// ==========================================

/// 在共享连接上装配完整的 AllocationApi
pub fn build_api(conn: Arc<Mutex<Connection>>) -> AllocationApi<ConfigManager> {
    let store_repo = Arc::new(StoreRepository::new(conn.clone()));
    let variant_repo = Arc::new(VariantRepository::new(conn.clone()));
    let warehouse_stock_repo = Arc::new(WarehouseStockRepository::new(conn.clone()));
    let store_stock_repo = Arc::new(StoreStockRepository::new(conn.clone()));
    let sales_repo = Arc::new(StoreSalesRepository::new(conn.clone()));
    let header_repo = Arc::new(AllocationHeaderRepository::new(conn.clone()));
    let detail_repo = Arc::new(AllocationDetailRepository::new(conn.clone()));
    let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));

    let config =
        Arc::new(ConfigManager::from_connection(conn).expect("初始化 ConfigManager 失败"));

    let orchestrator = AllocationOrchestrator::new(
        config,
        EligibilityEngine::new(store_repo, variant_repo),
        SupplyResolver::new(warehouse_stock_repo),
        sales_repo,
        store_stock_repo,
    );

    AllocationApi::new(header_repo, detail_repo, action_log_repo, orchestrator)
}
