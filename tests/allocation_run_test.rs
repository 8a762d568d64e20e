// ==========================================
// 分货计算集成测试
// ==========================================
// 测试范围:
// 1. 三种分货策略的端到端计算与落库
// 2. 供给不变量: 任一SKU的 final_qty 合计 ≤ 大仓可用量
// 3. 单店上下限与总量上限
// ==========================================

mod test_helpers;

use std::collections::HashMap;

use store_allocation::domain::types::{AllocationBasis, AllocationStatus};
use test_helpers::*;

#[tokio::test]
async fn test_ratio_run_two_stores() {
    // A/B 两店 (权重 1.0/0.7), 单SKU供给 17 → A店10件, B店7件
    let (_tmp, conn) = create_test_db().expect("创建测试数据库失败");
    seed_store(&conn, "S001", "A");
    seed_store(&conn, "S002", "B");
    let ga = seed_gen_article(&conn, "GA001", None);
    seed_variant(&conn, ga, "V001", "M", "BLK");
    seed_warehouse_stock(&conn, "WH001", "V001", 20, 3);

    let api = build_api(conn);
    let response = api
        .run(base_run_request("首铺测试"))
        .await
        .expect("分货计算失败");

    assert!(response.allocation_code.starts_with("ALLOC_"));
    assert_eq!(response.status, "DRAFT");
    assert_eq!(response.summary.total_qty, 17);
    assert_eq!(response.summary.total_stores, 2);
    assert_eq!(response.summary.total_variants, 1);

    let details = api
        .get_details(response.allocation_id, 1, 100, None, None)
        .expect("明细查询失败");
    assert_eq!(details.total, 2);

    let by_store: HashMap<String, i64> = details
        .rows
        .iter()
        .map(|r| (r.store_code.clone(), r.final_qty))
        .collect();
    assert_eq!(by_store["S001"], 10);
    assert_eq!(by_store["S002"], 7);

    // 等级快照与分货依据
    assert!(details.rows.iter().all(|r| r.allocation_basis == AllocationBasis::Ratio));
    assert!(details
        .rows
        .iter()
        .any(|r| r.store_code == "S001" && r.store_grade == "A"));

    let header = api.get_header(response.allocation_id).expect("查询头失败");
    assert_eq!(header.status, AllocationStatus::Draft);
    assert_eq!(header.total_qty, 17);
}

#[tokio::test]
async fn test_run_never_exceeds_variant_supply() {
    // 多门店多SKU, 任一SKU的 final_qty 合计不得超过其可用量
    let (_tmp, conn) = create_test_db().expect("创建测试数据库失败");
    for i in 0..9 {
        let grade = ["A", "B", "C"][i % 3];
        seed_store(&conn, &format!("S{:03}", i), grade);
    }
    let ga = seed_gen_article(&conn, "GA001", None);
    let supplies = [("V001", 13), ("V002", 7), ("V003", 101)];
    for (code, qty) in supplies {
        seed_variant(&conn, ga, code, "M", "BLK");
        seed_warehouse_stock(&conn, "WH001", code, qty, 0);
    }

    let api = build_api(conn);
    let response = api
        .run(base_run_request("供给不变量"))
        .await
        .expect("分货计算失败");

    let details = api
        .get_details(response.allocation_id, 1, 1000, None, None)
        .expect("明细查询失败");

    let mut per_variant: HashMap<String, i64> = HashMap::new();
    for row in &details.rows {
        *per_variant.entry(row.variant_code.clone()).or_default() += row.final_qty;
        assert!(row.final_qty > 0, "不允许落库零数量行");
    }
    for (code, qty) in supplies {
        assert!(
            per_variant.get(code).copied().unwrap_or(0) <= qty,
            "SKU {} 分货量超过供给 {}",
            code,
            qty
        );
    }
}

#[tokio::test]
async fn test_unknown_grade_uses_fallback_ratio() {
    // 目录外等级按 0.3 权重参与: A=1.0, E=0.3, 供给13 → A店10, E店3
    let (_tmp, conn) = create_test_db().expect("创建测试数据库失败");
    seed_store(&conn, "S001", "A");
    seed_store(&conn, "S002", "E");
    let ga = seed_gen_article(&conn, "GA001", None);
    seed_variant(&conn, ga, "V001", "M", "BLK");
    seed_warehouse_stock(&conn, "WH001", "V001", 13, 0);

    let api = build_api(conn);
    let response = api
        .run(base_run_request("未知等级"))
        .await
        .expect("分货计算失败");

    let details = api
        .get_details(response.allocation_id, 1, 100, None, None)
        .expect("明细查询失败");
    let by_store: HashMap<String, i64> = details
        .rows
        .iter()
        .map(|r| (r.store_code.clone(), r.final_qty))
        .collect();
    assert_eq!(by_store["S001"], 10);
    assert_eq!(by_store["S002"], 3);
}

#[tokio::test]
async fn test_per_store_max_clips_rows() {
    let (_tmp, conn) = create_test_db().expect("创建测试数据库失败");
    seed_store(&conn, "S001", "A");
    seed_store(&conn, "S002", "A");
    let ga = seed_gen_article(&conn, "GA001", None);
    seed_variant(&conn, ga, "V001", "M", "BLK");
    seed_warehouse_stock(&conn, "WH001", "V001", 40, 0);

    let api = build_api(conn);
    let mut request = base_run_request("单店上限");
    request.per_store_max = Some(8);
    let response = api.run(request).await.expect("分货计算失败");

    let details = api
        .get_details(response.allocation_id, 1, 100, None, None)
        .expect("明细查询失败");
    assert!(!details.rows.is_empty());
    assert!(details.rows.iter().all(|r| r.final_qty <= 8));
}

#[tokio::test]
async fn test_per_store_min_drops_small_rows() {
    // 下限是门槛: D店份额 round(10×0.2/1.2)=2 < 3, 整行剔除而不是补到3
    let (_tmp, conn) = create_test_db().expect("创建测试数据库失败");
    seed_store(&conn, "S001", "A");
    seed_store(&conn, "S002", "D");
    let ga = seed_gen_article(&conn, "GA001", None);
    seed_variant(&conn, ga, "V001", "M", "BLK");
    seed_warehouse_stock(&conn, "WH001", "V001", 10, 0);

    let api = build_api(conn);
    let mut request = base_run_request("单店下限");
    request.per_store_min = Some(3);
    let response = api.run(request).await.expect("分货计算失败");

    let details = api
        .get_details(response.allocation_id, 1, 100, None, None)
        .expect("明细查询失败");
    assert!(details
        .rows
        .iter()
        .all(|r| r.final_qty >= 3 || r.final_qty == 0));
    assert!(!details.rows.iter().any(|r| r.store_code == "S002"));
    assert!(details.rows.iter().any(|r| r.store_code == "S001"));
}

#[tokio::test]
async fn test_total_qty_limit_scales_down() {
    // 候选合计远超总量上限时全表等比缩放, 最终合计 ≤ 上限
    let (_tmp, conn) = create_test_db().expect("创建测试数据库失败");
    for i in 0..5 {
        seed_store(&conn, &format!("S{:03}", i), "A");
    }
    let ga = seed_gen_article(&conn, "GA001", None);
    for code in ["V001", "V002", "V003"] {
        seed_variant(&conn, ga, code, "M", "BLK");
        seed_warehouse_stock(&conn, "WH001", code, 50, 0);
    }

    let api = build_api(conn);
    let mut request = base_run_request("总量上限");
    request.total_qty_limit = Some(100);
    let response = api.run(request).await.expect("分货计算失败");

    assert!(
        response.summary.total_qty <= 100,
        "合计{}超过总量上限",
        response.summary.total_qty
    );
    assert!(response.summary.total_qty >= 90);
}

#[tokio::test]
async fn test_stock_need_prefers_larger_gap() {
    // A店库存2 (目标10, 缺口8) vs C店库存0 (目标4, 缺口4), 供给5
    // → 缺口大的A店拿满5件, C店不分货
    let (_tmp, conn) = create_test_db().expect("创建测试数据库失败");
    seed_store(&conn, "S001", "A");
    seed_store(&conn, "S002", "C");
    let ga = seed_gen_article(&conn, "GA001", None);
    seed_variant(&conn, ga, "V001", "M", "BLK");
    seed_warehouse_stock(&conn, "WH001", "V001", 5, 0);
    seed_store_stock(&conn, "S001", "V001", 2);
    seed_store_stock(&conn, "S002", "V001", 0);

    let api = build_api(conn);
    let mut request = base_run_request("库存缺口");
    request.basis = AllocationBasis::Stock;
    let response = api.run(request).await.expect("分货计算失败");

    let details = api
        .get_details(response.allocation_id, 1, 100, None, None)
        .expect("明细查询失败");
    assert_eq!(details.total, 1);
    assert_eq!(details.rows[0].store_code, "S001");
    assert_eq!(details.rows[0].final_qty, 5);
    assert_eq!(details.rows[0].allocation_basis, AllocationBasis::Stock);
}

#[tokio::test]
async fn test_sales_run_proportional_and_fallback() {
    // V001 窗口内销量 30:10 → 按占比切分8件 (6/2);
    // V002 无销售历史 → 等级比例均分兜底并打 SALES_FALLBACK 标记
    let (_tmp, conn) = create_test_db().expect("创建测试数据库失败");
    seed_store(&conn, "S001", "A");
    seed_store(&conn, "S002", "A");
    let ga = seed_gen_article(&conn, "GA001", None);
    seed_variant(&conn, ga, "V001", "M", "BLK");
    seed_variant(&conn, ga, "V002", "L", "BLK");
    seed_warehouse_stock(&conn, "WH001", "V001", 8, 0);
    seed_warehouse_stock(&conn, "WH001", "V002", 6, 0);
    seed_store_sales(&conn, "S001", "V001", 5, 30);
    seed_store_sales(&conn, "S002", "V001", 5, 10);

    let api = build_api(conn);
    let mut request = base_run_request("销售占比");
    request.basis = AllocationBasis::Sales;
    let response = api.run(request).await.expect("分货计算失败");

    let details = api
        .get_details(response.allocation_id, 1, 100, None, None)
        .expect("明细查询失败");

    let v1_rows: Vec<_> = details
        .rows
        .iter()
        .filter(|r| r.variant_code == "V001")
        .collect();
    let by_store: HashMap<String, i64> = v1_rows
        .iter()
        .map(|r| (r.store_code.clone(), r.final_qty))
        .collect();
    assert_eq!(by_store["S001"], 6);
    assert_eq!(by_store["S002"], 2);
    assert!(v1_rows.iter().all(|r| r.allocation_basis == AllocationBasis::Sales));

    let v2_rows: Vec<_> = details
        .rows
        .iter()
        .filter(|r| r.variant_code == "V002")
        .collect();
    assert!(!v2_rows.is_empty());
    assert!(v2_rows
        .iter()
        .all(|r| r.allocation_basis == AllocationBasis::SalesFallback));
}

#[tokio::test]
async fn test_sales_window_excludes_old_history() {
    // 仅40天前的销量: 默认30天窗口内无销售 → 兜底分货
    let (_tmp, conn) = create_test_db().expect("创建测试数据库失败");
    seed_store(&conn, "S001", "A");
    let ga = seed_gen_article(&conn, "GA001", None);
    seed_variant(&conn, ga, "V001", "M", "BLK");
    seed_warehouse_stock(&conn, "WH001", "V001", 10, 0);
    seed_store_sales(&conn, "S001", "V001", 40, 99);

    let api = build_api(conn);
    let mut request = base_run_request("过期销量");
    request.basis = AllocationBasis::Sales;
    let response = api.run(request).await.expect("分货计算失败");

    let details = api
        .get_details(response.allocation_id, 1, 100, None, None)
        .expect("明细查询失败");
    assert!(details
        .rows
        .iter()
        .all(|r| r.allocation_basis == AllocationBasis::SalesFallback));
}

#[tokio::test]
async fn test_reserved_qty_reduces_supply() {
    // 在库20, 预留20 → 可用0, 无候选行, 分货单以 DRAFT + 合计0 完成
    let (_tmp, conn) = create_test_db().expect("创建测试数据库失败");
    seed_store(&conn, "S001", "A");
    let ga = seed_gen_article(&conn, "GA001", None);
    seed_variant(&conn, ga, "V001", "M", "BLK");
    seed_warehouse_stock(&conn, "WH001", "V001", 20, 20);

    let api = build_api(conn);
    let response = api
        .run(base_run_request("零供给"))
        .await
        .expect("零行结果不应报错");

    assert_eq!(response.status, "DRAFT");
    assert_eq!(response.summary.total_qty, 0);

    let header = api.get_header(response.allocation_id).expect("查询头失败");
    assert_eq!(header.status, AllocationStatus::Draft);
    assert_eq!(header.total_qty, 0);

    let details = api
        .get_details(response.allocation_id, 1, 100, None, None)
        .expect("明细查询失败");
    assert_eq!(details.total, 0);
}

#[tokio::test]
async fn test_eligibility_filters_restrict_run() {
    // 等级过滤 + 无效门店排除 + 季节过滤共同生效
    let (_tmp, conn) = create_test_db().expect("创建测试数据库失败");
    seed_store(&conn, "S001", "A");
    seed_store(&conn, "S002", "B");
    seed_inactive_store(&conn, "S003", "A");
    let ga_ss = seed_gen_article(&conn, "GA-SS", Some("SS26"));
    let ga_fw = seed_gen_article(&conn, "GA-FW", Some("FW26"));
    seed_variant(&conn, ga_ss, "V-SS", "M", "BLK");
    seed_variant(&conn, ga_fw, "V-FW", "M", "BLK");
    seed_warehouse_stock(&conn, "WH001", "V-SS", 10, 0);
    seed_warehouse_stock(&conn, "WH001", "V-FW", 10, 0);

    let api = build_api(conn);
    let mut request = base_run_request("过滤测试");
    request.store_grades = Some(vec!["A".to_string()]);
    request.season = Some("SS26".to_string());
    let response = api.run(request).await.expect("分货计算失败");

    let details = api
        .get_details(response.allocation_id, 1, 100, None, None)
        .expect("明细查询失败");
    assert!(details.rows.iter().all(|r| r.store_code == "S001"));
    assert!(details.rows.iter().all(|r| r.variant_code == "V-SS"));
}
