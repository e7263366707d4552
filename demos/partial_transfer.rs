//! # 部分轉移完整範例
//!
//! 這個範例展示揀貨單分批轉入 WIP 的完整流程：
//! - 工單：1 台腳踏車，需要 100 kg 鋼材
//! - 揀貨：揀 60 kg，分兩次轉移
//! - 取消：第二張異動單取消後由背景工作回復結餘
//! - 生產：補齊後入庫並彙總成本

use rust_decimal::Decimal;
use shopfloor::*;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("🚲 ===== 部分轉移範例 =====");
    println!();

    // ========== 1. 建立主檔 ==========
    println!("📦 步驟 1: 建立料件與 BOM");
    let mut store = MemoryStore::new();
    store.add_item(
        Item::new("STEEL", "Kg")
            .with_item_name("Steel bar")
            .with_valuation_rate(Decimal::from(10)),
    );
    store.add_item(
        Item::new("CHIPS", "Kg")
            .with_item_name("Steel chips")
            .with_valuation_rate(Decimal::from(5)),
    );
    store.add_bom(
        Bom::new("BOM-BIKE-001", "BIKE", Decimal::ONE)
            .with_item("STEEL", Decimal::from(100))
            .with_scrap_item("CHIPS", Decimal::from(20), Decimal::ZERO),
    );
    println!("   ✓ STEEL 10/kg, CHIPS 5/kg");
    println!("   ✓ BOM-BIKE-001: 100 kg STEEL，廢料 20 kg CHIPS");
    println!();

    // ========== 2. 啟動檢查 ==========
    println!("⚙️  步驟 2: 檢查欄位結構");
    let config = ReconcileConfig::new();
    config.verify(&store)?;
    let hooks = LifecycleHooks::new(config.clone());
    let api = ShopfloorApi::new(config);
    println!("   ✓ 客製欄位齊全");
    println!();

    // ========== 3. 建立工單 ==========
    println!("🔧 步驟 3: 建立並提交工單");
    let mut wo = WorkOrder::new("WO-0001", "BIKE", Decimal::ONE)
        .with_company("Factory")
        .with_bom("BOM-BIKE-001")
        .with_source_warehouse("Stores")
        .with_wip_warehouse("WIP")
        .with_fg_warehouse("FG")
        .with_scrap_warehouse("Scrap")
        .with_operating_cost(Decimal::from(50));
    hooks.work_order_before_insert(&store, &mut wo)?;
    hooks.work_order_validate(&store, &mut wo)?;
    wo.docstatus = DocStatus::Submitted;
    hooks.work_order_on_submit(&mut wo);
    println!("   ✓ {} 狀態: {}", wo.name, wo.status.as_str());
    println!("   ✓ 廢料估價: {}", wo.scrap_items[0].amount);
    store.add_work_order(wo);
    println!();

    // ========== 4. 揀貨 ==========
    println!("🧺 步驟 4: 由工單建立揀貨單（揀 60 kg）");
    let mut pl = api.make_pick_list(&store, "WO-0001")?;
    pl.locations[0].qty = Decimal::from(60);
    hooks.pick_list_validate(&mut pl);
    let pick_list = store.insert_pick_list(pl)?;
    store.submit_pick_list(&pick_list)?;
    hooks.pick_list_on_submit(&mut store, &pick_list);
    print_balance(&api, &store, &pick_list)?;
    println!();

    // ========== 5. 分批轉移 ==========
    println!("🚚 步驟 5: 分兩次轉入 WIP");
    transfer(&api, &hooks, &mut store, &pick_list, Decimal::from(25))?;
    print_balance(&api, &store, &pick_list)?;
    let second = transfer(&api, &hooks, &mut store, &pick_list, Decimal::from(35))?;
    print_balance(&api, &store, &pick_list)?;
    println!();

    // ========== 6. 取消 ==========
    println!("↩️  步驟 6: 取消第二張異動單");
    store.cancel_stock_entry(&second)?;
    let mut queue = MemoryQueue::new();
    hooks.stock_entry_on_cancel(&mut queue, &second);
    println!("   ✓ 已排入背景工作 {} 筆", queue.len());
    let reports = JobRunner::new(hooks.reconciler()).drain(&mut store, &mut queue);
    println!("   ✓ 背景重算完成，寫入 {} 個欄位", reports.iter().map(|r| r.writes).sum::<usize>());
    print_balance(&api, &store, &pick_list)?;
    println!();

    // ========== 7. 補齊並生產 ==========
    println!("🏭 步驟 7: 補齊揀貨並生產入庫");
    transfer(&api, &hooks, &mut store, &pick_list, Decimal::from(35))?;
    let mut topup = api.make_pick_list(&store, "WO-0001")?;
    topup.locations[0].qty = Decimal::from(40);
    hooks.pick_list_validate(&mut topup);
    let topup_name = store.insert_pick_list(topup)?;
    store.submit_pick_list(&topup_name)?;
    hooks.pick_list_on_submit(&mut store, &topup_name);
    transfer(&api, &hooks, &mut store, &topup_name, Decimal::from(40))?;

    let mut entry = api.make_manufacture_entry(&store, "WO-0001", None)?;
    for row in entry.items.iter_mut().filter(|r| r.is_raw_material()) {
        row.basic_rate = Decimal::from(10);
    }
    let manufacture = store.insert_stock_entry(entry)?;
    submit(&hooks, &mut store, &manufacture)?;
    println!();

    // ========== 8. 顯示結果 ==========
    println!("📊 步驟 8: 工單結果");
    let wo = store.work_order("WO-0001")?;
    println!("   狀態: {}", wo.status.as_str());
    println!("   已生產: {}", wo.produced_qty);
    println!("   原料成本: {}", wo.costing.raw_material_cost);
    println!("   廢料成本: {}", wo.costing.scrap_material_cost);
    println!("   作業成本: {}", wo.costing.operating_cost);
    println!("   總成本: {}", wo.costing.total_cost);

    let view = api.get_work_order_balance(&store, "WO-0001")?;
    println!("   揀貨需求 {} / 已揀 {} / 結餘 {}", view.total_required, view.total_picked, view.total_balance);

    if !store.error_log().is_empty() {
        println!();
        println!("⚠️  錯誤紀錄:");
        for entry in store.error_log() {
            println!("   - {}: {}", entry.title, entry.message);
        }
    }

    Ok(())
}

/// 建立部分轉移異動單並提交
fn transfer(
    api: &ShopfloorApi,
    hooks: &LifecycleHooks,
    store: &mut MemoryStore,
    pick_list: &str,
    qty: Decimal,
) -> anyhow::Result<String> {
    let row = store.pick_list(pick_list)?.locations[0].name.clone();
    let items = serde_json::json!([{ "pl_item_name": row, "qty": qty }]).to_string();
    let name = api.make_partial_stock_entry_from_pick_list(store, pick_list, &items)?;
    submit(hooks, store, &name)?;
    println!("   ✓ {} 轉移 {} kg", name, qty);
    Ok(name)
}

fn submit(hooks: &LifecycleHooks, store: &mut MemoryStore, name: &str) -> anyhow::Result<()> {
    let mut entry = store.stock_entry(name)?;
    hooks.stock_entry_validate(&*store, &mut entry)?;
    store.add_stock_entry(entry);
    store.submit_stock_entry(name)?;

    let report = hooks.stock_entry_on_submit(store, name);
    for failure in &report.failures {
        println!("   ⚠ {} {}: {}", failure.step, failure.name, failure.reason);
    }
    Ok(())
}

fn print_balance(api: &ShopfloorApi, store: &MemoryStore, pick_list: &str) -> anyhow::Result<()> {
    let pl = store.pick_list(pick_list)?;
    println!(
        "   {} 狀態: {}，已揀 {}，已轉移 {}，結餘 {}",
        pl.name,
        pl.status.as_str(),
        pl.total_qty,
        pl.consumed_qty,
        pl.balance_qty
    );
    for row in api.get_pick_list_balance_rows(store, pick_list)? {
        println!("     - {} {} 可轉移 {}", row.item_code, row.item_name, row.balance_qty);
    }
    Ok(())
}
