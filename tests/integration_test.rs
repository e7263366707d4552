//! 集成測試

use rust_decimal::Decimal;
use shopfloor::*;

/// 單層 BOM：腳踏車需要 100 kg 鋼材，另產生廢料
fn setup() -> (MemoryStore, LifecycleHooks) {
    let mut store = MemoryStore::new();
    store.add_item(Item::new("STEEL", "Kg").with_item_name("Steel bar").with_valuation_rate(Decimal::from(10)));
    store.add_item(Item::new("CHIPS", "Kg").with_item_name("Steel chips").with_valuation_rate(Decimal::from(5)));
    store.add_bom(
        Bom::new("BOM-BIKE-001", "BIKE", Decimal::ONE)
            .with_item("STEEL", Decimal::from(100))
            .with_scrap_item("CHIPS", Decimal::from(20), Decimal::ZERO),
    );

    let hooks = LifecycleHooks::new(ReconcileConfig::new());
    hooks.reconciler().config().verify(&store).unwrap();

    let mut wo = WorkOrder::new("WO-0001", "BIKE", Decimal::ONE)
        .with_company("Factory")
        .with_bom("BOM-BIKE-001")
        .with_source_warehouse("Stores")
        .with_wip_warehouse("WIP")
        .with_fg_warehouse("FG")
        .with_scrap_warehouse("Scrap")
        .with_operating_cost(Decimal::from(50));
    hooks.work_order_before_insert(&store, &mut wo).unwrap();
    hooks.work_order_validate(&store, &mut wo).unwrap();
    wo.docstatus = DocStatus::Submitted;
    hooks.work_order_on_submit(&mut wo);
    store.add_work_order(wo);

    (store, hooks)
}

/// 由工單建立揀貨單（50 kg）並提交
fn submit_pick_list(store: &mut MemoryStore, hooks: &LifecycleHooks, qty: i64) -> String {
    let api = ShopfloorApi::default();
    let mut pl = api.make_pick_list(&*store, "WO-0001").unwrap();
    pl.locations[0].qty = Decimal::from(qty);
    hooks.pick_list_validate(&mut pl);

    let name = store.insert_pick_list(pl).unwrap();
    store.submit_pick_list(&name).unwrap();
    hooks.pick_list_on_submit(store, &name);
    name
}

/// 由揀貨單部分轉移並提交
fn transfer(store: &mut MemoryStore, hooks: &LifecycleHooks, pick_list: &str, qty: i64) -> String {
    let api = ShopfloorApi::default();
    let row = store.pick_list(pick_list).unwrap().locations[0].name.clone();
    let items = format!(r#"[{{"pl_item_name": "{}", "qty": {}}}]"#, row, qty);
    let name = api
        .make_partial_stock_entry_from_pick_list(store, pick_list, &items)
        .unwrap();

    let mut entry = store.stock_entry(&name).unwrap();
    hooks.stock_entry_validate(&*store, &mut entry).unwrap();
    store.add_stock_entry(entry);
    store.submit_stock_entry(&name).unwrap();
    let report = hooks.stock_entry_on_submit(store, &name);
    assert!(report.is_clean(), "{:?}", report.failures);
    name
}

#[test]
fn test_fresh_work_order_is_not_started() {
    let (store, _) = setup();
    let wo = store.work_order("WO-0001").unwrap();

    assert_eq!(wo.status, WorkOrderStatus::NotStarted);
    assert_eq!(wo.required_items.len(), 1);
    assert_eq!(wo.required_items[0].required_qty, Decimal::from(100));
    assert_eq!(wo.required_items[0].balance_to_transfer, Decimal::from(100));
    assert_eq!(wo.required_items[0].balance_to_consume, Decimal::from(100));

    // 廢料估價取料件評價單價
    assert_eq!(wo.scrap_items[0].rate, Decimal::from(5));
    assert_eq!(wo.scrap_items[0].amount, Decimal::from(100));
}

#[test]
fn test_partial_transfers_complete_pick_list() {
    let (mut store, hooks) = setup();
    let pl = submit_pick_list(&mut store, &hooks, 50);

    transfer(&mut store, &hooks, &pl, 20);
    let pick_list = store.pick_list(&pl).unwrap();
    assert_eq!(pick_list.locations[0].consumed_qty, Decimal::from(20));
    assert_eq!(pick_list.balance_qty, Decimal::from(30));
    assert_eq!(pick_list.status, PickListStatus::Open);

    let api = ShopfloorApi::default();
    let rows = api.get_pick_list_balance_rows(&store, &pl).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].balance_qty, Decimal::from(30));

    transfer(&mut store, &hooks, &pl, 30);
    let pick_list = store.pick_list(&pl).unwrap();
    assert_eq!(pick_list.balance_qty, Decimal::ZERO);
    assert_eq!(pick_list.status, PickListStatus::Completed);
    assert!(api.get_pick_list_balance_rows(&store, &pl).unwrap().is_empty());

    let wo = store.work_order("WO-0001").unwrap();
    assert_eq!(wo.status, WorkOrderStatus::InProcess);
    assert_eq!(wo.required_items[0].transferred_qty, Decimal::from(50));
    assert_eq!(wo.required_items[0].balance_to_transfer, Decimal::from(50));
    assert_eq!(wo.totals.total_pick_consumed_qty, Decimal::from(50));
}

#[test]
fn test_over_transfer_is_rejected() {
    let (mut store, hooks) = setup();
    let pl = submit_pick_list(&mut store, &hooks, 50);
    transfer(&mut store, &hooks, &pl, 45);

    let row = store.pick_list(&pl).unwrap().locations[0].name.clone();
    let items = format!(r#"[{{"pl_item_name": "{}", "qty": 6}}]"#, row);
    let err = ShopfloorApi::default()
        .make_partial_stock_entry_from_pick_list(&mut store, &pl, &items)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_cancel_restores_state_through_background_job() {
    let (mut store, hooks) = setup();
    let pl = submit_pick_list(&mut store, &hooks, 50);
    transfer(&mut store, &hooks, &pl, 20);
    let second = transfer(&mut store, &hooks, &pl, 30);

    store.cancel_stock_entry(&second).unwrap();
    let mut queue = MemoryQueue::new();
    hooks.stock_entry_on_cancel(&mut queue, &second);

    // 排入即返回，狀態尚未更新
    assert_eq!(queue.len(), 1);
    assert_eq!(store.pick_list(&pl).unwrap().status, PickListStatus::Completed);

    let reports = JobRunner::new(hooks.reconciler()).drain(&mut store, &mut queue);
    assert_eq!(reports.len(), 1);

    let pick_list = store.pick_list(&pl).unwrap();
    assert_eq!(pick_list.consumed_qty, Decimal::from(20));
    assert_eq!(pick_list.balance_qty, Decimal::from(30));
    assert_eq!(pick_list.status, PickListStatus::Open);
}

#[test]
fn test_reconciliation_is_idempotent() {
    let (mut store, hooks) = setup();
    let pl = submit_pick_list(&mut store, &hooks, 50);
    let entry = transfer(&mut store, &hooks, &pl, 20);

    let pl_before = store.pick_list(&pl).unwrap();
    let wo_before = store.work_order("WO-0001").unwrap();
    let writes_before = store.write_count();

    let report = hooks.stock_entry_on_submit(&mut store, &entry);
    assert_eq!(report.writes, 0);
    assert_eq!(store.write_count(), writes_before);

    let pl_after = store.pick_list(&pl).unwrap();
    let wo_after = store.work_order("WO-0001").unwrap();
    assert_eq!(pl_after.balance_qty, pl_before.balance_qty);
    assert_eq!(pl_after.status, pl_before.status);
    assert_eq!(wo_after.costing, wo_before.costing);
    assert_eq!(wo_after.totals, wo_before.totals);
    assert_eq!(wo_after.status, wo_before.status);
}

#[test]
fn test_manufacture_completes_work_order_and_costs() {
    let (mut store, hooks) = setup();
    let pl = submit_pick_list(&mut store, &hooks, 100);
    transfer(&mut store, &hooks, &pl, 100);

    let api = ShopfloorApi::default();
    let mut entry = api.make_manufacture_entry(&store, "WO-0001", None).unwrap();
    entry.items[0].basic_rate = Decimal::from(10);

    let name = store.insert_stock_entry(entry).unwrap();
    let mut draft = store.stock_entry(&name).unwrap();
    hooks.stock_entry_validate(&store, &mut draft).unwrap();
    store.add_stock_entry(draft);
    store.submit_stock_entry(&name).unwrap();
    assert!(hooks.stock_entry_on_submit(&mut store, &name).is_clean());

    let wo = store.work_order("WO-0001").unwrap();
    assert_eq!(wo.produced_qty, Decimal::ONE);
    assert_eq!(wo.status, WorkOrderStatus::Completed);
    assert_eq!(wo.required_items[0].consumed_qty, Decimal::from(100));
    assert_eq!(wo.required_items[0].balance_to_consume, Decimal::ZERO);

    // 轉移列無單價；生產入庫的原料列 100 × 10，廢料列無單價
    assert_eq!(wo.costing.raw_material_cost, Decimal::from(1000));
    assert_eq!(wo.costing.total_cost, Decimal::from(1050));
}

#[test]
fn test_cost_roll_up_with_scrap() {
    let mut store = MemoryStore::new();
    store.add_work_order(
        WorkOrder::new("WO-0002", "BIKE", Decimal::ONE)
            .with_operating_cost(Decimal::from(50))
            .submitted(),
    );
    store.add_stock_entry(
        StockEntry::new("SE-0001", StockEntryType::Manufacture)
            .with_work_order("WO-0002")
            .with_item(
                StockEntryDetail::new("STEEL", Decimal::from(100))
                    .with_rate(Decimal::from(10))
                    .from_warehouse("WIP"),
            )
            .with_item(
                StockEntryDetail::new("CHIPS", Decimal::from(20))
                    .with_rate(Decimal::from(5))
                    .to_warehouse("Scrap")
                    .as_scrap(),
            )
            .with_item(
                StockEntryDetail::new("BIKE", Decimal::ONE)
                    .with_rate(Decimal::from(2000))
                    .to_warehouse("FG")
                    .as_finished(),
            )
            .submitted(),
    );

    let report = Reconciler::default().reconcile_stock_entry(&mut store, "SE-0001");
    assert!(report.is_clean());

    let wo = store.work_order("WO-0002").unwrap();
    assert_eq!(wo.costing.raw_material_cost, Decimal::from(1000));
    assert_eq!(wo.costing.scrap_material_cost, Decimal::from(100));
    assert_eq!(wo.costing.total_cost, Decimal::from(950));
}

#[test]
fn test_stopped_work_order_stays_stopped() {
    let (mut store, hooks) = setup();
    store
        .set_work_order_status("WO-0001", WorkOrderStatus::Stopped)
        .unwrap();

    let pl = submit_pick_list(&mut store, &hooks, 50);
    transfer(&mut store, &hooks, &pl, 50);

    assert_eq!(
        store.work_order("WO-0001").unwrap().status,
        WorkOrderStatus::Stopped
    );
}
