//! 對帳重算協調器
//!
//! 由異動單或揀貨單事件觸發，依序重算受影響的揀貨單與工單。
//! 每個步驟各自攔截錯誤：失敗只記錄到報告、日誌與錯誤紀錄，不回報給呼叫端，
//! 也不影響後續步驟。所有數值都從已提交的異動明細重新推導，重複執行結果相同。

use rust_decimal::Decimal;
use serde::Serialize;
use shopfloor_calc::{BalanceCalculator, ConsumptionCalculator, CostAggregator, PickSummary, StatusDeriver};
use shopfloor_core::{
    DocumentStore, Field, FieldValue, PickListQuery, ReconcileConfig, ShopfloorError,
    StockEntryQuery, StockEntryType, WorkOrder,
};
use std::fmt;

use crate::AffectedDocuments;

/// 重算步驟
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReconcileStep {
    LoadStockEntry,
    ResolvePickLists,
    RecomputePickList,
    ResolveWorkOrders,
    RecomputeWorkOrder,
    Commit,
}

impl ReconcileStep {
    pub fn as_str(self) -> &'static str {
        match self {
            ReconcileStep::LoadStockEntry => "load stock entry",
            ReconcileStep::ResolvePickLists => "resolve pick lists",
            ReconcileStep::RecomputePickList => "recompute pick list",
            ReconcileStep::ResolveWorkOrders => "resolve work orders",
            ReconcileStep::RecomputeWorkOrder => "recompute work order",
            ReconcileStep::Commit => "commit",
        }
    }
}

impl fmt::Display for ReconcileStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 單一步驟失敗
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileFailure {
    pub step: ReconcileStep,
    /// 失敗時處理的文件
    pub name: String,
    pub reason: String,
}

/// 重算結果
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
    /// 觸發重算的文件
    pub trigger: String,
    pub pick_lists: Vec<String>,
    pub work_orders: Vec<String>,
    /// 實際寫入的欄位數
    pub writes: usize,
    pub failures: Vec<ReconcileFailure>,
}

impl ReconcileReport {
    fn new(trigger: &str) -> Self {
        Self {
            trigger: trigger.to_string(),
            ..Self::default()
        }
    }

    /// 全部步驟成功
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 對帳重算協調器
pub struct Reconciler {
    config: ReconcileConfig,
}

impl Reconciler {
    pub fn new(config: ReconcileConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// 異動單提交或取消後的重算
    pub fn reconcile_stock_entry<S: DocumentStore + ?Sized>(
        &self,
        store: &mut S,
        stock_entry: &str,
    ) -> ReconcileReport {
        tracing::info!(stock_entry, "開始異動單對帳重算");
        let mut report = ReconcileReport::new(stock_entry);

        let entry = match store.stock_entry(stock_entry) {
            Ok(entry) => entry,
            Err(e) => {
                self.record(store, &mut report, ReconcileStep::LoadStockEntry, stock_entry, e);
                return report;
            }
        };

        // Step 1: 表頭指向的揀貨單，加上明細列指向的揀貨明細所屬揀貨單
        tracing::debug!("Step 1: 解析受影響的揀貨單");
        let mut affected = AffectedDocuments::new();
        if let Some(pick_list) = &entry.pick_list {
            affected.mark_pick_list(pick_list.clone());
        }
        for row in &entry.items {
            let Some(pl_row) = &row.pick_list_item else {
                continue;
            };
            match store.pick_list_item_parent(pl_row) {
                Ok(Some(parent)) => affected.mark_pick_list(parent),
                Ok(None) => {
                    tracing::debug!(stock_entry, row = %pl_row, "揀貨明細已不存在，略過");
                }
                Err(e) => self.record(store, &mut report, ReconcileStep::ResolvePickLists, pl_row, e),
            }
        }
        if let Some(work_order) = &entry.work_order {
            affected.mark_work_order(work_order.clone());
        }

        self.run(store, &mut report, affected);
        report
    }

    /// 揀貨單提交或取消後的重算（含所屬工單）
    pub fn reconcile_pick_list<S: DocumentStore + ?Sized>(
        &self,
        store: &mut S,
        pick_list: &str,
    ) -> ReconcileReport {
        tracing::info!(pick_list, "開始揀貨單對帳重算");
        let mut report = ReconcileReport::new(pick_list);
        let mut affected = AffectedDocuments::new();
        affected.mark_pick_list(pick_list);
        self.run(store, &mut report, affected);
        report
    }

    fn run<S: DocumentStore + ?Sized>(
        &self,
        store: &mut S,
        report: &mut ReconcileReport,
        mut affected: AffectedDocuments,
    ) {
        let pick_lists: Vec<String> = affected.pick_lists().map(str::to_string).collect();

        // Step 2: 揀貨單結餘與狀態，完成後才處理工單
        tracing::debug!("Step 2: 重算揀貨單 {} 張", pick_lists.len());
        for name in &pick_lists {
            match self.recompute_pick_list(store, name) {
                Ok(writes) => report.writes += writes,
                Err(e) => self.record(store, report, ReconcileStep::RecomputePickList, name, e),
            }
        }

        // Step 3: 揀貨單所屬工單
        tracing::debug!("Step 3: 解析受影響的工單");
        for name in &pick_lists {
            match store.pick_list(name) {
                Ok(pl) => {
                    if let Some(work_order) = pl.work_order {
                        affected.mark_work_order(work_order);
                    }
                }
                Err(e) => self.record(store, report, ReconcileStep::ResolveWorkOrders, name, e),
            }
        }

        // Step 4: 工單成本、進度、結餘與狀態
        let work_orders: Vec<String> = affected.work_orders().map(str::to_string).collect();
        tracing::debug!("Step 4: 重算工單 {} 張", work_orders.len());
        for name in &work_orders {
            match self.recompute_work_order(store, name) {
                Ok(writes) => report.writes += writes,
                Err(e) => self.record(store, report, ReconcileStep::RecomputeWorkOrder, name, e),
            }
        }

        if report.writes > 0 {
            if let Err(e) = store.commit() {
                let trigger = report.trigger.clone();
                self.record(store, report, ReconcileStep::Commit, &trigger, e);
            }
        }

        report.pick_lists = pick_lists;
        report.work_orders = work_orders;

        tracing::info!(
            trigger = %report.trigger,
            pick_lists = report.pick_lists.len(),
            work_orders = report.work_orders.len(),
            writes = report.writes,
            failures = report.failures.len(),
            "對帳重算完成"
        );
    }

    /// 重算單張揀貨單，回傳寫入欄位數
    pub fn recompute_pick_list<S: DocumentStore + ?Sized>(
        &self,
        store: &mut S,
        name: &str,
    ) -> shopfloor_core::Result<usize> {
        let original = store.pick_list(name)?;

        let query = StockEntryQuery::submitted()
            .referencing_pick_list(name, original.location_names())
            .drawing_down();
        let rows = store.stock_entry_rows(&query)?;

        let consumed = ConsumptionCalculator::pick_list_consumption(&original, &rows);
        let balance = BalanceCalculator::pick_list_with_consumption(&original, &consumed);

        let mut updated = original.clone();
        BalanceCalculator::apply_to_pick_list(&mut updated, &balance);
        let status = StatusDeriver::pick_list_transition(&updated, self.config.completion_epsilon);

        let mut writes = 0;
        for (before, after) in original.locations.iter().zip(&updated.locations) {
            writes += self.write_qty(store, &after.name, Field::PickItemConsumedQty, before.consumed_qty, after.consumed_qty)?;
            writes += self.write_qty(store, &after.name, Field::PickItemBalanceQty, before.balance_qty, after.balance_qty)?;
        }
        writes += self.write_qty(store, name, Field::PickListTotalQty, original.total_qty, updated.total_qty)?;
        writes += self.write_qty(store, name, Field::PickListConsumedQty, original.consumed_qty, updated.consumed_qty)?;
        writes += self.write_qty(store, name, Field::PickListBalanceQty, original.balance_qty, updated.balance_qty)?;
        if let Some(status) = status {
            writes += self.write_field(store, name, Field::PickListStatus, FieldValue::from(status.as_str()))?;
        }

        tracing::debug!(
            pick_list = name,
            rows = rows.len(),
            total = %balance.total_qty,
            consumed = %balance.consumed_qty,
            balance = %balance.balance_qty,
            writes,
            "揀貨單重算完成"
        );
        Ok(writes)
    }

    /// 重算單張工單，回傳寫入欄位數
    pub fn recompute_work_order<S: DocumentStore + ?Sized>(
        &self,
        store: &mut S,
        name: &str,
    ) -> shopfloor_core::Result<usize> {
        let original = store.work_order(name)?;
        let mut updated = original.clone();

        let rows = store.stock_entry_rows(&StockEntryQuery::submitted().for_work_order(name))?;

        // 成本
        updated.costing = CostAggregator::aggregate(&rows, original.costing.operating_cost).into();

        // 明細進度
        let progress = ConsumptionCalculator::work_order_progress(&updated, &rows);
        for item in &mut updated.required_items {
            item.transferred_qty = progress.transferred_of(&item.item_code);
            item.consumed_qty = progress.consumed_of(&item.item_code);
        }
        updated.produced_qty = progress.produced_qty;

        // 揀貨
        let pick_lists = store.pick_lists(&PickListQuery::submitted().for_work_order(name))?;
        updated.material_transferred_for_manufacturing =
            ConsumptionCalculator::material_transferred(&updated, &pick_lists);

        let summary = if pick_lists.is_empty() {
            PickSummary::default()
        } else {
            let mut query = StockEntryQuery::submitted()
                .of_types(&[StockEntryType::MaterialTransferForManufacture, StockEntryType::Manufacture])
                .drawing_down();
            for pl in &pick_lists {
                query = query.referencing_pick_list(pl.name.clone(), pl.location_names());
            }
            let pick_rows = store.stock_entry_rows(&query)?;
            ConsumptionCalculator::pick_summary(&pick_lists, &pick_rows)
        };
        updated.totals.total_picked_qty = summary.total_picked_qty;
        updated.totals.total_pick_consumed_qty = summary.total_pick_consumed_qty;

        // 結餘與狀態
        let balance = BalanceCalculator::work_order(&updated);
        BalanceCalculator::apply_to_work_order(&mut updated, &balance);
        if let Some(status) = StatusDeriver::work_order_transition(&updated) {
            tracing::debug!(work_order = name, from = %original.status, to = %status, "工單狀態變更");
            updated.status = status;
        }

        let writes = self.persist_work_order(store, &original, &updated)?;
        tracing::debug!(
            work_order = name,
            rows = rows.len(),
            raw = %updated.costing.raw_material_cost,
            scrap = %updated.costing.scrap_material_cost,
            produced = %updated.produced_qty,
            writes,
            "工單重算完成"
        );
        Ok(writes)
    }

    fn persist_work_order<S: DocumentStore + ?Sized>(
        &self,
        store: &mut S,
        before: &WorkOrder,
        after: &WorkOrder,
    ) -> shopfloor_core::Result<usize> {
        let name = after.name.as_str();
        let header = [
            (Field::RawMaterialCost, before.costing.raw_material_cost, after.costing.raw_material_cost),
            (Field::ScrapMaterialCost, before.costing.scrap_material_cost, after.costing.scrap_material_cost),
            (Field::TotalCost, before.costing.total_cost, after.costing.total_cost),
            (Field::ProducedQty, before.produced_qty, after.produced_qty),
            (
                Field::MaterialTransferred,
                before.material_transferred_for_manufacturing,
                after.material_transferred_for_manufacturing,
            ),
            (Field::TotalTransferredQty, before.totals.total_transferred_qty, after.totals.total_transferred_qty),
            (Field::TotalConsumedQty, before.totals.total_consumed_qty, after.totals.total_consumed_qty),
            (Field::TotalPickedQty, before.totals.total_picked_qty, after.totals.total_picked_qty),
            (
                Field::TotalPickConsumedQty,
                before.totals.total_pick_consumed_qty,
                after.totals.total_pick_consumed_qty,
            ),
        ];

        let mut writes = 0;
        for (field, old, new) in header {
            writes += self.write_qty(store, name, field, old, new)?;
        }

        for (b, a) in before.required_items.iter().zip(&after.required_items) {
            let lines = [
                (Field::ItemTransferredQty, b.transferred_qty, a.transferred_qty),
                (Field::ItemConsumedQty, b.consumed_qty, a.consumed_qty),
                (Field::BalanceToTransfer, b.balance_to_transfer, a.balance_to_transfer),
                (Field::BalanceToConsume, b.balance_to_consume, a.balance_to_consume),
            ];
            for (field, old, new) in lines {
                writes += self.write_qty(store, &a.name, field, old, new)?;
            }
        }

        if before.status != after.status {
            writes += self.write_field(store, name, Field::WorkOrderStatus, FieldValue::from(after.status.as_str()))?;
        }

        Ok(writes)
    }

    fn write_qty<S: DocumentStore + ?Sized>(
        &self,
        store: &mut S,
        name: &str,
        field: Field,
        old: Decimal,
        new: Decimal,
    ) -> shopfloor_core::Result<usize> {
        if old == new {
            return Ok(0);
        }
        self.write_field(store, name, field, FieldValue::Qty(new))
    }

    /// 寫入欄位，不更新修改時間；部署未啟用的欄位直接略過
    fn write_field<S: DocumentStore + ?Sized>(
        &self,
        store: &mut S,
        name: &str,
        field: Field,
        value: FieldValue,
    ) -> shopfloor_core::Result<usize> {
        if !self.config.writes(field) {
            return Ok(0);
        }
        store.set_value(name, field, value, false)?;
        Ok(1)
    }

    fn record<S: DocumentStore + ?Sized>(
        &self,
        store: &mut S,
        report: &mut ReconcileReport,
        step: ReconcileStep,
        name: &str,
        error: ShopfloorError,
    ) {
        let error = ShopfloorError::reconciliation(step.as_str(), name, error);
        tracing::warn!(trigger = %report.trigger, step = %step, name, error = %error, "重算步驟失敗");
        store.log_error("Shopfloor reconciliation", &error.to_string());
        report.failures.push(ReconcileFailure {
            step,
            name: name.to_string(),
            reason: error.to_string(),
        });
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(ReconcileConfig::default())
    }
}
