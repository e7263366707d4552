//! 文件生命週期掛勾
//!
//! 宿主框架在 validate／submit／cancel 時呼叫。validate 類掛勾修改記憶體中的文件，
//! 錯誤直接回傳給使用者；submit／cancel 類掛勾觸發重算，失敗只記錄不回報。

use shopfloor_calc::{BalanceCalculator, CostAggregator, StatusDeriver};
use shopfloor_core::{
    DocumentStore, ErrorKind, PickList, ReconcileConfig, ScrapItem, StockEntry, StockEntryType,
    WorkOrder, WorkOrderItem,
};

use crate::{Job, JobQueue, ReconcileReport, Reconciler};

/// 生命週期掛勾集合
pub struct LifecycleHooks {
    reconciler: Reconciler,
}

impl LifecycleHooks {
    pub fn new(config: ReconcileConfig) -> Self {
        Self {
            reconciler: Reconciler::new(config),
        }
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// 異動單 validate：生產相關異動缺目標倉時依列別帶入工單倉別
    ///
    /// 成品列帶入成品倉，廢料列帶入廢料倉，其餘列帶入 WIP 倉。
    /// 生產入庫中從 WIP 扣帳的原料列不帶入，這些列是耗用而非移轉。
    pub fn stock_entry_validate<S: DocumentStore + ?Sized>(
        &self,
        store: &S,
        entry: &mut StockEntry,
    ) -> shopfloor_core::Result<()> {
        if !entry.entry_type.is_manufacturing_flow() {
            return Ok(());
        }
        let Some(work_order) = entry.work_order.as_deref() else {
            return Ok(());
        };

        let wo = store.work_order(work_order)?;
        let warehouse = |w: &Option<String>| w.clone().filter(|w| !w.is_empty());
        let wip = warehouse(&wo.wip_warehouse);
        let fg = warehouse(&wo.fg_warehouse);
        let scrap = warehouse(&wo.scrap_warehouse);

        let mut filled = 0;
        for row in &mut entry.items {
            if row.t_warehouse.as_deref().is_some_and(|w| !w.is_empty()) {
                continue;
            }
            let target = if row.is_finished_item {
                &fg
            } else if row.is_scrap_item {
                &scrap
            } else if entry.entry_type == StockEntryType::Manufacture && row.draws_down() {
                continue;
            } else {
                &wip
            };
            if let Some(target) = target {
                row.t_warehouse = Some(target.clone());
                filled += 1;
            }
        }

        if filled > 0 {
            tracing::debug!(stock_entry = %entry.name, work_order, filled, "帶入目標倉");
        }
        Ok(())
    }

    /// 異動單 submit：同步重算
    pub fn stock_entry_on_submit<S: DocumentStore + ?Sized>(
        &self,
        store: &mut S,
        stock_entry: &str,
    ) -> ReconcileReport {
        self.reconciler.reconcile_stock_entry(store, stock_entry)
    }

    /// 異動單 cancel：排入背景重算後立即返回
    pub fn stock_entry_on_cancel<Q: JobQueue + ?Sized>(&self, queue: &mut Q, stock_entry: &str) {
        let queue_name = self.reconciler.config().background_queue.as_str();
        queue.enqueue(
            queue_name,
            Job::RecomputeAfterStockEntry {
                stock_entry: stock_entry.to_string(),
            },
        );
        tracing::info!(stock_entry, queue = queue_name, "異動單取消，已排入背景重算");
    }

    /// 工單 before_insert：需求明細與廢料明細為空時由 BOM 帶入
    ///
    /// 需求量依工單數量相對 BOM 基準產量等比放大；廢料數量照 BOM 原值帶入。
    pub fn work_order_before_insert<S: DocumentStore + ?Sized>(
        &self,
        store: &S,
        work_order: &mut WorkOrder,
    ) -> shopfloor_core::Result<()> {
        let Some(bom_no) = work_order.bom_no.clone() else {
            return Ok(());
        };
        if !work_order.required_items.is_empty() && !work_order.scrap_items.is_empty() {
            return Ok(());
        }

        let bom = store.bom(&bom_no)?;

        if work_order.required_items.is_empty() {
            let multiplier = bom.multiplier_for(work_order.qty);
            for bom_item in &bom.items {
                let mut row = WorkOrderItem::new(String::new(), bom_item.item_code.clone(), bom_item.qty * multiplier)
                    .with_item_name(bom_item.item_name.clone())
                    .with_stock_uom(bom_item.stock_uom.clone());
                row.source_warehouse = bom_item
                    .source_warehouse
                    .clone()
                    .or_else(|| work_order.source_warehouse.clone());

                if let Some(item) = lookup_item(store, &bom_item.item_code)? {
                    row.stock_uom = item.stock_uom;
                    if row.item_name.is_empty() {
                        row.item_name = item.item_name;
                    }
                }
                row.balance_to_transfer = row.required_qty;
                row.balance_to_consume = row.required_qty;
                work_order.required_items.push(row);
            }
            tracing::debug!(
                work_order = %work_order.name,
                bom = %bom_no,
                rows = work_order.required_items.len(),
                %multiplier,
                "由 BOM 帶入需求明細"
            );
        }

        if work_order.scrap_items.is_empty() {
            for bom_scrap in &bom.scrap_items {
                let mut row = ScrapItem::new(bom_scrap.item_code.clone(), bom_scrap.stock_qty)
                    .with_rate(bom_scrap.rate)
                    .with_stock_uom(bom_scrap.stock_uom.clone());
                row.item_name = bom_scrap.item_name.clone();
                let item = lookup_item(store, &bom_scrap.item_code)?;
                CostAggregator::value_scrap_item(&mut row, item.as_ref());
                work_order.scrap_items.push(row);
            }
        }

        Ok(())
    }

    /// 工單 validate：廢料估價與明細結餘
    pub fn work_order_validate<S: DocumentStore + ?Sized>(
        &self,
        store: &S,
        work_order: &mut WorkOrder,
    ) -> shopfloor_core::Result<()> {
        for row in &mut work_order.scrap_items {
            let item = lookup_item(store, &row.item_code)?;
            CostAggregator::value_scrap_item(row, item.as_ref());
        }

        let balance = BalanceCalculator::work_order(work_order);
        BalanceCalculator::apply_to_work_order(work_order, &balance);
        Ok(())
    }

    /// 工單 on_submit：明細結餘與狀態
    pub fn work_order_on_submit(&self, work_order: &mut WorkOrder) {
        let balance = BalanceCalculator::work_order(work_order);
        BalanceCalculator::apply_to_work_order(work_order, &balance);

        if let Some(status) = StatusDeriver::work_order_transition(work_order) {
            tracing::debug!(work_order = %work_order.name, from = %work_order.status, to = %status, "工單狀態變更");
            work_order.status = status;
        }
    }

    /// 揀貨單 validate：以明細上現有的耗用量計算結餘、彙總與狀態
    pub fn pick_list_validate(&self, pick_list: &mut PickList) {
        let balance = BalanceCalculator::pick_list(pick_list);
        BalanceCalculator::apply_to_pick_list(pick_list, &balance);
        pick_list.status = StatusDeriver::pick_list_status(
            pick_list.balance_qty,
            self.reconciler.config().completion_epsilon,
        );
    }

    /// 揀貨單 on_submit：由已提交異動重算並回寫，連帶更新工單揀貨彙總
    pub fn pick_list_on_submit<S: DocumentStore + ?Sized>(
        &self,
        store: &mut S,
        pick_list: &str,
    ) -> ReconcileReport {
        self.reconciler.reconcile_pick_list(store, pick_list)
    }

    /// 揀貨單 on_cancel：同 on_submit，工單不再計入此揀貨單
    pub fn pick_list_on_cancel<S: DocumentStore + ?Sized>(
        &self,
        store: &mut S,
        pick_list: &str,
    ) -> ReconcileReport {
        self.reconciler.reconcile_pick_list(store, pick_list)
    }
}

impl Default for LifecycleHooks {
    fn default() -> Self {
        Self::new(ReconcileConfig::default())
    }
}

/// 查料件主檔；不存在時回傳 `None`
fn lookup_item<S: DocumentStore + ?Sized>(
    store: &S,
    item_code: &str,
) -> shopfloor_core::Result<Option<shopfloor_core::Item>> {
    match store.item(item_code) {
        Ok(item) => Ok(Some(item)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!(item_code, "料件主檔不存在");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
