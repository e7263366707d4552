//! 工單相關端點

use rust_decimal::Decimal;
use serde::Serialize;
use shopfloor_core::{
    DocumentStore, PickList, PickListItem, PickListQuery, PickListStatus, ShopfloorError,
    StockEntry, StockEntryDetail, StockEntryQuery, StockEntryType,
};
use std::collections::HashMap;

use crate::pick_list::{fg_warehouse, wip_warehouse, with_scrap_and_finished_rows};
use crate::ShopfloorApi;

/// 工單需求明細的揀貨結餘
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkOrderBalanceLine {
    pub item_code: String,
    pub item_name: String,
    pub required_qty: Decimal,
    pub picked_qty: Decimal,
    /// 需求 - 已揀（不截斷）
    pub balance_qty: Decimal,
    pub stock_uom: String,
    pub source_warehouse: Option<String>,
}

/// 工單揀貨結餘
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkOrderBalanceView {
    pub items: Vec<WorkOrderBalanceLine>,
    pub total_required: Decimal,
    pub total_picked: Decimal,
    pub total_balance: Decimal,
}

impl ShopfloorApi {
    /// 依實際轉入 WIP 的物料建立生產入庫異動單（不存檔）
    ///
    /// 原料列依料號與單位彙總所有已提交生產領料中目標為 WIP 的數量，由 WIP 耗用；
    /// 另加廢料列與成品列。`qty` 未指定時取剩餘待生產量。
    pub fn make_manufacture_entry<S: DocumentStore + ?Sized>(
        &self,
        store: &S,
        work_order: &str,
        qty: Option<Decimal>,
    ) -> shopfloor_core::Result<StockEntry> {
        let wo = store.work_order(work_order)?;
        let wip = wip_warehouse(&wo)?;
        let fg = fg_warehouse(&wo)?;

        let fg_qty = qty
            .filter(|q| !q.is_zero())
            .unwrap_or_else(|| wo.remaining_to_produce());
        if fg_qty <= Decimal::ZERO {
            return Err(ShopfloorError::validation(format!(
                "工單 {} 沒有剩餘待生產數量",
                wo.name
            )));
        }

        let query = StockEntryQuery::submitted()
            .for_work_order(work_order)
            .of_types(&[StockEntryType::MaterialTransferForManufacture]);
        let rows = store.stock_entry_rows(&query)?;

        // (料號, 單位) → 數量，保持首次出現順序
        let mut transferred: Vec<((String, String), Decimal)> = Vec::new();
        for row in rows
            .iter()
            .filter(|r| r.detail.t_warehouse.as_deref() == Some(wip.as_str()))
        {
            let key = (row.detail.item_code.clone(), row.detail.stock_uom.clone());
            match transferred.iter_mut().find(|(k, _)| *k == key) {
                Some((_, total)) => *total += row.detail.qty,
                None => transferred.push((key, row.detail.qty)),
            }
        }
        transferred.retain(|(_, total)| *total > Decimal::ZERO);

        if transferred.is_empty() {
            return Err(ShopfloorError::validation(format!(
                "工單 {} 沒有已提交的生產領料，請先將物料轉入 WIP",
                wo.name
            )));
        }

        let mut entry = StockEntry::new(String::new(), StockEntryType::Manufacture)
            .with_company(wo.company.clone())
            .with_work_order(wo.name.clone());
        for ((item_code, stock_uom), total) in transferred {
            entry = entry.with_item(
                StockEntryDetail::new(item_code, total)
                    .with_uom(stock_uom)
                    .from_warehouse(wip.clone()),
            );
        }
        let entry = with_scrap_and_finished_rows(entry, &wo, fg, fg_qty);

        tracing::debug!(work_order, rows = entry.items.len(), fg_qty = %fg_qty, "產生生產入庫異動單");
        Ok(entry)
    }

    /// 依需求量扣除已揀量建立揀貨單（不存檔）
    pub fn make_pick_list<S: DocumentStore + ?Sized>(
        &self,
        store: &S,
        work_order: &str,
    ) -> shopfloor_core::Result<PickList> {
        let wo = store.work_order(work_order)?;
        if wo.required_items.is_empty() {
            return Err(ShopfloorError::validation(format!(
                "工單 {} 沒有需求明細",
                wo.name
            )));
        }

        let picked = picked_quantities(store, work_order)?;

        let mut pick_list = PickList::new(String::new())
            .with_company(wo.company.clone())
            .with_work_order(wo.name.clone())
            .with_for_qty((wo.qty - wo.material_transferred_for_manufacturing).max(Decimal::ZERO));
        pick_list.purpose = StockEntryType::MaterialTransferForManufacture;
        pick_list.status = PickListStatus::Open;

        for item in &wo.required_items {
            let already = picked.get(&item.item_code).copied().unwrap_or(Decimal::ZERO);
            let balance = item.required_qty - already;
            if balance <= Decimal::ZERO {
                continue;
            }

            let mut location = PickListItem::new(String::new(), item.item_code.clone(), balance)
                .with_item_name(item.item_name.clone())
                .with_uom(item.stock_uom.clone());
            location.warehouse = item
                .source_warehouse
                .clone()
                .or_else(|| wo.source_warehouse.clone());
            location.wo_required_qty = Some(item.required_qty);
            pick_list = pick_list.with_location(location);
        }

        if pick_list.locations.is_empty() {
            return Err(ShopfloorError::validation(format!(
                "工單 {} 的需求已全部揀貨",
                wo.name
            )));
        }

        tracing::debug!(work_order, rows = pick_list.locations.len(), "產生揀貨單");
        Ok(pick_list)
    }

    /// 工單需求、已揀量與結餘
    pub fn get_work_order_balance<S: DocumentStore + ?Sized>(
        &self,
        store: &S,
        work_order: &str,
    ) -> shopfloor_core::Result<WorkOrderBalanceView> {
        let wo = store.work_order(work_order)?;
        if wo.required_items.is_empty() {
            return Ok(WorkOrderBalanceView::default());
        }

        let picked = picked_quantities(store, work_order)?;
        let mut view = WorkOrderBalanceView::default();

        for item in &wo.required_items {
            let picked_qty = picked.get(&item.item_code).copied().unwrap_or(Decimal::ZERO);
            let balance_qty = item.required_qty - picked_qty;

            view.total_required += item.required_qty;
            view.total_picked += picked_qty;
            view.total_balance += balance_qty;

            view.items.push(WorkOrderBalanceLine {
                item_code: item.item_code.clone(),
                item_name: item.item_name.clone(),
                required_qty: item.required_qty,
                picked_qty,
                balance_qty,
                stock_uom: item.stock_uom.clone(),
                source_warehouse: item.source_warehouse.clone(),
            });
        }

        Ok(view)
    }
}

/// 工單已提交揀貨單的已揀量（依料號）
fn picked_quantities<S: DocumentStore + ?Sized>(
    store: &S,
    work_order: &str,
) -> shopfloor_core::Result<HashMap<String, Decimal>> {
    let pick_lists = store.pick_lists(&PickListQuery::submitted().for_work_order(work_order))?;

    let mut picked: HashMap<String, Decimal> = HashMap::new();
    for location in pick_lists.iter().flat_map(|pl| pl.locations.iter()) {
        *picked.entry(location.item_code.clone()).or_insert(Decimal::ZERO) += location.picked_qty();
    }
    Ok(picked)
}
