//! 揀貨單相關端點

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopfloor_calc::{BalanceCalculator, ConsumptionCalculator, PickListBalance};
use shopfloor_core::{
    DocumentStore, PickList, ShopfloorError, StockEntry, StockEntryDetail, StockEntryQuery,
    StockEntryType, WorkOrder,
};
use std::collections::HashMap;

use crate::ShopfloorApi;

/// 部分轉移對話框的一列
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceRow {
    pub pl_item_name: String,
    pub item_code: String,
    pub item_name: String,
    /// 剩餘可轉移量
    pub balance_qty: Decimal,
}

/// 部分轉移請求的一列
#[derive(Debug, Clone, Deserialize)]
pub struct TransferRequest {
    #[serde(default)]
    pub pl_item_name: Option<String>,
    #[serde(default)]
    pub qty: Decimal,
}

impl ShopfloorApi {
    /// 仍有結餘的揀貨明細
    pub fn get_pick_list_balance_rows<S: DocumentStore + ?Sized>(
        &self,
        store: &S,
        pick_list: &str,
    ) -> shopfloor_core::Result<Vec<BalanceRow>> {
        let pl = submitted_pick_list(store, pick_list)?;
        let balance = current_balance(store, &pl)?;

        let rows = balance
            .open_lines(self.config().completion_epsilon)
            .map(|line| BalanceRow {
                pl_item_name: line.row.clone(),
                item_code: line.item_code.clone(),
                item_name: line.item_name.clone(),
                balance_qty: line.remaining(),
            })
            .collect();
        Ok(rows)
    }

    /// 依使用者指定的數量，由揀貨單建立生產領料異動單（草稿）
    ///
    /// `items_json` 為 `[{"pl_item_name": "...", "qty": 10}, ...]`。每列數量不得超過
    /// 該揀貨明細的剩餘結餘（容許 `transfer_tolerance` 尾差）；同一明細出現多次時以加總檢查，
    /// 並合併為一列。回傳新異動單名稱。
    pub fn make_partial_stock_entry_from_pick_list<S: DocumentStore + ?Sized>(
        &self,
        store: &mut S,
        pick_list: &str,
        items_json: &str,
    ) -> shopfloor_core::Result<String> {
        let pl = submitted_pick_list(&*store, pick_list)?;
        let wo = linked_work_order(&*store, &pl)?;
        let wip = wip_warehouse(&wo)?;

        let requests: Vec<TransferRequest> = serde_json::from_str(items_json)
            .map_err(|e| ShopfloorError::validation(format!("轉移明細格式錯誤: {}", e)))?;
        if requests.is_empty() {
            return Err(ShopfloorError::validation("未選擇任何要轉移的明細"));
        }

        let balance = current_balance(&*store, &pl)?;
        let mut entry = StockEntry::new(String::new(), StockEntryType::MaterialTransferForManufacture)
            .with_company(pl.company.clone())
            .with_pick_list(pl.name.clone())
            .with_work_order(wo.name.clone());

        // 同一揀貨明細可能出現多次，先依明細加總再檢查結餘
        let mut order: Vec<&str> = Vec::new();
        let mut totals: HashMap<&str, Decimal> = HashMap::new();
        for request in &requests {
            let Some(row_name) = request.pl_item_name.as_deref().filter(|n| !n.is_empty()) else {
                continue;
            };
            if request.qty <= Decimal::ZERO {
                continue;
            }
            let total = totals.entry(row_name).or_insert_with(|| {
                order.push(row_name);
                Decimal::ZERO
            });
            *total += request.qty;
        }

        for row_name in order {
            let qty = totals.get(row_name).copied().unwrap_or(Decimal::ZERO);
            let (Some(location), Some(line)) = (pl.location(row_name), balance.line(row_name)) else {
                return Err(ShopfloorError::validation(format!("無效的揀貨明細 {}", row_name)));
            };

            let remaining = line.remaining();
            if qty > remaining + self.config().transfer_tolerance {
                return Err(ShopfloorError::validation(format!(
                    "物料 {}：轉移數量 ({}) 不可超過揀貨結餘 ({})",
                    location.item_code, qty, remaining
                )));
            }

            let mut detail = StockEntryDetail::new(location.item_code.clone(), qty)
                .with_item_name(location.item_name.clone())
                .with_uom(location.uom.clone())
                .with_conversion_factor(location.conversion_factor)
                .to_warehouse(wip.clone())
                .with_pick_list_item(location.name.clone());
            detail.stock_uom = location.stock_uom.clone();
            detail.s_warehouse = location.warehouse.clone();
            entry = entry.with_item(detail);
        }

        if entry.items.is_empty() {
            return Err(ShopfloorError::validation(format!(
                "工單 {} 沒有可轉移的明細",
                wo.name
            )));
        }

        let rows = entry.items.len();
        let name = store.insert_stock_entry(entry)?;
        store.commit()?;

        tracing::info!(pick_list, stock_entry = %name, rows, "建立部分轉移異動單");
        Ok(name)
    }

    /// 由揀貨單剩餘結餘建立異動單（不存檔）
    ///
    /// - 生產領料：全部剩餘結餘由揀貨倉轉入 WIP
    /// - 生產入庫：剩餘結餘由 WIP 耗用，另加廢料列與成品列（成品數量為剩餘待生產量）
    pub fn make_stock_entry_from_pick_list<S: DocumentStore + ?Sized>(
        &self,
        store: &S,
        pick_list: &str,
        purpose: StockEntryType,
    ) -> shopfloor_core::Result<StockEntry> {
        let pl = store.pick_list(pick_list)?;
        let wo = linked_work_order(store, &pl)?;
        let wip = wip_warehouse(&wo)?;

        let company = if pl.company.is_empty() {
            wo.company.clone()
        } else {
            pl.company.clone()
        };
        let mut entry = StockEntry::new(String::new(), purpose)
            .with_company(company)
            .with_pick_list(pl.name.clone())
            .with_work_order(wo.name.clone());

        let balance = current_balance(store, &pl)?;
        let open = |row: &str| balance.line(row).map(|l| l.remaining()).unwrap_or(Decimal::ZERO);

        match purpose {
            StockEntryType::MaterialTransferForManufacture => {
                for location in &pl.locations {
                    let qty = open(&location.name);
                    if qty <= Decimal::ZERO {
                        continue;
                    }
                    let mut detail = pick_row(location, qty).to_warehouse(wip.clone());
                    detail.s_warehouse = location.warehouse.clone();
                    entry = entry.with_item(detail);
                }
            }
            StockEntryType::Manufacture => {
                let fg = fg_warehouse(&wo)?;
                let fg_qty = wo.remaining_to_produce();
                if fg_qty <= Decimal::ZERO {
                    return Err(ShopfloorError::validation(format!(
                        "工單 {} 沒有剩餘待生產數量",
                        wo.name
                    )));
                }

                for location in &pl.locations {
                    let qty = open(&location.name);
                    if qty <= Decimal::ZERO {
                        continue;
                    }
                    entry = entry.with_item(pick_row(location, qty).from_warehouse(wip.clone()));
                }
                entry = with_scrap_and_finished_rows(entry, &wo, fg, fg_qty);
            }
            other => {
                return Err(ShopfloorError::validation(format!(
                    "不支援的異動類型: {}",
                    other
                )));
            }
        }

        tracing::debug!(pick_list, purpose = %purpose, rows = entry.items.len(), "由揀貨單產生異動單");
        Ok(entry)
    }
}

/// 依已提交異動重新計算揀貨單結餘
pub(crate) fn current_balance<S: DocumentStore + ?Sized>(
    store: &S,
    pick_list: &PickList,
) -> shopfloor_core::Result<PickListBalance> {
    let query = StockEntryQuery::submitted()
        .referencing_pick_list(pick_list.name.clone(), pick_list.location_names())
        .drawing_down();
    let rows = store.stock_entry_rows(&query)?;
    let consumed = ConsumptionCalculator::pick_list_consumption(pick_list, &rows);
    Ok(BalanceCalculator::pick_list_with_consumption(pick_list, &consumed))
}

/// 生產入庫的廢料列與成品列
pub(crate) fn with_scrap_and_finished_rows(
    mut entry: StockEntry,
    wo: &WorkOrder,
    fg_warehouse: String,
    fg_qty: Decimal,
) -> StockEntry {
    if let Some(scrap_warehouse) = wo.scrap_warehouse.as_deref().filter(|w| !w.is_empty()) {
        for scrap in &wo.scrap_items {
            if scrap.stock_qty <= Decimal::ZERO {
                continue;
            }
            entry = entry.with_item(
                StockEntryDetail::new(scrap.item_code.clone(), scrap.stock_qty)
                    .with_item_name(scrap.item_name.clone())
                    .with_uom(scrap.stock_uom.clone())
                    .to_warehouse(scrap_warehouse)
                    .as_scrap(),
            );
        }
    }

    entry.fg_completed_qty = fg_qty;
    entry.with_item(
        StockEntryDetail::new(wo.production_item.clone(), fg_qty)
            .with_uom(wo.stock_uom.clone())
            .to_warehouse(fg_warehouse)
            .as_finished(),
    )
}

fn pick_row(location: &shopfloor_core::PickListItem, qty: Decimal) -> StockEntryDetail {
    let mut detail = StockEntryDetail::new(location.item_code.clone(), qty)
        .with_item_name(location.item_name.clone())
        .with_uom(location.uom.clone())
        .with_conversion_factor(if location.conversion_factor.is_zero() {
            Decimal::ONE
        } else {
            location.conversion_factor
        });
    detail.stock_uom = location.stock_uom.clone();
    detail
}

fn submitted_pick_list<S: DocumentStore + ?Sized>(
    store: &S,
    pick_list: &str,
) -> shopfloor_core::Result<PickList> {
    if pick_list.is_empty() {
        return Err(ShopfloorError::validation("必須指定揀貨單"));
    }
    let pl = store.pick_list(pick_list)?;
    if !pl.docstatus.is_submitted() {
        return Err(ShopfloorError::validation(format!("揀貨單 {} 必須先提交", pl.name)));
    }
    Ok(pl)
}

fn linked_work_order<S: DocumentStore + ?Sized>(
    store: &S,
    pick_list: &PickList,
) -> shopfloor_core::Result<WorkOrder> {
    let Some(work_order) = pick_list.work_order.as_deref().filter(|w| !w.is_empty()) else {
        return Err(ShopfloorError::validation(format!(
            "揀貨單 {} 未關聯工單",
            pick_list.name
        )));
    };
    store.work_order(work_order)
}

pub(crate) fn wip_warehouse(wo: &WorkOrder) -> shopfloor_core::Result<String> {
    wo.wip_warehouse
        .clone()
        .filter(|w| !w.is_empty())
        .ok_or_else(|| ShopfloorError::validation(format!("工單 {} 未設定 WIP 倉", wo.name)))
}

pub(crate) fn fg_warehouse(wo: &WorkOrder) -> shopfloor_core::Result<String> {
    wo.fg_warehouse
        .clone()
        .filter(|w| !w.is_empty())
        .ok_or_else(|| ShopfloorError::validation(format!("工單 {} 未設定成品倉", wo.name)))
}
