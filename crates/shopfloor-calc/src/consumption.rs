//! 由已提交異動明細重新推導耗用與進度
//!
//! 一律從權威的異動明細重算，不做增量累加，因此重複執行結果相同。

use rust_decimal::Decimal;
use serde::Serialize;
use shopfloor_core::{PickList, StockEntryRow, StockEntryType, WorkOrder};
use std::collections::HashMap;

/// 工單生產進度
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkOrderProgress {
    /// 物料 → 已轉入 WIP 量
    pub transferred: HashMap<String, Decimal>,
    /// 物料 → 已耗用量
    pub consumed: HashMap<String, Decimal>,
    /// 已生產成品量
    pub produced_qty: Decimal,
}

impl WorkOrderProgress {
    pub fn transferred_of(&self, item_code: &str) -> Decimal {
        self.transferred.get(item_code).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn consumed_of(&self, item_code: &str) -> Decimal {
        self.consumed.get(item_code).copied().unwrap_or(Decimal::ZERO)
    }
}

/// 工單揀貨彙總
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PickSummary {
    pub total_picked_qty: Decimal,
    pub total_pick_consumed_qty: Decimal,
}

/// 耗用計算器
pub struct ConsumptionCalculator;

impl ConsumptionCalculator {
    /// 計算揀貨單每一列的已耗用量
    ///
    /// `rows` 應為參照此揀貨單（表頭或明細列）的已提交異動明細。只計入有來源倉的扣帳列。
    /// 表頭指向此揀貨單的生產入庫也會從 WIP 扣帳，其原料列同樣計入，
    /// 會疊加在先前生產領料已計入的耗用量之上。
    ///
    /// 歸屬規則：
    /// 1. 明細列有指向揀貨明細者，直接計入該列
    /// 2. 其餘依料號依序填入同料號的揀貨明細，每列以揀貨量為上限，溢出部分計入最後一列
    pub fn pick_list_consumption(
        pick_list: &PickList,
        rows: &[StockEntryRow],
    ) -> HashMap<String, Decimal> {
        let mut consumed: HashMap<String, Decimal> = pick_list
            .locations
            .iter()
            .map(|l| (l.name.clone(), Decimal::ZERO))
            .collect();

        // 依料號彙總未指向明細列的數量（保持首次出現順序）
        let mut unlinked: Vec<(String, Decimal)> = Vec::new();

        for row in rows {
            let detail = &row.detail;
            if !detail.draws_down() {
                continue;
            }

            match &detail.pick_list_item {
                Some(pl_row) => match consumed.get_mut(pl_row) {
                    Some(qty) => *qty += detail.qty,
                    None => {
                        tracing::debug!(
                            pick_list = %pick_list.name,
                            row = %pl_row,
                            "異動明細指向其他揀貨單，略過"
                        );
                    }
                },
                None => {
                    if row.pick_list.as_deref() != Some(pick_list.name.as_str()) {
                        continue;
                    }
                    match unlinked.iter_mut().find(|(code, _)| *code == detail.item_code) {
                        Some((_, qty)) => *qty += detail.qty,
                        None => unlinked.push((detail.item_code.clone(), detail.qty)),
                    }
                }
            }
        }

        for (item_code, mut remaining) in unlinked {
            let matching: Vec<_> = pick_list
                .locations
                .iter()
                .filter(|l| l.item_code == item_code)
                .collect();

            if matching.is_empty() {
                tracing::debug!(
                    pick_list = %pick_list.name,
                    item_code = %item_code,
                    "揀貨單沒有此料號，耗用量未歸屬"
                );
                continue;
            }

            let last = matching.len() - 1;
            for (idx, location) in matching.into_iter().enumerate() {
                if remaining <= Decimal::ZERO {
                    break;
                }
                let entry = consumed.entry(location.name.clone()).or_insert(Decimal::ZERO);
                let take = if idx == last {
                    remaining
                } else {
                    (location.picked_qty() - *entry).max(Decimal::ZERO).min(remaining)
                };
                *entry += take;
                remaining -= take;
            }
        }

        consumed
    }

    /// 計算工單生產進度
    ///
    /// `rows` 應為該工單所有已提交異動單的明細。
    /// - 已轉移：生產領料且目標倉為 WIP 的列
    /// - 已耗用：生產入庫中有來源倉的原料列
    /// - 已生產：生產入庫的成品列
    pub fn work_order_progress(work_order: &WorkOrder, rows: &[StockEntryRow]) -> WorkOrderProgress {
        let mut progress = WorkOrderProgress::default();
        let wip = work_order.wip_warehouse.as_deref();

        for row in rows {
            let detail = &row.detail;
            match row.entry_type {
                StockEntryType::MaterialTransferForManufacture => {
                    if wip.is_some() && detail.t_warehouse.as_deref() == wip {
                        *progress
                            .transferred
                            .entry(detail.item_code.clone())
                            .or_insert(Decimal::ZERO) += detail.qty;
                    }
                }
                StockEntryType::Manufacture => {
                    if detail.is_finished_item {
                        progress.produced_qty += detail.qty;
                    } else if detail.is_raw_material() && detail.draws_down() {
                        *progress
                            .consumed
                            .entry(detail.item_code.clone())
                            .or_insert(Decimal::ZERO) += detail.qty;
                    }
                }
                _ => {}
            }
        }

        progress
    }

    /// 工單已轉移生產數量 = min(已提交揀貨單 for_qty 合計, 計劃量)
    pub fn material_transferred(work_order: &WorkOrder, pick_lists: &[PickList]) -> Decimal {
        let total: Decimal = pick_lists
            .iter()
            .filter(|pl| pl.docstatus.is_submitted())
            .map(|pl| pl.for_qty)
            .sum();
        total.min(work_order.qty)
    }

    /// 工單揀貨彙總
    ///
    /// `rows` 應為參照這些揀貨單、類型為生產領料或生產入庫的已提交異動明細。
    pub fn pick_summary(pick_lists: &[PickList], rows: &[StockEntryRow]) -> PickSummary {
        let total_picked_qty = pick_lists
            .iter()
            .flat_map(|pl| pl.locations.iter())
            .map(|l| l.picked_qty())
            .sum();

        let total_pick_consumed_qty = rows
            .iter()
            .filter(|r| r.entry_type.is_manufacturing_flow() && r.detail.draws_down())
            .map(|r| r.detail.qty)
            .sum();

        PickSummary {
            total_picked_qty,
            total_pick_consumed_qty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopfloor_core::{PickListItem, StockEntryDetail};

    fn row(entry_type: StockEntryType, pick_list: Option<&str>, detail: StockEntryDetail) -> StockEntryRow {
        StockEntryRow {
            stock_entry: "SE-1".to_string(),
            entry_type,
            work_order: Some("WO-1".to_string()),
            pick_list: pick_list.map(str::to_string),
            detail,
        }
    }

    fn transfer(qty: u32) -> StockEntryDetail {
        StockEntryDetail::new("STEEL", Decimal::from(qty))
            .from_warehouse("Stores")
            .to_warehouse("WIP")
    }

    #[test]
    fn test_consumption_by_item_code() {
        let pl = PickList::new("PL-1").with_location(PickListItem::new("PLI-1", "STEEL", Decimal::from(50)));
        let rows = vec![
            row(StockEntryType::MaterialTransferForManufacture, Some("PL-1"), transfer(20)),
            row(StockEntryType::MaterialTransferForManufacture, Some("PL-1"), transfer(10)),
        ];

        let consumed = ConsumptionCalculator::pick_list_consumption(&pl, &rows);
        assert_eq!(consumed["PLI-1"], Decimal::from(30));
    }

    #[test]
    fn test_row_link_takes_precedence() {
        let pl = PickList::new("PL-1")
            .with_location(PickListItem::new("PLI-1", "STEEL", Decimal::from(10)))
            .with_location(PickListItem::new("PLI-2", "STEEL", Decimal::from(10)));
        let rows = vec![row(
            StockEntryType::MaterialTransferForManufacture,
            None,
            transfer(7).with_pick_list_item("PLI-2"),
        )];

        let consumed = ConsumptionCalculator::pick_list_consumption(&pl, &rows);
        assert_eq!(consumed["PLI-1"], Decimal::ZERO);
        assert_eq!(consumed["PLI-2"], Decimal::from(7));
    }

    #[test]
    fn test_item_code_fill_spills_to_last_line() {
        let pl = PickList::new("PL-1")
            .with_location(PickListItem::new("PLI-1", "STEEL", Decimal::from(10)))
            .with_location(PickListItem::new("PLI-2", "STEEL", Decimal::from(5)));
        let rows = vec![row(StockEntryType::MaterialTransferForManufacture, Some("PL-1"), transfer(18))];

        let consumed = ConsumptionCalculator::pick_list_consumption(&pl, &rows);
        assert_eq!(consumed["PLI-1"], Decimal::from(10));
        assert_eq!(consumed["PLI-2"], Decimal::from(8));
    }

    #[test]
    fn test_inbound_rows_are_not_consumption() {
        let pl = PickList::new("PL-1").with_location(PickListItem::new("PLI-1", "STEEL", Decimal::from(10)));
        let inbound = StockEntryDetail::new("STEEL", Decimal::from(4)).to_warehouse("WIP");
        let rows = vec![row(StockEntryType::MaterialTransferForManufacture, Some("PL-1"), inbound)];

        let consumed = ConsumptionCalculator::pick_list_consumption(&pl, &rows);
        assert_eq!(consumed["PLI-1"], Decimal::ZERO);
    }

    #[test]
    fn test_rows_for_other_pick_list_rows_are_ignored() {
        let pl = PickList::new("PL-1").with_location(PickListItem::new("PLI-1", "STEEL", Decimal::from(10)));
        let rows = vec![row(
            StockEntryType::MaterialTransferForManufacture,
            Some("PL-1"),
            transfer(3).with_pick_list_item("PLI-99"),
        )];

        let consumed = ConsumptionCalculator::pick_list_consumption(&pl, &rows);
        assert_eq!(consumed["PLI-1"], Decimal::ZERO);
        assert!(!consumed.contains_key("PLI-99"));
    }

    #[test]
    fn test_work_order_progress() {
        let wo = WorkOrder::new("WO-1", "BIKE", Decimal::from(5)).with_wip_warehouse("WIP");
        let rows = vec![
            row(StockEntryType::MaterialTransferForManufacture, None, transfer(20)),
            // 轉到其他倉不算
            row(
                StockEntryType::MaterialTransferForManufacture,
                None,
                StockEntryDetail::new("STEEL", Decimal::from(3)).from_warehouse("Stores").to_warehouse("QC"),
            ),
            row(
                StockEntryType::Manufacture,
                None,
                StockEntryDetail::new("STEEL", Decimal::from(12)).from_warehouse("WIP"),
            ),
            row(
                StockEntryType::Manufacture,
                None,
                StockEntryDetail::new("SCRAP", Decimal::from(1)).to_warehouse("Scrap").as_scrap(),
            ),
            row(
                StockEntryType::Manufacture,
                None,
                StockEntryDetail::new("BIKE", Decimal::from(2)).to_warehouse("FG").as_finished(),
            ),
        ];

        let progress = ConsumptionCalculator::work_order_progress(&wo, &rows);
        assert_eq!(progress.transferred_of("STEEL"), Decimal::from(20));
        assert_eq!(progress.consumed_of("STEEL"), Decimal::from(12));
        assert_eq!(progress.consumed_of("SCRAP"), Decimal::ZERO);
        assert_eq!(progress.produced_qty, Decimal::from(2));
    }

    #[test]
    fn test_material_transferred_capped_at_target() {
        let wo = WorkOrder::new("WO-1", "BIKE", Decimal::from(5));
        let pls = vec![
            PickList::new("PL-1").with_for_qty(Decimal::from(3)).submitted(),
            PickList::new("PL-2").with_for_qty(Decimal::from(4)).submitted(),
            PickList::new("PL-3").with_for_qty(Decimal::from(9)),
        ];
        assert_eq!(
            ConsumptionCalculator::material_transferred(&wo, &pls),
            Decimal::from(5)
        );
        assert_eq!(
            ConsumptionCalculator::material_transferred(&wo, &pls[..1]),
            Decimal::from(3)
        );
    }

    #[test]
    fn test_pick_summary() {
        let pls = vec![PickList::new("PL-1")
            .with_location(PickListItem::new("PLI-1", "STEEL", Decimal::from(10)))
            .with_location(PickListItem::new("PLI-2", "BOLT", Decimal::from(4)))
            .submitted()];
        let rows = vec![
            row(StockEntryType::MaterialTransferForManufacture, Some("PL-1"), transfer(6)),
            row(StockEntryType::MaterialIssue, Some("PL-1"), transfer(100)),
        ];

        let summary = ConsumptionCalculator::pick_summary(&pls, &rows);
        assert_eq!(summary.total_picked_qty, Decimal::from(14));
        assert_eq!(summary.total_pick_consumed_qty, Decimal::from(6));
    }
}
