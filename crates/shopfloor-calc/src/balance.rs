//! 結餘計算
//!
//! 兩種結餘刻意分開：
//! - 顯示結餘（display）：直接相減，可能為負，寫回表頭與明細欄位
//! - 剩餘可作業量（remaining）：截斷於 0，用於可轉移上限與「待處理列」篩選

use rust_decimal::Decimal;
use serde::Serialize;
use shopfloor_core::{PickList, WorkOrder};
use std::collections::HashMap;

/// 揀貨明細結餘
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineBalance {
    /// 明細列ID
    pub row: String,
    pub item_code: String,
    pub item_name: String,
    /// 揀貨量
    pub picked_qty: Decimal,
    /// 已耗用量
    pub consumed_qty: Decimal,
    /// 顯示結餘 = 揀貨量 - 已耗用量
    pub display_balance: Decimal,
}

impl LineBalance {
    /// 剩餘可作業量（不小於 0）
    pub fn remaining(&self) -> Decimal {
        self.display_balance.max(Decimal::ZERO)
    }
}

/// 揀貨單結餘
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickListBalance {
    pub pick_list: String,
    pub lines: Vec<LineBalance>,
    /// 揀貨總量
    pub total_qty: Decimal,
    /// 已耗用總量
    pub consumed_qty: Decimal,
    /// 表頭結餘 = 總量 - 已耗用（不截斷）
    pub balance_qty: Decimal,
}

impl PickListBalance {
    /// 依明細列ID取結餘
    pub fn line(&self, row: &str) -> Option<&LineBalance> {
        self.lines.iter().find(|l| l.row == row)
    }

    /// 仍有剩餘可作業量的明細
    pub fn open_lines(&self, epsilon: Decimal) -> impl Iterator<Item = &LineBalance> {
        self.lines.iter().filter(move |l| l.remaining() > epsilon)
    }
}

/// 工單明細結餘
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkOrderLineBalance {
    pub row: String,
    pub item_code: String,
    pub required_qty: Decimal,
    pub transferred_qty: Decimal,
    pub consumed_qty: Decimal,
    /// max(需求 - 已轉移, 0)
    pub balance_to_transfer: Decimal,
    /// max(需求 - 已耗用, 0)
    pub balance_to_consume: Decimal,
}

/// 工單結餘
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkOrderBalance {
    pub work_order: String,
    pub lines: Vec<WorkOrderLineBalance>,
    pub total_required_qty: Decimal,
    pub total_transferred_qty: Decimal,
    pub total_consumed_qty: Decimal,
}

impl WorkOrderBalance {
    pub fn line(&self, row: &str) -> Option<&WorkOrderLineBalance> {
        self.lines.iter().find(|l| l.row == row)
    }
}

/// 結餘計算器
pub struct BalanceCalculator;

impl BalanceCalculator {
    /// 以揀貨明細上現有的已耗用量計算（validate 時使用）
    pub fn pick_list(pick_list: &PickList) -> PickListBalance {
        let consumed: HashMap<String, Decimal> = pick_list
            .locations
            .iter()
            .map(|l| (l.name.clone(), l.consumed_qty))
            .collect();
        Self::pick_list_with_consumption(pick_list, &consumed)
    }

    /// 以外部計得的已耗用量計算
    ///
    /// # 參數
    /// * `consumed` - 明細列ID → 已耗用量；缺少的列視為 0
    pub fn pick_list_with_consumption(
        pick_list: &PickList,
        consumed: &HashMap<String, Decimal>,
    ) -> PickListBalance {
        let mut lines = Vec::with_capacity(pick_list.locations.len());
        let mut total_qty = Decimal::ZERO;
        let mut consumed_qty = Decimal::ZERO;

        for location in &pick_list.locations {
            let picked = location.picked_qty();
            let used = consumed.get(&location.name).copied().unwrap_or(Decimal::ZERO);

            total_qty += picked;
            consumed_qty += used;

            lines.push(LineBalance {
                row: location.name.clone(),
                item_code: location.item_code.clone(),
                item_name: location.item_name.clone(),
                picked_qty: picked,
                consumed_qty: used,
                display_balance: picked - used,
            });
        }

        PickListBalance {
            pick_list: pick_list.name.clone(),
            lines,
            total_qty,
            consumed_qty,
            balance_qty: total_qty - consumed_qty,
        }
    }

    /// 將結餘套用到記憶體中的揀貨單
    pub fn apply_to_pick_list(pick_list: &mut PickList, balance: &PickListBalance) {
        for location in &mut pick_list.locations {
            if let Some(line) = balance.line(&location.name) {
                location.consumed_qty = line.consumed_qty;
                location.balance_qty = line.display_balance;
            }
        }
        pick_list.total_qty = balance.total_qty;
        pick_list.consumed_qty = balance.consumed_qty;
        pick_list.balance_qty = balance.balance_qty;
    }

    /// 計算工單明細待轉移／待耗用量
    pub fn work_order(work_order: &WorkOrder) -> WorkOrderBalance {
        let mut lines = Vec::with_capacity(work_order.required_items.len());
        let mut total_required_qty = Decimal::ZERO;
        let mut total_transferred_qty = Decimal::ZERO;
        let mut total_consumed_qty = Decimal::ZERO;

        for item in &work_order.required_items {
            total_required_qty += item.required_qty;
            total_transferred_qty += item.transferred_qty;
            total_consumed_qty += item.consumed_qty;

            lines.push(WorkOrderLineBalance {
                row: item.name.clone(),
                item_code: item.item_code.clone(),
                required_qty: item.required_qty,
                transferred_qty: item.transferred_qty,
                consumed_qty: item.consumed_qty,
                balance_to_transfer: (item.required_qty - item.transferred_qty).max(Decimal::ZERO),
                balance_to_consume: (item.required_qty - item.consumed_qty).max(Decimal::ZERO),
            });
        }

        WorkOrderBalance {
            work_order: work_order.name.clone(),
            lines,
            total_required_qty,
            total_transferred_qty,
            total_consumed_qty,
        }
    }

    /// 將結餘套用到記憶體中的工單
    pub fn apply_to_work_order(work_order: &mut WorkOrder, balance: &WorkOrderBalance) {
        for item in &mut work_order.required_items {
            if let Some(line) = balance.line(&item.name) {
                item.balance_to_transfer = line.balance_to_transfer;
                item.balance_to_consume = line.balance_to_consume;
            }
        }
        work_order.totals.total_transferred_qty = balance.total_transferred_qty;
        work_order.totals.total_consumed_qty = balance.total_consumed_qty;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use shopfloor_core::{PickListItem, WorkOrderItem};

    fn pick_list(lines: &[(u32, u32)]) -> PickList {
        let mut pl = PickList::new("PL-0001");
        for (idx, (qty, consumed)) in lines.iter().enumerate() {
            let mut item = PickListItem::new(format!("PLI-{}", idx), format!("ITEM-{}", idx), Decimal::from(*qty));
            item.consumed_qty = Decimal::from(*consumed);
            pl = pl.with_location(item);
        }
        pl
    }

    #[test]
    fn test_pick_list_balance_simple() {
        let balance = BalanceCalculator::pick_list(&pick_list(&[(50, 20)]));

        assert_eq!(balance.total_qty, Decimal::from(50));
        assert_eq!(balance.consumed_qty, Decimal::from(20));
        assert_eq!(balance.balance_qty, Decimal::from(30));
        assert_eq!(balance.lines[0].display_balance, Decimal::from(30));
    }

    #[test]
    fn test_over_consumption_keeps_display_and_clamps_remaining() {
        let balance = BalanceCalculator::pick_list(&pick_list(&[(10, 12), (5, 0)]));

        let over = balance.line("PLI-0").unwrap();
        // 顯示結餘不截斷
        assert_eq!(over.display_balance, Decimal::from(-2));
        // 可作業量截斷於 0
        assert_eq!(over.remaining(), Decimal::ZERO);

        assert_eq!(balance.balance_qty, Decimal::from(3));

        let open: Vec<_> = balance.open_lines(Decimal::new(1, 6)).map(|l| l.row.as_str()).collect();
        assert_eq!(open, vec!["PLI-1"]);
    }

    #[test]
    fn test_missing_consumption_is_zero() {
        let pl = pick_list(&[(8, 3)]);
        let balance = BalanceCalculator::pick_list_with_consumption(&pl, &HashMap::new());
        assert_eq!(balance.consumed_qty, Decimal::ZERO);
        assert_eq!(balance.balance_qty, Decimal::from(8));
    }

    #[test]
    fn test_pl_qty_overrides_qty() {
        let pl = PickList::new("PL-0002")
            .with_location(PickListItem::new("PLI-1", "STEEL", Decimal::from(10)).with_pl_qty(Decimal::from(6)));
        let balance = BalanceCalculator::pick_list(&pl);
        assert_eq!(balance.total_qty, Decimal::from(6));
    }

    #[test]
    fn test_apply_to_pick_list() {
        let mut pl = pick_list(&[(50, 0)]);
        let mut consumed = HashMap::new();
        consumed.insert("PLI-0".to_string(), Decimal::from(20));

        let balance = BalanceCalculator::pick_list_with_consumption(&pl, &consumed);
        BalanceCalculator::apply_to_pick_list(&mut pl, &balance);

        assert_eq!(pl.locations[0].consumed_qty, Decimal::from(20));
        assert_eq!(pl.locations[0].balance_qty, Decimal::from(30));
        assert_eq!(pl.balance_qty, Decimal::from(30));
    }

    #[test]
    fn test_work_order_without_movements() {
        let wo = WorkOrder::new("WO-0001", "X-ASSY", Decimal::from(1))
            .with_required_item(WorkOrderItem::new("WOI-1", "X", Decimal::from(100)));

        let balance = BalanceCalculator::work_order(&wo);
        assert_eq!(balance.lines[0].balance_to_transfer, Decimal::from(100));
        assert_eq!(balance.lines[0].balance_to_consume, Decimal::from(100));
        assert_eq!(balance.total_transferred_qty, Decimal::ZERO);
    }

    #[test]
    fn test_work_order_balance_clamps() {
        let mut wo = WorkOrder::new("WO-0002", "X-ASSY", Decimal::from(1)).with_required_item(
            WorkOrderItem::new("WOI-1", "X", Decimal::from(10))
                .with_transferred_qty(Decimal::from(12))
                .with_consumed_qty(Decimal::from(4)),
        );

        let balance = BalanceCalculator::work_order(&wo);
        assert_eq!(balance.lines[0].balance_to_transfer, Decimal::ZERO);
        assert_eq!(balance.lines[0].balance_to_consume, Decimal::from(6));

        BalanceCalculator::apply_to_work_order(&mut wo, &balance);
        assert_eq!(wo.required_items[0].balance_to_consume, Decimal::from(6));
        assert_eq!(wo.totals.total_transferred_qty, Decimal::from(12));
        assert_eq!(wo.totals.total_consumed_qty, Decimal::from(4));
    }

    proptest! {
        #[test]
        fn prop_header_balance_is_total_minus_consumed(
            lines in prop::collection::vec((0u32..10_000, 0u32..10_000), 0..12)
        ) {
            let balance = BalanceCalculator::pick_list(&pick_list(&lines));

            let total: Decimal = lines.iter().map(|(q, _)| Decimal::from(*q)).sum();
            let consumed: Decimal = lines.iter().map(|(_, c)| Decimal::from(*c)).sum();

            prop_assert_eq!(balance.total_qty, total);
            prop_assert_eq!(balance.consumed_qty, consumed);
            prop_assert_eq!(balance.balance_qty, balance.total_qty - balance.consumed_qty);
            for line in &balance.lines {
                prop_assert_eq!(line.display_balance, line.picked_qty - line.consumed_qty);
                prop_assert!(line.remaining() >= Decimal::ZERO);
            }
        }

        #[test]
        fn prop_work_order_line_balances_clamp(
            required in 0u32..10_000,
            transferred in 0u32..20_000,
            consumed in 0u32..20_000,
        ) {
            let wo = WorkOrder::new("WO-P", "P", Decimal::ONE).with_required_item(
                WorkOrderItem::new("WOI-1", "X", Decimal::from(required))
                    .with_transferred_qty(Decimal::from(transferred))
                    .with_consumed_qty(Decimal::from(consumed)),
            );
            let line = &BalanceCalculator::work_order(&wo).lines[0];

            let expected_transfer = (Decimal::from(required) - Decimal::from(transferred)).max(Decimal::ZERO);
            let expected_consume = (Decimal::from(required) - Decimal::from(consumed)).max(Decimal::ZERO);
            prop_assert_eq!(line.balance_to_transfer, expected_transfer);
            prop_assert_eq!(line.balance_to_consume, expected_consume);
        }
    }
}
