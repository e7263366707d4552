//! 工單成本彙總

use rust_decimal::Decimal;
use serde::Serialize;
use shopfloor_core::{Item, ScrapItem, StockEntryRow, WorkOrderCosting};

/// 成本明細
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CostBreakdown {
    pub raw_material_cost: Decimal,
    pub scrap_material_cost: Decimal,
    pub operating_cost: Decimal,
    pub total_cost: Decimal,
}

impl From<CostBreakdown> for WorkOrderCosting {
    fn from(breakdown: CostBreakdown) -> Self {
        WorkOrderCosting {
            raw_material_cost: breakdown.raw_material_cost,
            scrap_material_cost: breakdown.scrap_material_cost,
            operating_cost: breakdown.operating_cost,
            total_cost: breakdown.total_cost,
        }
    }
}

/// 成本彙總器
pub struct CostAggregator;

impl CostAggregator {
    /// 彙總工單成本
    ///
    /// `rows` 應為該工單所有已提交異動單的明細。成品列略過；廢料列計入廢料價值；
    /// 其餘計入原料成本。金額一律以庫存數量 × 單價計。
    pub fn aggregate(rows: &[StockEntryRow], operating_cost: Decimal) -> CostBreakdown {
        let mut raw_material_cost = Decimal::ZERO;
        let mut scrap_material_cost = Decimal::ZERO;

        for row in rows {
            let detail = &row.detail;
            if detail.is_finished_item {
                continue;
            }
            if detail.is_scrap_item {
                scrap_material_cost += detail.amount();
            } else {
                raw_material_cost += detail.amount();
            }
        }

        CostBreakdown {
            raw_material_cost,
            scrap_material_cost,
            operating_cost,
            total_cost: Self::total_cost(raw_material_cost, operating_cost, scrap_material_cost),
        }
    }

    /// 總成本 = 原料 + 作業 - 廢料（廢料視為回收價值）
    pub fn total_cost(raw: Decimal, operating: Decimal, scrap: Decimal) -> Decimal {
        raw + operating - scrap
    }

    /// 估算工單廢料明細的金額
    ///
    /// 單價為 0 時改用料件主檔的預設單價；庫存單位一律取自料件主檔。
    pub fn value_scrap_item(scrap: &mut ScrapItem, item: Option<&Item>) {
        if let Some(item) = item {
            scrap.stock_uom = item.stock_uom.clone();
            if scrap.item_name.is_empty() {
                scrap.item_name = item.item_name.clone();
            }
            if scrap.rate.is_zero() {
                scrap.rate = item.default_rate();
            }
        }
        scrap.amount = scrap.stock_qty * scrap.rate;
    }
}
