//! 揀貨單模型

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{DocStatus, ShopfloorError, StockEntryType};

/// 揀貨單狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PickListStatus {
    #[default]
    Open,
    Completed,
}

impl PickListStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PickListStatus::Open => "Open",
            PickListStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for PickListStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PickListStatus {
    type Err = ShopfloorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(PickListStatus::Open),
            "Completed" => Ok(PickListStatus::Completed),
            other => Err(ShopfloorError::validation(format!("未知的揀貨單狀態: {}", other))),
        }
    }
}

/// 揀貨明細
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickListItem {
    /// 明細列ID
    pub name: String,

    pub item_code: String,
    pub item_name: String,

    /// 揀貨倉
    pub warehouse: Option<String>,

    pub uom: String,
    pub stock_uom: String,
    pub conversion_factor: Decimal,

    /// 揀貨數量
    pub qty: Decimal,

    /// 手動指定的揀貨量（非零時取代 qty）
    pub pl_qty: Option<Decimal>,

    /// 已耗用量
    pub consumed_qty: Decimal,

    /// 結餘量（揀貨量 - 已耗用量，不截斷）
    pub balance_qty: Decimal,

    /// 建立時的工單需求量
    pub wo_required_qty: Option<Decimal>,
}

impl PickListItem {
    /// 創建新的揀貨明細
    pub fn new(name: impl Into<String>, item_code: impl Into<String>, qty: Decimal) -> Self {
        Self {
            name: name.into(),
            item_code: item_code.into(),
            item_name: String::new(),
            warehouse: None,
            uom: "Nos".to_string(),
            stock_uom: "Nos".to_string(),
            conversion_factor: Decimal::ONE,
            qty,
            pl_qty: None,
            consumed_qty: Decimal::ZERO,
            balance_qty: qty,
            wo_required_qty: None,
        }
    }

    /// 建構器模式：設置揀貨倉
    pub fn with_warehouse(mut self, warehouse: impl Into<String>) -> Self {
        self.warehouse = Some(warehouse.into());
        self
    }

    /// 建構器模式：設置物料名稱
    pub fn with_item_name(mut self, item_name: impl Into<String>) -> Self {
        self.item_name = item_name.into();
        self
    }

    /// 建構器模式：設置單位
    pub fn with_uom(mut self, uom: impl Into<String>) -> Self {
        let uom = uom.into();
        self.stock_uom = uom.clone();
        self.uom = uom;
        self
    }

    /// 建構器模式：設置手動揀貨量
    pub fn with_pl_qty(mut self, pl_qty: Decimal) -> Self {
        self.pl_qty = Some(pl_qty);
        self
    }

    /// 實際揀貨量
    pub fn picked_qty(&self) -> Decimal {
        match self.pl_qty {
            Some(pl_qty) if !pl_qty.is_zero() => pl_qty,
            _ => self.qty,
        }
    }
}

/// 揀貨單
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickList {
    pub name: String,
    pub company: String,

    /// 關聯工單
    pub work_order: Option<String>,

    pub purpose: StockEntryType,

    /// 本揀貨單對應的成品數量
    pub for_qty: Decimal,

    pub docstatus: DocStatus,
    pub status: PickListStatus,

    /// 揀貨明細
    pub locations: Vec<PickListItem>,

    /// 表頭彙總：揀貨總量
    pub total_qty: Decimal,

    /// 表頭彙總：已耗用量
    pub consumed_qty: Decimal,

    /// 表頭彙總：結餘量
    pub balance_qty: Decimal,

    pub modified: DateTime<Utc>,
}

impl PickList {
    /// 創建新的揀貨單（草稿）
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            company: String::new(),
            work_order: None,
            purpose: StockEntryType::MaterialTransferForManufacture,
            for_qty: Decimal::ZERO,
            docstatus: DocStatus::Draft,
            status: PickListStatus::Open,
            locations: Vec::new(),
            total_qty: Decimal::ZERO,
            consumed_qty: Decimal::ZERO,
            balance_qty: Decimal::ZERO,
            modified: Utc::now(),
        }
    }

    /// 建構器模式：設置公司
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = company.into();
        self
    }

    /// 建構器模式：關聯工單
    pub fn with_work_order(mut self, work_order: impl Into<String>) -> Self {
        self.work_order = Some(work_order.into());
        self
    }

    /// 建構器模式：設置成品數量
    pub fn with_for_qty(mut self, for_qty: Decimal) -> Self {
        self.for_qty = for_qty;
        self
    }

    /// 建構器模式：加入揀貨明細
    pub fn with_location(mut self, item: PickListItem) -> Self {
        self.locations.push(item);
        self
    }

    /// 建構器模式：設為已提交
    pub fn submitted(mut self) -> Self {
        self.docstatus = DocStatus::Submitted;
        self
    }

    /// 依明細列ID找揀貨明細
    pub fn location(&self, name: &str) -> Option<&PickListItem> {
        self.locations.iter().find(|l| l.name == name)
    }

    /// 所有明細列ID
    pub fn location_names(&self) -> Vec<String> {
        self.locations.iter().map(|l| l.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picked_qty_prefers_pl_qty() {
        let item = PickListItem::new("PLI-1", "STEEL", Decimal::from(10));
        assert_eq!(item.picked_qty(), Decimal::from(10));

        let item = item.with_pl_qty(Decimal::from(8));
        assert_eq!(item.picked_qty(), Decimal::from(8));

        // 手動量為 0 時退回 qty
        let item = item.with_pl_qty(Decimal::ZERO);
        assert_eq!(item.picked_qty(), Decimal::from(10));
    }

    #[test]
    fn test_pick_list_builder() {
        let pl = PickList::new("PL-0001")
            .with_work_order("WO-0001")
            .with_for_qty(Decimal::from(5))
            .with_location(PickListItem::new("PLI-1", "STEEL", Decimal::from(10)))
            .submitted();

        assert_eq!(pl.work_order.as_deref(), Some("WO-0001"));
        assert!(pl.docstatus.is_submitted());
        assert_eq!(pl.status, PickListStatus::Open);
        assert!(pl.location("PLI-1").is_some());
        assert_eq!(pl.location_names(), vec!["PLI-1".to_string()]);
    }
}
