//! 主檔（BOM、物料），唯讀

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// BOM 用料
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomItem {
    pub item_code: String,
    pub item_name: String,
    pub qty: Decimal,
    pub stock_uom: String,
    pub source_warehouse: Option<String>,
}

/// BOM 廢料
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomScrapItem {
    pub item_code: String,
    pub item_name: String,
    pub stock_qty: Decimal,
    pub stock_uom: String,
    pub rate: Decimal,
}

/// 物料清單
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bom {
    pub name: String,

    /// 成品料號
    pub item: String,

    /// BOM 基準產量
    pub quantity: Decimal,

    pub items: Vec<BomItem>,
    pub scrap_items: Vec<BomScrapItem>,
}

impl Bom {
    pub fn new(name: impl Into<String>, item: impl Into<String>, quantity: Decimal) -> Self {
        Self {
            name: name.into(),
            item: item.into(),
            quantity,
            items: Vec::new(),
            scrap_items: Vec::new(),
        }
    }

    /// 建構器模式：加入用料
    pub fn with_item(mut self, item_code: impl Into<String>, qty: Decimal) -> Self {
        self.items.push(BomItem {
            item_code: item_code.into(),
            item_name: String::new(),
            qty,
            stock_uom: String::new(),
            source_warehouse: None,
        });
        self
    }

    /// 建構器模式：加入廢料
    pub fn with_scrap_item(mut self, item_code: impl Into<String>, stock_qty: Decimal, rate: Decimal) -> Self {
        self.scrap_items.push(BomScrapItem {
            item_code: item_code.into(),
            item_name: String::new(),
            stock_qty,
            stock_uom: String::new(),
            rate,
        });
        self
    }

    /// 工單數量相對於 BOM 基準產量的倍數
    pub fn multiplier_for(&self, work_order_qty: Decimal) -> Decimal {
        let base = if self.quantity.is_zero() {
            Decimal::ONE
        } else {
            self.quantity
        };
        let qty = if work_order_qty.is_zero() {
            Decimal::ONE
        } else {
            work_order_qty
        };
        qty / base
    }
}

/// 物料主檔
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub item_code: String,
    pub item_name: String,
    pub stock_uom: String,
    pub description: Option<String>,
    pub valuation_rate: Option<Decimal>,
    pub last_purchase_rate: Option<Decimal>,
}

impl Item {
    pub fn new(item_code: impl Into<String>, stock_uom: impl Into<String>) -> Self {
        let item_code = item_code.into();
        Self {
            item_name: item_code.clone(),
            item_code,
            stock_uom: stock_uom.into(),
            description: None,
            valuation_rate: None,
            last_purchase_rate: None,
        }
    }

    pub fn with_item_name(mut self, item_name: impl Into<String>) -> Self {
        self.item_name = item_name.into();
        self
    }

    pub fn with_valuation_rate(mut self, rate: Decimal) -> Self {
        self.valuation_rate = Some(rate);
        self
    }

    pub fn with_last_purchase_rate(mut self, rate: Decimal) -> Self {
        self.last_purchase_rate = Some(rate);
        self
    }

    /// 預設單價：評價單價優先，其次最近採購價
    pub fn default_rate(&self) -> Decimal {
        self.valuation_rate
            .filter(|r| !r.is_zero())
            .or(self.last_purchase_rate)
            .unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bom_multiplier() {
        let bom = Bom::new("BOM-BIKE-001", "BIKE", Decimal::from(2));
        assert_eq!(bom.multiplier_for(Decimal::from(10)), Decimal::from(5));

        let zero_base = Bom::new("BOM-X", "X", Decimal::ZERO);
        assert_eq!(zero_base.multiplier_for(Decimal::from(3)), Decimal::from(3));
    }

    #[test]
    fn test_item_default_rate() {
        let item = Item::new("SCRAP-STEEL", "Kg");
        assert_eq!(item.default_rate(), Decimal::ZERO);

        let item = item.with_last_purchase_rate(Decimal::from(4));
        assert_eq!(item.default_rate(), Decimal::from(4));

        let item = item.with_valuation_rate(Decimal::from(6));
        assert_eq!(item.default_rate(), Decimal::from(6));
    }
}
