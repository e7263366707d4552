//! 可回寫的衍生欄位

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{DocType, ShopfloorError};

/// 對帳層會回寫的欄位
///
/// 標準欄位（狀態、已轉移量、已生產量、明細已轉移/已耗用量）由 ERP 本身提供；
/// 其餘為客製欄位，是否存在由 [`crate::FieldSchema`] 決定。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    // 工單表頭
    WorkOrderStatus,
    MaterialTransferred,
    ProducedQty,
    RawMaterialCost,
    ScrapMaterialCost,
    TotalCost,
    TotalTransferredQty,
    TotalConsumedQty,
    TotalPickedQty,
    TotalPickConsumedQty,

    // 工單明細
    ItemTransferredQty,
    ItemConsumedQty,
    BalanceToTransfer,
    BalanceToConsume,

    // 揀貨單表頭
    PickListStatus,
    PickListTotalQty,
    PickListConsumedQty,
    PickListBalanceQty,

    // 揀貨單明細
    PickItemConsumedQty,
    PickItemBalanceQty,
}

impl Field {
    pub const ALL: [Field; 20] = [
        Field::WorkOrderStatus,
        Field::MaterialTransferred,
        Field::ProducedQty,
        Field::RawMaterialCost,
        Field::ScrapMaterialCost,
        Field::TotalCost,
        Field::TotalTransferredQty,
        Field::TotalConsumedQty,
        Field::TotalPickedQty,
        Field::TotalPickConsumedQty,
        Field::ItemTransferredQty,
        Field::ItemConsumedQty,
        Field::BalanceToTransfer,
        Field::BalanceToConsume,
        Field::PickListStatus,
        Field::PickListTotalQty,
        Field::PickListConsumedQty,
        Field::PickListBalanceQty,
        Field::PickItemConsumedQty,
        Field::PickItemBalanceQty,
    ];

    /// 欄位所在的文件類型
    pub fn doctype(self) -> DocType {
        match self {
            Field::WorkOrderStatus
            | Field::MaterialTransferred
            | Field::ProducedQty
            | Field::RawMaterialCost
            | Field::ScrapMaterialCost
            | Field::TotalCost
            | Field::TotalTransferredQty
            | Field::TotalConsumedQty
            | Field::TotalPickedQty
            | Field::TotalPickConsumedQty => DocType::WorkOrder,
            Field::ItemTransferredQty
            | Field::ItemConsumedQty
            | Field::BalanceToTransfer
            | Field::BalanceToConsume => DocType::WorkOrderItem,
            Field::PickListStatus
            | Field::PickListTotalQty
            | Field::PickListConsumedQty
            | Field::PickListBalanceQty => DocType::PickList,
            Field::PickItemConsumedQty | Field::PickItemBalanceQty => DocType::PickListItem,
        }
    }

    /// 資料庫欄位名稱
    pub fn fieldname(self) -> &'static str {
        match self {
            Field::WorkOrderStatus | Field::PickListStatus => "status",
            Field::MaterialTransferred => "material_transferred_for_manufacturing",
            Field::ProducedQty => "produced_qty",
            Field::RawMaterialCost => "raw_material_cost",
            Field::ScrapMaterialCost => "scrap_material_cost",
            Field::TotalCost => "total_cost",
            Field::TotalTransferredQty => "total_transferred_qty",
            Field::TotalConsumedQty => "total_consumed_qty",
            Field::TotalPickedQty => "total_picked_qty",
            Field::TotalPickConsumedQty => "total_pick_consumed_qty",
            Field::ItemTransferredQty => "transferred_qty",
            Field::ItemConsumedQty | Field::PickItemConsumedQty => "consumed_qty",
            Field::BalanceToTransfer => "balance_to_transfer",
            Field::BalanceToConsume => "balance_to_consume",
            Field::PickListTotalQty => "total_qty",
            Field::PickListConsumedQty => "consumed_qty",
            Field::PickListBalanceQty | Field::PickItemBalanceQty => "balance_qty",
        }
    }

    /// ERP 本身就有的欄位（不受欄位結構設定影響）
    pub fn is_standard(self) -> bool {
        matches!(
            self,
            Field::WorkOrderStatus
                | Field::MaterialTransferred
                | Field::ProducedQty
                | Field::ItemTransferredQty
                | Field::ItemConsumedQty
                | Field::PickListStatus
        )
    }
}

/// 欄位值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    Qty(Decimal),
    Text(String),
}

impl FieldValue {
    pub fn as_qty(&self) -> crate::Result<Decimal> {
        match self {
            FieldValue::Qty(qty) => Ok(*qty),
            FieldValue::Text(text) => Err(ShopfloorError::validation(format!(
                "預期數值欄位，收到文字: {}",
                text
            ))),
        }
    }

    pub fn as_text(&self) -> crate::Result<&str> {
        match self {
            FieldValue::Text(text) => Ok(text),
            FieldValue::Qty(qty) => Err(ShopfloorError::validation(format!(
                "預期文字欄位，收到數值: {}",
                qty
            ))),
        }
    }
}

impl From<Decimal> for FieldValue {
    fn from(qty: Decimal) -> Self {
        FieldValue::Qty(qty)
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        FieldValue::Text(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_doctype() {
        assert_eq!(Field::TotalCost.doctype(), DocType::WorkOrder);
        assert_eq!(Field::BalanceToConsume.doctype(), DocType::WorkOrderItem);
        assert_eq!(Field::PickListBalanceQty.doctype(), DocType::PickList);
        assert_eq!(Field::PickItemBalanceQty.doctype(), DocType::PickListItem);
    }

    #[test]
    fn test_standard_fields() {
        let standard: Vec<_> = Field::ALL.iter().filter(|f| f.is_standard()).collect();
        assert_eq!(standard.len(), 6);
        assert!(!Field::TotalCost.is_standard());
    }

    #[test]
    fn test_field_value_conversion() {
        let qty = FieldValue::from(Decimal::from(5));
        assert_eq!(qty.as_qty().unwrap(), Decimal::from(5));
        assert!(qty.as_text().is_err());

        let text = FieldValue::from("Completed");
        assert_eq!(text.as_text().unwrap(), "Completed");
        assert!(text.as_qty().is_err());
    }
}
