//! 工單模型

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{DocStatus, ShopfloorError};

/// 工單狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WorkOrderStatus {
    /// 草稿（尚未提交）
    #[default]
    Draft,
    /// 未開始
    NotStarted,
    /// 進行中
    InProcess,
    /// 已完成
    Completed,
    /// 已停止（手動設定）
    Stopped,
    /// 已結案（手動設定）
    Closed,
    /// 已取消
    Cancelled,
}

impl WorkOrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkOrderStatus::Draft => "Draft",
            WorkOrderStatus::NotStarted => "Not Started",
            WorkOrderStatus::InProcess => "In Process",
            WorkOrderStatus::Completed => "Completed",
            WorkOrderStatus::Stopped => "Stopped",
            WorkOrderStatus::Closed => "Closed",
            WorkOrderStatus::Cancelled => "Cancelled",
        }
    }

    /// 手動設定的狀態，自動推導不得覆蓋
    pub fn is_sticky(self) -> bool {
        matches!(self, WorkOrderStatus::Stopped | WorkOrderStatus::Closed)
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            WorkOrderStatus::Completed
                | WorkOrderStatus::Stopped
                | WorkOrderStatus::Closed
                | WorkOrderStatus::Cancelled
        )
    }
}

impl fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkOrderStatus {
    type Err = ShopfloorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Draft" => Ok(WorkOrderStatus::Draft),
            "Not Started" => Ok(WorkOrderStatus::NotStarted),
            "In Process" => Ok(WorkOrderStatus::InProcess),
            "Completed" => Ok(WorkOrderStatus::Completed),
            "Stopped" => Ok(WorkOrderStatus::Stopped),
            "Closed" => Ok(WorkOrderStatus::Closed),
            "Cancelled" => Ok(WorkOrderStatus::Cancelled),
            other => Err(ShopfloorError::validation(format!("未知的工單狀態: {}", other))),
        }
    }
}

/// 工單需求明細
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrderItem {
    /// 明細列ID
    pub name: String,

    /// 物料編號
    pub item_code: String,

    /// 物料名稱
    pub item_name: String,

    /// 來源倉
    pub source_warehouse: Option<String>,

    /// 庫存單位
    pub stock_uom: String,

    /// 需求量
    pub required_qty: Decimal,

    /// 已轉移至 WIP 數量
    pub transferred_qty: Decimal,

    /// 已耗用數量
    pub consumed_qty: Decimal,

    /// 待轉移量（不小於 0）
    pub balance_to_transfer: Decimal,

    /// 待耗用量（不小於 0）
    pub balance_to_consume: Decimal,
}

impl WorkOrderItem {
    /// 創建新的需求明細
    pub fn new(name: impl Into<String>, item_code: impl Into<String>, required_qty: Decimal) -> Self {
        Self {
            name: name.into(),
            item_code: item_code.into(),
            item_name: String::new(),
            source_warehouse: None,
            stock_uom: String::new(),
            required_qty,
            transferred_qty: Decimal::ZERO,
            consumed_qty: Decimal::ZERO,
            balance_to_transfer: Decimal::ZERO,
            balance_to_consume: Decimal::ZERO,
        }
    }

    /// 建構器模式：設置物料名稱
    pub fn with_item_name(mut self, item_name: impl Into<String>) -> Self {
        self.item_name = item_name.into();
        self
    }

    /// 建構器模式：設置來源倉
    pub fn with_source_warehouse(mut self, warehouse: impl Into<String>) -> Self {
        self.source_warehouse = Some(warehouse.into());
        self
    }

    /// 建構器模式：設置庫存單位
    pub fn with_stock_uom(mut self, uom: impl Into<String>) -> Self {
        self.stock_uom = uom.into();
        self
    }

    /// 建構器模式：設置已轉移量
    pub fn with_transferred_qty(mut self, qty: Decimal) -> Self {
        self.transferred_qty = qty;
        self
    }

    /// 建構器模式：設置已耗用量
    pub fn with_consumed_qty(mut self, qty: Decimal) -> Self {
        self.consumed_qty = qty;
        self
    }

    /// 是否已有任何進度
    pub fn has_progress(&self) -> bool {
        self.transferred_qty > Decimal::ZERO || self.consumed_qty > Decimal::ZERO
    }
}

/// 工單廢料明細
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapItem {
    pub item_code: String,
    pub item_name: String,
    pub stock_uom: String,
    pub stock_qty: Decimal,
    pub rate: Decimal,
    pub amount: Decimal,
}

impl ScrapItem {
    pub fn new(item_code: impl Into<String>, stock_qty: Decimal) -> Self {
        Self {
            item_code: item_code.into(),
            item_name: String::new(),
            stock_uom: String::new(),
            stock_qty,
            rate: Decimal::ZERO,
            amount: Decimal::ZERO,
        }
    }

    pub fn with_rate(mut self, rate: Decimal) -> Self {
        self.rate = rate;
        self
    }

    pub fn with_stock_uom(mut self, uom: impl Into<String>) -> Self {
        self.stock_uom = uom.into();
        self
    }
}

/// 工單成本欄位
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrderCosting {
    /// 原料成本
    pub raw_material_cost: Decimal,

    /// 廢料價值
    pub scrap_material_cost: Decimal,

    /// 作業成本（手動輸入）
    pub operating_cost: Decimal,

    /// 總成本
    pub total_cost: Decimal,
}

/// 工單彙總數量
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrderTotals {
    pub total_transferred_qty: Decimal,
    pub total_consumed_qty: Decimal,
    pub total_picked_qty: Decimal,
    pub total_pick_consumed_qty: Decimal,
}

/// 工單
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrder {
    /// 工單號
    pub name: String,

    /// 公司
    pub company: String,

    /// 成品料號
    pub production_item: String,

    /// BOM 編號
    pub bom_no: Option<String>,

    /// 成品庫存單位
    pub stock_uom: String,

    /// 計劃生產量
    pub qty: Decimal,

    /// 已生產量
    pub produced_qty: Decimal,

    /// 已轉移生產數量（依揀貨單 for_qty 累計）
    pub material_transferred_for_manufacturing: Decimal,

    pub source_warehouse: Option<String>,
    pub wip_warehouse: Option<String>,
    pub fg_warehouse: Option<String>,
    pub scrap_warehouse: Option<String>,

    /// 提交狀態
    pub docstatus: DocStatus,

    /// 工單狀態
    pub status: WorkOrderStatus,

    /// 需求明細
    pub required_items: Vec<WorkOrderItem>,

    /// 廢料明細
    pub scrap_items: Vec<ScrapItem>,

    pub costing: WorkOrderCosting,

    pub totals: WorkOrderTotals,

    /// 最後修改時間
    pub modified: DateTime<Utc>,
}

impl WorkOrder {
    /// 創建新的工單（草稿）
    pub fn new(name: impl Into<String>, production_item: impl Into<String>, qty: Decimal) -> Self {
        Self {
            name: name.into(),
            company: String::new(),
            production_item: production_item.into(),
            bom_no: None,
            stock_uom: "Nos".to_string(),
            qty,
            produced_qty: Decimal::ZERO,
            material_transferred_for_manufacturing: Decimal::ZERO,
            source_warehouse: None,
            wip_warehouse: None,
            fg_warehouse: None,
            scrap_warehouse: None,
            docstatus: DocStatus::Draft,
            status: WorkOrderStatus::Draft,
            required_items: Vec::new(),
            scrap_items: Vec::new(),
            costing: WorkOrderCosting::default(),
            totals: WorkOrderTotals::default(),
            modified: Utc::now(),
        }
    }

    /// 建構器模式：設置公司
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = company.into();
        self
    }

    /// 建構器模式：設置 BOM
    pub fn with_bom(mut self, bom_no: impl Into<String>) -> Self {
        self.bom_no = Some(bom_no.into());
        self
    }

    /// 建構器模式：設置來源倉
    pub fn with_source_warehouse(mut self, warehouse: impl Into<String>) -> Self {
        self.source_warehouse = Some(warehouse.into());
        self
    }

    /// 建構器模式：設置在製品倉
    pub fn with_wip_warehouse(mut self, warehouse: impl Into<String>) -> Self {
        self.wip_warehouse = Some(warehouse.into());
        self
    }

    /// 建構器模式：設置成品倉
    pub fn with_fg_warehouse(mut self, warehouse: impl Into<String>) -> Self {
        self.fg_warehouse = Some(warehouse.into());
        self
    }

    /// 建構器模式：設置廢料倉
    pub fn with_scrap_warehouse(mut self, warehouse: impl Into<String>) -> Self {
        self.scrap_warehouse = Some(warehouse.into());
        self
    }

    /// 建構器模式：設置作業成本
    pub fn with_operating_cost(mut self, cost: Decimal) -> Self {
        self.costing.operating_cost = cost;
        self
    }

    /// 建構器模式：加入需求明細
    pub fn with_required_item(mut self, item: WorkOrderItem) -> Self {
        self.required_items.push(item);
        self
    }

    /// 建構器模式：加入廢料明細
    pub fn with_scrap_item(mut self, item: ScrapItem) -> Self {
        self.scrap_items.push(item);
        self
    }

    /// 建構器模式：設為已提交
    pub fn submitted(mut self) -> Self {
        self.docstatus = DocStatus::Submitted;
        if self.status == WorkOrderStatus::Draft {
            self.status = WorkOrderStatus::NotStarted;
        }
        self
    }

    /// 依物料編號找需求明細
    pub fn required_item(&self, item_code: &str) -> Option<&WorkOrderItem> {
        self.required_items.iter().find(|i| i.item_code == item_code)
    }

    /// 剩餘待生產量
    pub fn remaining_to_produce(&self) -> Decimal {
        self.qty - self.produced_qty
    }
}
