//! 庫存異動單模型

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{DocStatus, ShopfloorError};

/// 異動類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockEntryType {
    /// 生產領料（轉入 WIP）
    MaterialTransferForManufacture,
    /// 生產入庫（耗用 WIP，產出成品與廢料）
    Manufacture,
    MaterialTransfer,
    MaterialIssue,
    MaterialReceipt,
}

impl StockEntryType {
    pub fn as_str(self) -> &'static str {
        match self {
            StockEntryType::MaterialTransferForManufacture => "Material Transfer for Manufacture",
            StockEntryType::Manufacture => "Manufacture",
            StockEntryType::MaterialTransfer => "Material Transfer",
            StockEntryType::MaterialIssue => "Material Issue",
            StockEntryType::MaterialReceipt => "Material Receipt",
        }
    }

    /// 是否屬於工單生產流程
    pub fn is_manufacturing_flow(self) -> bool {
        matches!(
            self,
            StockEntryType::MaterialTransferForManufacture | StockEntryType::Manufacture
        )
    }
}

impl fmt::Display for StockEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StockEntryType {
    type Err = ShopfloorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Material Transfer for Manufacture" => Ok(StockEntryType::MaterialTransferForManufacture),
            "Manufacture" => Ok(StockEntryType::Manufacture),
            "Material Transfer" => Ok(StockEntryType::MaterialTransfer),
            "Material Issue" => Ok(StockEntryType::MaterialIssue),
            "Material Receipt" => Ok(StockEntryType::MaterialReceipt),
            other => Err(ShopfloorError::validation(format!(
                "不支援的異動類型: {}",
                other
            ))),
        }
    }
}

/// 異動明細
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockEntryDetail {
    /// 明細列ID（新增時由存取層指派）
    pub name: String,

    pub item_code: String,
    pub item_name: String,

    /// 數量（交易單位）
    pub qty: Decimal,

    pub uom: String,
    pub stock_uom: String,
    pub conversion_factor: Decimal,

    /// 單價（庫存單位）
    pub basic_rate: Decimal,

    /// 來源倉（有值代表扣帳）
    pub s_warehouse: Option<String>,

    /// 目標倉
    pub t_warehouse: Option<String>,

    pub is_finished_item: bool,
    pub is_scrap_item: bool,

    /// 對應的揀貨明細列
    pub pick_list_item: Option<String>,
}

impl StockEntryDetail {
    /// 創建新的異動明細
    pub fn new(item_code: impl Into<String>, qty: Decimal) -> Self {
        Self {
            name: String::new(),
            item_code: item_code.into(),
            item_name: String::new(),
            qty,
            uom: "Nos".to_string(),
            stock_uom: "Nos".to_string(),
            conversion_factor: Decimal::ONE,
            basic_rate: Decimal::ZERO,
            s_warehouse: None,
            t_warehouse: None,
            is_finished_item: false,
            is_scrap_item: false,
            pick_list_item: None,
        }
    }

    /// 建構器模式：設置明細列ID
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// 建構器模式：設置物料名稱
    pub fn with_item_name(mut self, item_name: impl Into<String>) -> Self {
        self.item_name = item_name.into();
        self
    }

    /// 建構器模式：設置單位（同時作為庫存單位）
    pub fn with_uom(mut self, uom: impl Into<String>) -> Self {
        let uom = uom.into();
        self.stock_uom = uom.clone();
        self.uom = uom;
        self
    }

    /// 建構器模式：設置換算率
    pub fn with_conversion_factor(mut self, factor: Decimal) -> Self {
        self.conversion_factor = factor;
        self
    }

    /// 建構器模式：設置單價
    pub fn with_rate(mut self, rate: Decimal) -> Self {
        self.basic_rate = rate;
        self
    }

    /// 建構器模式：設置來源倉
    pub fn from_warehouse(mut self, warehouse: impl Into<String>) -> Self {
        self.s_warehouse = Some(warehouse.into());
        self
    }

    /// 建構器模式：設置目標倉
    pub fn to_warehouse(mut self, warehouse: impl Into<String>) -> Self {
        self.t_warehouse = Some(warehouse.into());
        self
    }

    /// 建構器模式：標記為成品
    pub fn as_finished(mut self) -> Self {
        self.is_finished_item = true;
        self
    }

    /// 建構器模式：標記為廢料
    pub fn as_scrap(mut self) -> Self {
        self.is_scrap_item = true;
        self
    }

    /// 建構器模式：關聯揀貨明細
    pub fn with_pick_list_item(mut self, row: impl Into<String>) -> Self {
        self.pick_list_item = Some(row.into());
        self
    }

    /// 庫存單位數量
    pub fn transfer_qty(&self) -> Decimal {
        self.qty * self.conversion_factor
    }

    /// 金額 = 庫存數量 × 單價
    pub fn amount(&self) -> Decimal {
        self.transfer_qty() * self.basic_rate
    }

    /// 是否為扣帳列（有來源倉）
    pub fn draws_down(&self) -> bool {
        self.s_warehouse.as_deref().is_some_and(|w| !w.is_empty())
    }

    /// 是否為原料列（非成品、非廢料）
    pub fn is_raw_material(&self) -> bool {
        !self.is_finished_item && !self.is_scrap_item
    }
}

/// 庫存異動單
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockEntry {
    pub name: String,
    pub company: String,
    pub entry_type: StockEntryType,
    pub work_order: Option<String>,
    pub pick_list: Option<String>,

    /// 完工數量（Manufacture 用）
    pub fg_completed_qty: Decimal,

    pub docstatus: DocStatus,
    pub items: Vec<StockEntryDetail>,
    pub modified: DateTime<Utc>,
}

impl StockEntry {
    /// 創建新的異動單（草稿）
    pub fn new(name: impl Into<String>, entry_type: StockEntryType) -> Self {
        Self {
            name: name.into(),
            company: String::new(),
            entry_type,
            work_order: None,
            pick_list: None,
            fg_completed_qty: Decimal::ZERO,
            docstatus: DocStatus::Draft,
            items: Vec::new(),
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

    /// 建構器模式：關聯揀貨單
    pub fn with_pick_list(mut self, pick_list: impl Into<String>) -> Self {
        self.pick_list = Some(pick_list.into());
        self
    }

    /// 建構器模式：加入明細
    pub fn with_item(mut self, item: StockEntryDetail) -> Self {
        self.items.push(item);
        self
    }

    /// 建構器模式：設為已提交
    pub fn submitted(mut self) -> Self {
        self.docstatus = DocStatus::Submitted;
        self
    }

    /// 成品列數量合計
    pub fn finished_qty(&self) -> Decimal {
        self.items
            .iter()
            .filter(|i| i.is_finished_item)
            .map(|i| i.qty)
            .sum()
    }
}
