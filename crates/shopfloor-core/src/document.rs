//! 文件狀態與文件類型

use serde::{Deserialize, Serialize};
use std::fmt;

/// 文件提交狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DocStatus {
    /// 草稿（docstatus = 0）
    #[default]
    Draft,
    /// 已提交（docstatus = 1）
    Submitted,
    /// 已取消（docstatus = 2）
    Cancelled,
}

impl DocStatus {
    pub fn is_draft(self) -> bool {
        self == DocStatus::Draft
    }

    pub fn is_submitted(self) -> bool {
        self == DocStatus::Submitted
    }

    pub fn is_cancelled(self) -> bool {
        self == DocStatus::Cancelled
    }
}

/// 文件類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocType {
    WorkOrder,
    WorkOrderItem,
    PickList,
    PickListItem,
    StockEntry,
    StockEntryDetail,
    Bom,
    Item,
}

impl DocType {
    pub fn as_str(self) -> &'static str {
        match self {
            DocType::WorkOrder => "Work Order",
            DocType::WorkOrderItem => "Work Order Item",
            DocType::PickList => "Pick List",
            DocType::PickListItem => "Pick List Item",
            DocType::StockEntry => "Stock Entry",
            DocType::StockEntryDetail => "Stock Entry Detail",
            DocType::Bom => "BOM",
            DocType::Item => "Item",
        }
    }

    /// 子表列所屬的父文件類型
    pub fn parent(self) -> Option<DocType> {
        match self {
            DocType::WorkOrderItem => Some(DocType::WorkOrder),
            DocType::PickListItem => Some(DocType::PickList),
            DocType::StockEntryDetail => Some(DocType::StockEntry),
            _ => None,
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
