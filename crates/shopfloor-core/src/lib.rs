//! # Shopfloor Core
//!
//! 工單、揀貨單與庫存異動單的核心資料模型，以及外部文件存取介面

pub mod config;
pub mod document;
pub mod field;
pub mod master;
pub mod memory;
pub mod pick_list;
pub mod stock_entry;
pub mod store;
pub mod work_order;

// Re-export 主要類型
pub use config::{FieldSchema, ReconcileConfig};
pub use document::{DocStatus, DocType};
pub use field::{Field, FieldValue};
pub use master::{Bom, BomItem, BomScrapItem, Item};
pub use memory::MemoryStore;
pub use pick_list::{PickList, PickListItem, PickListStatus};
pub use stock_entry::{StockEntry, StockEntryDetail, StockEntryType};
pub use store::{DocumentStore, ErrorLogEntry, PickListQuery, StockEntryQuery, StockEntryRow};
pub use work_order::{ScrapItem, WorkOrder, WorkOrderCosting, WorkOrderItem, WorkOrderStatus, WorkOrderTotals};

/// 錯誤分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 使用者輸入錯誤，立即中止操作
    Validation,
    /// 找不到文件
    NotFound,
    /// 背景重算錯誤，只記錄不回報
    Reconciliation,
    /// 欄位結構設定錯誤（啟動時檢查）
    Schema,
}

/// Shopfloor 錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum ShopfloorError {
    #[error("{0}")]
    Validation(String),

    #[error("找不到{doctype}: {name}")]
    NotFound { doctype: DocType, name: String },

    #[error("重算失敗（{operation} {name}）: {reason}")]
    Reconciliation {
        operation: String,
        name: String,
        reason: String,
    },

    #[error("欄位結構錯誤: {0}")]
    Schema(String),
}

impl ShopfloorError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(doctype: DocType, name: impl Into<String>) -> Self {
        Self::NotFound {
            doctype,
            name: name.into(),
        }
    }

    pub fn reconciliation(
        operation: impl Into<String>,
        name: impl Into<String>,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self::Reconciliation {
            operation: operation.into(),
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// 取得錯誤分類
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Reconciliation { .. } => ErrorKind::Reconciliation,
            Self::Schema(_) => ErrorKind::Schema,
        }
    }
}

impl From<serde_json::Error> for ShopfloorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(format!("JSON 格式錯誤: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, ShopfloorError>;
