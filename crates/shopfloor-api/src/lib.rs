//! # Shopfloor API
//!
//! 對外開放的 RPC 端點：揀貨結餘查詢、由揀貨單或工單產生異動單與揀貨單。
//!
//! 端點只接受文件名稱與 JSON 字串，回傳可序列化的結果；使用者輸入錯誤以
//! [`ShopfloorError::Validation`](shopfloor_core::ShopfloorError) 回報。

pub mod pick_list;
pub mod work_order;

use shopfloor_core::ReconcileConfig;

// Re-export 主要類型
pub use pick_list::{BalanceRow, TransferRequest};
pub use work_order::{WorkOrderBalanceLine, WorkOrderBalanceView};

/// RPC 端點集合
pub struct ShopfloorApi {
    config: ReconcileConfig,
}

impl ShopfloorApi {
    pub fn new(config: ReconcileConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }
}

impl Default for ShopfloorApi {
    fn default() -> Self {
        Self::new(ReconcileConfig::default())
    }
}
