//! # Shopfloor Calculation
//!
//! 結餘、成本與狀態推導。全部為純計算，不存取文件。

pub mod balance;
pub mod consumption;
pub mod costing;
pub mod status;

// Re-export 主要類型
pub use balance::{BalanceCalculator, LineBalance, PickListBalance, WorkOrderBalance, WorkOrderLineBalance};
pub use consumption::{ConsumptionCalculator, PickSummary, WorkOrderProgress};
pub use costing::{CostAggregator, CostBreakdown};
pub use status::StatusDeriver;
