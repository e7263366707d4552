//! # Shopfloor
//!
//! 工單、揀貨單與庫存異動單的對帳層：部分轉移、廢料與成本彙總。
//!
//! ```no_run
//! use shopfloor::{LifecycleHooks, MemoryStore, ReconcileConfig};
//!
//! let config = ReconcileConfig::new();
//! let mut store = MemoryStore::new();
//! config.verify(&store).expect("欄位結構");
//!
//! let hooks = LifecycleHooks::new(config);
//! let report = hooks.stock_entry_on_submit(&mut store, "MAT-STE-0001");
//! println!("{:?}", report.failures);
//! ```

pub use shopfloor_api::{BalanceRow, ShopfloorApi, TransferRequest, WorkOrderBalanceLine, WorkOrderBalanceView};
pub use shopfloor_calc::{
    BalanceCalculator, ConsumptionCalculator, CostAggregator, CostBreakdown, LineBalance,
    PickListBalance, PickSummary, StatusDeriver, WorkOrderBalance, WorkOrderLineBalance,
    WorkOrderProgress,
};
pub use shopfloor_core::*;
pub use shopfloor_sync::{
    AffectedDocuments, Job, JobQueue, JobRunner, LifecycleHooks, MemoryQueue, QueuedJob,
    ReconcileFailure, ReconcileReport, ReconcileStep, Reconciler,
};
