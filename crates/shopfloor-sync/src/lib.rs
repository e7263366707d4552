//! # Shopfloor Sync
//!
//! 異動單提交／取消後的對帳重算、背景工作與文件生命週期掛勾

pub mod affected;
pub mod hooks;
pub mod jobs;
pub mod orchestrator;

// Re-export 主要類型
pub use affected::AffectedDocuments;
pub use hooks::LifecycleHooks;
pub use jobs::{Job, JobQueue, JobRunner, MemoryQueue, QueuedJob};
pub use orchestrator::{ReconcileFailure, ReconcileReport, ReconcileStep, Reconciler};
