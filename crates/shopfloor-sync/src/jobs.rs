//! 背景工作
//!
//! 取消異動單時只排入工作即返回；實際重算由宿主的工作執行器呼叫 [`JobRunner`]。

use serde::{Deserialize, Serialize};
use shopfloor_core::{DocumentStore, ErrorKind};
use std::collections::VecDeque;

use crate::{ReconcileReport, Reconciler};

/// 背景工作內容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "job", rename_all = "snake_case")]
pub enum Job {
    /// 異動單變動後重算受影響的揀貨單與工單
    RecomputeAfterStockEntry { stock_entry: String },
}

/// 已排入佇列的工作
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedJob {
    pub queue: String,
    pub job: Job,
}

/// 背景工作佇列
pub trait JobQueue {
    fn enqueue(&mut self, queue: &str, job: Job);

    fn dequeue(&mut self) -> Option<QueuedJob>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 記憶體 FIFO 佇列
#[derive(Debug, Default)]
pub struct MemoryQueue {
    jobs: VecDeque<QueuedJob>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 尚未執行的工作
    pub fn pending(&self) -> impl Iterator<Item = &QueuedJob> {
        self.jobs.iter()
    }
}

impl JobQueue for MemoryQueue {
    fn enqueue(&mut self, queue: &str, job: Job) {
        tracing::debug!(queue, job = ?job, "排入背景工作");
        self.jobs.push_back(QueuedJob {
            queue: queue.to_string(),
            job,
        });
    }

    fn dequeue(&mut self) -> Option<QueuedJob> {
        self.jobs.pop_front()
    }

    fn len(&self) -> usize {
        self.jobs.len()
    }
}

/// 工作執行器（不重試）
pub struct JobRunner<'a> {
    reconciler: &'a Reconciler,
}

impl<'a> JobRunner<'a> {
    pub fn new(reconciler: &'a Reconciler) -> Self {
        Self { reconciler }
    }

    /// 執行單一工作；異動單已不存在時略過並回傳 `None`
    pub fn run<S: DocumentStore + ?Sized>(&self, store: &mut S, job: &Job) -> Option<ReconcileReport> {
        match job {
            Job::RecomputeAfterStockEntry { stock_entry } => {
                match store.stock_entry(stock_entry) {
                    Ok(_) => {}
                    Err(e) if e.kind() == ErrorKind::NotFound => {
                        tracing::info!(stock_entry = %stock_entry, "異動單已不存在，略過重算");
                        return None;
                    }
                    Err(e) => {
                        tracing::warn!(stock_entry = %stock_entry, error = %e, "讀取異動單失敗，略過重算");
                        store.log_error("Shopfloor background job", &e.to_string());
                        return None;
                    }
                }

                let report = self.reconciler.reconcile_stock_entry(store, stock_entry);
                if !report.is_clean() {
                    tracing::warn!(
                        stock_entry = %stock_entry,
                        failures = report.failures.len(),
                        "背景重算有步驟失敗"
                    );
                }
                Some(report)
            }
        }
    }

    /// 依序執行佇列中所有工作
    pub fn drain<S, Q>(&self, store: &mut S, queue: &mut Q) -> Vec<ReconcileReport>
    where
        S: DocumentStore + ?Sized,
        Q: JobQueue + ?Sized,
    {
        let mut reports = Vec::new();
        while let Some(queued) = queue.dequeue() {
            tracing::debug!(queue = %queued.queue, job = ?queued.job, "執行背景工作");
            if let Some(report) = self.run(store, &queued.job) {
                reports.push(report);
            }
        }
        reports
    }
}
