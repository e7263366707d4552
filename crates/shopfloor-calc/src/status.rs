//! 狀態推導

use rust_decimal::Decimal;
use shopfloor_core::{DocStatus, PickList, PickListStatus, WorkOrder, WorkOrderStatus};

/// 狀態推導器
pub struct StatusDeriver;

impl StatusDeriver {
    /// 推導工單狀態
    ///
    /// 判斷順序：
    /// 1. 未提交 → Draft；已取消 → Cancelled
    /// 2. Stopped／Closed 為手動狀態，維持不變
    /// 3. 已生產 ≥ 計劃量 → Completed
    /// 4. 有任何轉移、耗用或生產 → In Process
    /// 5. 其餘 → Not Started
    pub fn work_order_status(work_order: &WorkOrder) -> WorkOrderStatus {
        match work_order.docstatus {
            DocStatus::Draft => return WorkOrderStatus::Draft,
            DocStatus::Cancelled => return WorkOrderStatus::Cancelled,
            DocStatus::Submitted => {}
        }

        if work_order.status.is_sticky() {
            return work_order.status;
        }

        if work_order.produced_qty >= work_order.qty {
            return WorkOrderStatus::Completed;
        }

        let started = work_order.material_transferred_for_manufacturing > Decimal::ZERO
            || work_order.totals.total_transferred_qty > Decimal::ZERO
            || work_order.produced_qty > Decimal::ZERO
            || work_order.required_items.iter().any(|i| i.has_progress());

        if started {
            WorkOrderStatus::InProcess
        } else {
            WorkOrderStatus::NotStarted
        }
    }

    /// 工單狀態變更；與現值相同時回傳 `None`
    pub fn work_order_transition(work_order: &WorkOrder) -> Option<WorkOrderStatus> {
        let next = Self::work_order_status(work_order);
        (next != work_order.status).then_some(next)
    }

    /// 依表頭結餘推導揀貨單狀態
    pub fn pick_list_status(balance_qty: Decimal, epsilon: Decimal) -> PickListStatus {
        if balance_qty <= epsilon {
            PickListStatus::Completed
        } else {
            PickListStatus::Open
        }
    }

    /// 揀貨單狀態變更；與現值相同時回傳 `None`
    pub fn pick_list_transition(pick_list: &PickList, epsilon: Decimal) -> Option<PickListStatus> {
        let next = Self::pick_list_status(pick_list.balance_qty, epsilon);
        (next != pick_list.status).then_some(next)
    }
}
