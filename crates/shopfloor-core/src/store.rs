//! 外部文件存取介面

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Bom, DocStatus, Field, FieldValue, Item, PickList, StockEntry, StockEntryDetail,
    StockEntryType, WorkOrder,
};

/// 異動明細查詢結果（附帶表頭資訊）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockEntryRow {
    pub stock_entry: String,
    pub entry_type: StockEntryType,
    pub work_order: Option<String>,
    pub pick_list: Option<String>,
    pub detail: StockEntryDetail,
}

/// 異動明細查詢條件
///
/// 各條件以 AND 組合；揀貨單參照條件內部以 OR 組合：表頭指向 `pick_lists`
/// 之一，或明細列指向 `pick_list_items` 之一。
#[derive(Debug, Clone, Default)]
pub struct StockEntryQuery {
    pub docstatus: DocStatus,
    pub work_order: Option<String>,
    pub pick_lists: Vec<String>,
    pub pick_list_items: Vec<String>,
    pub entry_types: Vec<StockEntryType>,
    pub draws_down_only: bool,
}

impl StockEntryQuery {
    /// 只查已提交的異動單
    pub fn submitted() -> Self {
        Self {
            docstatus: DocStatus::Submitted,
            ..Self::default()
        }
    }

    pub fn for_work_order(mut self, work_order: impl Into<String>) -> Self {
        self.work_order = Some(work_order.into());
        self
    }

    /// 參照揀貨單（表頭或明細列）
    pub fn referencing_pick_list(mut self, pick_list: impl Into<String>, rows: Vec<String>) -> Self {
        self.pick_lists.push(pick_list.into());
        self.pick_list_items.extend(rows);
        self
    }

    pub fn of_types(mut self, types: &[StockEntryType]) -> Self {
        self.entry_types.extend_from_slice(types);
        self
    }

    /// 只取有來源倉的扣帳列
    pub fn drawing_down(mut self) -> Self {
        self.draws_down_only = true;
        self
    }

    /// 判斷某筆明細是否符合條件
    pub fn matches(&self, entry: &StockEntry, row: &StockEntryDetail) -> bool {
        if entry.docstatus != self.docstatus {
            return false;
        }

        if let Some(work_order) = &self.work_order {
            if entry.work_order.as_deref() != Some(work_order.as_str()) {
                return false;
            }
        }

        if !self.entry_types.is_empty() && !self.entry_types.contains(&entry.entry_type) {
            return false;
        }

        if self.draws_down_only && !row.draws_down() {
            return false;
        }

        if !self.pick_lists.is_empty() || !self.pick_list_items.is_empty() {
            let header_match = entry
                .pick_list
                .as_ref()
                .is_some_and(|pl| self.pick_lists.contains(pl));
            let row_match = row
                .pick_list_item
                .as_ref()
                .is_some_and(|r| self.pick_list_items.contains(r));
            if !header_match && !row_match {
                return false;
            }
        }

        true
    }
}

/// 揀貨單查詢條件
#[derive(Debug, Clone, Default)]
pub struct PickListQuery {
    pub docstatus: DocStatus,
    pub work_order: Option<String>,
    pub names: Vec<String>,
}

impl PickListQuery {
    pub fn submitted() -> Self {
        Self {
            docstatus: DocStatus::Submitted,
            ..Self::default()
        }
    }

    pub fn for_work_order(mut self, work_order: impl Into<String>) -> Self {
        self.work_order = Some(work_order.into());
        self
    }

    pub fn named(mut self, names: Vec<String>) -> Self {
        self.names = names;
        self
    }

    pub fn matches(&self, pick_list: &PickList) -> bool {
        pick_list.docstatus == self.docstatus
            && self
                .work_order
                .as_ref()
                .map_or(true, |wo| pick_list.work_order.as_ref() == Some(wo))
            && (self.names.is_empty() || self.names.contains(&pick_list.name))
    }
}

/// 錯誤紀錄（供維運人員查看）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    pub title: String,
    pub message: String,
    pub logged_at: DateTime<Utc>,
}

/// 文件存取層
///
/// 由外部 ERP 框架提供；本 crate 只定義需要的操作。
pub trait DocumentStore {
    fn work_order(&self, name: &str) -> crate::Result<WorkOrder>;

    fn pick_list(&self, name: &str) -> crate::Result<PickList>;

    fn stock_entry(&self, name: &str) -> crate::Result<StockEntry>;

    fn bom(&self, name: &str) -> crate::Result<Bom>;

    fn item(&self, item_code: &str) -> crate::Result<Item>;

    /// 查詢異動明細
    fn stock_entry_rows(&self, query: &StockEntryQuery) -> crate::Result<Vec<StockEntryRow>>;

    /// 查詢揀貨單
    fn pick_lists(&self, query: &PickListQuery) -> crate::Result<Vec<PickList>>;

    /// 揀貨明細列所屬的揀貨單
    fn pick_list_item_parent(&self, row_name: &str) -> crate::Result<Option<String>>;

    /// 新增揀貨單，回傳文件名稱
    fn insert_pick_list(&mut self, pick_list: PickList) -> crate::Result<String>;

    /// 新增異動單（草稿），回傳文件名稱
    fn insert_stock_entry(&mut self, entry: StockEntry) -> crate::Result<String>;

    /// 寫入單一欄位
    ///
    /// `name` 為文件名稱，子表欄位則為明細列ID。`update_modified = false`
    /// 時不更新修改時間，避免正在檢視該文件的使用者收到「文件已被修改」衝突。
    fn set_value(
        &mut self,
        name: &str,
        field: Field,
        value: FieldValue,
        update_modified: bool,
    ) -> crate::Result<()>;

    /// 存取層是否具備該欄位
    fn has_field(&self, field: Field) -> bool;

    fn commit(&mut self) -> crate::Result<()>;

    /// 寫入錯誤紀錄
    fn log_error(&mut self, title: &str, message: &str) {
        tracing::error!(title, message, "錯誤紀錄");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn transfer_entry() -> StockEntry {
        StockEntry::new("SE-1", StockEntryType::MaterialTransferForManufacture)
            .with_work_order("WO-1")
            .with_pick_list("PL-1")
            .submitted()
    }

    #[test]
    fn test_query_filters_docstatus_and_type() {
        let entry = transfer_entry();
        let row = StockEntryDetail::new("STEEL", Decimal::ONE).from_warehouse("Stores");

        assert!(StockEntryQuery::submitted().matches(&entry, &row));
        assert!(!StockEntryQuery::default().matches(&entry, &row));
        assert!(!StockEntryQuery::submitted()
            .of_types(&[StockEntryType::Manufacture])
            .matches(&entry, &row));
        assert!(!StockEntryQuery::submitted()
            .for_work_order("WO-2")
            .matches(&entry, &row));
    }

    #[test]
    fn test_query_pick_list_reference_header_or_row() {
        let row = StockEntryDetail::new("STEEL", Decimal::ONE).with_pick_list_item("PLI-9");

        // 表頭指向 PL-1
        let query = StockEntryQuery::submitted().referencing_pick_list("PL-1", vec![]);
        assert!(query.matches(&transfer_entry(), &row));

        // 表頭未指向，但明細列指向
        let mut entry = transfer_entry();
        entry.pick_list = None;
        let query = StockEntryQuery::submitted().referencing_pick_list("PL-2", vec!["PLI-9".into()]);
        assert!(query.matches(&entry, &row));

        let query = StockEntryQuery::submitted().referencing_pick_list("PL-2", vec!["PLI-1".into()]);
        assert!(!query.matches(&entry, &row));
    }

    #[test]
    fn test_query_draws_down_only() {
        let entry = transfer_entry();
        let inbound = StockEntryDetail::new("BIKE", Decimal::ONE).to_warehouse("FG");
        assert!(!StockEntryQuery::submitted().drawing_down().matches(&entry, &inbound));
    }

    #[test]
    fn test_pick_list_query() {
        let pl = PickList::new("PL-1").with_work_order("WO-1").submitted();
        assert!(PickListQuery::submitted().for_work_order("WO-1").matches(&pl));
        assert!(!PickListQuery::submitted().for_work_order("WO-2").matches(&pl));
        assert!(!PickListQuery::default().matches(&pl));
        assert!(PickListQuery::submitted().named(vec!["PL-1".into()]).matches(&pl));
    }
}
