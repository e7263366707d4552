//! 記憶體文件存取層（測試與示範用）

use chrono::Utc;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::{
    Bom, DocStatus, DocType, DocumentStore, ErrorLogEntry, Field, FieldSchema, FieldValue, Item,
    PickList, PickListQuery, ShopfloorError, StockEntry, StockEntryQuery, StockEntryRow,
    WorkOrder, WorkOrderStatus,
};

/// 記憶體文件存取層
pub struct MemoryStore {
    work_orders: BTreeMap<String, WorkOrder>,
    pick_lists: BTreeMap<String, PickList>,
    stock_entries: BTreeMap<String, StockEntry>,
    boms: BTreeMap<String, Bom>,
    items: BTreeMap<String, Item>,

    /// 存取層實際具備的客製欄位
    fields: FieldSchema,

    error_log: Vec<ErrorLogEntry>,
    commits: usize,
    writes: usize,
}

fn new_name(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &id[..10])
}

impl MemoryStore {
    /// 創建具備全部客製欄位的存取層
    pub fn new() -> Self {
        Self::with_fields(FieldSchema::full())
    }

    /// 創建指定客製欄位的存取層
    pub fn with_fields(fields: FieldSchema) -> Self {
        Self {
            work_orders: BTreeMap::new(),
            pick_lists: BTreeMap::new(),
            stock_entries: BTreeMap::new(),
            boms: BTreeMap::new(),
            items: BTreeMap::new(),
            fields,
            error_log: Vec::new(),
            commits: 0,
            writes: 0,
        }
    }

    pub fn add_work_order(&mut self, mut work_order: WorkOrder) {
        for row in &mut work_order.required_items {
            if row.name.is_empty() {
                row.name = new_name("WOI");
            }
        }
        self.work_orders.insert(work_order.name.clone(), work_order);
    }

    pub fn add_pick_list(&mut self, mut pick_list: PickList) {
        for row in &mut pick_list.locations {
            if row.name.is_empty() {
                row.name = new_name("PLI");
            }
        }
        self.pick_lists.insert(pick_list.name.clone(), pick_list);
    }

    pub fn add_stock_entry(&mut self, mut entry: StockEntry) {
        for row in &mut entry.items {
            if row.name.is_empty() {
                row.name = new_name("SED");
            }
        }
        self.stock_entries.insert(entry.name.clone(), entry);
    }

    pub fn add_bom(&mut self, bom: Bom) {
        self.boms.insert(bom.name.clone(), bom);
    }

    pub fn add_item(&mut self, item: Item) {
        self.items.insert(item.item_code.clone(), item);
    }

    /// 提交異動單
    pub fn submit_stock_entry(&mut self, name: &str) -> crate::Result<StockEntry> {
        self.set_stock_entry_docstatus(name, DocStatus::Submitted)
    }

    /// 取消異動單
    pub fn cancel_stock_entry(&mut self, name: &str) -> crate::Result<StockEntry> {
        self.set_stock_entry_docstatus(name, DocStatus::Cancelled)
    }

    /// 刪除異動單
    pub fn remove_stock_entry(&mut self, name: &str) -> Option<StockEntry> {
        self.stock_entries.remove(name)
    }

    fn set_stock_entry_docstatus(
        &mut self,
        name: &str,
        docstatus: DocStatus,
    ) -> crate::Result<StockEntry> {
        let entry = self
            .stock_entries
            .get_mut(name)
            .ok_or_else(|| ShopfloorError::not_found(DocType::StockEntry, name))?;
        entry.docstatus = docstatus;
        entry.modified = Utc::now();
        Ok(entry.clone())
    }

    /// 提交揀貨單
    pub fn submit_pick_list(&mut self, name: &str) -> crate::Result<PickList> {
        self.set_pick_list_docstatus(name, DocStatus::Submitted)
    }

    /// 取消揀貨單
    pub fn cancel_pick_list(&mut self, name: &str) -> crate::Result<PickList> {
        self.set_pick_list_docstatus(name, DocStatus::Cancelled)
    }

    fn set_pick_list_docstatus(
        &mut self,
        name: &str,
        docstatus: DocStatus,
    ) -> crate::Result<PickList> {
        let pick_list = self
            .pick_lists
            .get_mut(name)
            .ok_or_else(|| ShopfloorError::not_found(DocType::PickList, name))?;
        pick_list.docstatus = docstatus;
        pick_list.modified = Utc::now();
        Ok(pick_list.clone())
    }

    /// 手動設定工單狀態（例如停止、結案）
    pub fn set_work_order_status(&mut self, name: &str, status: WorkOrderStatus) -> crate::Result<()> {
        let wo = self
            .work_orders
            .get_mut(name)
            .ok_or_else(|| ShopfloorError::not_found(DocType::WorkOrder, name))?;
        wo.status = status;
        wo.modified = Utc::now();
        Ok(())
    }

    pub fn error_log(&self) -> &[ErrorLogEntry] {
        &self.error_log
    }

    pub fn commit_count(&self) -> usize {
        self.commits
    }

    /// 已套用的欄位寫入次數
    pub fn write_count(&self) -> usize {
        self.writes
    }

    fn write_work_order(&mut self, name: &str, field: Field, value: &FieldValue) -> crate::Result<&mut WorkOrder> {
        let wo = self
            .work_orders
            .get_mut(name)
            .ok_or_else(|| ShopfloorError::not_found(DocType::WorkOrder, name))?;
        match field {
            Field::WorkOrderStatus => wo.status = value.as_text()?.parse()?,
            Field::MaterialTransferred => {
                wo.material_transferred_for_manufacturing = value.as_qty()?
            }
            Field::ProducedQty => wo.produced_qty = value.as_qty()?,
            Field::RawMaterialCost => wo.costing.raw_material_cost = value.as_qty()?,
            Field::ScrapMaterialCost => wo.costing.scrap_material_cost = value.as_qty()?,
            Field::TotalCost => wo.costing.total_cost = value.as_qty()?,
            Field::TotalTransferredQty => wo.totals.total_transferred_qty = value.as_qty()?,
            Field::TotalConsumedQty => wo.totals.total_consumed_qty = value.as_qty()?,
            Field::TotalPickedQty => wo.totals.total_picked_qty = value.as_qty()?,
            Field::TotalPickConsumedQty => wo.totals.total_pick_consumed_qty = value.as_qty()?,
            other => return Err(wrong_doctype(other)),
        }
        Ok(wo)
    }

    fn write_work_order_item(&mut self, name: &str, field: Field, value: &FieldValue) -> crate::Result<&mut WorkOrder> {
        let wo = self
            .work_orders
            .values_mut()
            .find(|wo| wo.required_items.iter().any(|i| i.name == name))
            .ok_or_else(|| ShopfloorError::not_found(DocType::WorkOrderItem, name))?;
        let row = wo
            .required_items
            .iter_mut()
            .find(|i| i.name == name)
            .ok_or_else(|| ShopfloorError::not_found(DocType::WorkOrderItem, name))?;
        match field {
            Field::ItemTransferredQty => row.transferred_qty = value.as_qty()?,
            Field::ItemConsumedQty => row.consumed_qty = value.as_qty()?,
            Field::BalanceToTransfer => row.balance_to_transfer = value.as_qty()?,
            Field::BalanceToConsume => row.balance_to_consume = value.as_qty()?,
            other => return Err(wrong_doctype(other)),
        }
        Ok(wo)
    }

    fn write_pick_list(&mut self, name: &str, field: Field, value: &FieldValue) -> crate::Result<&mut PickList> {
        let pl = self
            .pick_lists
            .get_mut(name)
            .ok_or_else(|| ShopfloorError::not_found(DocType::PickList, name))?;
        match field {
            Field::PickListStatus => pl.status = value.as_text()?.parse()?,
            Field::PickListTotalQty => pl.total_qty = value.as_qty()?,
            Field::PickListConsumedQty => pl.consumed_qty = value.as_qty()?,
            Field::PickListBalanceQty => pl.balance_qty = value.as_qty()?,
            other => return Err(wrong_doctype(other)),
        }
        Ok(pl)
    }

    fn write_pick_list_item(&mut self, name: &str, field: Field, value: &FieldValue) -> crate::Result<&mut PickList> {
        let pl = self
            .pick_lists
            .values_mut()
            .find(|pl| pl.locations.iter().any(|l| l.name == name))
            .ok_or_else(|| ShopfloorError::not_found(DocType::PickListItem, name))?;
        let row = pl
            .locations
            .iter_mut()
            .find(|l| l.name == name)
            .ok_or_else(|| ShopfloorError::not_found(DocType::PickListItem, name))?;
        match field {
            Field::PickItemConsumedQty => row.consumed_qty = value.as_qty()?,
            Field::PickItemBalanceQty => row.balance_qty = value.as_qty()?,
            other => return Err(wrong_doctype(other)),
        }
        Ok(pl)
    }
}

fn wrong_doctype(field: Field) -> ShopfloorError {
    ShopfloorError::Schema(format!(
        "欄位 {} 不屬於 {}",
        field.fieldname(),
        field.doctype()
    ))
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryStore {
    fn work_order(&self, name: &str) -> crate::Result<WorkOrder> {
        self.work_orders
            .get(name)
            .cloned()
            .ok_or_else(|| ShopfloorError::not_found(DocType::WorkOrder, name))
    }

    fn pick_list(&self, name: &str) -> crate::Result<PickList> {
        self.pick_lists
            .get(name)
            .cloned()
            .ok_or_else(|| ShopfloorError::not_found(DocType::PickList, name))
    }

    fn stock_entry(&self, name: &str) -> crate::Result<StockEntry> {
        self.stock_entries
            .get(name)
            .cloned()
            .ok_or_else(|| ShopfloorError::not_found(DocType::StockEntry, name))
    }

    fn bom(&self, name: &str) -> crate::Result<Bom> {
        self.boms
            .get(name)
            .cloned()
            .ok_or_else(|| ShopfloorError::not_found(DocType::Bom, name))
    }

    fn item(&self, item_code: &str) -> crate::Result<Item> {
        self.items
            .get(item_code)
            .cloned()
            .ok_or_else(|| ShopfloorError::not_found(DocType::Item, item_code))
    }

    fn stock_entry_rows(&self, query: &StockEntryQuery) -> crate::Result<Vec<StockEntryRow>> {
        let rows = self
            .stock_entries
            .values()
            .flat_map(|entry| {
                entry
                    .items
                    .iter()
                    .filter(move |row| query.matches(entry, row))
                    .map(move |row| StockEntryRow {
                        stock_entry: entry.name.clone(),
                        entry_type: entry.entry_type,
                        work_order: entry.work_order.clone(),
                        pick_list: entry.pick_list.clone(),
                        detail: row.clone(),
                    })
            })
            .collect();
        Ok(rows)
    }

    fn pick_lists(&self, query: &PickListQuery) -> crate::Result<Vec<PickList>> {
        Ok(self
            .pick_lists
            .values()
            .filter(|pl| query.matches(pl))
            .cloned()
            .collect())
    }

    fn pick_list_item_parent(&self, row_name: &str) -> crate::Result<Option<String>> {
        Ok(self
            .pick_lists
            .values()
            .find(|pl| pl.locations.iter().any(|l| l.name == row_name))
            .map(|pl| pl.name.clone()))
    }

    fn insert_pick_list(&mut self, mut pick_list: PickList) -> crate::Result<String> {
        if pick_list.name.is_empty() {
            pick_list.name = new_name("PL");
        }
        if self.pick_lists.contains_key(&pick_list.name) {
            return Err(ShopfloorError::validation(format!(
                "揀貨單 {} 已存在",
                pick_list.name
            )));
        }
        pick_list.docstatus = DocStatus::Draft;
        pick_list.modified = Utc::now();
        let name = pick_list.name.clone();
        self.add_pick_list(pick_list);
        Ok(name)
    }

    fn insert_stock_entry(&mut self, mut entry: StockEntry) -> crate::Result<String> {
        if entry.name.is_empty() {
            entry.name = new_name("MAT-STE");
        }
        if self.stock_entries.contains_key(&entry.name) {
            return Err(ShopfloorError::validation(format!(
                "異動單 {} 已存在",
                entry.name
            )));
        }
        entry.docstatus = DocStatus::Draft;
        entry.modified = Utc::now();
        let name = entry.name.clone();
        self.add_stock_entry(entry);
        Ok(name)
    }

    fn set_value(
        &mut self,
        name: &str,
        field: Field,
        value: FieldValue,
        update_modified: bool,
    ) -> crate::Result<()> {
        if !self.has_field(field) {
            return Err(ShopfloorError::Schema(format!(
                "{} 沒有欄位 {}",
                field.doctype(),
                field.fieldname()
            )));
        }

        let now = Utc::now();
        match field.doctype() {
            DocType::WorkOrder => {
                let wo = self.write_work_order(name, field, &value)?;
                if update_modified {
                    wo.modified = now;
                }
            }
            DocType::WorkOrderItem => {
                let wo = self.write_work_order_item(name, field, &value)?;
                if update_modified {
                    wo.modified = now;
                }
            }
            DocType::PickList => {
                let pl = self.write_pick_list(name, field, &value)?;
                if update_modified {
                    pl.modified = now;
                }
            }
            DocType::PickListItem => {
                let pl = self.write_pick_list_item(name, field, &value)?;
                if update_modified {
                    pl.modified = now;
                }
            }
            other => {
                return Err(ShopfloorError::Schema(format!("{} 不支援欄位寫入", other)));
            }
        }

        self.writes += 1;
        Ok(())
    }

    fn has_field(&self, field: Field) -> bool {
        self.fields.supports(field)
    }

    fn commit(&mut self) -> crate::Result<()> {
        self.commits += 1;
        Ok(())
    }

    fn log_error(&mut self, title: &str, message: &str) {
        tracing::error!(title, message, "錯誤紀錄");
        self.error_log.push(ErrorLogEntry {
            title: title.to_string(),
            message: message.to_string(),
            logged_at: Utc::now(),
        });
    }
}
