//! 受影響文件追蹤

use std::collections::BTreeSet;

/// 一次異動影響到的揀貨單與工單
///
/// 以有序集合保存，重算順序固定，方便比對日誌。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AffectedDocuments {
    pick_lists: BTreeSet<String>,
    work_orders: BTreeSet<String>,
}

impl AffectedDocuments {
    /// 創建新的追蹤器
    pub fn new() -> Self {
        Self::default()
    }

    /// 標記揀貨單需重算
    pub fn mark_pick_list(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !name.is_empty() {
            self.pick_lists.insert(name);
        }
    }

    /// 標記工單需重算
    pub fn mark_work_order(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !name.is_empty() {
            self.work_orders.insert(name);
        }
    }

    pub fn has_pick_list(&self, name: &str) -> bool {
        self.pick_lists.contains(name)
    }

    pub fn has_work_order(&self, name: &str) -> bool {
        self.work_orders.contains(name)
    }

    pub fn pick_lists(&self) -> impl Iterator<Item = &str> {
        self.pick_lists.iter().map(String::as_str)
    }

    pub fn work_orders(&self) -> impl Iterator<Item = &str> {
        self.work_orders.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.pick_lists.is_empty() && self.work_orders.is_empty()
    }

    /// 清除所有標記
    pub fn clear(&mut self) {
        self.pick_lists.clear();
        self.work_orders.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marks_are_deduplicated_and_ordered() {
        let mut affected = AffectedDocuments::new();
        affected.mark_pick_list("PL-2");
        affected.mark_pick_list("PL-1");
        affected.mark_pick_list("PL-2");
        affected.mark_work_order("WO-1");

        assert_eq!(affected.pick_lists().collect::<Vec<_>>(), vec!["PL-1", "PL-2"]);
        assert!(affected.has_work_order("WO-1"));
        assert!(!affected.has_pick_list("PL-3"));
    }

    #[test]
    fn test_empty_names_are_ignored() {
        let mut affected = AffectedDocuments::new();
        affected.mark_pick_list("");
        affected.mark_work_order(String::new());
        assert!(affected.is_empty());

        affected.mark_work_order("WO-1");
        affected.clear();
        assert!(affected.is_empty());
    }
}
