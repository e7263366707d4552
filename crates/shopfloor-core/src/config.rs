//! 對帳配置模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{DocumentStore, Field, ShopfloorError};

/// 部署環境支援的客製欄位
///
/// 啟動時以 [`FieldSchema::verify`] 對存取層檢查一次，之後重算流程只依此設定決定
/// 要不要回寫某個欄位，不再逐次探測。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// 工單成本欄位（原料／廢料／總成本）
    pub work_order_costing: bool,

    /// 工單已轉移／已耗用彙總
    pub work_order_totals: bool,

    /// 工單揀貨彙總（已揀／揀貨已耗用）
    pub work_order_pick_summary: bool,

    /// 工單明細待轉移／待耗用量
    pub work_order_item_balances: bool,

    /// 揀貨單表頭彙總與狀態
    pub pick_list_totals: bool,

    /// 揀貨明細已耗用／結餘量
    pub pick_list_item_balances: bool,
}

impl FieldSchema {
    /// 所有客製欄位皆存在
    pub fn full() -> Self {
        Self {
            work_order_costing: true,
            work_order_totals: true,
            work_order_pick_summary: true,
            work_order_item_balances: true,
            pick_list_totals: true,
            pick_list_item_balances: true,
        }
    }

    /// 只有 ERP 標準欄位
    pub fn standard_only() -> Self {
        Self {
            work_order_costing: false,
            work_order_totals: false,
            work_order_pick_summary: false,
            work_order_item_balances: false,
            pick_list_totals: false,
            pick_list_item_balances: false,
        }
    }

    /// 此部署是否支援該欄位
    pub fn supports(&self, field: Field) -> bool {
        match field {
            Field::RawMaterialCost | Field::ScrapMaterialCost | Field::TotalCost => {
                self.work_order_costing
            }
            Field::TotalTransferredQty | Field::TotalConsumedQty => self.work_order_totals,
            Field::TotalPickedQty | Field::TotalPickConsumedQty => self.work_order_pick_summary,
            Field::BalanceToTransfer | Field::BalanceToConsume => self.work_order_item_balances,
            Field::PickListTotalQty | Field::PickListConsumedQty | Field::PickListBalanceQty => {
                self.pick_list_totals
            }
            Field::PickItemConsumedQty | Field::PickItemBalanceQty => self.pick_list_item_balances,
            _ => field.is_standard(),
        }
    }

    /// 此設定要求存在的全部欄位
    pub fn enabled_fields(&self) -> Vec<Field> {
        Field::ALL
            .iter()
            .copied()
            .filter(|f| self.supports(*f))
            .collect()
    }

    /// 檢查存取層確實具備所宣告的欄位
    pub fn verify<S: DocumentStore + ?Sized>(&self, store: &S) -> crate::Result<()> {
        let missing: Vec<String> = self
            .enabled_fields()
            .into_iter()
            .filter(|f| !store.has_field(*f))
            .map(|f| format!("{}.{}", f.doctype(), f.fieldname()))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ShopfloorError::Schema(format!(
                "存取層缺少欄位: {}",
                missing.join(", ")
            )))
        }
    }
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self::full()
    }
}

/// 對帳參數配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// 客製欄位設定
    pub field_schema: FieldSchema,

    /// 揀貨單完成判定容差（吸收尾差）
    pub completion_epsilon: Decimal,

    /// 部分轉移時允許超出結餘的容差
    pub transfer_tolerance: Decimal,

    /// 取消後重算所用的背景佇列
    pub background_queue: String,
}

impl ReconcileConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self {
            field_schema: FieldSchema::full(),
            completion_epsilon: Decimal::new(1, 6),
            transfer_tolerance: Decimal::new(1, 9),
            background_queue: "short".to_string(),
        }
    }

    /// 從 JSON 讀取配置
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ShopfloorError::Schema(format!("配置格式錯誤: {}", e)))
    }

    /// 建構器模式：設置欄位結構
    pub fn with_field_schema(mut self, schema: FieldSchema) -> Self {
        self.field_schema = schema;
        self
    }

    /// 建構器模式：設置完成容差
    pub fn with_completion_epsilon(mut self, epsilon: Decimal) -> Self {
        self.completion_epsilon = epsilon;
        self
    }

    /// 建構器模式：設置轉移容差
    pub fn with_transfer_tolerance(mut self, tolerance: Decimal) -> Self {
        self.transfer_tolerance = tolerance;
        self
    }

    /// 建構器模式：設置背景佇列
    pub fn with_background_queue(mut self, queue: impl Into<String>) -> Self {
        self.background_queue = queue.into();
        self
    }

    /// 啟動檢查
    pub fn verify<S: DocumentStore + ?Sized>(&self, store: &S) -> crate::Result<()> {
        if self.completion_epsilon < Decimal::ZERO || self.transfer_tolerance < Decimal::ZERO {
            return Err(ShopfloorError::Schema("容差不可為負數".to_string()));
        }
        self.field_schema.verify(store)?;
        tracing::info!(
            fields = self.field_schema.enabled_fields().len(),
            queue = %self.background_queue,
            "對帳配置檢查通過"
        );
        Ok(())
    }

    /// 欄位是否可回寫
    pub fn writes(&self, field: Field) -> bool {
        self.field_schema.supports(field)
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use rstest::rstest;

    #[test]
    fn test_default_config() {
        let config = ReconcileConfig::new();
        assert_eq!(config.completion_epsilon, Decimal::new(1, 6));
        assert_eq!(config.transfer_tolerance, Decimal::new(1, 9));
        assert_eq!(config.background_queue, "short");
        assert!(config.writes(Field::TotalCost));
    }

    #[rstest]
    #[case(Field::WorkOrderStatus, true)]
    #[case(Field::ProducedQty, true)]
    #[case(Field::ItemConsumedQty, true)]
    #[case(Field::PickListStatus, true)]
    #[case(Field::TotalCost, false)]
    #[case(Field::TotalPickedQty, false)]
    #[case(Field::BalanceToTransfer, false)]
    #[case(Field::PickItemBalanceQty, false)]
    fn test_standard_only_schema(#[case] field: Field, #[case] supported: bool) {
        let schema = FieldSchema::standard_only();
        assert_eq!(schema.supports(field), supported);
        assert_eq!(schema.enabled_fields().len(), 6);
    }

    #[test]
    fn test_verify_against_store() {
        let store = MemoryStore::with_fields(FieldSchema::standard_only());

        assert!(ReconcileConfig::new()
            .with_field_schema(FieldSchema::standard_only())
            .verify(&store)
            .is_ok());

        let err = ReconcileConfig::new().verify(&store).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Schema);
        assert!(err.to_string().contains("total_cost"));
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let store = MemoryStore::new();
        let config = ReconcileConfig::new().with_completion_epsilon(Decimal::from(-1));
        assert!(config.verify(&store).is_err());
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "field_schema": {
                "work_order_costing": true,
                "work_order_totals": false,
                "work_order_pick_summary": false,
                "work_order_item_balances": true,
                "pick_list_totals": true,
                "pick_list_item_balances": true
            },
            "completion_epsilon": "0.001",
            "transfer_tolerance": "0",
            "background_queue": "long"
        }"#;

        let config = ReconcileConfig::from_json_str(json).unwrap();
        assert!(!config.writes(Field::TotalTransferredQty));
        assert!(config.writes(Field::BalanceToConsume));
        assert_eq!(config.completion_epsilon, Decimal::new(1, 3));
        assert_eq!(config.background_queue, "long");

        assert!(ReconcileConfig::from_json_str("{}").is_err());
    }
}
