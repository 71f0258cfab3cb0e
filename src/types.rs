use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub logged_in: bool,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_of_measure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_delivery_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_delivery_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_location: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrderDto {
    pub sales_order_number: String,
    pub sold_to_party: String,
    pub requested_delivery_date: String,
    pub requested_delivery_week: String,
    pub complete_delivery: bool,
    #[serde(default)]
    pub to_item: Vec<ToItem>,
}

/// Sales order payload for creation; the backend assigns the number.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSalesOrder {
    pub sold_to_party: String,
    pub requested_delivery_date: String,
    pub requested_delivery_week: String,
    pub complete_delivery: bool,
    pub to_item: Vec<ToItem>,
}

/// Partial sales order update; absent fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrderPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sold_to_party: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_delivery_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_delivery_week: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complete_delivery: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_item: Option<Vec<ToItem>>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrderStats {
    pub total_orders: u64,
    pub completed_orders: u64,
    pub pending_orders: u64,
    pub total_value: f64,
}

/// Spring `Page` response.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u32,
    pub size: u32,
    pub number: u32,
    pub first: bool,
    pub last: bool,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionOrderDto {
    pub material: String,
    pub material_description: String,
    pub production_order: String,
    pub production_plant: String,
    pub order_is_released: bool,
    pub order_is_scheduled: bool,
    pub production_supervisor: String,
    pub production_version: String,
    pub work_center: String,
    pub work_center_description: String,
    pub mfg_order_scheduled_start_date: String,
    pub mfg_order_scheduled_start_time: String,
    pub mfg_order_scheduled_end_date: String,
    pub mfg_order_scheduled_end_time: String,
    pub production_unit: String,
    pub total_quantity: f64,
    pub mfg_order_confirmed_yield_qty: f64,
    pub sales_order: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedOrderDto {
    pub planned_order: String,
    pub material: String,
    pub production_plan: String,
    pub total_quantity: f64,
    pub sales_order: String,
    pub production_supervisor: String,
    pub plnd_order_planned_start_date: String,
    pub plnd_order_planned_start_time: String,
    pub plnd_order_planned_end_date: String,
    pub plnd_order_planned_end_time: String,
    pub planned_order_capacity_is_dsptchd: bool,
    pub work_center: String,
    pub etag: String,
    pub production_version: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionVersionDto {
    pub id: String,
    pub material: String,
    pub plant: u32,
    pub production_version_number: u32,
    pub routing_group: String,
    pub routing_group_counter: u32,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionSupervisor {
    pub plant: String,
    pub supervisor: String,
    pub supervisor_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkCenter {
    pub id: String,
    pub work_center: String,
    pub description: String,
    pub plant: String,
    pub production_supervisor: String,
}

/// Input for [`crate::ProductionOrderService::create_production_order`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewProductionOrder {
    pub material: String,
    pub production_plant: String,
    pub manufacturing_order_type: String,
    pub total_quantity: String,
    pub production_version: Option<String>,
}
