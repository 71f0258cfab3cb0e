use chrono::NaiveDateTime;
use serde_json::Value;

use crate::{
    client::decode_list, format::local_date_time, ApiClient, NewProductionOrder, PlannedOrderDto,
    ProductionOrderDto, ProductionSupervisor, ProductionVersionDto, RequestSpec, Result,
    SessionCredentials, WorkCenter,
};

pub(crate) const SAP_ENDPOINT: &str = "/api/sap";

/// Production and planned order operations under `/api/sap`.
///
/// Most endpoints authenticate with the session's encoded credentials passed
/// as query parameters; those fail with
/// [`crate::ApiClientError::MissingCredentials`] before any request is made
/// when nobody is logged in.
#[derive(Clone, Debug)]
pub struct ProductionOrderService {
    client: ApiClient,
    session: SessionCredentials,
}

impl ProductionOrderService {
    pub fn new(client: ApiClient, session: SessionCredentials) -> Self {
        Self { client, session }
    }

    pub fn has_credentials(&self) -> bool {
        self.session.has_stored()
    }

    pub async fn planned_orders(
        &self,
        req_del_date_begin: NaiveDateTime,
        req_del_date_end: NaiveDateTime,
    ) -> Result<Vec<PlannedOrderDto>> {
        let spec = self
            .session
            .authorize(sap_get("getPlannedOrders"))?
            .query("reqDelDateBegin", local_date_time(req_del_date_begin))
            .query("reqDelDateEnd", local_date_time(req_del_date_end));
        self.list(spec).await
    }

    pub async fn planned_orders_by_production_supervisor(
        &self,
        production_supervisor: &str,
        req_del_date_begin: NaiveDateTime,
        req_del_date_end: NaiveDateTime,
    ) -> Result<Vec<PlannedOrderDto>> {
        let spec = self
            .session
            .authorize(sap_get("getPlannedOrdersByProductionSupervisor"))?
            .query("productionSupervisor", production_supervisor)
            .query("reqDelDateBegin", local_date_time(req_del_date_begin))
            .query("reqDelDateEnd", local_date_time(req_del_date_end));
        self.list(spec).await
    }

    pub async fn production_versions_by_material(
        &self,
        material: &str,
        plant: &str,
    ) -> Result<Vec<ProductionVersionDto>> {
        let spec = sap_get("getProductionVersionByMaterial")
            .query("material", material)
            .query("plant", plant);
        self.list(spec).await
    }

    pub async fn production_orders_by_production_supervisor(
        &self,
        production_supervisor: &str,
        req_del_date_begin: NaiveDateTime,
        req_del_date_end: NaiveDateTime,
    ) -> Result<Vec<ProductionOrderDto>> {
        let spec = self
            .session
            .authorize(sap_get("getProductionOrdersByProductionSupervisor"))?
            .query("productionSupervisor", production_supervisor)
            .query("reqDelDateBegin", local_date_time(req_del_date_begin))
            .query("reqDelDateEnd", local_date_time(req_del_date_end));
        self.list(spec).await
    }

    pub async fn production_orders_by_material(
        &self,
        material: &str,
        req_del_date_begin: NaiveDateTime,
        req_del_date_end: NaiveDateTime,
    ) -> Result<Vec<ProductionOrderDto>> {
        let spec = self
            .session
            .authorize(sap_get("getProductionOrdersByMaterial"))?
            .query("material", material)
            .query("reqDelDateBegin", local_date_time(req_del_date_begin))
            .query("reqDelDateEnd", local_date_time(req_del_date_end));
        self.list(spec).await
    }

    pub async fn production_supervisors(&self) -> Result<Vec<ProductionSupervisor>> {
        self.list(sap_get("getProductionSupervisor")).await
    }

    pub async fn work_centers_by_production_supervisor(
        &self,
        production_supervisor: &str,
    ) -> Result<Vec<WorkCenter>> {
        let spec = sap_get("getWorkCentersByProductionSupervisor")
            .query("productionSupervisor", production_supervisor);
        self.list(spec).await
    }

    /// Converts a planned order and returns the new production order number.
    pub async fn convert_planned_order(
        &self,
        planned_order: &str,
        manufacturing_order_type: &str,
    ) -> Result<String> {
        let spec = self
            .session
            .authorize(sap_post("convertPlannedOrder"))?
            .query("plannedOrder", planned_order)
            .query("manufacturingOrderType", manufacturing_order_type);
        let value = self.client.execute(&spec).await?;
        Ok(order_number(value))
    }

    /// Creates a production order and returns its number.
    pub async fn create_production_order(&self, order: &NewProductionOrder) -> Result<String> {
        let spec = self
            .session
            .authorize(sap_post("createProductionOrder"))?
            .query("material", order.material.as_str())
            .query("productionPlant", order.production_plant.as_str())
            .query("manufacturingOrderType", order.manufacturing_order_type.as_str())
            .query("totalQuantity", order.total_quantity.as_str())
            .query("productionVersion", order.production_version.as_ref());
        let value = self.client.execute(&spec).await?;
        Ok(order_number(value))
    }

    /// Schedules (`schedule = true`) or unschedules a production order.
    pub async fn update_production_order(
        &self,
        production_order: &str,
        scheduled_start: NaiveDateTime,
        schedule: bool,
    ) -> Result<()> {
        let spec = self
            .session
            .authorize(sap_post("updateProductionOrder"))?
            .query("productionOrder", production_order)
            .query("scheduledStartDateTime", local_date_time(scheduled_start))
            .query("schedule", schedule);
        self.client.execute(&spec).await?;
        Ok(())
    }

    pub async fn unschedule_production_order(
        &self,
        production_order: &str,
        scheduled_start: NaiveDateTime,
    ) -> Result<()> {
        self.update_production_order(production_order, scheduled_start, false)
            .await
    }

    pub async fn update_production_version(
        &self,
        production_order: &str,
        production_version: &str,
    ) -> Result<()> {
        let spec = self
            .session
            .authorize(sap_post("updateProductionVersion"))?
            .query("productionOrder", production_order)
            .query("productionVersion", production_version);
        self.client.execute(&spec).await?;
        Ok(())
    }

    /// Same endpoint as [`Self::update_production_version`], keyed by
    /// manufacturing order.
    pub async fn update_production_version_for_manufacturing_order(
        &self,
        manufacturing_order: &str,
        production_version: &str,
    ) -> Result<()> {
        let spec = self
            .session
            .authorize(sap_post("updateProductionVersion"))?
            .query("manufacturingOrder", manufacturing_order)
            .query("productionVersion", production_version);
        self.client.execute(&spec).await?;
        Ok(())
    }

    pub async fn update_production_order_quantity(
        &self,
        production_order: &str,
        quantity: &str,
    ) -> Result<()> {
        // The backend binds this parameter as `productionOrderOrder`.
        let spec = self
            .session
            .authorize(sap_post("updateProductionOrderQuantity"))?
            .query("productionOrderOrder", production_order)
            .query("quantity", quantity);
        self.client.execute(&spec).await?;
        Ok(())
    }

    pub async fn update_storage_location(
        &self,
        manufacturing_order: &str,
        new_storage_location: &str,
    ) -> Result<()> {
        let spec = self
            .session
            .authorize(sap_post("updateStorageLocation"))?
            .query("manufacturingOrder", manufacturing_order)
            .query("newStorageLocation", new_storage_location);
        self.client.execute(&spec).await?;
        Ok(())
    }

    async fn list<T: serde::de::DeserializeOwned>(&self, spec: RequestSpec) -> Result<Vec<T>> {
        let value = self.client.execute(&spec).await?;
        let rows = decode_list(&spec, value)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(path = spec.path(), count = rows.len(), "fetched rows");

        Ok(rows)
    }
}

pub(crate) fn sap_get(operation: &str) -> RequestSpec {
    RequestSpec::get(format!("{SAP_ENDPOINT}/{operation}"))
}

pub(crate) fn sap_post(operation: &str) -> RequestSpec {
    RequestSpec::post(format!("{SAP_ENDPOINT}/{operation}"))
}

/// The backend answers with the bare order number, usually as a JSON string.
fn order_number(value: Value) -> String {
    match value {
        Value::String(number) => number,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::order_number;

    #[test]
    fn order_number_accepts_strings_and_numbers() {
        assert_eq!(order_number(json!("1000456")), "1000456");
        assert_eq!(order_number(json!(1000456)), "1000456");
        assert_eq!(order_number(serde_json::Value::Null), "");
    }
}
