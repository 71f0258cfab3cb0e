use chrono::NaiveDateTime;

use crate::{
    error::PlanStep,
    format::local_date_time,
    production_orders::sap_post,
    ApiClient, ApiClientError, Result, SessionCredentials,
};

/// Scheduling operations on SAP planned orders.
#[derive(Clone, Debug)]
pub struct PlannedOrderService {
    client: ApiClient,
    session: SessionCredentials,
}

impl PlannedOrderService {
    pub fn new(client: ApiClient, session: SessionCredentials) -> Self {
        Self { client, session }
    }

    /// Dispatches the planned order's capacity at `dispatch_time`.
    pub async fn dispatch(&self, planned_order: &str, dispatch_time: NaiveDateTime) -> Result<()> {
        self.send_dispatch_time("dispatchPlannedOrder", planned_order, dispatch_time)
            .await
    }

    /// Releases dispatched capacity, re-anchoring the order at `dispatch_time`.
    pub async fn deallocate(
        &self,
        planned_order: &str,
        dispatch_time: NaiveDateTime,
    ) -> Result<()> {
        self.send_dispatch_time("deallocatePlannedOrder", planned_order, dispatch_time)
            .await
    }

    /// Sets the production version and quantity of a planned order.
    pub async fn update_details(
        &self,
        planned_order: &str,
        production_version: &str,
        quantity: &str,
    ) -> Result<()> {
        let spec = self
            .session
            .authorize(sap_post("updatePlannedOrder"))?
            .query("plannedOrder", planned_order)
            .query("productionVersion", production_version)
            .query("quantity", quantity);
        self.client.execute(&spec).await?;
        Ok(())
    }

    /// Updates version and quantity, then dispatches.
    ///
    /// Dispatch is only attempted after the update succeeded. A dispatch
    /// failure leaves the update in place; the error names the failing step.
    pub async fn plan_order(
        &self,
        planned_order: &str,
        dispatch_time: NaiveDateTime,
        production_version: &str,
        quantity: &str,
    ) -> Result<()> {
        #[cfg(feature = "tracing")]
        tracing::debug!(planned_order, "plan order step 1: updating details");

        self.update_details(planned_order, production_version, quantity)
            .await
            .map_err(|err| plan_error(planned_order, PlanStep::UpdateDetails, err))?;

        #[cfg(feature = "tracing")]
        tracing::debug!(planned_order, "plan order step 2: dispatching");

        self.dispatch(planned_order, dispatch_time)
            .await
            .map_err(|err| plan_error(planned_order, PlanStep::Dispatch, err))
    }

    async fn send_dispatch_time(
        &self,
        operation: &str,
        planned_order: &str,
        dispatch_time: NaiveDateTime,
    ) -> Result<()> {
        let spec = self
            .session
            .authorize(sap_post(operation))?
            .query("plannedOrder", planned_order)
            .query("dispatchTime", local_date_time(dispatch_time));
        self.client.execute(&spec).await?;
        Ok(())
    }
}

fn plan_error(planned_order: &str, step: PlanStep, source: ApiClientError) -> ApiClientError {
    ApiClientError::PlanOrder {
        planned_order: planned_order.to_owned(),
        step,
        source: Box::new(source),
    }
}
