use crate::{
    client::decode_list, ApiClient, NewSalesOrder, Page, RequestSpec, Result, SalesOrderDto,
    SalesOrderPatch, SalesOrderStats,
};

const SALES_ORDERS_ENDPOINT: &str = "/sales-orders";

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_SORT: &str = "salesOrderNumber";

/// Optional filters for [`SalesOrderService::list`]. Unset fields are not sent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SalesOrderFilters {
    pub sales_order_number: Option<String>,
    pub sold_to_party: Option<String>,
    pub requested_delivery_week: Option<String>,
    pub complete_delivery: Option<bool>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub size: u32,
    pub sort: String,
    pub direction: SortDirection,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort: DEFAULT_SORT.to_owned(),
            direction: SortDirection::Asc,
        }
    }
}

impl Pagination {
    pub fn page(page: u32) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }
}

/// CRUD and search over `/sales-orders`.
#[derive(Clone, Debug)]
pub struct SalesOrderService {
    client: ApiClient,
}

impl SalesOrderService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(
        &self,
        filters: &SalesOrderFilters,
        pagination: &Pagination,
    ) -> Result<Page<SalesOrderDto>> {
        let spec = RequestSpec::get(SALES_ORDERS_ENDPOINT)
            .query("salesOrderNumber", filters.sales_order_number.as_ref())
            .query("soldToParty", filters.sold_to_party.as_ref())
            .query("requestedDeliveryWeek", filters.requested_delivery_week.as_ref())
            .query("completeDelivery", filters.complete_delivery)
            .query("dateFrom", filters.date_from.as_ref())
            .query("dateTo", filters.date_to.as_ref())
            .query("page", pagination.page)
            .query("size", pagination.size)
            .query("sort", pagination.sort.as_str())
            .query("direction", pagination.direction.as_str());
        self.client.execute_as(&spec).await
    }

    pub async fn get_by_number(&self, sales_order_number: &str) -> Result<SalesOrderDto> {
        self.client
            .get(&format!("{SALES_ORDERS_ENDPOINT}/{sales_order_number}"))
            .await
    }

    pub async fn create(&self, order: &NewSalesOrder) -> Result<SalesOrderDto> {
        self.client.post(SALES_ORDERS_ENDPOINT, Some(order)).await
    }

    pub async fn update(
        &self,
        sales_order_number: &str,
        patch: &SalesOrderPatch,
    ) -> Result<SalesOrderDto> {
        self.client
            .put(&format!("{SALES_ORDERS_ENDPOINT}/{sales_order_number}"), Some(patch))
            .await
    }

    pub async fn delete(&self, sales_order_number: &str) -> Result<()> {
        let spec = RequestSpec::delete(format!("{SALES_ORDERS_ENDPOINT}/{sales_order_number}"));
        self.client.execute(&spec).await?;
        Ok(())
    }

    /// Full-text search; only `page` and `size` of `pagination` are sent.
    pub async fn search(&self, query: &str, pagination: &Pagination) -> Result<Page<SalesOrderDto>> {
        let spec = RequestSpec::get(format!("{SALES_ORDERS_ENDPOINT}/search"))
            .query("q", query)
            .query("page", pagination.page)
            .query("size", pagination.size);
        self.client.execute_as(&spec).await
    }

    pub async fn by_delivery_week(&self, week: &str) -> Result<Vec<SalesOrderDto>> {
        let spec = RequestSpec::get(format!("{SALES_ORDERS_ENDPOINT}/delivery-week/{week}"));
        let value = self.client.execute(&spec).await?;
        decode_list(&spec, value)
    }

    pub async fn stats(&self) -> Result<SalesOrderStats> {
        self.client
            .get(&format!("{SALES_ORDERS_ENDPOINT}/stats"))
            .await
    }
}
