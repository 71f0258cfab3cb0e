//! `sap-order-client` is an async HTTP client for the order management REST
//! API that fronts a SAP ERP backend.
//!
//! Every call goes through [`RequestExecutor`], which enforces a per-attempt
//! timeout and retries server and late network failures with capped
//! exponential backoff. On top of it sit typed services:
//! - [`AuthService`] for login and session state
//! - [`SalesOrderService`] for `/sales-orders`
//! - [`ProductionOrderService`] and [`PlannedOrderService`] for `/api/sap`

mod auth;
mod client;
mod config;
mod credentials;
mod error;
mod executor;
pub mod format;
mod planned_orders;
mod production_orders;
mod request;
mod sales_orders;
pub mod transport;
mod types;
mod value;

pub use auth::AuthService;
pub use client::ApiClient;
pub use config::{
    ClientConfig, DEFAULT_APP_NAME, DEFAULT_APP_VERSION, DEFAULT_BASE_URL, DEFAULT_HEALTH_PATH,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_MODE, DEFAULT_TIMEOUT_MS,
};
pub use credentials::{Credentials, EncodedCredentials, SessionCredentials};
pub use error::{ApiClientError, ApiError, PlanStep};
pub use executor::{backoff_delay, RequestExecutor};
pub use planned_orders::PlannedOrderService;
pub use production_orders::ProductionOrderService;
pub use request::{redact_url, Method, RequestSpec};
pub use sales_orders::{
    Pagination, SalesOrderFilters, SalesOrderService, SortDirection, DEFAULT_PAGE_SIZE,
    DEFAULT_SORT,
};
pub use types::{
    HealthStatus, LoginResponse, NewProductionOrder, NewSalesOrder, Page, PlannedOrderDto,
    ProductionOrderDto, ProductionSupervisor, ProductionVersionDto, SalesOrderDto,
    SalesOrderPatch, SalesOrderStats, SessionInfo, ToItem, WorkCenter,
};
pub use value::QueryValue;

pub type Result<T> = std::result::Result<T, ApiClientError>;
