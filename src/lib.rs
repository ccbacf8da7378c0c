pub mod checkout;
pub mod draft_store;
pub mod limits;
pub mod model;
pub mod observability;
pub mod provider;
pub mod reconcile;
pub mod report;
pub mod session;
