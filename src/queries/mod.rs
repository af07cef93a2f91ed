pub mod analytics_queries;
pub mod batch_queries;
pub mod claim_queries;
pub mod product_queries;
pub mod shop_queries;
pub mod unit_queries;
pub mod user_queries;
