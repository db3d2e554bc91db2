//! Transformers applied to extracted tables before loading

mod column_filter;
mod key_filter;
mod tenant_stamp;

pub use column_filter::ColumnAllowList;
pub use key_filter::KeyRequired;
pub use tenant_stamp::TenantStamper;
