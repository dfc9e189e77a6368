mod cfg;
mod error;
mod filter;

pub use cfg::SofaConfig;
pub use cfg::Subsystem;
pub use error::Error;
pub use filter::parse_filter_list;
pub use filter::Filter;
