mod config;
pub use config::DiscoverConfig;

mod errors;
pub use errors::DiscoverError;

mod resolver;
pub use resolver::{PublicIpResolver, parse_address};
