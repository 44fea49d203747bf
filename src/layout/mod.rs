mod append;
mod full;
mod partition;
mod routing;
pub(crate) mod types;

pub use append::{AppendSkip, try_append};
pub use full::compute_full_layout;
pub use partition::{PartitionSkip, try_partition};
pub use routing::{ConnectorRoute, PathCommand, route_connector};
pub use types::*;
