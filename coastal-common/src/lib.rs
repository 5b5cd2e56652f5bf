// coastal-common: Record model, normalization and merging for coastal feeds
// Used by coastal-gateway (proxy server and CLI)

pub mod display;
pub mod error;
pub mod logging;
pub mod record;
pub mod schema;
pub mod series;
pub mod time;
