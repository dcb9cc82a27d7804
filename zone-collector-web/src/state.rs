//! Shared request state.

use std::sync::Arc;

use zone_collector_app::AppState;
use zone_collector_czds::CzdsClient;

use crate::scheduler::Scheduler;

/// Everything the HTTP handlers need: the service container, the raw CZDS
/// client (for `/zone-links` and the health probe), and the scheduler handle.
pub struct WebState {
    pub app: AppState,
    pub czds: Arc<CzdsClient>,
    pub scheduler: Scheduler,
}
