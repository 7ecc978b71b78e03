use std::sync::Arc;
use std::time::Duration;

use reviewer_repository::UnitOfWorkFactory;
use reviewer_service::{RequestContext, Services};

pub struct AppState {
    pub services: Services,
    pub request_timeout: Duration,
}

impl AppState {
    #[must_use]
    pub fn new(factory: Arc<dyn UnitOfWorkFactory>, request_timeout: Duration) -> Self {
        Self {
            services: Services::new(factory),
            request_timeout,
        }
    }

    /// Context for one request, expiring after the configured timeout.
    #[must_use]
    pub fn context(&self) -> RequestContext {
        RequestContext::with_timeout(self.request_timeout)
    }
}
