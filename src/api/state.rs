use std::sync::Arc;
use crate::{
    config::Settings,
    media::MediaHost,
    service::ServiceContext,
};

#[derive(Clone)]
pub struct AppState {
    pub service_context: Arc<ServiceContext>,
    pub media_host: Option<Arc<dyn MediaHost>>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(
        service_context: Arc<ServiceContext>,
        media_host: Option<Arc<dyn MediaHost>>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            service_context,
            media_host,
            settings,
        }
    }
}
