use portal_app::AppServices;

#[derive(Clone)]
pub struct HttpState {
    pub services: AppServices,
    pub max_upload_bytes: usize,
}

impl HttpState {
    pub fn new(services: AppServices, max_upload_bytes: usize) -> Self {
        Self {
            services,
            max_upload_bytes,
        }
    }
}
