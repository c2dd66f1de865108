use std::sync::Arc;

use gamehub_tracker::Tracker;

#[derive(Clone)]
pub struct ServerContext {
    pub tracker: Arc<Tracker>,
    /// Mark the admin session cookie as HTTPS only
    pub secure_cookies: bool,
}

impl ServerContext {
    pub fn new(tracker: Tracker, secure_cookies: bool) -> Self {
        Self {
            tracker: Arc::new(tracker),
            secure_cookies,
        }
    }
}
