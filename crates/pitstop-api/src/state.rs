use std::sync::Arc;

use crate::relay::Broadcaster;

#[derive(Clone)]
pub struct ApiState {
    pub db: pitstop_db::Database,
    pub broadcaster: Arc<dyn Broadcaster>,
}
