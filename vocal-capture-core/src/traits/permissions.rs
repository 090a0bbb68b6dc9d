use std::future::Future;

use crate::models::audio_models::PermissionState;

/// Read-only microphone permission query.
///
/// Returns `None` when the host has no permission API; implementations must
/// never prompt the user.
pub trait PermissionQuery: Send + Sync + 'static {
    fn query_microphone(&self) -> impl Future<Output = Option<PermissionState>> + Send;
}

/// For hosts without a permission API.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPermissionApi;

impl PermissionQuery for NoPermissionApi {
    async fn query_microphone(&self) -> Option<PermissionState> {
        None
    }
}
