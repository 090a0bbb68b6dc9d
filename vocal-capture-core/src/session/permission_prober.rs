use crate::models::audio_models::{CaptureDiagnostics, PermissionState};
use crate::traits::media_devices::MediaDevices;
use crate::traits::permissions::PermissionQuery;
use crate::traits::recorder::{select_mime_type, RecorderFactory};

/// Read-only permission and capability checks run before a capture.
///
/// Never requests access itself; its only job is to let the capture
/// session fail with a specific, actionable error instead of a generic
/// denial after the fact.
pub struct PermissionProber<P: PermissionQuery> {
    query: P,
}

impl<P: PermissionQuery> PermissionProber<P> {
    pub fn new(query: P) -> Self {
        Self { query }
    }

    /// Current microphone permission. Hosts without a permission API report
    /// `Unsupported`; callers should attempt capture anyway.
    pub async fn probe(&self) -> PermissionState {
        let state = self.query.query_microphone().await.unwrap_or(PermissionState::Unsupported);
        log::debug!("Microphone permission: {:?}", state);
        state
    }

    /// Assemble a capability report for display or logging.
    pub async fn diagnose<D, R>(
        &self,
        devices: &D,
        recorders: &R,
        mime_preferences: &[String],
        needs_user_interaction: bool,
    ) -> CaptureDiagnostics
    where
        D: MediaDevices,
        R: RecorderFactory,
    {
        let permission = self.probe().await;
        let capture_supported = devices.is_supported();
        let input_devices = if capture_supported {
            devices.enumerate_audio_inputs().await.map(|inputs| inputs.len())
        } else {
            None
        };
        CaptureDiagnostics {
            permission,
            capture_supported,
            selected_mime_type: select_mime_type(recorders, mime_preferences),
            input_devices,
            needs_user_interaction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::EngineConfig;
    use crate::sim::SimulatedPlatform;
    use crate::traits::permissions::NoPermissionApi;

    #[tokio::test]
    async fn reports_host_permission() {
        let platform = SimulatedPlatform::default();
        platform.configure(|s| s.permission = Some(PermissionState::Denied));
        let prober = PermissionProber::new(platform.clone());

        assert_eq!(prober.probe().await, PermissionState::Denied);
        assert_eq!(platform.permission_queries(), 1);
        assert!(platform.device_requests().is_empty());
    }

    #[tokio::test]
    async fn missing_api_degrades_to_unsupported() {
        let prober = PermissionProber::new(NoPermissionApi);
        assert_eq!(prober.probe().await, PermissionState::Unsupported);

        let platform = SimulatedPlatform::default();
        platform.configure(|s| s.permission = None);
        assert_eq!(PermissionProber::new(platform).probe().await, PermissionState::Unsupported);
    }

    #[tokio::test]
    async fn diagnose_collects_capabilities() {
        let platform = SimulatedPlatform::default();
        let prober = PermissionProber::new(platform.clone());
        let config = EngineConfig::default();

        let report = prober.diagnose(&platform, &platform, &config.mime_preferences, true).await;

        assert_eq!(report.permission, PermissionState::Granted);
        assert!(report.capture_supported);
        assert_eq!(report.selected_mime_type.as_deref(), Some("audio/webm"));
        assert_eq!(report.input_devices, Some(1));
        assert!(report.needs_user_interaction);
        assert!(platform.device_requests().is_empty());
    }

    #[tokio::test]
    async fn diagnose_without_capture_support() {
        let platform = SimulatedPlatform::default();
        platform.configure(|s| {
            s.capture_supported = false;
            s.supported_mime_types.clear();
        });
        let prober = PermissionProber::new(platform.clone());

        let report = prober.diagnose(&platform, &platform, &["audio/webm".to_string()], false).await;

        assert!(!report.capture_supported);
        assert_eq!(report.selected_mime_type, None);
        assert_eq!(report.input_devices, None);
    }
}
