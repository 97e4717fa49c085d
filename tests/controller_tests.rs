// SPDX-License-Identifier: GPL-3.0-only

//! Screen controller tests against mock permission and camera backends

use futures::FutureExt;
use snapcam::app::{Action, Command, Notice, ScreenController, ScreenMode};
use snapcam::backends::camera::{
    CameraDevice, CameraFrame, CameraKind, CameraSession, CaptureDevice, PhotoRef, with_camera,
};
use snapcam::backends::permission::{PermissionProvider, PermissionState};
use snapcam::errors::{BackendError, BackendResult, CaptureError, PermissionError, PermissionResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct MockPermission {
    status: Mutex<PermissionResult<PermissionState>>,
    on_request: PermissionResult<PermissionState>,
    queries: AtomicUsize,
    requests: AtomicUsize,
}

impl MockPermission {
    fn new(status: PermissionState, on_request: PermissionState) -> Arc<Self> {
        Arc::new(Self {
            status: Mutex::new(Ok(status)),
            on_request: Ok(on_request),
            queries: AtomicUsize::new(0),
            requests: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        let error = PermissionError::PortalUnavailable("no session bus".to_string());
        Arc::new(Self {
            status: Mutex::new(Err(error.clone())),
            on_request: Err(error),
            queries: AtomicUsize::new(0),
            requests: AtomicUsize::new(0),
        })
    }
}

impl PermissionProvider for MockPermission {
    async fn query_status(&self) -> PermissionResult<PermissionState> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.status.lock().unwrap().clone()
    }

    async fn request_access(&self) -> PermissionResult<PermissionState> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Ok(state) = &self.on_request {
            *self.status.lock().unwrap() = Ok(*state);
        }
        self.on_request.clone()
    }
}

struct MockCamera {
    devices: Vec<CameraDevice>,
    capture: Result<PhotoRef, CaptureError>,
    fail_activation: bool,
    activations: AtomicUsize,
    deactivations: AtomicUsize,
    captures: AtomicUsize,
}

impl MockCamera {
    fn with_devices(devices: Vec<CameraDevice>) -> Self {
        Self {
            devices,
            capture: Ok(PhotoRef::new("/tmp/snapcam/IMG_1.jpg")),
            fail_activation: false,
            activations: AtomicUsize::new(0),
            deactivations: AtomicUsize::new(0),
            captures: AtomicUsize::new(0),
        }
    }

    fn back() -> Arc<Self> {
        Arc::new(Self::with_devices(vec![device(CameraKind::Back)]))
    }

    fn failing_capture(error: CaptureError) -> Arc<Self> {
        Arc::new(Self {
            capture: Err(error),
            ..Self::with_devices(vec![device(CameraKind::Back)])
        })
    }

    fn active(&self) -> usize {
        self.activations.load(Ordering::SeqCst) - self.deactivations.load(Ordering::SeqCst)
    }
}

impl CaptureDevice for MockCamera {
    fn enumerate(&self) -> Vec<CameraDevice> {
        self.devices.clone()
    }

    fn activate(&self, device: &CameraDevice) -> BackendResult<()> {
        if self.fail_activation {
            return Err(BackendError::Busy);
        }
        assert!(self.devices.contains(device));
        self.activations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn deactivate(&self, _device: &CameraDevice) {
        self.deactivations.fetch_add(1, Ordering::SeqCst);
    }

    fn latest_frame(&self) -> Option<Arc<CameraFrame>> {
        CameraFrame::from_rgb(1, 1, vec![10, 20, 30]).map(Arc::new)
    }

    async fn take_photo(&self, _device: &CameraDevice) -> Result<PhotoRef, CaptureError> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        self.capture.clone()
    }
}

fn device(kind: CameraKind) -> CameraDevice {
    CameraDevice {
        name: format!("{} camera", kind),
        path: "/dev/video0".to_string(),
        driver: Some("mock".to_string()),
        kind,
    }
}

fn controller(
    permission: &Arc<MockPermission>,
    camera: &Arc<MockCamera>,
) -> ScreenController<MockPermission, MockCamera> {
    ScreenController::with_shared(Arc::clone(permission), Arc::clone(camera), None)
}

async fn granted_and_live(
    camera: &Arc<MockCamera>,
) -> ScreenController<MockPermission, MockCamera> {
    let permission = MockPermission::new(PermissionState::Granted, PermissionState::Granted);
    let mut controller = controller(&permission, camera);
    controller.initialize().await;
    controller.open_camera();
    assert_eq!(controller.current_mode(), ScreenMode::CameraLive);
    controller
}

#[tokio::test]
async fn test_initialize_queries_exactly_once() {
    let permission = MockPermission::new(PermissionState::Granted, PermissionState::Granted);
    let camera = MockCamera::back();
    let mut controller = controller(&permission, &camera);

    controller.initialize().await;
    controller.initialize().await;

    assert_eq!(permission.queries.load(Ordering::SeqCst), 1);
    assert_eq!(controller.state().permission, PermissionState::Granted);
    assert_eq!(controller.state().device, Some(device(CameraKind::Back)));
    assert_eq!(controller.current_mode(), ScreenMode::Home);
}

#[tokio::test]
async fn test_query_failure_is_denied() {
    let permission = MockPermission::failing();
    let camera = MockCamera::back();
    let mut controller = controller(&permission, &camera);

    controller.initialize().await;

    assert_eq!(controller.state().permission, PermissionState::Denied);
    assert!(!controller.state().pending.permission);
}

#[tokio::test]
async fn test_grant_flow_reaches_live() {
    let permission = MockPermission::new(PermissionState::Denied, PermissionState::Granted);
    let camera = MockCamera::back();
    let mut controller = controller(&permission, &camera);
    controller.initialize().await;

    controller.open_camera();
    assert_eq!(controller.current_mode(), ScreenMode::PermissionBlocked);
    assert_eq!(camera.activations.load(Ordering::SeqCst), 0);

    controller.request_permission().await;
    assert_eq!(controller.state().permission, PermissionState::Granted);
    assert_eq!(controller.current_mode(), ScreenMode::CameraLive);
    assert!(controller.session_active());
    assert_eq!(camera.active(), 1);
    assert!(controller.latest_frame().is_some());
}

#[tokio::test]
async fn test_refused_request_stays_blocked() {
    let permission = MockPermission::new(PermissionState::Denied, PermissionState::Denied);
    let camera = MockCamera::back();
    let mut controller = controller(&permission, &camera);
    controller.initialize().await;
    controller.open_camera();

    controller.request_permission().await;

    assert_eq!(controller.current_mode(), ScreenMode::PermissionBlocked);
    assert!(controller.latest_frame().is_none());
    controller.close_camera();
    assert_eq!(controller.current_mode(), ScreenMode::Home);
}

#[tokio::test]
async fn test_request_failure_is_denied() {
    let permission = MockPermission::failing();
    let camera = MockCamera::back();
    let mut controller = controller(&permission, &camera);

    controller.request_permission().await;

    assert_eq!(permission.requests.load(Ordering::SeqCst), 1);
    assert_eq!(controller.state().permission, PermissionState::Denied);
}

#[tokio::test]
async fn test_request_when_granted_issues_nothing() {
    let permission = MockPermission::new(PermissionState::Granted, PermissionState::Granted);
    let camera = MockCamera::back();
    let mut controller = controller(&permission, &camera);
    controller.initialize().await;

    controller.request_permission().await;

    assert_eq!(permission.requests.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_request_permission_not_reentrant() {
    let permission = MockPermission::new(PermissionState::Denied, PermissionState::Granted);
    let camera = MockCamera::back();
    let mut controller = controller(&permission, &camera);

    let first = controller.dispatch(Action::RequestPermission);
    let second = controller.dispatch(Action::RequestPermission);
    assert_eq!(first, Command::RequestPermission);
    assert_eq!(second, Command::None);

    let completion = controller.perform(first).unwrap().await;
    controller.dispatch(completion);

    assert_eq!(permission.requests.load(Ordering::SeqCst), 1);
    assert_eq!(controller.state().permission, PermissionState::Granted);
}

#[tokio::test]
async fn test_missing_device_then_back() {
    let permission = MockPermission::new(PermissionState::Granted, PermissionState::Granted);
    let camera = Arc::new(MockCamera::with_devices(Vec::new()));
    let mut controller = controller(&permission, &camera);
    controller.initialize().await;

    controller.open_camera();
    assert_eq!(controller.current_mode(), ScreenMode::DeviceUnavailable);
    assert_eq!(camera.activations.load(Ordering::SeqCst), 0);

    controller.close_camera();
    assert_eq!(controller.current_mode(), ScreenMode::Home);
}

#[tokio::test]
async fn test_wrong_kind_is_unavailable() {
    let permission = MockPermission::new(PermissionState::Granted, PermissionState::Granted);
    let camera = MockCamera::back();
    let mut controller = ScreenController::with_shared(
        Arc::clone(&permission),
        Arc::clone(&camera),
        Some(CameraKind::Front),
    );
    controller.initialize().await;

    controller.open_camera();

    assert_eq!(controller.current_mode(), ScreenMode::DeviceUnavailable);
}

#[tokio::test]
async fn test_capture_success_returns_home_and_releases() {
    let camera = MockCamera::back();
    let mut controller = granted_and_live(&camera).await;

    controller.capture_photo().await;

    assert_eq!(
        controller.state().photo,
        Some(PhotoRef::new("/tmp/snapcam/IMG_1.jpg"))
    );
    assert!(!controller.state().camera_open);
    assert_eq!(controller.current_mode(), ScreenMode::Home);
    assert_eq!(camera.captures.load(Ordering::SeqCst), 1);
    assert_eq!(camera.active(), 0);
    assert!(!controller.session_active());
}

#[tokio::test]
async fn test_capture_failure_keeps_live_view() {
    let camera = MockCamera::failing_capture(CaptureError::Timeout);
    let mut controller = granted_and_live(&camera).await;

    controller.capture_photo().await;

    assert!(controller.state().camera_open);
    assert!(controller.state().photo.is_none());
    assert_eq!(controller.current_mode(), ScreenMode::CameraLive);
    assert!(matches!(
        controller.state().notice,
        Some(Notice::CaptureFailed(_))
    ));
    // Still streaming from the same activation
    assert_eq!(camera.activations.load(Ordering::SeqCst), 1);
    assert_eq!(camera.active(), 1);

    controller.dismiss_notice();
    assert!(controller.state().notice.is_none());
}

#[tokio::test]
async fn test_capture_not_reentrant() {
    let camera = MockCamera::back();
    let mut controller = granted_and_live(&camera).await;

    let first = controller.dispatch(Action::CapturePhoto);
    let second = controller.dispatch(Action::CapturePhoto);
    assert!(matches!(first, Command::Capture(_)));
    assert_eq!(second, Command::None);

    let completion = controller.perform(first).unwrap().await;
    controller.dispatch(completion);

    assert_eq!(camera.captures.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_capture_outside_live_view_does_nothing() {
    let permission = MockPermission::new(PermissionState::Granted, PermissionState::Granted);
    let camera = MockCamera::back();
    let mut controller = controller(&permission, &camera);
    controller.initialize().await;

    controller.capture_photo().await;

    assert_eq!(camera.captures.load(Ordering::SeqCst), 0);
    assert!(controller.state().photo.is_none());
}

#[tokio::test]
async fn test_close_releases_camera() {
    let camera = MockCamera::back();
    let mut controller = granted_and_live(&camera).await;

    controller.close_camera();

    assert_eq!(controller.current_mode(), ScreenMode::Home);
    assert_eq!(camera.active(), 0);
    // Closing again is harmless
    controller.close_camera();
    assert_eq!(camera.deactivations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_permission_loss_releases_camera() {
    let camera = MockCamera::back();
    let mut controller = granted_and_live(&camera).await;

    controller.dispatch(Action::PermissionResolved(PermissionState::Denied));

    assert_eq!(controller.current_mode(), ScreenMode::PermissionBlocked);
    assert_eq!(camera.active(), 0);
}

#[tokio::test]
async fn test_activation_failure_marks_device_unavailable() {
    let permission = MockPermission::new(PermissionState::Granted, PermissionState::Granted);
    let camera = Arc::new(MockCamera {
        fail_activation: true,
        ..MockCamera::with_devices(vec![device(CameraKind::Back)])
    });
    let mut controller = controller(&permission, &camera);
    controller.initialize().await;

    controller.open_camera();

    assert_eq!(controller.current_mode(), ScreenMode::DeviceUnavailable);
    assert!(!controller.session_active());
    controller.close_camera();
    assert_eq!(controller.current_mode(), ScreenMode::Home);
}

#[tokio::test]
async fn test_dropping_controller_releases_camera() {
    let camera = MockCamera::back();
    let controller = granted_and_live(&camera).await;

    drop(controller);

    assert_eq!(camera.active(), 0);
}

#[test]
fn test_session_deactivates_on_drop() {
    let camera = MockCamera::back();
    let session = CameraSession::acquire(Arc::clone(&camera), device(CameraKind::Back)).unwrap();
    assert_eq!(camera.active(), 1);

    drop(session);

    assert_eq!(camera.active(), 0);
}

#[tokio::test]
async fn test_with_camera_releases_on_error() {
    let camera = MockCamera::failing_capture(CaptureError::Device("unplugged".to_string()));
    let target = device(CameraKind::Back);

    let result = with_camera(&camera, &target, |camera, device| async move {
        assert_eq!(camera.active(), 1);
        camera.take_photo(&device).await
    })
    .await;

    assert_eq!(
        result,
        Ok(Err(CaptureError::Device("unplugged".to_string())))
    );
    assert_eq!(camera.active(), 0);
}

#[tokio::test]
async fn test_with_camera_releases_on_panic() {
    let camera = MockCamera::back();
    let target = device(CameraKind::Back);

    let outcome = std::panic::AssertUnwindSafe(with_camera(&camera, &target, |_, _| async {
        if std::hint::black_box(true) {
            panic!("body failed");
        }
    }))
    .catch_unwind()
    .await;

    assert!(outcome.is_err());
    assert_eq!(camera.active(), 0);
}

#[tokio::test]
async fn test_with_camera_activation_failure() {
    let camera = Arc::new(MockCamera {
        fail_activation: true,
        ..MockCamera::with_devices(vec![device(CameraKind::Back)])
    });
    let target = device(CameraKind::Back);

    let result = with_camera(&camera, &target, |_, _| async { 42 }).await;

    assert_eq!(result, Err(BackendError::Busy));
    assert_eq!(camera.deactivations.load(Ordering::SeqCst), 0);
}
