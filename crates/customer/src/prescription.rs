//! Prescription upload.
//!
//! The customer photographs the prescription (camera permission required)
//! or picks it from the gallery, previews it and sends it to the backend.

use async_trait::async_trait;
use farmacia_client::api::{PrescriptionImage, PrescriptionReceipt};
use farmacia_client::{ApiClient, ApiError};
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Alert title when camera access is refused.
pub const PERMISSION_TITLE: &str = "Permiso requerido";
/// Alert body when camera access is refused.
pub const CAMERA_PERMISSION_MESSAGE: &str =
    "Necesitamos acceso a la camara para fotografiar tu receta";
/// Text shown after a successful upload.
pub const UPLOAD_SUCCESS_MESSAGE: &str = "Tu receta fue recibida correctamente. Te notificaremos cuando tus medicamentos esten listos para retiro.";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{}", CAMERA_PERMISSION_MESSAGE)]
    PermissionDenied,

    /// `upload` called before an image was chosen.
    #[error("Selecciona una imagen de la receta")]
    NoImage,

    /// A previous upload is still running.
    #[error("Subida en curso")]
    InProgress,

    #[error("image picker error: {0}")]
    Picker(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

/// Options passed to the camera and gallery.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickerOptions {
    pub allows_editing: bool,
    /// JPEG quality in `0.0..=1.0`.
    pub quality: f32,
}

impl Default for PickerOptions {
    fn default() -> Self {
        Self {
            allows_editing: true,
            quality: 0.8,
        }
    }
}

/// Image chosen by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedImage {
    /// Local URI used for the preview.
    pub uri: String,
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl PickedImage {
    fn to_upload(&self) -> PrescriptionImage {
        PrescriptionImage {
            file_name: self.file_name.clone(),
            mime_type: self.mime_type.clone(),
            bytes: self.bytes.clone(),
        }
    }
}

/// Platform camera and gallery.
///
/// `None` from a launch means the user cancelled.
#[async_trait]
pub trait ImagePicker: Send + Sync {
    async fn request_camera_permission(&self) -> PermissionStatus;
    async fn launch_camera(&self, options: &PickerOptions) -> Result<Option<PickedImage>, String>;
    async fn launch_library(&self, options: &PickerOptions) -> Result<Option<PickedImage>, String>;
}

/// Upload screen state.
#[derive(Debug)]
pub struct PrescriptionUpload<P> {
    picker: P,
    api: ApiClient,
    image: Option<PickedImage>,
    uploading: bool,
    receipt: Option<PrescriptionReceipt>,
}

impl<P: ImagePicker> PrescriptionUpload<P> {
    pub const fn new(picker: P, api: ApiClient) -> Self {
        Self {
            picker,
            api,
            image: None,
            uploading: false,
            receipt: None,
        }
    }

    #[must_use]
    pub const fn image(&self) -> Option<&PickedImage> {
        self.image.as_ref()
    }

    #[must_use]
    pub const fn is_uploading(&self) -> bool {
        self.uploading
    }

    /// `true` once the backend accepted the prescription.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.receipt.is_some()
    }

    #[must_use]
    pub const fn receipt(&self) -> Option<&PrescriptionReceipt> {
        self.receipt.as_ref()
    }

    /// Photograph the prescription.
    ///
    /// Returns `Ok(false)` if the user cancelled the camera.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::PermissionDenied` without touching state when
    /// camera access is refused, or `UploadError::Picker` if the camera fails.
    #[instrument(skip(self))]
    pub async fn take_photo(&mut self) -> Result<bool, UploadError> {
        if self.picker.request_camera_permission().await != PermissionStatus::Granted {
            warn!("Camera permission refused");
            return Err(UploadError::PermissionDenied);
        }
        let picked = self
            .picker
            .launch_camera(&PickerOptions::default())
            .await
            .map_err(UploadError::Picker)?;
        Ok(self.select(picked))
    }

    /// Choose the prescription from the gallery.
    ///
    /// Returns `Ok(false)` if the user cancelled.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Picker` if the gallery fails.
    #[instrument(skip(self))]
    pub async fn pick_image(&mut self) -> Result<bool, UploadError> {
        let picked = self
            .picker
            .launch_library(&PickerOptions::default())
            .await
            .map_err(UploadError::Picker)?;
        Ok(self.select(picked))
    }

    fn select(&mut self, picked: Option<PickedImage>) -> bool {
        let Some(image) = picked else {
            return false;
        };
        self.image = Some(image);
        true
    }

    /// Drop the chosen image to pick another.
    pub fn clear_image(&mut self) {
        self.image = None;
    }

    /// Send the chosen image.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::NoImage` without an image, `InProgress` while
    /// another upload runs, or `UploadError::Api` if the backend rejects it.
    /// The image is kept on failure so the user can retry.
    #[instrument(skip(self))]
    pub async fn upload(&mut self) -> Result<&PrescriptionReceipt, UploadError> {
        if self.uploading {
            return Err(UploadError::InProgress);
        }
        let image = self.image.as_ref().ok_or(UploadError::NoImage)?.to_upload();

        self.uploading = true;
        let result = self.api.upload_prescription(&image).await;
        self.uploading = false;

        let receipt = result?;
        info!(prescription_id = %receipt.id, "Prescription uploaded");
        Ok(&*self.receipt.insert(receipt))
    }

    /// Back to the empty form after a successful upload.
    pub fn reset(&mut self) {
        self.image = None;
        self.receipt = None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use farmacia_client::{ClientConfig, CredentialStore};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    struct FakePicker {
        permission: PermissionStatus,
        camera: Option<PickedImage>,
        library: Option<PickedImage>,
    }

    #[async_trait]
    impl ImagePicker for FakePicker {
        async fn request_camera_permission(&self) -> PermissionStatus {
            self.permission
        }

        async fn launch_camera(&self, options: &PickerOptions) -> Result<Option<PickedImage>, String> {
            assert!(options.allows_editing);
            Ok(self.camera.clone())
        }

        async fn launch_library(&self, _options: &PickerOptions) -> Result<Option<PickedImage>, String> {
            Ok(self.library.clone())
        }
    }

    fn photo(name: &str) -> PickedImage {
        PickedImage {
            uri: format!("file:///tmp/{name}"),
            file_name: name.to_string(),
            mime_type: "image/jpeg".to_string(),
            bytes: vec![0xFF, 0xD8, 0xFF],
        }
    }

    fn screen(server: &MockServer, picker: FakePicker) -> PrescriptionUpload<FakePicker> {
        let config = ClientConfig::default().with_base_urls(&server.uri(), &server.uri());
        let api = ApiClient::new(&config, CredentialStore::in_memory()).unwrap();
        PrescriptionUpload::new(picker, api)
    }

    #[tokio::test]
    async fn test_denied_camera_leaves_state() {
        let server = MockServer::start().await;
        let mut upload = screen(
            &server,
            FakePicker {
                permission: PermissionStatus::Denied,
                camera: Some(photo("receta.jpg")),
                library: None,
            },
        );
        let err = upload.take_photo().await.unwrap_err();
        assert!(matches!(err, UploadError::PermissionDenied));
        assert_eq!(
            err.to_string(),
            "Necesitamos acceso a la camara para fotografiar tu receta"
        );
        assert!(upload.image().is_none());
    }

    #[tokio::test]
    async fn test_cancelled_pick_keeps_previous_image() {
        let server = MockServer::start().await;
        let mut upload = screen(
            &server,
            FakePicker {
                permission: PermissionStatus::Granted,
                camera: Some(photo("receta.jpg")),
                library: None,
            },
        );
        assert!(upload.take_photo().await.unwrap());
        assert!(!upload.pick_image().await.unwrap());
        assert_eq!(upload.image().unwrap().file_name, "receta.jpg");
    }

    #[tokio::test]
    async fn test_upload_requires_image() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/prescriptions"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let mut upload = screen(
            &server,
            FakePicker {
                permission: PermissionStatus::Granted,
                camera: None,
                library: None,
            },
        );
        assert!(matches!(upload.upload().await, Err(UploadError::NoImage)));
        assert!(!upload.is_success());
    }

    #[tokio::test]
    async fn test_upload_success_then_reset() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/prescriptions"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": "rx-1001",
                "status": "RECEIVED"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut upload = screen(
            &server,
            FakePicker {
                permission: PermissionStatus::Undetermined,
                camera: None,
                library: Some(photo("galeria.png")),
            },
        );
        assert!(upload.pick_image().await.unwrap());
        assert_eq!(upload.upload().await.unwrap().id, "rx-1001");
        assert!(upload.is_success());
        assert!(!upload.is_uploading());

        upload.reset();
        assert!(!upload.is_success());
        assert!(upload.image().is_none());
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_image() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/prescriptions"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let mut upload = screen(
            &server,
            FakePicker {
                permission: PermissionStatus::Granted,
                camera: Some(photo("receta.jpg")),
                library: None,
            },
        );
        upload.take_photo().await.unwrap();
        assert!(matches!(
            upload.upload().await,
            Err(UploadError::Api(ApiError::Status(503)))
        ));
        assert!(upload.image().is_some());
        assert!(!upload.is_success());
    }
}
