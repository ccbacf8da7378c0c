use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::limits::MAX_PAYMENT_PROOF_BYTES;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    AccessDenied,
    Unavailable(String),
    EmptyImage,
    TooLarge(usize),
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureError::AccessDenied => write!(f, "camera access denied"),
            CaptureError::Unavailable(e) => write!(f, "capture device unavailable: {e}"),
            CaptureError::EmptyImage => write!(f, "captured image is empty"),
            CaptureError::TooLarge(len) => write!(
                f,
                "captured image is {len} bytes, limit is {MAX_PAYMENT_PROOF_BYTES}"
            ),
        }
    }
}

impl std::error::Error for CaptureError {}

/// Platform image source (camera, file picker). Checkout code only sees this trait.
pub trait ImageCapture {
    fn request_access(&mut self) -> Result<(), CaptureError>;
    fn capture(&mut self) -> Result<CapturedImage, CaptureError>;
    fn release(&mut self);
}

/// Grab a payment-proof image. Once access is granted the device is
/// released whether or not the capture succeeds.
pub fn capture_payment_proof(device: &mut dyn ImageCapture) -> Result<CapturedImage, CaptureError> {
    device.request_access()?;
    let result = device.capture().and_then(check_image);
    device.release();
    if let Err(e) = &result {
        debug!("payment proof capture failed: {e}");
    }
    result
}

pub(crate) fn check_image(image: CapturedImage) -> Result<CapturedImage, CaptureError> {
    if image.bytes.is_empty() {
        return Err(CaptureError::EmptyImage);
    }
    if image.bytes.len() > MAX_PAYMENT_PROOF_BYTES {
        return Err(CaptureError::TooLarge(image.bytes.len()));
    }
    Ok(image)
}
