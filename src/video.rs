// src/video.rs - Camera capture for the live view
use anyhow::{Context, Result};
use image::{DynamicImage, RgbImage};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution};
use nokhwa::Camera;
use tracing::{debug, info};

pub struct CameraSource {
    camera: Camera,
}

impl CameraSource {
    pub fn open(index: u32) -> Result<Self> {
        debug!("Opening camera index {}", index);

        let format = CameraFormat::new(Resolution::new(1280, 720), FrameFormat::MJPEG, 30);
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(format));

        let camera = Camera::new(CameraIndex::Index(index), requested)
            .map_err(|e| anyhow::anyhow!("Failed to open camera: {}", e))?;

        info!("Camera {} opened: {}", index, camera.info().human_name());
        Ok(Self { camera })
    }

    pub fn read_frame(&mut self) -> Result<DynamicImage> {
        if !self.camera.is_stream_open() {
            self.camera
                .open_stream()
                .map_err(|e| anyhow::anyhow!("Failed to open camera stream: {}", e))?;
        }

        let frame = self
            .camera
            .frame()
            .map_err(|e| anyhow::anyhow!("Failed to capture frame: {}", e))?;
        let decoded = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| anyhow::anyhow!("Failed to decode frame: {}", e))?;

        let (width, height) = (decoded.width(), decoded.height());
        let img = RgbImage::from_raw(width, height, decoded.into_raw())
            .context("Failed to create image buffer")?;
        Ok(DynamicImage::ImageRgb8(img))
    }

    pub fn resolution(&self) -> (u32, u32) {
        let resolution = self.camera.resolution();
        (resolution.width(), resolution.height())
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        let _ = self.camera.stop_stream();
    }
}

/// Names of the cameras the platform backend can see
pub fn list_cameras() -> Vec<String> {
    match nokhwa::query(nokhwa::utils::ApiBackend::Auto) {
        Ok(cameras) => cameras.iter().map(|c| c.human_name()).collect(),
        Err(e) => {
            tracing::warn!("Failed to query cameras: {}", e);
            Vec::new()
        }
    }
}
