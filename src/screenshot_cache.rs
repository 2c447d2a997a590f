//! Time-bounded reuse of captured frames
//!
//! A frame younger than the TTL is handed out again instead of paying for
//! another `screencap` round trip.

use crate::adb::{AdbResult, DeviceActions};
use image::DynamicImage;
use std::time::{Duration, Instant};

pub const DEFAULT_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
pub struct CachedFrame {
    pub image: DynamicImage,
    pub captured_at: Instant,
}

pub struct ScreenshotCache<P: DeviceActions> {
    device: P,
    ttl: Duration,
    frame: Option<CachedFrame>,
    capture_count: u64,
}

impl<P: DeviceActions> ScreenshotCache<P> {
    pub fn new(device: P) -> Self {
        Self::with_ttl(device, DEFAULT_TTL)
    }

    pub fn with_ttl(device: P, ttl: Duration) -> Self {
        Self {
            device,
            ttl,
            frame: None,
            capture_count: 0,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached frame, capturing a new one when forced, empty, or
    /// older than the TTL. A failed capture leaves the previous frame in place.
    pub fn get_frame(&mut self, force_refresh: bool) -> AdbResult<&DynamicImage> {
        let frame = match self.frame.take() {
            Some(frame) if !force_refresh && frame.captured_at.elapsed() <= self.ttl => {
                log::debug!("Using cached screenshot");
                frame
            }
            previous => match self.device.capture_screen() {
                Ok(image) => {
                    self.capture_count += 1;
                    log::debug!(
                        "Screenshot refreshed (forced: {force_refresh}, capture #{})",
                        self.capture_count
                    );
                    CachedFrame {
                        image,
                        captured_at: Instant::now(),
                    }
                }
                Err(e) => {
                    self.frame = previous;
                    return Err(e);
                }
            },
        };
        Ok(&self.frame.insert(frame).image)
    }

    /// Drop the cached frame so the next `get_frame` captures.
    pub fn invalidate(&mut self) {
        self.frame = None;
    }

    pub fn last_capture_age(&self) -> Option<Duration> {
        self.frame.as_ref().map(|f| f.captured_at.elapsed())
    }

    /// Number of successful captures performed through this cache.
    pub fn capture_count(&self) -> u64 {
        self.capture_count
    }

    pub fn device(&self) -> &P {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut P {
        &mut self.device
    }

    pub fn into_device(self) -> P {
        self.device
    }
}
