use crate::{KoeError, KoeResult};

use std::{panic::Location, thread, time::Duration};

use cpal::{
    Device, SampleFormat, Stream, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument};

/// Receives each incoming buffer as mono `f32` samples. The slice is only valid
/// for the duration of the call.
pub type BufferCallback = Box<dyn FnMut(&[f32]) + Send + 'static>;

/// Receives asynchronous driver errors (device unplugged, stream invalidated).
pub type ErrorCallback = Box<dyn FnMut(String) + Send + 'static>;

/// Audio input driver.
pub trait AudioSource {
    /// Opens and starts an input stream that invokes `on_buffer` for every buffer.
    ///
    /// # Errors
    ///
    /// [`KoeError::Audio`] if the stream cannot be opened or started.
    fn start(&self, on_buffer: BufferCallback, on_error: ErrorCallback)
    -> KoeResult<Box<dyn CaptureStream>>;

    /// Sample rate of the buffers delivered to `on_buffer`.
    fn sample_rate(&self) -> u32;

    /// Name of the input device, when known.
    fn device_name(&self) -> Option<String>;
}

/// A running input stream.
pub trait CaptureStream {
    /// Closes the stream. After this returns no callback runs again.
    fn close(self: Box<Self>);
}

/// Microphone input through the system's default `cpal` host.
pub struct CpalSource {
    device: Device,
    device_name: Option<String>,
    config: StreamConfig,
}

impl CpalSource {
    /// Opens the named input device, or the default one when `selected_device` is `None`.
    ///
    /// # Errors
    ///
    /// [`KoeError::Audio`] if no matching input device exists or its
    /// configuration cannot be read.
    #[track_caller]
    #[instrument]
    pub fn new(selected_device: Option<&str>) -> KoeResult<Self> {
        let host = cpal::default_host();

        let device = match selected_device {
            Some(wanted) => host
                .input_devices()
                .map_err(|e| KoeError::Audio {
                    message: format!("microphone unavailable: {}", e),
                    device: Some(wanted.to_string()),
                    location: ErrorLocation::from(Location::caller()),
                })?
                .find(|d| device_name(d).as_deref() == Some(wanted))
                .ok_or_else(|| KoeError::Audio {
                    message: format!("input device not found: {}", wanted),
                    device: Some(wanted.to_string()),
                    location: ErrorLocation::from(Location::caller()),
                })?,
            None => host
                .default_input_device()
                .ok_or_else(|| KoeError::Audio {
                    message: "microphone unavailable: no input device found".to_string(),
                    device: None,
                    location: ErrorLocation::from(Location::caller()),
                })?,
        };

        let name = device_name(&device);

        let config = device
            .default_input_config()
            .map_err(|e| KoeError::Audio {
                message: format!("microphone unavailable: failed to get config: {}", e),
                device: name.clone(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!(
            device = ?name,
            sample_rate = config.sample_rate(),
            channels = config.channels(),
            "Input device opened"
        );

        Ok(Self {
            device,
            device_name: name,
            config: config.into(),
        })
    }

    /// Switches to an `f32` stream with the given rate and channel count when
    /// the device supports one; otherwise keeps the device default.
    #[instrument(skip(self), fields(device = ?self.device_name))]
    pub fn with_preferred_format(mut self, sample_rate: u32, channels: u16) -> Self {
        let supported = match self.device.supported_input_configs() {
            Ok(configs) => configs
                .filter(|range| range.sample_format() == SampleFormat::F32)
                .filter(|range| range.channels() == channels)
                .find(|range| {
                    range.min_sample_rate() <= sample_rate && sample_rate <= range.max_sample_rate()
                }),
            Err(e) => {
                debug!(error = %e, "Could not list supported input configs");
                None
            }
        };

        match supported {
            Some(range) => {
                self.config = range.with_sample_rate(sample_rate).into();
                debug!(sample_rate, channels, "Using preferred input format");
            }
            None => debug!(
                sample_rate,
                channels,
                default_rate = self.config.sample_rate,
                "Preferred input format unsupported, keeping device default"
            ),
        }

        self
    }
}

impl AudioSource for CpalSource {
    #[track_caller]
    fn start(
        &self,
        mut on_buffer: BufferCallback,
        mut on_error: ErrorCallback,
    ) -> KoeResult<Box<dyn CaptureStream>> {
        let channels = usize::from(self.config.channels.max(1));

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if channels == 1 {
                        on_buffer(data);
                    } else {
                        let mono: Vec<f32> = data
                            .chunks(channels)
                            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
                            .collect();
                        on_buffer(&mono);
                    }
                },
                move |err| {
                    error!("Audio stream error: {}", err);
                    on_error(err.to_string());
                },
                None,
            )
            .map_err(|e| KoeError::Audio {
                message: format!("microphone unavailable: failed to build stream: {}", e),
                device: self.device_name.clone(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        stream.play().map_err(|e| KoeError::Audio {
            message: format!("microphone unavailable: failed to start stream: {}", e),
            device: self.device_name.clone(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        debug!(channels, "Input stream started");

        Ok(Box::new(CpalStream { stream }))
    }

    fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    fn device_name(&self) -> Option<String> {
        self.device_name.clone()
    }
}

struct CpalStream {
    stream: Stream,
}

impl CaptureStream for CpalStream {
    fn close(self: Box<Self>) {
        drop(self.stream);
        // Some backends return from drop before the final callback finishes.
        thread::sleep(Duration::from_millis(5));
        debug!("Input stream closed");
    }
}

#[allow(deprecated)]
fn device_name(device: &Device) -> Option<String> {
    device.name().ok()
}
