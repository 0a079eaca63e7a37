use crate::{
    Backend,
    config::{Config, WhisperDevice},
    tool,
};

use std::{
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use koe_core::{DependencyPreflight, KoeError, KoeResult};
use tracing::{debug, instrument};

/// Checks tools, model and directories before any shared state is touched.
pub struct Preflight<'a> {
    backend: Backend,
    config: &'a Config,
    cuda_compiled: bool,
    find_tool: fn(&str) -> Option<PathBuf>,
}

impl<'a> Preflight<'a> {
    /// Preflight against the real `PATH` and this build's features.
    pub fn new(backend: Backend, config: &'a Config) -> Self {
        Self {
            backend,
            config,
            cuda_compiled: cfg!(feature = "cuda"),
            find_tool: tool::find_on_path,
        }
    }

    /// Overrides tool lookup and the CUDA build flag.
    #[cfg(test)]
    pub(crate) fn with_environment(
        mut self,
        find_tool: fn(&str) -> Option<PathBuf>,
        cuda_compiled: bool,
    ) -> Self {
        self.find_tool = find_tool;
        self.cuda_compiled = cuda_compiled;
        self
    }

    #[track_caller]
    fn check_tools(&self) -> KoeResult<()> {
        for &required in self.backend.required_tools() {
            if (self.find_tool)(required).is_none() {
                return Err(missing(
                    format!("required tool is missing: {}", required),
                    required,
                ));
            }
        }

        let paste_tools = self.backend.paste_tools();
        if !paste_tools.is_empty() && paste_tools.iter().all(|t| (self.find_tool)(t).is_none()) {
            return Err(missing(
                format!("{} is required for {} paste", paste_tools.join(" or "), self.backend),
                paste_tools[0],
            ));
        }

        Ok(())
    }

    #[track_caller]
    fn check_whisper(&self) -> KoeResult<()> {
        let whisper = &self.config.whisper;

        if !whisper.model_path.is_file() {
            return Err(missing(
                format!("whisper model not found at {}", whisper.model_path.display()),
                "whisper_model",
            ));
        }

        if whisper.device == WhisperDevice::Cuda && !self.cuda_compiled {
            return Err(missing(
                "whisper device is cuda but koe was built without the cuda feature; set whisper.device = \"cpu\"".to_string(),
                "whisper_device",
            ));
        }

        Ok(())
    }

    #[track_caller]
    fn check_directories(&self) -> KoeResult<()> {
        let paths = &self.config.paths;

        if !is_writable_dir(&paths.temp_dir) {
            return Err(missing(
                format!("temp directory is not writable: {}", paths.temp_dir.display()),
                "temp_dir",
            ));
        }

        let lock_parent = paths
            .lock_file
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        if !is_writable_dir(lock_parent) {
            return Err(missing(
                format!("lock directory is not writable: {}", lock_parent.display()),
                "lock_file_path",
            ));
        }

        Ok(())
    }
}

impl DependencyPreflight for Preflight<'_> {
    #[track_caller]
    #[instrument(skip(self), fields(backend = %self.backend))]
    fn check(&self) -> KoeResult<()> {
        self.check_tools()?;
        self.check_whisper()?;
        self.check_directories()?;

        debug!("Preflight passed");
        Ok(())
    }
}

/// Writability probed by creating and dropping a scratch file.
pub(crate) fn is_writable_dir(dir: &Path) -> bool {
    tempfile::Builder::new()
        .prefix(".koe-probe-")
        .tempfile_in(dir)
        .is_ok()
}

#[track_caller]
fn missing(message: String, missing_tool: &str) -> KoeError {
    KoeError::Dependency {
        message,
        missing_tool: missing_tool.to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}
