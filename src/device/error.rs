use std::error;

pub type Result<T> = std::result::Result<T, DeviceError>;

#[derive(Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The device is not available.
    ///
    /// This could indicate that the device is in use by another process or is
    /// not connected to the host.
    NoSuchDevice(std::path::PathBuf),

    /// One or multiple parameters were incorrect.
    InvalidInput,

    /// An external command exited with a failure status.
    CommandFailed(Option<i32>),

    /// An I/O error occured.
    ///
    /// The type of I/O error is determined by the inner `io::ErrorKind`.
    Io(std::io::ErrorKind),
}

#[derive(Debug)]
pub struct DeviceError {
    /// Device name.
    pub device: String,
    /// Error kind.
    pub kind: ErrorKind,
}

impl DeviceError {
    pub(crate) fn no_such_device(device: String, path: &std::path::Path) -> Self {
        Self {
            device,
            kind: ErrorKind::NoSuchDevice(path.to_path_buf()),
        }
    }

    pub(crate) fn invalid_input(device: String) -> Self {
        Self {
            device,
            kind: ErrorKind::InvalidInput,
        }
    }

    pub(crate) fn command_failed(device: String, code: Option<i32>) -> Self {
        Self {
            device,
            kind: ErrorKind::CommandFailed(code),
        }
    }

    pub(crate) fn from_io(device: String, error: std::io::Error) -> Self {
        Self {
            device,
            kind: ErrorKind::Io(error.kind()),
        }
    }
}

impl std::fmt::Display for DeviceError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::result::Result<(), std::fmt::Error> {
        match &self.kind {
            ErrorKind::NoSuchDevice(path) => {
                write!(
                    f,
                    "{}: no such device: {}",
                    self.device,
                    path.to_string_lossy()
                )
            }
            ErrorKind::InvalidInput => write!(f, "{}: invalid device parameters", self.device),
            ErrorKind::CommandFailed(Some(code)) => {
                write!(f, "{}: command exited with status {}", self.device, code)
            }
            ErrorKind::CommandFailed(None) => {
                write!(f, "{}: command terminated by signal", self.device)
            }
            ErrorKind::Io(e) => write!(f, "{}: io error: {:?}", self.device, e),
        }
    }
}

impl error::Error for DeviceError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        None
    }
}
