use std::{error, fmt};

use crate::device::DeviceError;

#[derive(Debug)]
pub enum Error {
    /// A hardware device failed.
    Device(DeviceError),
    /// The workspace is locked by another instance.
    WorkspaceInUse,
    /// An I/O error outside a device.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Device(e) => write!(f, "{}", e),
            Error::WorkspaceInUse => write!(f, "workspace is in use by another instance"),
            Error::Io(e) => write!(f, "{}", e),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        None
    }
}

impl From<DeviceError> for Error {
    fn from(value: DeviceError) -> Self {
        Error::Device(value)
    }
}
