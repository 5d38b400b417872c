//! Error taxonomy shared by every kiln crate.
//!
//! Drivers report failures as negative status codes.
//! `ErrorKind` decodes them and sorts them into one of three classes.

use std::{borrow::Cow, fmt};

/// Class of the error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Bad sizes, mismatched dimensionality, bad flag combination.
    /// Always reported by the call that made the mistake.
    InvalidArgument,

    /// Use of a released context, queue, memory object or event.
    ResourceState,

    /// Failure reported by the device after the command was admitted.
    DeviceExecution,
}

macro_rules! error_kinds {
    ($($kind:ident = $code:literal, $class:ident, $text:literal;)*) => {
        /// Decoded driver status.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum ErrorKind {
            $(
                #[doc = $text]
                $kind,
            )*
            /// Negative status this crate doesn't know about.
            Other(i32),
        }

        impl ErrorKind {
            /// Negative driver status code of this kind.
            pub fn code(&self) -> i32 {
                match *self {
                    $(ErrorKind::$kind => $code,)*
                    ErrorKind::Other(code) => code,
                }
            }

            /// Decode driver status.
            /// Returns `None` for non-negative codes as they are not errors.
            pub fn from_code(code: i32) -> Option<Self> {
                match code {
                    $($code => Some(ErrorKind::$kind),)*
                    code if code < 0 => Some(ErrorKind::Other(code)),
                    _ => None,
                }
            }

            /// Class of the error.
            pub fn class(&self) -> ErrorClass {
                match *self {
                    $(ErrorKind::$kind => ErrorClass::$class,)*
                    ErrorKind::Other(_) => ErrorClass::DeviceExecution,
                }
            }

            fn text(&self) -> &'static str {
                match *self {
                    $(ErrorKind::$kind => $text,)*
                    ErrorKind::Other(_) => "Unknown driver error",
                }
            }
        }
    };
}

error_kinds! {
    DeviceNotFound = -1, ResourceState, "Device not found";
    MemObjectAllocationFailure = -4, DeviceExecution, "Memory object allocation failure";
    OutOfResources = -5, DeviceExecution, "Out of device resources";
    OutOfHostMemory = -6, DeviceExecution, "Out of host memory";
    ProfilingInfoNotAvailable = -7, ResourceState, "Profiling info not available";
    MemCopyOverlap = -8, InvalidArgument, "Source and destination of the copy overlap";
    ImageFormatMismatch = -9, InvalidArgument, "Image formats do not match";
    ImageFormatNotSupported = -10, InvalidArgument, "Image format is not supported";
    BuildProgramFailure = -11, DeviceExecution, "Program build failure";
    MapFailure = -12, DeviceExecution, "Map failure";
    ExecStatusErrorForEventsInWaitList = -14, DeviceExecution, "Event in the wait list has failed";
    InvalidValue = -30, InvalidArgument, "Invalid value";
    InvalidDevice = -33, InvalidArgument, "Invalid device";
    InvalidContext = -34, ResourceState, "Invalid context";
    InvalidQueueProperties = -35, InvalidArgument, "Invalid queue properties";
    InvalidCommandQueue = -36, ResourceState, "Invalid command queue";
    InvalidHostPtr = -37, InvalidArgument, "Invalid host pointer";
    InvalidMemObject = -38, ResourceState, "Invalid memory object";
    InvalidImageSize = -40, InvalidArgument, "Invalid image size";
    InvalidBuildOptions = -43, InvalidArgument, "Invalid build options";
    InvalidProgramExecutable = -45, ResourceState, "Invalid program executable";
    InvalidKernelName = -46, InvalidArgument, "Invalid kernel name";
    InvalidKernel = -48, ResourceState, "Invalid kernel";
    InvalidArgIndex = -49, InvalidArgument, "Invalid kernel argument index";
    InvalidArgValue = -50, InvalidArgument, "Invalid kernel argument value";
    InvalidArgSize = -51, InvalidArgument, "Invalid kernel argument size";
    InvalidKernelArgs = -52, InvalidArgument, "Kernel arguments are not set";
    InvalidWorkDimension = -53, InvalidArgument, "Invalid work dimension";
    InvalidWorkGroupSize = -54, InvalidArgument, "Invalid work group size";
    InvalidWorkItemSize = -55, InvalidArgument, "Invalid work item size";
    InvalidGlobalOffset = -56, InvalidArgument, "Invalid global offset";
    InvalidEventWaitList = -57, InvalidArgument, "Invalid event wait list";
    InvalidEvent = -58, ResourceState, "Invalid event";
    InvalidOperation = -59, InvalidArgument, "Invalid operation";
    InvalidBufferSize = -61, InvalidArgument, "Invalid buffer size";
    InvalidGlobalWorkSize = -63, InvalidArgument, "Invalid global work size";
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{} ({})", self.text(), self.code())
    }
}

/// Error returned by kiln operations.
#[derive(Clone, Debug, PartialEq, Eq, failure::Fail)]
pub struct Error {
    kind: ErrorKind,
    message: Cow<'static, str>,
}

impl Error {
    /// Create error of specified kind with a message.
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Error {
            kind,
            message: message.into(),
        }
    }

    /// Decoded driver status.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Class of the error.
    pub fn class(&self) -> ErrorClass {
        self.kind.class()
    }

    /// Additional context, may be empty.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error {
            kind,
            message: Cow::Borrowed(""),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(fmt, "{}", self.kind)
        } else {
            write!(fmt, "{}: {}", self.kind, self.message)
        }
    }
}

/// Program build failed.
#[derive(Clone, Debug, PartialEq, Eq, failure::Fail)]
#[fail(display = "{}\n{}", error, log)]
pub struct BuildError {
    /// Decoded status.
    pub error: Error,

    /// Build log produced by the compiler.
    pub log: String,
}

impl From<Error> for BuildError {
    fn from(error: Error) -> Self {
        BuildError {
            error,
            log: String::new(),
        }
    }
}

impl From<BuildError> for Error {
    fn from(error: BuildError) -> Self {
        error.error
    }
}
