#![cfg_attr(not(test), no_std)]

use core::fmt;

use strum::EnumCount;

/// The status code type reported by the OS-abstraction layer.
///
/// Similar to [`std::io::ErrorKind`], restricted to the conditions the
/// abstraction layer itself can produce. Each variant has a stable positive
/// `i32` code, so a status can travel through plain-integer channels (object
/// tables, instrumentation stores) and be validated on the way back out with
/// [`OsError::try_from_i32`].
///
/// [`std::io::ErrorKind`]: https://doc.rust-lang.org/std/io/enum.ErrorKind.html
#[repr(i32)]
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, EnumCount)]
pub enum OsError {
    /// An entity already exists, often an object registered under a name.
    AlreadyExists = 1,
    /// Bad internal state, typically a subsystem used before initialization.
    BadState,
    /// Invalid executable format.
    InvalidExecutable,
    /// Invalid parameter/argument.
    InvalidInput,
    /// Input/output error.
    Io,
    /// An object name or path exceeds the configured limit.
    NameTooLong,
    /// All slots of a fixed-capacity object table are occupied.
    NoFreeSlots,
    /// Not enough space/cannot allocate memory.
    NoMemory,
    /// The requested entity is not found.
    NotFound,
    /// Operation not permitted.
    OperationNotPermitted,
    /// Result out of range.
    OutOfRange,
    /// The operation lacked the necessary privileges to complete.
    PermissionDenied,
    /// Device or resource is busy.
    ResourceBusy,
    /// The operation's timeout expired, causing it to be canceled.
    TimedOut,
    /// This operation is unsupported or unimplemented.
    Unsupported,
}

impl OsError {
    /// Returns the error description.
    pub fn as_str(&self) -> &'static str {
        use OsError::*;
        match *self {
            AlreadyExists => "Entity already exists",
            BadState => "Bad internal state",
            InvalidExecutable => "Invalid executable format",
            InvalidInput => "Invalid input parameter",
            Io => "I/O error",
            NameTooLong => "Object name too long",
            NoFreeSlots => "No free table slots",
            NoMemory => "Out of memory",
            NotFound => "Entity not found",
            OperationNotPermitted => "Operation not permitted",
            OutOfRange => "Result out of range",
            PermissionDenied => "Permission denied",
            ResourceBusy => "Resource busy",
            TimedOut => "Timed out",
            Unsupported => "Operation not supported",
        }
    }

    /// Returns the error code value in `i32`.
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Validates a raw code and converts it back into an [`OsError`].
    ///
    /// # Examples
    ///
    /// ```
    /// # use oserr::OsError;
    /// let code = OsError::NotFound.code();
    /// assert_eq!(OsError::try_from_i32(code), Ok(OsError::NotFound));
    /// assert_eq!(OsError::try_from_i32(0), Err(0));
    /// ```
    pub fn try_from_i32(value: i32) -> Result<Self, i32> {
        Self::try_from(value)
    }
}

impl TryFrom<i32> for OsError {
    type Error = i32;

    #[inline]
    fn try_from(value: i32) -> Result<Self, Self::Error> {
        if value > 0 && value <= OsError::COUNT as i32 {
            Ok(unsafe { core::mem::transmute::<i32, OsError>(value) })
        } else {
            Err(value)
        }
    }
}

impl fmt::Display for OsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A specialized [`Result`] type with [`OsError`] as the error type.
pub type OsResult<T = ()> = Result<T, OsError>;

/// Convenience method to construct an [`OsError`] type while printing a
/// warning message.
///
/// # Examples
///
/// ```
/// # use oserr::{os_err_type, OsError};
/// #
/// // Also print "[AlreadyExists]" if the `log` crate is enabled.
/// assert_eq!(os_err_type!(AlreadyExists), OsError::AlreadyExists);
///
/// // Also print "[BadState] subsystem not initialized" if the `log` crate
/// // is enabled.
/// assert_eq!(
///     os_err_type!(BadState, "subsystem not initialized"),
///     OsError::BadState,
/// );
/// ```
#[macro_export]
macro_rules! os_err_type {
    ($err:ident) => {{
        let err = $crate::OsError::$err;
        $crate::__priv::warn!("[{:?}]", err);
        err
    }};
    ($err:ident, $msg:expr) => {{
        let err = $crate::OsError::$err;
        $crate::__priv::warn!("[{:?}] {}", err, $msg);
        err
    }};
}

/// Convenience method to construct an [`Err(OsError)`] type while printing a
/// warning message.
///
/// # Examples
///
/// ```
/// # use oserr::{os_err, OsError, OsResult};
/// #
/// // Also print "[NotFound]" if the `log` crate is enabled.
/// assert_eq!(os_err!(NotFound), OsResult::<()>::Err(OsError::NotFound));
///
/// // Also print "[InvalidInput] name is empty" if the `log` crate is enabled.
/// assert_eq!(
///     os_err!(InvalidInput, "name is empty"),
///     OsResult::<()>::Err(OsError::InvalidInput),
/// );
/// ```
/// [`Err(OsError)`]: Err
#[macro_export]
macro_rules! os_err {
    ($err:ident) => {
        Err($crate::os_err_type!($err))
    };
    ($err:ident, $msg:expr) => {
        Err($crate::os_err_type!($err, $msg))
    };
}

/// Throws an error of type [`OsError`] with the given kind, optionally with a
/// message.
#[macro_export]
macro_rules! os_bail {
    ($($t:tt)*) => {
        return $crate::os_err!($($t)*);
    };
}

/// Ensure a condition is true. If it is not, return from the function
/// with an error.
///
/// ## Examples
///
/// ```rust
/// # use oserr::{ensure, os_err, OsResult};
///
/// fn example(slot: usize) -> OsResult {
///     ensure!(slot < 32, os_err!(OutOfRange));
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! ensure {
    ($predicate:expr, $context_selector:expr $(,)?) => {
        if !$predicate {
            return $context_selector;
        }
    };
}

#[doc(hidden)]
pub mod __priv {
    pub use log::warn;
}
