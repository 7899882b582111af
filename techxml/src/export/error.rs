//! Export error types.

use crate::deps::arcstr::ArcStr;

/// A helper trait for exporter tree-walkers.
///
/// Implementers report their current position in the technology upon failure
/// by injecting it in the required `err` method.
pub trait ErrorHelper {
    type Error;

    /// Creates and returns a [Self::Error] value.
    fn err(&self, msg: impl Into<String>) -> Self::Error;
    /// Returns the given failure message.
    fn fail<T>(&self, msg: impl Into<String>) -> Result<T, Self::Error> {
        Err(self.err(msg))
    }
    /// Unwraps the [`Option`] `opt` if it is [`Some`] and returns an error if not.
    fn unwrap<T>(&self, opt: Option<T>, msg: impl Into<String>) -> Result<T, Self::Error> {
        match opt {
            Some(val) => Ok(val),
            None => self.fail(msg),
        }
    }
    /// Asserts boolean condition `b`. Returns through `self.fail` if not.
    fn assert(&self, b: bool, msg: impl Into<String>) -> Result<(), Self::Error> {
        match b {
            true => Ok(()),
            false => self.fail(msg),
        }
    }
    /// Unwraps the [`Result`] `res`. Returns through our failure method if it is [`Err`].
    ///
    /// The default implementation discards the underlying error.
    fn ok<T, E>(&self, res: Result<T, E>, msg: impl Into<String>) -> Result<T, Self::Error>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        match res {
            Ok(val) => Ok(val),
            Err(_) => self.fail(msg),
        }
    }
}

/// The part of a technology being exported.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ExportContext {
    Technology(ArcStr),
    Layers,
    Layer(ArcStr),
    Arcs,
    Pins,
    PrimitiveGroup(usize),
    Primitive(ArcStr),
    Foundry,
    Menu,
}

/// An error exporting a technology.
pub enum ExportError {
    /// An inconsistency found while walking the technology.
    Export {
        message: String,
        stack: Vec<ExportContext>,
    },
    /// A failure of an underlying writer or formatter.
    Conversion {
        message: String,
        err: Box<dyn std::error::Error + Send + Sync>,
        stack: Vec<ExportContext>,
    },
}

impl ExportError {
    /// The export backtrace, outermost first.
    pub fn stack(&self) -> &[ExportContext] {
        match self {
            Self::Export { stack, .. } | Self::Conversion { stack, .. } => stack,
        }
    }
}

impl std::fmt::Debug for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ExportError::Export { message, stack } => {
                write!(f, "Export Error: \n - {message} \n - {stack:?}")
            }
            ExportError::Conversion {
                message,
                err,
                stack,
            } => write!(
                f,
                "Conversion Error: \n - {message} \n - {err} \n - {stack:?}"
            ),
        }
    }
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Conversion { err, .. } => Some(&**err),
            _ => None,
        }
    }
}

/// The [`ExportError`] result type.
pub type ExportResult<T> = Result<T, ExportError>;
