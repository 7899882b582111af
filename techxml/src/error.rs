use std::fmt::{Debug, Display};
use std::path::PathBuf;

use thiserror::Error;

use crate::deps::arcstr::ArcStr;
use crate::export::error::ExportError;
use crate::layers::pattern::PatternError;
use crate::layers::GdsLayer;

pub type Result<T> = std::result::Result<T, TechError>;

pub struct TechError {
    pub(crate) source: ErrorSource,
    pub(crate) context: Vec<ErrorContext>,
}

impl TechError {
    pub fn source(&self) -> &ErrorSource {
        &self.source
    }

    /// Returns the contexts in which the error occurred, innermost first.
    pub fn context(&self) -> &[ErrorContext] {
        &self.context
    }
}

impl std::error::Error for TechError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl Display for TechError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Error:\n{}", self.source)?;
        if !self.context.is_empty() {
            writeln!(f, "\nError occurred:")?;
            for item in self.context.iter() {
                writeln!(f, "\twhile {}", item)?;
            }
        }
        Ok(())
    }
}

impl Debug for TechError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.source)?;
        if !self.context.is_empty() {
            writeln!(f, "\nError occurred:")?;
            for (i, item) in self.context.iter().enumerate() {
                writeln!(f, "\t{}: {:?}", i, item)?;
            }
        }
        Ok(())
    }
}

impl<T> From<T> for TechError
where
    T: Into<ErrorSource>,
{
    fn from(value: T) -> Self {
        Self {
            source: value.into(),
            context: Vec::new(),
        }
    }
}

impl TechError {
    pub fn new(source: impl Into<ErrorSource>) -> Self {
        Self {
            source: source.into(),
            context: Vec::new(),
        }
    }

    pub fn from_context(source: impl Into<ErrorSource>, ctx: impl Into<ErrorContext>) -> Self {
        Self {
            source: source.into(),
            context: vec![ctx.into()],
        }
    }

    pub fn with_context(mut self, ctx: impl Into<ErrorContext>) -> Self {
        self.context.push(ctx.into());
        self
    }

    #[inline]
    pub fn into_inner(self) -> ErrorSource {
        self.source
    }
}

#[inline]
pub fn with_err_context<T, E, C>(result: std::result::Result<T, E>, ctx: C) -> Result<T>
where
    C: FnOnce() -> ErrorContext,
    E: Into<TechError>,
{
    result.map_err(|err| err.into().with_context(ctx()))
}

#[derive(Debug, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorContext {
    RegisterLayer(ArcStr),
    BuildPrimitive(ArcStr),
    GenerateContact(ArcStr),
    LoadConfig,
    CreateFile(PathBuf),
    ReadFile(PathBuf),
    Task(ArcStr),
}

impl Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ErrorContext::*;
        match self {
            RegisterLayer(name) => write!(f, "registering layer {name}"),
            BuildPrimitive(name) => write!(f, "building primitive {name}"),
            GenerateContact(name) => write!(f, "generating contact {name}"),
            LoadConfig => write!(f, "loading process configuration"),
            CreateFile(path) => write!(f, "creating file {path:?}"),
            ReadFile(path) => write!(f, "reading file {path:?}"),
            Task(task) => write!(f, "{task}"),
        }
    }
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ErrorSource {
    #[error("GDS layer {gds} is already associated with layer {existing}; cannot associate it with {requested}")]
    DuplicateGdsMapping {
        gds: GdsLayer,
        existing: ArcStr,
        requested: ArcStr,
    },

    #[error("no such layer: {0}")]
    LayerNotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(ArcStr),

    #[error("invalid fill pattern: {0}")]
    InvalidPattern(#[from] PatternError),

    #[error("not implemented: {0}")]
    NotImplemented(ArcStr),

    #[error("no such primitive: {0}")]
    PrimitiveNotFound(String),

    #[error("no such primitive group: {0}")]
    GroupNotFound(String),

    #[error("no such port: {0}")]
    PortNotFound(usize),

    #[error("no such net: {0}")]
    NetNotFound(usize),

    #[error("layer {0} has no design rules")]
    MissingRules(ArcStr),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("invalid technology (enable logging for details): {0}")]
    InvalidTech(String),

    #[error("error while exporting technology: {0}")]
    Export(#[from] ExportError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("error parsing TOML: {0}")]
    TomlParsing(#[from] toml::de::Error),
}
