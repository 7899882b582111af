//! Verifies that every reference in a technology resolves before it is exported.

use std::collections::HashSet;
use std::fmt::Display;

use crate::deps::arcstr::{self, ArcStr};
use crate::layers::LayerKey;
use crate::log::Log;
use crate::primitive::{LayerShape, Primitive};
use crate::tech::Tech;
use crate::validation::ValidatorOutput;

/// Validates a technology.
pub fn validate_tech(tech: &Tech) -> TechValidatorOutput {
    TechValidator { tech }.validate()
}

pub struct TechValidator<'a> {
    tech: &'a Tech,
}

pub type TechValidatorOutput = ValidatorOutput<Warning, Error>;

/// The location of a diagnostic.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Location {
    Layer(ArcStr),
    Primitive(ArcStr),
    Port { primitive: ArcStr, port: ArcStr },
    NodeLayer { primitive: ArcStr, index: usize },
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Layer(name) => write!(f, "layer {name}"),
            Self::Primitive(name) => write!(f, "primitive {name}"),
            Self::Port { primitive, port } => write!(f, "primitive {primitive}, port {port}"),
            Self::NodeLayer { primitive, index } => {
                write!(f, "primitive {primitive}, node layer {index}")
            }
        }
    }
}

/// Data for a warning.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Warning {
    loc: Location,
    cause: WarningCause,
}

/// An enumeration of causes for a warning.
#[non_exhaustive]
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum WarningCause {
    /// A primitive without geometry.
    Empty,
    /// A signal layer whose arcs and pins will have zero width.
    MissingRules,
}

impl Warning {
    pub fn new(loc: Location, cause: WarningCause) -> Self {
        Self { loc, cause }
    }

    #[inline]
    pub fn cause(&self) -> &WarningCause {
        &self.cause
    }
}

impl Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.cause {
            WarningCause::Empty => write!(f, "primitive has no node layers: {}", self.loc),
            WarningCause::MissingRules => {
                write!(f, "signal layer has no design rules: {}", self.loc)
            }
        }
    }
}

impl Log for Warning {
    fn log(&self) {
        use crate::log::warn;
        warn!("{self}");
    }
}

/// Data for an error.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Error {
    loc: Location,
    cause: ErrorCause,
}

/// An enumeration of causes for an error.
#[non_exhaustive]
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum ErrorCause {
    /// A reference to a layer that is not registered.
    UnknownLayer(String),
    /// A node layer bound to a port number that does not exist.
    UnknownPort(usize),
    /// A port on a net number that does not exist.
    UnknownNet(usize),
    /// A cut array bound to a port.
    PortOnMultiCut,
    /// A primitive whose name is already taken by another primitive or pin node.
    DuplicateName,
}

impl Error {
    pub fn new(loc: Location, cause: ErrorCause) -> Self {
        Self { loc, cause }
    }

    #[inline]
    pub fn cause(&self) -> &ErrorCause {
        &self.cause
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            ErrorCause::UnknownLayer(key) => {
                write!(f, "reference to unregistered layer {key}: {}", self.loc)
            }
            ErrorCause::UnknownPort(port) => {
                write!(f, "reference to nonexistent port {port}: {}", self.loc)
            }
            ErrorCause::UnknownNet(net) => {
                write!(f, "reference to nonexistent net {net}: {}", self.loc)
            }
            ErrorCause::PortOnMultiCut => {
                write!(f, "cut arrays cannot belong to a port: {}", self.loc)
            }
            ErrorCause::DuplicateName => write!(f, "duplicate primitive name: {}", self.loc),
        }
    }
}

impl Log for Error {
    fn log(&self) {
        use crate::log::error;
        error!("{self}");
    }
}

impl<'a> TechValidator<'a> {
    fn validate(&self) -> TechValidatorOutput {
        let mut output = TechValidatorOutput::default();
        self.validate_layers(&mut output);
        self.validate_primitives(&mut output);
        output
    }

    fn check_layer(&self, key: LayerKey, loc: &Location, output: &mut TechValidatorOutput) {
        if !self.tech.layers().contains(key) {
            output.errors.push(Error::new(
                loc.clone(),
                ErrorCause::UnknownLayer(format!("{key:?}")),
            ));
        }
    }

    fn validate_layers(&self, output: &mut TechValidatorOutput) {
        for layer in self.tech.layers().iter() {
            let loc = Location::Layer(layer.name.clone());
            for other in layer.referenced_layers() {
                self.check_layer(other, &loc, output);
            }
            if layer.is_signal() && layer.rules.is_none() {
                output
                    .warnings
                    .push(Warning::new(loc, WarningCause::MissingRules));
            }
        }
    }

    fn validate_primitives(&self, output: &mut TechValidatorOutput) {
        let mut names: HashSet<ArcStr> = self
            .tech
            .layers()
            .iter()
            .filter(|layer| layer.is_signal())
            .map(|layer| arcstr::format!("{}-Pin", layer.name))
            .collect();

        for primitive in self.tech.primitives() {
            if !names.insert(primitive.name().clone()) {
                output.errors.push(Error::new(
                    Location::Primitive(primitive.name().clone()),
                    ErrorCause::DuplicateName,
                ));
            }
            self.validate_primitive(primitive, output);
        }
    }

    fn validate_primitive(&self, primitive: &Primitive, output: &mut TechValidatorOutput) {
        if primitive.layers().is_empty() {
            output.warnings.push(Warning::new(
                Location::Primitive(primitive.name().clone()),
                WarningCause::Empty,
            ));
        }

        for (index, layer) in primitive.layers().iter().enumerate() {
            let loc = Location::NodeLayer {
                primitive: primitive.name().clone(),
                index,
            };
            self.check_layer(layer.layer, &loc, output);
            if let Some(port) = layer.port {
                if matches!(layer.shape, LayerShape::MultiCut(_)) {
                    output
                        .errors
                        .push(Error::new(loc.clone(), ErrorCause::PortOnMultiCut));
                }
                if primitive.port(port).is_err() {
                    output
                        .errors
                        .push(Error::new(loc, ErrorCause::UnknownPort(port.index())));
                }
            }
        }

        for port in primitive.ports() {
            let loc = Location::Port {
                primitive: primitive.name().clone(),
                port: port.name.clone(),
            };
            for layer in port.layers.iter() {
                self.check_layer(*layer, &loc, output);
            }
            if primitive.net(port.net).is_err() {
                output
                    .errors
                    .push(Error::new(loc, ErrorCause::UnknownNet(port.net.index())));
            }
        }
    }
}
