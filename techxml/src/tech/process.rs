use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::deps::arcstr::{self, ArcStr};
use crate::error::{ErrorSource, Result};

/// Technology-level facts about a manufacturing process.
pub trait Process {
    fn name(&self) -> ArcStr;

    /// A human-readable description of the process.
    fn description(&self) -> ArcStr {
        self.name()
    }

    /// The name of the foundry rule set.
    fn foundry(&self) -> ArcStr;

    /// The foundry-recommended supply voltage, in volts.
    fn vdd(&self) -> f64;

    /// The manufacturing grid, in lambda.
    fn grid(&self) -> f64;

    /// The number of metal layers plus the number of poly layers.
    fn num_layers_poly_or_metal(&self) -> i32;

    /// The ordinal of the lowest metal layer.
    fn lowest_metal_ordinal(&self) -> i32 {
        1
    }

    /// Comment lines placed at the top of exported documents.
    fn header_comments(&self) -> Vec<ArcStr> {
        Vec::new()
    }

    /// Wire capacitance of the layer with ordinal `layer`, in femtofarads per nanometer.
    #[allow(unused)]
    fn capacitance_per_nm(&self, layer: i32) -> Result<f64> {
        Err(ErrorSource::NotImplemented(arcstr::literal!("capacitance per nm")).into())
    }

    /// Sheet resistance of the layer with ordinal `layer`, in ohms per square.
    #[allow(unused)]
    fn resistance_per_square(&self, layer: i32) -> Result<f64> {
        Err(ErrorSource::NotImplemented(arcstr::literal!("resistance per square")).into())
    }

    /// Gate capacitance of a unit-size NMOS transistor, in femtofarads.
    fn nfet_gate_capacitance_x1(&self) -> Result<f64> {
        Err(ErrorSource::NotImplemented(arcstr::literal!("nfet gate capacitance")).into())
    }

    /// Drain capacitance of a unit-size NMOS transistor, in femtofarads.
    fn nfet_drain_capacitance_x1(&self) -> Result<f64> {
        Err(ErrorSource::NotImplemented(arcstr::literal!("nfet drain capacitance")).into())
    }
}

fn one() -> i32 {
    1
}

/// A [`Process`] described entirely by data.
///
/// Per-layer tables are indexed from the lowest poly layer, whose ordinal is
/// one less than the lowest metal ordinal.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(pattern = "owned")]
pub struct ProcessInfo {
    #[builder(setter(into))]
    pub name: ArcStr,
    #[builder(setter(into, strip_option), default)]
    #[serde(default)]
    pub description: Option<ArcStr>,
    #[builder(setter(into))]
    pub foundry: ArcStr,
    pub vdd: f64,
    pub grid: f64,
    pub num_layers_poly_or_metal: i32,
    #[builder(default = "1")]
    #[serde(default = "one")]
    pub lowest_metal_ordinal: i32,
    #[builder(default)]
    #[serde(default)]
    pub header_comments: Vec<ArcStr>,
    #[builder(default)]
    #[serde(default)]
    pub capacitance_per_nm: Vec<f64>,
    #[builder(default)]
    #[serde(default)]
    pub resistance_per_square: Vec<f64>,
    #[builder(setter(strip_option), default)]
    #[serde(default)]
    pub nfet_gate_capacitance_x1: Option<f64>,
    #[builder(setter(strip_option), default)]
    #[serde(default)]
    pub nfet_drain_capacitance_x1: Option<f64>,
}

impl ProcessInfo {
    #[inline]
    pub fn builder() -> ProcessInfoBuilder {
        ProcessInfoBuilder::default()
    }

    fn lookup(&self, table: &[f64], layer: i32, what: &str) -> Result<f64> {
        let index = layer - (self.lowest_metal_ordinal - 1);
        usize::try_from(index)
            .ok()
            .and_then(|i| table.get(i).copied())
            .ok_or_else(|| {
                ErrorSource::NotImplemented(arcstr::format!("{what} of layer {layer}")).into()
            })
    }
}

impl Process for ProcessInfo {
    fn name(&self) -> ArcStr {
        self.name.clone()
    }

    fn description(&self) -> ArcStr {
        self.description.clone().unwrap_or_else(|| self.name.clone())
    }

    fn foundry(&self) -> ArcStr {
        self.foundry.clone()
    }

    fn vdd(&self) -> f64 {
        self.vdd
    }

    fn grid(&self) -> f64 {
        self.grid
    }

    fn num_layers_poly_or_metal(&self) -> i32 {
        self.num_layers_poly_or_metal
    }

    fn lowest_metal_ordinal(&self) -> i32 {
        self.lowest_metal_ordinal
    }

    fn header_comments(&self) -> Vec<ArcStr> {
        self.header_comments.clone()
    }

    fn capacitance_per_nm(&self, layer: i32) -> Result<f64> {
        self.lookup(&self.capacitance_per_nm, layer, "capacitance per nm")
    }

    fn resistance_per_square(&self, layer: i32) -> Result<f64> {
        self.lookup(&self.resistance_per_square, layer, "resistance per square")
    }

    fn nfet_gate_capacitance_x1(&self) -> Result<f64> {
        self.nfet_gate_capacitance_x1.ok_or_else(|| {
            ErrorSource::NotImplemented(arcstr::literal!("nfet gate capacitance")).into()
        })
    }

    fn nfet_drain_capacitance_x1(&self) -> Result<f64> {
        self.nfet_drain_capacitance_x1.ok_or_else(|| {
            ErrorSource::NotImplemented(arcstr::literal!("nfet drain capacitance")).into()
        })
    }
}
