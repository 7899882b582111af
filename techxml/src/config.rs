//! Process description files.
//!
//! A [`ProcessConfig`] carries the numeric tables of one process as data:
//! layers, design rules, inter-layer relationships and contact stack.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use techgeom::Dims;

use crate::deps::arcstr::ArcStr;
use crate::error::{with_err_context, ErrorContext, Result};
use crate::layers::pattern::PatternName;
use crate::layers::style::{Color, Outline, RenderingStyle};
use crate::layers::{GdsLayer, LayerParams, LayerRules};
use crate::log::info;
use crate::menu::MenuPalette;
use crate::primitive::via::{generate_contact_stack, ContactSpec, ParallelSide};
use crate::tech::process::ProcessInfo;
use crate::tech::Tech;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessConfig {
    pub process: ProcessInfo,
    #[serde(default)]
    pub layers: Vec<LayerConfig>,
    #[serde(default)]
    pub spacing: Vec<SpacingConfig>,
    #[serde(default)]
    pub unconnected_spacing: Vec<SpacingConfig>,
    #[serde(default)]
    pub forbidden: Vec<PairConfig>,
    #[serde(default)]
    pub connections: Vec<PairConfig>,
    #[serde(default)]
    pub contacts: Vec<ContactConfig>,
    #[serde(default)]
    pub menu: Option<MenuPalette>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub name: ArcStr,
    #[serde(default)]
    pub gds: Option<(i16, i16)>,
    #[serde(default)]
    pub pin: Option<(i16, i16)>,
    #[serde(default)]
    pub rules: Option<RulesConfig>,
    #[serde(default)]
    pub metal_number: Option<i32>,
    #[serde(default)]
    pub style: Option<StyleConfig>,
    #[serde(default)]
    pub description: ArcStr,
    #[serde(default)]
    pub res: Option<(i16, i16)>,
    #[serde(default)]
    pub dummy: Option<(i16, i16)>,
    #[serde(default)]
    pub block: Option<(i16, i16)>,
    #[serde(default)]
    pub height_3d: f64,
    #[serde(default)]
    pub thickness_3d: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulesConfig {
    pub min_width: f64,
    #[serde(default)]
    pub min_space: f64,
    #[serde(default)]
    pub min_area: f64,
    /// Zero or absent means unbounded.
    #[serde(default)]
    pub max_width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleConfig {
    pub pattern: PatternName,
    /// `NOPAT`, `PAT_S` or any other outline name; absent means `NOPAT`.
    #[serde(default)]
    pub outline: Option<ArcStr>,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpacingConfig {
    pub layer: ArcStr,
    pub other: ArcStr,
    pub distance: f64,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct PairConfig {
    pub layer: ArcStr,
    pub other: ArcStr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactConfig {
    pub name: ArcStr,
    pub cut: ArcStr,
    pub below: ArcStr,
    #[serde(default)]
    pub above: Option<ArcStr>,
    #[serde(default)]
    pub below_enclosure: Dims,
    #[serde(default)]
    pub above_enclosure: Dims,
    #[serde(default)]
    pub parallel: ParallelSide,
    #[serde(default)]
    pub marker: Option<ArcStr>,
    #[serde(default)]
    pub surrounds: Vec<SurroundConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurroundConfig {
    pub layer: ArcStr,
    pub enclosure: f64,
}

impl From<RulesConfig> for LayerRules {
    fn from(value: RulesConfig) -> Self {
        LayerRules::new(
            value.min_width,
            value.min_space,
            value.min_area,
            value.max_width,
        )
    }
}

impl From<&StyleConfig> for RenderingStyle {
    fn from(value: &StyleConfig) -> Self {
        let outline = match value.outline.as_deref() {
            None | Some("NOPAT") => Outline::None,
            Some("PAT_S") => Outline::Solid,
            Some(name) => Outline::Named(name.into()),
        };
        RenderingStyle::new(value.pattern.pattern(), outline, value.color)
    }
}

impl LayerConfig {
    fn params(&self) -> LayerParams {
        LayerParams {
            name: self.name.clone(),
            gds: self.gds.map(GdsLayer::from),
            pin: self.pin.map(GdsLayer::from),
            rules: self.rules.map(LayerRules::from),
            style: self.style.as_ref().map(RenderingStyle::from),
            description: self.description.clone(),
            res: self.res.map(GdsLayer::from),
            dummy: self.dummy.map(GdsLayer::from),
            block: self.block.map(GdsLayer::from),
            metal_number: self.metal_number,
        }
    }
}

impl ContactConfig {
    fn spec(&self, tech: &Tech) -> Result<ContactSpec> {
        Ok(ContactSpec {
            name: self.name.clone(),
            cut: tech.layer(&self.cut)?,
            below: tech.layer(&self.below)?,
            above: self.above.as_ref().map(|l| tech.layer(l)).transpose()?,
            below_enclosure: self.below_enclosure,
            above_enclosure: self.above_enclosure,
            parallel: self.parallel,
            marker: self.marker.as_ref().map(|l| tech.layer(l)).transpose()?,
            surrounds: self
                .surrounds
                .iter()
                .map(|s| Ok((tech.layer(&s.layer)?, s.enclosure)))
                .collect::<Result<Vec<_>>>()?,
        })
    }
}

impl ProcessConfig {
    pub fn from_toml(input: &str) -> Result<Self> {
        let value = toml::from_str(input)?;
        Ok(value)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let input = crate::io::read_to_string(path)?;
        Self::from_toml(&input)
    }

    /// Builds a populated technology: layers, relationships, contacts and menu.
    pub fn build(&self) -> Result<Tech> {
        let inner = || -> Result<Tech> {
            let mut tech = Tech::new(Arc::new(self.process.clone()));
            for layer in self.layers.iter() {
                let key = tech.register_layer(layer.params())?;
                tech.set_3d(key, layer.height_3d, layer.thickness_3d)?;
            }
            for rule in self.spacing.iter() {
                tech.add_spacing(tech.layer(&rule.layer)?, tech.layer(&rule.other)?, rule.distance)?;
            }
            for rule in self.unconnected_spacing.iter() {
                tech.add_unconnected_spacing(
                    tech.layer(&rule.layer)?,
                    tech.layer(&rule.other)?,
                    rule.distance,
                )?;
            }
            for pair in self.forbidden.iter() {
                tech.forbid(tech.layer(&pair.layer)?, tech.layer(&pair.other)?)?;
            }
            for pair in self.connections.iter() {
                tech.add_pure_layer_node_connection(
                    tech.layer(&pair.layer)?,
                    tech.layer(&pair.other)?,
                )?;
            }

            let specs = self
                .contacts
                .iter()
                .map(|contact| contact.spec(&tech))
                .collect::<Result<Vec<_>>>()?;
            generate_contact_stack(&mut tech, &specs)?;

            if let Some(menu) = &self.menu {
                tech.set_menu_palette(menu.clone());
            }

            info!(
                "loaded process {} ({} layers, {} primitives)",
                self.process.name,
                tech.layers().len(),
                tech.primitives().count()
            );
            Ok(tech)
        };
        with_err_context(inner(), || ErrorContext::LoadConfig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorSource;
    use crate::layers::pattern;

    const PROCESS: &str = r#"
        [process]
        name = "demo"
        foundry = "DEMO"
        vdd = 1.8
        grid = 0.005
        num_layers_poly_or_metal = 3

        [[layers]]
        name = "M1"
        gds = [68, 20]
        pin = [68, 16]
        rules = { min_width = 0.14, min_space = 0.14 }
        height_3d = 1.0
        thickness_3d = 0.36

        [[layers]]
        name = "via"
        gds = [68, 44]
        rules = { min_width = 0.15, min_space = 0.17 }
        style = { pattern = "solid", outline = "PAT_T2", color = { r = 1, g = 2, b = 3 } }

        [[layers]]
        name = "M2"
        gds = [69, 20]
        rules = { min_width = 0.14, min_space = 0.14 }

        [[spacing]]
        layer = "M1"
        other = "M2"
        distance = 0.2

        [[forbidden]]
        layer = "via"
        other = "M2"

        [[contacts]]
        name = "via"
        cut = "via"
        below = "M1"
        above = "M2"
        below_enclosure = { w = 0.085, h = 0.055 }
        above_enclosure = { w = 0.055, h = 0.085 }
    "#;

    #[test]
    fn builds_layers_rules_and_contacts() {
        let tech = ProcessConfig::from_toml(PROCESS).unwrap().build().unwrap();
        assert_eq!(tech.layers().len(), 3);

        let m1 = tech.get_layer("M1").unwrap();
        assert_eq!(m1.pin, Some(GdsLayer::new(68, 16)));
        assert_eq!(m1.height_3d, 1.0);
        assert_eq!(m1.rules.unwrap().max_width, f64::MAX);
        let m2 = tech.layer("M2").unwrap();
        assert_eq!(m1.spacing_rules().collect::<Vec<_>>(), [(m2, 0.2)]);

        let via = tech.get_layer("via").unwrap();
        assert_eq!(via.style.pattern, pattern::SOLID);
        assert_eq!(via.style.outline, Outline::Named("PAT_T2".into()));
        assert_eq!(via.forbidden().collect::<Vec<_>>(), [m2]);

        let names: Vec<&str> = tech.primitives().map(|p| p.name().as_str()).collect();
        assert_eq!(names, ["via-X", "via-P"]);
    }

    #[test]
    fn unknown_layers_are_reported() {
        let input = PROCESS.replace("other = \"M2\"\n        distance", "other = \"M9\"\n        distance");
        let err = ProcessConfig::from_toml(&input).unwrap().build().unwrap_err();
        assert!(matches!(err.source(), ErrorSource::LayerNotFound(name) if name == "M9"));
        assert_eq!(err.context(), [ErrorContext::LoadConfig]);
    }

    #[test]
    fn malformed_input_is_rejected() {
        let err = ProcessConfig::from_toml("[process]\nname = 3").unwrap_err();
        assert!(matches!(err.source(), ErrorSource::TomlParsing(_)));
    }
}
