//! Contact and via primitive generation.
//!
//! Each transition between two adjacent layers of a process gets a group of
//! contact cells: an `X` variant, whose enclosures on the layers below and
//! above run perpendicular to each other, and a `P` variant, whose enclosures
//! run parallel.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use techgeom::{Dims, Rect};

use super::{GroupKey, MultiCut, Primitive, PrimitiveParams};
use crate::deps::arcstr::{self, ArcStr};
use crate::error::{ErrorContext, ErrorSource, Result};
use crate::layers::{LayerKey, LayerRules};
use crate::log::debug;
use crate::tech::Tech;

/// The layer whose enclosure is rotated to form the parallel contact variant.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParallelSide {
    #[default]
    Below,
    Above,
}

/// A description of one layer transition in a contact stack.
#[derive(Debug, Clone, Builder)]
#[builder(pattern = "owned")]
pub struct ContactSpec {
    /// The base name of the generated primitives, e.g. `PCont` or `via2`.
    #[builder(setter(into))]
    pub name: ArcStr,
    /// The cut layer. Its minimum width and spacing size the cut array.
    pub cut: LayerKey,
    pub below: LayerKey,
    /// `None` for a terminal contact, such as a pad.
    #[builder(setter(strip_option), default)]
    pub above: Option<LayerKey>,
    /// The enclosure of the cut by the layer below, per axis.
    #[builder(setter(into), default)]
    pub below_enclosure: Dims,
    /// The enclosure of the cut by the layer above, per axis.
    #[builder(setter(into), default)]
    pub above_enclosure: Dims,
    #[builder(default)]
    pub parallel: ParallelSide,
    /// A second cut array drawn on a marker layer.
    #[builder(setter(strip_option), default)]
    pub marker: Option<LayerKey>,
    /// Rectangles surrounding the cut by a fixed amount, drawn first.
    #[builder(default)]
    pub surrounds: Vec<(LayerKey, f64)>,
}

impl ContactSpec {
    #[inline]
    pub fn builder() -> ContactSpecBuilder {
        ContactSpecBuilder::default()
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Variant {
    Crossed,
    Parallel,
}

impl Variant {
    fn suffix(&self) -> &'static str {
        match self {
            Self::Crossed => "X",
            Self::Parallel => "P",
        }
    }
}

/// The resolved rules and enclosures of one contact cell.
struct ContactGeometry {
    cut: LayerRules,
    base: Rect,
    below: Rect,
    above: Rect,
    below_width: f64,
    above_width: Option<f64>,
}

impl ContactGeometry {
    /// The shape of the port: where a wire on either layer may end.
    fn port_shape(&self) -> Rect {
        let below = self.below.grow_all(-self.below_width / 2.);
        let above = match self.above_width {
            Some(width) => self.above.grow_all(-width / 2.),
            None => below,
        };
        below.clamped_intersection(&above)
    }

    fn cuts(&self) -> MultiCut {
        MultiCut::new(
            self.cut.min_width,
            self.cut.min_width,
            self.cut.min_space,
            self.cut.min_space,
            self.base,
        )
    }
}

fn rules_of(tech: &Tech, key: LayerKey) -> Result<LayerRules> {
    let layer = tech.layers().try_get(key)?;
    layer
        .rules
        .ok_or_else(|| ErrorSource::MissingRules(layer.name.clone()).into())
}

/// Generates the contact cells for one layer transition into a new group.
///
/// The parallel variant is omitted when rotating the enclosure of
/// [`ContactSpec::parallel`] would leave it unchanged.
pub fn generate_contacts(tech: &mut Tech, spec: &ContactSpec) -> Result<GroupKey> {
    generate_contacts_inner(tech, spec)
        .map_err(|err| err.with_context(ErrorContext::GenerateContact(spec.name.clone())))
}

/// Generates the contact cells of every transition in `specs`, in order.
pub fn generate_contact_stack(tech: &mut Tech, specs: &[ContactSpec]) -> Result<Vec<GroupKey>> {
    specs
        .iter()
        .map(|spec| generate_contacts(tech, spec))
        .collect()
}

fn generate_contacts_inner(tech: &mut Tech, spec: &ContactSpec) -> Result<GroupKey> {
    let cut = rules_of(tech, spec.cut)?;
    let below_width = rules_of(tech, spec.below)?.min_width;
    let above_width = spec
        .above
        .map(|above| rules_of(tech, above).map(|rules| rules.min_width))
        .transpose()?;
    for layer in spec.marker.iter().chain(spec.surrounds.iter().map(|(l, _)| l)) {
        tech.layers().try_get(*layer)?;
    }

    let base = Rect::square(cut.min_width);
    let crossed = ContactGeometry {
        cut,
        base,
        below: base.grow_dims(spec.below_enclosure),
        above: base.grow_dims(spec.above_enclosure),
        below_width,
        above_width,
    };

    let parallel = match spec.parallel {
        ParallelSide::Below if crossed.below.swap_axes() != crossed.below => {
            Some(ContactGeometry {
                below: crossed.below.swap_axes(),
                ..crossed
            })
        }
        ParallelSide::Above
            if spec.above.is_some() && crossed.above.swap_axes() != crossed.above =>
        {
            Some(ContactGeometry {
                above: crossed.above.swap_axes(),
                ..crossed
            })
        }
        _ => None,
    };

    let group = tech.add_group();
    build_variant(tech, group, spec, Variant::Crossed, &crossed)?;
    match parallel {
        Some(parallel) => build_variant(tech, group, spec, Variant::Parallel, &parallel)?,
        None => debug!(
            "skipping parallel variant of {}: enclosure is square",
            spec.name
        ),
    }
    Ok(group)
}

fn build_variant(
    tech: &mut Tech,
    group: GroupKey,
    spec: &ContactSpec,
    variant: Variant,
    geometry: &ContactGeometry,
) -> Result<()> {
    let name = arcstr::format!("{}-{}", spec.name, variant.suffix());
    let params = PrimitiveParams {
        name: name.clone(),
        function: arcstr::literal!("CONTACT"),
        node_base: geometry.base,
        default_width: None,
        default_height: None,
    };
    let key = tech.add_primitive(group, params)?;
    let primitive = tech.primitive_mut(key)?;
    draw_contact(primitive, spec, geometry)
        .map_err(|err| err.with_context(ErrorContext::BuildPrimitive(name.clone())))?;
    debug!("generated contact primitive {}", name);
    Ok(())
}

fn draw_contact(primitive: &mut Primitive, spec: &ContactSpec, geometry: &ContactGeometry) -> Result<()> {
    for (layer, enclosure) in spec.surrounds.iter() {
        primitive.add_rect(*layer, None, geometry.base.grow_all(*enclosure))?;
    }

    let net = primitive.add_net("port");
    let port = primitive.add_port(
        "port",
        geometry.port_shape(),
        Some(net),
        spec.above.into_iter().chain([spec.below]),
    )?;

    if let Some(above) = spec.above {
        primitive.add_rect(above, Some(port), geometry.above)?;
    }
    primitive.add_rect(spec.below, Some(port), geometry.below)?;

    primitive.add_multicut(spec.cut, geometry.cuts());
    if let Some(marker) = spec.marker {
        primitive.add_multicut(marker, geometry.cuts());
    }
    Ok(())
}
