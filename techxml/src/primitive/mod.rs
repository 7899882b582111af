//! Primitive nodes: the transistors, contacts and pins of a technology.
//!
//! A [`Primitive`] is described relative to its node base. Ports and node
//! layers are append-only and keep their construction order, which the
//! layout tool relies on: ports are matched positionally and every port and
//! net is referenced in the exported document by its sequence number.

use std::collections::BTreeSet;

use derive_builder::Builder;
use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use techgeom::{Dims, Rect, ScaledRect};

use crate::deps::arcstr::ArcStr;
use crate::error::{ErrorSource, Result};
use crate::layers::LayerKey;

pub mod via;

new_key_type! {
    /// A unique identifier for a primitive in a technology.
    pub struct PrimitiveKey;
    /// A unique identifier for a primitive group in a technology.
    pub struct GroupKey;
}

/// An ordered set of primitives exported as one structural group.
#[derive(Debug, Clone, Default)]
pub struct PrimitiveGroup {
    pub(crate) primitives: Vec<PrimitiveKey>,
}

impl PrimitiveGroup {
    /// The primitives of this group, in creation order.
    #[inline]
    pub fn primitives(&self) -> &[PrimitiveKey] {
        &self.primitives
    }
}

/// Parameters for creating a [`Primitive`].
#[derive(Debug, Clone, Builder)]
#[builder(pattern = "owned")]
pub struct PrimitiveParams {
    #[builder(setter(into))]
    pub name: ArcStr,
    /// The Electric `fun` attribute, e.g. `CONTACT` or `TRANMOS`.
    #[builder(setter(into))]
    pub function: ArcStr,
    /// The prototype footprint all relative geometry is expressed against.
    pub node_base: Rect,
    /// Defaults to the width of the node base.
    #[builder(setter(strip_option), default)]
    pub default_width: Option<f64>,
    /// Defaults to the height of the node base.
    #[builder(setter(strip_option), default)]
    pub default_height: Option<f64>,
}

impl PrimitiveParams {
    #[inline]
    pub fn builder() -> PrimitiveParamsBuilder {
        PrimitiveParamsBuilder::default()
    }
}

/// The sequence number of a port within its primitive.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct PortId(usize);

impl PortId {
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

/// The sequence number of a net within its primitive.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct NetId(usize);

impl NetId {
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A set of ports that the primitive's own geometry connects.
#[derive(Debug, Clone)]
pub struct Net {
    pub id: NetId,
    pub comment: ArcStr,
}

/// A connection point on a primitive.
#[derive(Debug, Clone)]
pub struct Port {
    pub id: PortId,
    pub name: ArcStr,
    pub extent: ScaledRect,
    /// Layers that may route to this port, in registry order.
    pub layers: BTreeSet<LayerKey>,
    pub net: NetId,
}

/// Shape-specific behavior of a [`NodeLayer`].
#[enum_dispatch]
pub trait NodeShape {
    /// The `style` attribute of the node layer.
    fn style(&self) -> &'static str;
    /// The extent of the shape on a primitive whose node base has size `base`.
    fn bbox(&self, base: Dims) -> Rect;
}

/// A rectangle sized relative to the node base.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rectangle {
    pub extent: ScaledRect,
}

impl Rectangle {
    pub fn new(extent: impl Into<ScaledRect>) -> Self {
        Self {
            extent: extent.into(),
        }
    }
}

impl NodeShape for Rectangle {
    fn style(&self) -> &'static str {
        "FILLED"
    }

    fn bbox(&self, base: Dims) -> Rect {
        self.extent.resolve(base)
    }
}

/// A disc, or an annulus when `thickness` is nonzero.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Round {
    pub diameter: f64,
    pub thickness: f64,
    /// Half of the magnification applied to the node base width.
    pub mult: f64,
}

impl Round {
    pub fn new(diameter: f64, thickness: f64, mult: f64) -> Self {
        Self {
            diameter,
            thickness,
            mult: 0.5 * mult,
        }
    }

    /// A filled disc of the given diameter at unit magnification.
    #[inline]
    pub fn disc(diameter: f64) -> Self {
        Self::new(diameter, 0., 1.)
    }

    /// The resolved radius on a node base of width `width`.
    pub fn radius(&self, width: f64) -> f64 {
        self.mult * width + self.diameter / 2.
    }
}

impl NodeShape for Round {
    fn style(&self) -> &'static str {
        if self.thickness == 0. {
            "DISC"
        } else {
            "THICKCIRCLE"
        }
    }

    fn bbox(&self, base: Dims) -> Rect {
        Rect::square(2. * self.radius(base.w))
    }
}

/// A regular array of cuts.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MultiCut {
    pub cut_width: f64,
    pub cut_height: f64,
    /// Cut spacing along a single row or column.
    pub sep1d: f64,
    /// Cut spacing in two-dimensional arrays.
    pub sep2d: f64,
    /// The box containing every cut.
    pub bounds: Rect,
}

impl MultiCut {
    pub fn new(cut_width: f64, cut_height: f64, sep1d: f64, sep2d: f64, bounds: Rect) -> Self {
        Self {
            cut_width,
            cut_height,
            sep1d,
            sep2d,
            bounds,
        }
    }

    /// The box the centers of all cuts fall within.
    pub fn centroids(&self) -> Rect {
        self.bounds
            .grow(-self.cut_width / 2., -self.cut_height / 2.)
    }
}

impl NodeShape for MultiCut {
    fn style(&self) -> &'static str {
        "FILLED"
    }

    fn bbox(&self, _base: Dims) -> Rect {
        self.bounds
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
#[enum_dispatch(NodeShape)]
pub enum LayerShape {
    Rectangle(Rectangle),
    Round(Round),
    MultiCut(MultiCut),
}

/// One layer of a primitive's geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeLayer {
    pub layer: LayerKey,
    /// The port this geometry belongs to. Multicuts never have one.
    pub port: Option<PortId>,
    /// Non-electrical geometry does not participate in connectivity.
    pub electrical: bool,
    pub shape: LayerShape,
}

impl NodeLayer {
    /// Marks this geometry as decorative.
    pub fn non_electrical(&mut self) -> &mut Self {
        self.electrical = false;
        self
    }
}

/// A primitive node.
#[derive(Debug, Clone)]
pub struct Primitive {
    pub(crate) id: PrimitiveKey,
    pub(crate) group: GroupKey,
    name: ArcStr,
    function: ArcStr,
    node_base: Rect,
    default_width: f64,
    default_height: f64,
    min_width: f64,
    min_height: f64,
    ports: Vec<Port>,
    nets: Vec<Net>,
    layers: Vec<NodeLayer>,
}

impl Primitive {
    pub(crate) fn new(id: PrimitiveKey, group: GroupKey, params: PrimitiveParams) -> Self {
        let node_base = params.node_base;
        Self {
            id,
            group,
            name: params.name,
            function: params.function,
            default_width: params.default_width.unwrap_or_else(|| node_base.width()),
            default_height: params.default_height.unwrap_or_else(|| node_base.height()),
            node_base,
            min_width: 0.,
            min_height: 0.,
            ports: Vec::new(),
            nets: Vec::new(),
            layers: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> PrimitiveKey {
        self.id
    }

    #[inline]
    pub fn group(&self) -> GroupKey {
        self.group
    }

    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    #[inline]
    pub fn function(&self) -> &ArcStr {
        &self.function
    }

    #[inline]
    pub fn node_base(&self) -> Rect {
        self.node_base
    }

    #[inline]
    pub fn default_width(&self) -> f64 {
        self.default_width
    }

    #[inline]
    pub fn default_height(&self) -> f64 {
        self.default_height
    }

    /// The minimum (width, height); zero means unconstrained.
    #[inline]
    pub fn min_dimensions(&self) -> (f64, f64) {
        (self.min_width, self.min_height)
    }

    pub fn set_min_dimensions(&mut self, min_width: f64, min_height: f64) {
        self.min_width = min_width;
        self.min_height = min_height;
    }

    /// Sets the minimum dimensions to the size of `rect`.
    pub fn set_min_size_from(&mut self, rect: Rect) {
        self.set_min_dimensions(rect.width(), rect.height());
    }

    #[inline]
    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    #[inline]
    pub fn nets(&self) -> &[Net] {
        &self.nets
    }

    #[inline]
    pub fn layers(&self) -> &[NodeLayer] {
        &self.layers
    }

    pub fn port(&self, id: PortId) -> Result<&Port> {
        self.ports
            .get(id.0)
            .ok_or_else(|| ErrorSource::PortNotFound(id.0).into())
    }

    pub fn net(&self, id: NetId) -> Result<&Net> {
        self.nets
            .get(id.0)
            .ok_or_else(|| ErrorSource::NetNotFound(id.0).into())
    }

    /// Gets a port by name.
    pub fn port_named(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Creates a new net, numbered after the nets created so far.
    pub fn add_net(&mut self, comment: impl Into<ArcStr>) -> NetId {
        let id = NetId(self.nets.len());
        self.nets.push(Net {
            id,
            comment: comment.into(),
        });
        id
    }

    /// Creates a new port, numbered after the ports created so far.
    ///
    /// If `net` is `None`, the port gets a net of its own named after it.
    pub fn add_port(
        &mut self,
        name: impl Into<ArcStr>,
        extent: impl Into<ScaledRect>,
        net: Option<NetId>,
        layers: impl IntoIterator<Item = LayerKey>,
    ) -> Result<PortId> {
        let name = name.into();
        let net = match net {
            Some(net) => {
                self.net(net)?;
                net
            }
            None => self.add_net(name.clone()),
        };
        let id = PortId(self.ports.len());
        self.ports.push(Port {
            id,
            name,
            extent: extent.into(),
            layers: layers.into_iter().collect(),
            net,
        });
        Ok(id)
    }

    fn push_layer(
        &mut self,
        layer: LayerKey,
        port: Option<PortId>,
        shape: LayerShape,
    ) -> Result<&mut NodeLayer> {
        if let Some(port) = port {
            self.port(port)?;
        }
        self.layers.push(NodeLayer {
            layer,
            port,
            electrical: true,
            shape,
        });
        let idx = self.layers.len() - 1;
        Ok(&mut self.layers[idx])
    }

    /// Adds a rectangle on `layer`, optionally belonging to `port`.
    pub fn add_rect(
        &mut self,
        layer: LayerKey,
        port: Option<PortId>,
        extent: impl Into<ScaledRect>,
    ) -> Result<&mut NodeLayer> {
        self.push_layer(layer, port, Rectangle::new(extent).into())
    }

    /// Adds a disc or annulus on `layer`, optionally belonging to `port`.
    pub fn add_round(
        &mut self,
        layer: LayerKey,
        port: Option<PortId>,
        round: Round,
    ) -> Result<&mut NodeLayer> {
        self.push_layer(layer, port, round.into())
    }

    /// Adds a cut array on `layer`.
    pub fn add_multicut(&mut self, layer: LayerKey, cut: MultiCut) -> &mut NodeLayer {
        self.layers.push(NodeLayer {
            layer,
            port: None,
            electrical: true,
            shape: cut.into(),
        });
        let idx = self.layers.len() - 1;
        &mut self.layers[idx]
    }
}
