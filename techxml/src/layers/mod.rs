//! The layer registry of a technology.

use std::borrow::Borrow;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;
use std::hash::{Hash, Hasher};

use derive_builder::Builder;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

use self::classify::{classify, metal_ordinal, LayerFunction};
use self::style::RenderingStyle;
use crate::deps::arcstr::{self, ArcStr};
use crate::error::{ErrorContext, ErrorSource, Result};
use crate::log::debug;

pub mod classify;
pub mod pattern;
pub mod style;

new_key_type! {
    /// A unique identifier for a layer in a technology.
    pub struct LayerKey;
}

/// A GDS layer, identified by its (major, minor) pair.
///
/// The name is cosmetic: equality and hashing only consider the pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GdsLayer {
    pub major: i16,
    pub minor: i16,
    #[serde(default)]
    pub name: Option<ArcStr>,
}

impl GdsLayer {
    pub fn new(major: i16, minor: i16) -> Self {
        Self {
            major,
            minor,
            name: None,
        }
    }

    pub fn named(name: impl Into<ArcStr>, major: i16, minor: i16) -> Self {
        Self {
            major,
            minor,
            name: Some(name.into()),
        }
    }

    #[inline]
    pub fn pair(&self) -> (i16, i16) {
        (self.major, self.minor)
    }
}

impl PartialEq for GdsLayer {
    fn eq(&self, other: &Self) -> bool {
        self.pair() == other.pair()
    }
}

impl Eq for GdsLayer {}

impl Hash for GdsLayer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pair().hash(state);
    }
}

impl From<(i16, i16)> for GdsLayer {
    fn from((major, minor): (i16, i16)) -> Self {
        Self::new(major, minor)
    }
}

impl Display for GdsLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "{name}")?;
        }
        write!(f, "({}/{})", self.major, self.minor)
    }
}

/// The basic design rules of a layer.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRules {
    pub min_width: f64,
    pub min_space: f64,
    pub min_area: f64,
    /// The maximum width; [`f64::MAX`] when unbounded.
    pub max_width: f64,
}

impl LayerRules {
    /// Creates a new [`LayerRules`]. A `max_width` of zero means unbounded.
    pub fn new(min_width: f64, min_space: f64, min_area: f64, max_width: f64) -> Self {
        Self {
            min_width,
            min_space,
            min_area,
            max_width: if max_width == 0. { f64::MAX } else { max_width },
        }
    }

    #[inline]
    pub fn w(width: f64) -> Self {
        Self::wsa(width, 0., 0.)
    }

    #[inline]
    pub fn ws(width: f64, space: f64) -> Self {
        Self::wsa(width, space, 0.)
    }

    #[inline]
    pub fn wsa(width: f64, space: f64, area: f64) -> Self {
        Self::wsam(width, space, area, f64::MAX)
    }

    #[inline]
    pub fn wsam(width: f64, space: f64, area: f64, max_width: f64) -> Self {
        Self::new(width, space, area, max_width)
    }
}

/// The metal stack a layer name is classified against.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MetalStack {
    /// The number of metal layers plus the number of poly layers.
    pub num_layers_poly_or_metal: i32,
    /// The ordinal of the lowest metal layer.
    pub lowest_metal: i32,
}

/// Parameters for registering a layer.
#[derive(Debug, Clone, Default, Builder)]
#[builder(pattern = "owned")]
pub struct LayerParams {
    /// The layer name. Spaces, periods and colons are replaced by `-`.
    #[builder(setter(into))]
    pub name: ArcStr,
    /// The GDS layer on which geometry is emitted.
    #[builder(setter(into, strip_option), default)]
    pub gds: Option<GdsLayer>,
    /// The GDS layer on which pins are emitted.
    #[builder(setter(into, strip_option), default)]
    pub pin: Option<GdsLayer>,
    #[builder(setter(strip_option), default)]
    pub rules: Option<LayerRules>,
    /// Overrides the style chosen by the classification table.
    #[builder(setter(strip_option), default)]
    pub style: Option<RenderingStyle>,
    #[builder(setter(into), default)]
    pub description: ArcStr,
    /// If present, a `<name>-Res` resistor layer is created on this GDS layer.
    #[builder(setter(into, strip_option), default)]
    pub res: Option<GdsLayer>,
    /// If present, a `<name>-Dummy` fill layer is created on this GDS layer.
    #[builder(setter(into, strip_option), default)]
    pub dummy: Option<GdsLayer>,
    /// If present, a `<name>-Block` fill-block layer is created on this GDS layer.
    #[builder(setter(into, strip_option), default)]
    pub block: Option<GdsLayer>,
    /// Overrides the metal ordinal derived from the name.
    #[builder(setter(strip_option), default)]
    pub metal_number: Option<i32>,
}

impl LayerParams {
    #[inline]
    pub fn builder() -> LayerParamsBuilder {
        LayerParamsBuilder::default()
    }
}

/// The child layers owned by a layer.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct DerivedLayers {
    pub res: Option<LayerKey>,
    pub dummy: Option<LayerKey>,
    pub block: Option<LayerKey>,
}

/// One manufacturing layer.
#[derive(Debug, Clone)]
pub struct TechLayer {
    pub id: LayerKey,
    pub name: ArcStr,
    pub description: ArcStr,
    pub gds: Option<GdsLayer>,
    pub pin: Option<GdsLayer>,
    pub rules: Option<LayerRules>,
    pub is_poly: bool,
    pub is_diff: bool,
    pub is_metal: bool,
    /// The metal ordinal, or -1 for non-metal layers.
    pub metal_number: i32,
    pub function: LayerFunction,
    pub style: RenderingStyle,
    pub height_3d: f64,
    pub thickness_3d: f64,
    pub derived: DerivedLayers,
    pub(crate) connections: BTreeSet<LayerKey>,
    pub(crate) forbidden: IndexSet<LayerKey>,
    pub(crate) spacing: IndexMap<LayerKey, f64>,
    pub(crate) unconnected_spacing: IndexMap<LayerKey, f64>,
}

impl TechLayer {
    /// Signal layers (poly, diffusion and metal) participate in nets.
    #[inline]
    pub fn is_signal(&self) -> bool {
        self.is_poly || self.is_diff || self.is_metal
    }

    /// The minimum width of the layer, or zero if it has no rules.
    #[inline]
    pub fn min_width(&self) -> f64 {
        self.rules.map(|r| r.min_width).unwrap_or(0.)
    }

    /// The layers allowed to connect to this layer's pure-layer node, in registry order.
    pub fn connections(&self) -> impl Iterator<Item = LayerKey> + '_ {
        self.connections.iter().copied()
    }

    /// Layers whose geometry may not overlap this layer, in declaration order.
    pub fn forbidden(&self) -> impl Iterator<Item = LayerKey> + '_ {
        self.forbidden.iter().copied()
    }

    /// Spacing rules that apply regardless of connectivity.
    pub fn spacing_rules(&self) -> impl Iterator<Item = (LayerKey, f64)> + '_ {
        self.spacing.iter().map(|(k, v)| (*k, *v))
    }

    /// Spacing rules that apply only between distinct nets.
    pub fn unconnected_spacing_rules(&self) -> impl Iterator<Item = (LayerKey, f64)> + '_ {
        self.unconnected_spacing.iter().map(|(k, v)| (*k, *v))
    }

    /// All layers this layer refers to through relationships and connections.
    pub(crate) fn referenced_layers(&self) -> impl Iterator<Item = LayerKey> + '_ {
        self.connections()
            .chain(self.forbidden())
            .chain(self.spacing.keys().copied())
            .chain(self.unconnected_spacing.keys().copied())
    }
}

/// Replaces the separator characters Electric does not accept in layer names.
pub fn normalize_name(name: &str) -> ArcStr {
    let name: String = name
        .chars()
        .map(|c| match c {
            ' ' | '.' | ':' => '-',
            c => c,
        })
        .collect();
    ArcStr::from(name)
}

#[derive(Debug, Copy, Clone)]
enum DerivedKind {
    Res,
    Dummy,
    Block,
}

impl DerivedKind {
    fn suffix(&self) -> &'static str {
        match self {
            Self::Res => "Res",
            Self::Dummy => "Dummy",
            Self::Block => "Block",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Self::Res => "Resistor",
            Self::Dummy => "Dummy",
            Self::Block => "Block",
        }
    }
}

/// A pending layer insertion.
struct NewLayer {
    name: ArcStr,
    description: ArcStr,
    gds: Option<GdsLayer>,
    pin: Option<GdsLayer>,
    rules: Option<LayerRules>,
    style: Option<RenderingStyle>,
    metal_number: i32,
}

/// A manager for the layers of a technology.
///
/// Layers are kept in registration order and indexed by name and by GDS
/// layer. Layers are never removed.
#[derive(Debug, Clone, Default)]
pub struct Layers {
    slots: SlotMap<LayerKey, TechLayer>,
    names: HashMap<ArcStr, LayerKey>,
    gds: HashMap<GdsLayer, LayerKey>,
}

impl Layers {
    /// Creates an empty [`Layers`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a layer and any derived layers it requests.
    ///
    /// The derived layers are registered immediately after their parent. No
    /// layer is added if any name or GDS layer conflicts.
    pub fn register(&mut self, params: LayerParams, stack: MetalStack) -> Result<LayerKey> {
        let name = normalize_name(&params.name);
        self.register_inner(name.clone(), params, stack)
            .map_err(|err| err.with_context(ErrorContext::RegisterLayer(name)))
    }

    fn register_inner(
        &mut self,
        name: ArcStr,
        params: LayerParams,
        stack: MetalStack,
    ) -> Result<LayerKey> {
        let metal_number = params
            .metal_number
            .unwrap_or_else(|| metal_ordinal(&name, stack.num_layers_poly_or_metal));
        let class = classify(&name, metal_number, stack.lowest_metal);

        let derived = |kind: DerivedKind, gds: &Option<GdsLayer>| {
            gds.as_ref().map(|gds| {
                let child = arcstr::format!("{name}-{}", kind.suffix());
                let layer = NewLayer {
                    metal_number: metal_ordinal(&child, stack.num_layers_poly_or_metal),
                    description: arcstr::format!("{} for {name}", kind.description()),
                    name: child,
                    gds: Some(gds.clone()),
                    pin: None,
                    rules: None,
                    style: match kind {
                        DerivedKind::Dummy => class.dummy_style.clone(),
                        _ => None,
                    },
                };
                (kind, layer)
            })
        };
        let children: Vec<(DerivedKind, NewLayer)> = [
            derived(DerivedKind::Res, &params.res),
            derived(DerivedKind::Dummy, &params.dummy),
            derived(DerivedKind::Block, &params.block),
        ]
        .into_iter()
        .flatten()
        .collect();

        let parent = NewLayer {
            name,
            description: params.description,
            gds: params.gds,
            pin: params.pin,
            rules: params.rules,
            style: params.style,
            metal_number,
        };

        let pending: Vec<&NewLayer> = std::iter::once(&parent)
            .chain(children.iter().map(|(_, layer)| layer))
            .collect();
        self.check_pending(&pending)?;

        let key = self.insert(parent, stack);
        for (kind, layer) in children {
            let child = self.insert(layer, stack);
            let derived = &mut self.slots[key].derived;
            match kind {
                DerivedKind::Res => derived.res = Some(child),
                DerivedKind::Dummy => derived.dummy = Some(child),
                DerivedKind::Block => derived.block = Some(child),
            }
        }

        Ok(key)
    }

    /// Verifies that none of the pending layers conflict with existing layers
    /// or with each other.
    fn check_pending(&self, pending: &[&NewLayer]) -> Result<()> {
        let mut claimed: HashMap<&GdsLayer, &ArcStr> = HashMap::new();
        for (i, layer) in pending.iter().enumerate() {
            if self.names.contains_key(&layer.name)
                || pending[..i].iter().any(|other| other.name == layer.name)
            {
                return Err(ErrorSource::AlreadyExists(layer.name.clone()).into());
            }
            for gds in layer.gds.iter().chain(layer.pin.iter()) {
                let existing = self
                    .gds
                    .get(gds)
                    .map(|key| &self.slots[*key].name)
                    .or_else(|| claimed.get(gds).copied());
                match existing {
                    Some(existing) if *existing != layer.name => {
                        return Err(ErrorSource::DuplicateGdsMapping {
                            gds: gds.clone(),
                            existing: existing.clone(),
                            requested: layer.name.clone(),
                        }
                        .into());
                    }
                    Some(_) => {}
                    None => {
                        claimed.insert(gds, &layer.name);
                    }
                }
            }
        }
        Ok(())
    }

    fn insert(&mut self, layer: NewLayer, stack: MetalStack) -> LayerKey {
        let class = classify(&layer.name, layer.metal_number, stack.lowest_metal);
        let name = layer.name.clone();
        let bindings: Vec<GdsLayer> = layer.gds.iter().chain(layer.pin.iter()).cloned().collect();

        let key = self.slots.insert_with_key(|id| TechLayer {
            id,
            name: layer.name,
            description: layer.description,
            gds: layer.gds,
            pin: layer.pin,
            rules: layer.rules,
            is_poly: class.is_poly,
            is_diff: class.is_diff,
            is_metal: class.is_metal,
            metal_number: class.metal_number,
            function: class.function,
            style: layer.style.unwrap_or(class.style),
            height_3d: 0.,
            thickness_3d: 0.,
            derived: DerivedLayers::default(),
            connections: BTreeSet::new(),
            forbidden: IndexSet::new(),
            spacing: IndexMap::new(),
            unconnected_spacing: IndexMap::new(),
        });
        for gds in bindings {
            self.gds.entry(gds).or_insert(key);
        }
        self.names.insert(name.clone(), key);

        debug!(
            "registered layer {} ({}, signal: {})",
            name,
            self.slots[key].function,
            self.slots[key].is_signal()
        );
        key
    }

    /// Associates an additional GDS layer with an existing layer.
    ///
    /// Binding a GDS layer to the layer it is already bound to does nothing.
    pub fn bind_gds(&mut self, key: LayerKey, gds: GdsLayer) -> Result<()> {
        let requested = self.try_get(key)?.name.clone();
        match self.gds.get(&gds) {
            Some(existing) if *existing == key => Ok(()),
            Some(existing) => Err(ErrorSource::DuplicateGdsMapping {
                gds,
                existing: self.slots[*existing].name.clone(),
                requested,
            }
            .into()),
            None => {
                self.gds.insert(gds, key);
                Ok(())
            }
        }
    }

    /// Gets the [`LayerKey`] of the layer named `name`.
    pub fn get_key<Q>(&self, name: &Q) -> Option<LayerKey>
    where
        Q: Hash + Eq + ?Sized,
        ArcStr: Borrow<Q>,
    {
        self.names.get(name).copied()
    }

    /// Gets the layer bound to GDS layer `gds`, if any.
    pub fn get_by_gds(&self, gds: &GdsLayer) -> Option<LayerKey> {
        self.gds.get(gds).copied()
    }

    #[inline]
    pub fn get(&self, key: LayerKey) -> Option<&TechLayer> {
        self.slots.get(key)
    }

    #[inline]
    pub fn get_mut(&mut self, key: LayerKey) -> Option<&mut TechLayer> {
        self.slots.get_mut(key)
    }

    /// Gets a layer, failing with [`ErrorSource::LayerNotFound`] if `key` is not registered.
    pub fn try_get(&self, key: LayerKey) -> Result<&TechLayer> {
        self.slots
            .get(key)
            .ok_or_else(|| ErrorSource::LayerNotFound(format!("{key:?}")).into())
    }

    pub(crate) fn try_get_mut(&mut self, key: LayerKey) -> Result<&mut TechLayer> {
        self.slots
            .get_mut(key)
            .ok_or_else(|| ErrorSource::LayerNotFound(format!("{key:?}")).into())
    }

    /// Gets the name of `key`.
    pub fn name(&self, key: LayerKey) -> Result<&ArcStr> {
        Ok(&self.try_get(key)?.name)
    }

    #[inline]
    pub fn contains(&self, key: LayerKey) -> bool {
        self.slots.contains_key(key)
    }

    /// Iterates over all layers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &TechLayer> {
        self.slots.values()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
