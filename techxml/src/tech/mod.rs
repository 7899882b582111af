//! The root of a technology description.

use std::sync::Arc;

use derivative::Derivative;
use slotmap::SlotMap;

use self::process::Process;
use crate::deps::arcstr::ArcStr;
use crate::error::{ErrorSource, Result};
use crate::layers::{GdsLayer, LayerKey, LayerParams, Layers, MetalStack, TechLayer};
use crate::menu::MenuPalette;
use crate::primitive::{GroupKey, Primitive, PrimitiveGroup, PrimitiveKey, PrimitiveParams};

pub mod process;

/// A technology: the layers, primitives and menu of one manufacturing process.
///
/// A technology is populated once, then exported. Layers, primitives and
/// groups are never removed, and every collection iterates in creation order.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Tech {
    #[derivative(Debug = "ignore")]
    process: Arc<dyn Process>,
    layers: Layers,
    groups: SlotMap<GroupKey, PrimitiveGroup>,
    primitives: SlotMap<PrimitiveKey, Primitive>,
    menu: MenuPalette,
}

impl Tech {
    pub fn new(process: Arc<dyn Process>) -> Self {
        Self {
            process,
            layers: Layers::new(),
            groups: SlotMap::with_key(),
            primitives: SlotMap::with_key(),
            menu: MenuPalette::default(),
        }
    }

    #[inline]
    pub fn process(&self) -> &Arc<dyn Process> {
        &self.process
    }

    /// The metal stack layer names are classified against.
    pub fn metal_stack(&self) -> MetalStack {
        MetalStack {
            num_layers_poly_or_metal: self.process.num_layers_poly_or_metal(),
            lowest_metal: self.process.lowest_metal_ordinal(),
        }
    }

    /// Registers a layer and its derived layers.
    pub fn register_layer(&mut self, params: LayerParams) -> Result<LayerKey> {
        let stack = self.metal_stack();
        self.layers.register(params, stack)
    }

    #[inline]
    pub fn layers(&self) -> &Layers {
        &self.layers
    }

    /// Looks up a layer by name, accepting `:` in place of `-`.
    pub fn layer(&self, name: &str) -> Result<LayerKey> {
        let name = name.replace(':', "-");
        self.layers
            .get_key(name.as_str())
            .ok_or(ErrorSource::LayerNotFound(name).into())
    }

    /// Looks up a layer by name, returning its full description.
    pub fn get_layer(&self, name: &str) -> Result<&TechLayer> {
        let key = self.layer(name)?;
        self.layers.try_get(key)
    }

    /// Checks that `other` exists, then returns the declaring layer.
    fn relate(&mut self, layer: LayerKey, other: LayerKey) -> Result<&mut TechLayer> {
        self.layers.try_get(other)?;
        self.layers.try_get_mut(layer)
    }

    /// Forbids geometry on `other` from overlapping `layer`.
    pub fn forbid(&mut self, layer: LayerKey, other: LayerKey) -> Result<()> {
        self.relate(layer, other)?.forbidden.insert(other);
        Ok(())
    }

    /// Declares a spacing rule that applies regardless of connectivity.
    ///
    /// Declaring a rule to the same layer again replaces its distance.
    pub fn add_spacing(&mut self, layer: LayerKey, other: LayerKey, distance: f64) -> Result<()> {
        self.relate(layer, other)?.spacing.insert(other, distance);
        Ok(())
    }

    /// Declares a spacing rule that applies only between distinct nets.
    pub fn add_unconnected_spacing(
        &mut self,
        layer: LayerKey,
        other: LayerKey,
        distance: f64,
    ) -> Result<()> {
        self.relate(layer, other)?
            .unconnected_spacing
            .insert(other, distance);
        Ok(())
    }

    /// Allows arcs on `other` to connect to the pure-layer node of `layer`.
    pub fn add_pure_layer_node_connection(&mut self, layer: LayerKey, other: LayerKey) -> Result<()> {
        self.relate(layer, other)?.connections.insert(other);
        Ok(())
    }

    /// Sets the position of `layer` in the 3D view of the stack.
    pub fn set_3d(&mut self, layer: LayerKey, height: f64, thickness: f64) -> Result<()> {
        let layer = self.layers.try_get_mut(layer)?;
        layer.height_3d = height;
        layer.thickness_3d = thickness;
        Ok(())
    }

    /// Associates an additional GDS layer with `layer`.
    pub fn bind_gds(&mut self, layer: LayerKey, gds: GdsLayer) -> Result<()> {
        self.layers.bind_gds(layer, gds)
    }

    /// Creates a new, empty primitive group.
    pub fn add_group(&mut self) -> GroupKey {
        self.groups.insert(PrimitiveGroup::default())
    }

    /// Creates a new primitive at the end of `group`.
    pub fn add_primitive(&mut self, group: GroupKey, params: PrimitiveParams) -> Result<PrimitiveKey> {
        let members = self
            .groups
            .get_mut(group)
            .ok_or_else(|| ErrorSource::GroupNotFound(format!("{group:?}")))?;
        let key = self
            .primitives
            .insert_with_key(|id| Primitive::new(id, group, params));
        members.primitives.push(key);
        Ok(key)
    }

    pub fn group(&self, key: GroupKey) -> Result<&PrimitiveGroup> {
        self.groups
            .get(key)
            .ok_or_else(|| ErrorSource::GroupNotFound(format!("{key:?}")).into())
    }

    /// Iterates over all primitive groups in creation order.
    pub fn groups(&self) -> impl Iterator<Item = &PrimitiveGroup> {
        self.groups.values()
    }

    pub fn primitive(&self, key: PrimitiveKey) -> Result<&Primitive> {
        self.primitives
            .get(key)
            .ok_or_else(|| ErrorSource::PrimitiveNotFound(format!("{key:?}")).into())
    }

    pub fn primitive_mut(&mut self, key: PrimitiveKey) -> Result<&mut Primitive> {
        self.primitives
            .get_mut(key)
            .ok_or_else(|| ErrorSource::PrimitiveNotFound(format!("{key:?}")).into())
    }

    /// Gets the first primitive named `name`.
    pub fn primitive_named(&self, name: &str) -> Option<&Primitive> {
        self.primitives.values().find(|p| p.name() == name)
    }

    /// Iterates over all primitives in creation order.
    pub fn primitives(&self) -> impl Iterator<Item = &Primitive> {
        self.primitives.values()
    }

    #[inline]
    pub fn menu_palette(&self) -> &MenuPalette {
        &self.menu
    }

    pub fn set_menu_palette(&mut self, menu: MenuPalette) {
        self.menu = menu;
    }

    /// The technology name, used as the document's short name.
    #[inline]
    pub fn name(&self) -> ArcStr {
        self.process.name()
    }
}
