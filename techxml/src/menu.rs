//! The component menu shown by the layout tool.

use serde::{Deserialize, Serialize};

use crate::deps::arcstr::ArcStr;

/// One item of a [`MenuBox`].
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuEntry {
    /// A text label.
    Text(ArcStr),
    /// The arc of the named layer.
    Arc(ArcStr),
    /// The named primitive node.
    Node(ArcStr),
    /// A preconfigured instance of a primitive node.
    NodeInst {
        proto: ArcStr,
        function: ArcStr,
        /// Rotation in tenths of a degree.
        #[serde(default)]
        rotation: Option<u32>,
        /// Label drawn over the node in the menu.
        #[serde(default)]
        text: Option<ArcStr>,
    },
}

impl MenuEntry {
    pub fn node_inst(proto: impl Into<ArcStr>, function: impl Into<ArcStr>) -> Self {
        Self::NodeInst {
            proto: proto.into(),
            function: function.into(),
            rotation: None,
            text: None,
        }
    }
}

/// One cell of the menu grid.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuBox {
    pub entries: Vec<MenuEntry>,
}

impl MenuBox {
    pub fn new(entries: impl IntoIterator<Item = MenuEntry>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }
}

/// A grid of menu boxes, filled row by row.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct MenuPalette {
    pub columns: u32,
    #[serde(default)]
    pub boxes: Vec<MenuBox>,
}

impl Default for MenuPalette {
    fn default() -> Self {
        Self {
            columns: 3,
            boxes: Vec::new(),
        }
    }
}

impl MenuPalette {
    pub fn new(columns: u32) -> Self {
        Self {
            columns,
            boxes: Vec::new(),
        }
    }

    pub fn push(&mut self, menu_box: MenuBox) -> &mut Self {
        self.boxes.push(menu_box);
        self
    }
}
