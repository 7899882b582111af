//! Technology XML export.
//!
//! Walks a finished [`Tech`] and renders the technology description read by
//! the layout tool. The document is assembled in memory and only written out
//! once every section rendered successfully.

use std::fmt::Write as _;
use std::path::Path;

use derivative::Derivative;
use itertools::Itertools;
use techgeom::{Rect, ScaledRect};

use self::error::{ErrorHelper, ExportContext, ExportError, ExportResult};
use self::validation::validate_tech;
use self::writer::IndentWriter;
use crate::deps::arcstr;
use crate::error::{with_err_context, ErrorContext, ErrorSource, Result};
use crate::layers::{LayerKey, TechLayer};
use crate::log::info;
use crate::menu::{MenuBox, MenuEntry};
use crate::primitive::{LayerShape, NodeLayer, NodeShape, Port, Primitive};
use crate::tech::Tech;

pub mod error;
pub mod validation;
pub mod writer;

/// Indentation added for each level of element nesting.
const NESTING: usize = 4;

/// Formats a double the way the layout tool's own files do.
///
/// Integral values keep one decimal place, magnitudes in `[1e-3, 1e7)` use
/// the shortest decimal that round-trips, and everything else uses
/// `<mantissa>E<exponent>` notation.
pub fn fmt_f64(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0. { "Infinity" } else { "-Infinity" }.to_string();
    }
    let magnitude = value.abs();
    if magnitude == 0. || (1e-3..1e7).contains(&magnitude) {
        return format!("{value:?}");
    }
    let sci = format!("{value:e}");
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((&sci, "0"));
    if mantissa.contains('.') {
        format!("{mantissa}E{exponent}")
    } else {
        format!("{mantissa}.0E{exponent}")
    }
}

/// Escapes text for use in XML content and quoted attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Makes `text` safe to place inside an XML comment.
fn comment_text(text: &str) -> String {
    text.replace("--", "- -")
}

/// The attribute list of a box, each attribute preceded by a space.
fn box_attrs(r: Rect) -> String {
    format!(
        " klx='{}' kly='{}' khx='{}' khy='{}'",
        fmt_f64(r.p0.x),
        fmt_f64(r.p0.y),
        fmt_f64(r.p1.x),
        fmt_f64(r.p1.y)
    )
}

/// Writes one line of output, propagating formatter failures.
macro_rules! emit {
    ($self:ident) => {
        $self.line(format_args!(""))?
    };
    ($self:ident, $($arg:tt)*) => {
        $self.line(format_args!($($arg)*))?
    };
}

/// A technology XML exporter.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct TechExporter<'a> {
    #[derivative(Debug = "ignore")]
    tech: &'a Tech,
    out: IndentWriter<String>,
    backtrace: Vec<ExportContext>,
}

impl Tech {
    /// Renders the technology XML document.
    ///
    /// The technology is validated first; any validation error aborts the
    /// export with [`ErrorSource::InvalidTech`].
    pub fn to_xml_string(&self) -> Result<String> {
        let inner = || -> Result<String> {
            let output = validate_tech(self);
            output.log();
            if let Some(err) = output.first_error() {
                return Err(ErrorSource::InvalidTech(err).into());
            }
            let xml = TechExporter::new(self)
                .export()
                .map_err(ErrorSource::Export)?;
            info!(
                "exported technology {} ({} layers, {} primitive groups, {} primitives)",
                self.name(),
                self.layers().len(),
                self.groups().count(),
                self.primitives().count()
            );
            Ok(xml)
        };
        with_err_context(inner(), || {
            ErrorContext::Task(arcstr::literal!("exporting technology XML"))
        })
    }

    /// Writes the technology XML document to `out` and flushes it.
    pub fn dump(&self, out: &mut dyn std::io::Write) -> Result<()> {
        let xml = self.to_xml_string()?;
        out.write_all(xml.as_bytes())?;
        out.flush()?;
        Ok(())
    }

    /// Writes the technology XML document to a new file at `path`.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let xml = self.to_xml_string()?;
        crate::io::write_file(path, xml.as_bytes())
    }
}

impl<'a> TechExporter<'a> {
    pub fn new(tech: &'a Tech) -> Self {
        Self {
            tech,
            out: IndentWriter::new(String::new()),
            backtrace: Vec::new(),
        }
    }

    /// Renders the whole document, consuming the exporter.
    pub fn export(mut self) -> ExportResult<String> {
        self.export_tech()?;
        Ok(self.out.into_inner())
    }

    fn line(&mut self, args: std::fmt::Arguments) -> ExportResult<()> {
        let res = self.out.write_fmt(args).and_then(|_| self.out.write_char('\n'));
        match res {
            Ok(()) => Ok(()),
            Err(err) => Err(ExportError::Conversion {
                message: "failed to format output".to_string(),
                err: Box::new(err),
                stack: self.backtrace.clone(),
            }),
        }
    }

    fn nest(&mut self) {
        self.out.indent += NESTING;
    }

    fn unnest(&mut self) {
        self.out.indent -= NESTING;
    }

    fn layer_name(&self, key: LayerKey) -> ExportResult<String> {
        let layer = self.unwrap(
            self.tech.layers().get(key),
            format!("reference to unregistered layer {key:?}"),
        )?;
        Ok(escape(&layer.name))
    }

    fn export_tech(&mut self) -> ExportResult<()> {
        let process = self.tech.process().clone();
        let name = escape(&process.name());
        let description = escape(&process.description());
        let foundry = escape(&process.foundry());
        self.backtrace
            .push(ExportContext::Technology(process.name()));

        emit!(self, "<?xml version='1.0' encoding='UTF-8'?>");
        let comments = process.header_comments();
        if !comments.is_empty() {
            emit!(self);
            for comment in comments.iter() {
                emit!(self, "<!-- {} -->", comment_text(comment));
            }
            emit!(self);
        }

        emit!(self, "<technology name='{name}'");
        self.nest();
        emit!(self, "xmlns='http://electric.sun.com/Technology'");
        emit!(self, "xmlns:xsi='http://www.w3.org/2001/XMLSchema-instance'");
        emit!(
            self,
            "xsi:schemaLocation='http://electric.sun.com/Technology ../../technology/Technology.xsd'>"
        );
        emit!(self);
        emit!(self, "<shortName>{name}</shortName>");
        emit!(self, "<description>{description}</description>");
        let metals = process.num_layers_poly_or_metal() - 1;
        emit!(
            self,
            "<numMetals min='{metals}' max='{metals}' default='{metals}'/>"
        );
        emit!(self, "<scale value='1000.0' relevant='true'/>");
        emit!(self, "<resolution value='{}'/>", fmt_f64(process.grid()));
        emit!(self, "<defaultFoundry value='{foundry}'/>");
        emit!(
            self,
            "<minResistance value='4.0'/> <!-- not sure what this should be; copied default from mocmos -->"
        );
        emit!(
            self,
            "<minCapacitance value='0.1'/> <!-- not sure what this should be; copied default from mocmos -->"
        );
        emit!(self);
        emit!(
            self,
            "<!-- Transparent layers; not sure why these are in a techfile, copied from mocmos -->"
        );
        let transparent = [
            (107, 255, 242),
            (0, 153, 51),
            (255, 155, 192),
            (224, 95, 255),
            (247, 251, 20),
        ];
        for (i, (r, g, b)) in transparent.into_iter().enumerate() {
            emit!(
                self,
                "<transparentLayer transparent='{}'><r>{r}</r><g>{g}</g><b>{b}</b></transparentLayer>",
                i + 1
            );
        }
        emit!(self);
        emit!(
            self,
            "<!-- **************************************** LAYERS **************************************** -->"
        );

        self.export_layers()?;
        self.export_arcs()?;
        self.export_pins()?;
        self.export_primitives()?;

        for level in 1..=3 {
            emit!(
                self,
                "<spiceHeader level='{level}'><spiceLine line='* SPICE deck for {description}'/></spiceHeader>"
            );
        }
        self.export_menu()?;
        self.export_foundry(&foundry)?;

        self.unnest();
        emit!(self, "</technology>");
        self.backtrace.pop();
        Ok(())
    }

    fn export_layers(&mut self) -> ExportResult<()> {
        self.backtrace.push(ExportContext::Layers);
        let tech = self.tech;
        for layer in tech.layers().iter() {
            self.export_layer(layer)?;
        }
        self.backtrace.pop();
        Ok(())
    }

    fn export_layer(&mut self, layer: &TechLayer) -> ExportResult<()> {
        self.backtrace.push(ExportContext::Layer(layer.name.clone()));
        let name = escape(&layer.name);
        let extra = if layer.name.starts_with("Dummy-") || layer.name.starts_with("Diff-1v8") {
            " extraFun=\"nonelectrical\""
        } else {
            ""
        };
        let style = &layer.style;

        emit!(self, "<layer name=\"{name}\" fun=\"{}\"{extra}>", layer.function);
        self.nest();
        emit!(
            self,
            "<opaqueColor r=\"{}\" g=\"{}\" b=\"{}\"/>",
            style.color.r,
            style.color.g,
            style.color.b
        );
        emit!(self, "<patternedOnDisplay>true</patternedOnDisplay> <!-- dummy value -->");
        emit!(self, "<patternedOnPrinter>true</patternedOnPrinter> <!-- dummy value -->");
        for row in style.pattern.rows() {
            emit!(self, "<pattern>{row}</pattern>");
        }
        emit!(self, "<outlined>{}</outlined>", style.outline);
        emit!(self, "<opacity>1.0</opacity>");
        emit!(self, "<foreground>true</foreground> <!-- dummy value -->");
        emit!(
            self,
            "<display3D thick=\"{}\" height=\"{}\" mode=\"NONE\" factor=\"0.0\"/>",
            fmt_f64(layer.thickness_3d),
            fmt_f64(layer.height_3d)
        );
        emit!(self, "<cifLayer cif=\"COG\"/> <!-- dummy value -->");
        emit!(self, "<pureLayerNode name=\"{name}\" port=\"port\">");
        self.nest();
        emit!(self, "<lambda>{}</lambda>", fmt_f64(layer.min_width()));
        for other in layer.connections() {
            let other = self.layer_name(other)?;
            emit!(self, "<portArc>{other}</portArc>");
        }
        if layer.is_signal() {
            emit!(self, "<portArc>{name}</portArc>");
        }
        self.unnest();
        emit!(self, "</pureLayerNode>");
        self.unnest();
        emit!(self, "</layer>");
        emit!(self);

        self.backtrace.pop();
        Ok(())
    }

    fn export_arcs(&mut self) -> ExportResult<()> {
        self.backtrace.push(ExportContext::Arcs);
        let tech = self.tech;
        for layer in tech.layers().iter().filter(|layer| layer.is_signal()) {
            let name = escape(&layer.name);
            let half = layer.min_width() / 2.;
            emit!(self, "<arcProto name=\"{name}\" fun=\"{}\">", layer.function);
            self.nest();
            emit!(self, "<wipable/>");
            emit!(self, "<extended>true</extended>");
            emit!(self, "<fixedAngle>true</fixedAngle>");
            emit!(self, "<angleIncrement>45</angleIncrement>");
            emit!(self, "<antennaRatio>400.0</antennaRatio> <!-- dummy value -->");
            emit!(self, "<arcLayer layer=\"{name}\" style=\"FILLED\">");
            self.nest();
            emit!(self, "<lambda>{}</lambda>", fmt_f64(half));
            self.unnest();
            emit!(self, "</arcLayer>");
            self.unnest();
            emit!(self, "</arcProto>");
        }
        self.backtrace.pop();
        Ok(())
    }

    fn export_pins(&mut self) -> ExportResult<()> {
        self.backtrace.push(ExportContext::Pins);
        let tech = self.tech;
        for layer in tech.layers().iter().filter(|layer| layer.is_signal()) {
            let name = escape(&layer.name);
            let half = layer.min_width() / 2.;
            let lambda_box = format!(
                "<lambdaBox klx=\"{}\" khx=\"{}\" kly=\"{}\" khy=\"{}\"/>",
                fmt_f64(-half),
                fmt_f64(half),
                fmt_f64(-half),
                fmt_f64(half)
            );

            emit!(self, "<primitiveNodeGroup>");
            self.nest();
            emit!(self, "<primitiveNode name=\"{name}-Pin\" fun=\"PIN\"/>");
            emit!(self, "<shrinkArcs/>");
            emit!(self, "<nodeBase>");
            self.nest();
            emit!(self, "<box>");
            self.nest();
            emit!(self, "{lambda_box}");
            self.unnest();
            emit!(self, "</box>");
            self.unnest();
            emit!(self, "</nodeBase>");
            emit!(self, "<nodeLayer layer=\"{name}\" style=\"CROSSED\">");
            self.nest();
            emit!(self, "<box>");
            self.nest();
            emit!(self, "{lambda_box}");
            self.unnest();
            emit!(self, "</box>");
            self.unnest();
            emit!(self, "</nodeLayer>");
            emit!(self, "<primitivePort name=\"port\">");
            self.nest();
            emit!(self, "<portAngle primary=\"0\" range=\"180\"/>");
            emit!(self, "<portTopology>0</portTopology>");
            emit!(self, "<box klx=\"0.0\" khx=\"0.0\" kly=\"0.0\" khy=\"0.0\">");
            self.nest();
            emit!(self, "<lambdaBox klx=\"0.0\" khx=\"0.0\" kly=\"0.0\" khy=\"0.0\"/>");
            self.unnest();
            emit!(self, "</box>");
            emit!(self, "<portArc>{name}</portArc>");
            for other in layer.connections() {
                let other = self.layer_name(other)?;
                emit!(self, "<portArc>{other}</portArc>");
            }
            self.unnest();
            emit!(self, "</primitivePort>");
            self.unnest();
            emit!(self, "</primitiveNodeGroup>");
            emit!(self);
        }
        self.backtrace.pop();
        Ok(())
    }

    fn export_primitives(&mut self) -> ExportResult<()> {
        let tech = self.tech;
        for (i, group) in tech.groups().enumerate() {
            self.backtrace.push(ExportContext::PrimitiveGroup(i));
            for key in group.primitives() {
                let primitive = self.ok(
                    tech.primitive(*key),
                    format!("group {i} refers to a missing primitive"),
                )?;
                emit!(self, "<primitiveNodeGroup>");
                self.nest();
                self.export_primitive(primitive)?;
                self.unnest();
                emit!(self, "</primitiveNodeGroup>");
            }
            self.backtrace.pop();
        }
        Ok(())
    }

    fn export_primitive(&mut self, primitive: &Primitive) -> ExportResult<()> {
        self.backtrace
            .push(ExportContext::Primitive(primitive.name().clone()));
        let name = escape(primitive.name());
        let base = primitive.node_base();

        emit!(
            self,
            "<primitiveNode name='{name}' fun='{}'/>",
            escape(primitive.function())
        );
        if primitive.default_width() != base.width() {
            emit!(
                self,
                "<defaultWidth><lambda>{}</lambda></defaultWidth>",
                fmt_f64(primitive.default_width() - base.width())
            );
        }
        if primitive.default_height() != base.height() {
            emit!(
                self,
                "<defaultHeight><lambda>{}</lambda></defaultHeight>",
                fmt_f64(primitive.default_height() - base.height())
            );
        }
        emit!(self, "<nodeBase>");
        self.nest();
        self.export_scaled_box(base.into())?;
        self.unnest();
        emit!(self, "</nodeBase>");

        for layer in primitive.layers() {
            self.export_node_layer(layer)?;
        }
        for port in primitive.ports() {
            self.export_port(primitive, port)?;
        }

        let (min_width, min_height) = primitive.min_dimensions();
        if min_width > 0. || min_height > 0. {
            emit!(
                self,
                "<minSizeRule width='{}' height='{}' rule='{name}.MINSIZE'/>",
                fmt_f64(min_width),
                fmt_f64(min_height)
            );
        }

        self.backtrace.pop();
        Ok(())
    }

    fn export_scaled_box(&mut self, extent: ScaledRect) -> ExportResult<()> {
        if extent.has_default_mult() {
            emit!(self, "<box>");
        } else {
            emit!(self, "<box{}>", box_attrs(extent.mult));
        }
        self.nest();
        emit!(self, "<lambdaBox{}/>", box_attrs(extent.add));
        self.unnest();
        emit!(self, "</box>");
        Ok(())
    }

    fn export_node_layer(&mut self, layer: &NodeLayer) -> ExportResult<()> {
        let name = self.layer_name(layer.layer)?;
        let port_num = match layer.port {
            Some(port) => port.index().to_string(),
            None => "-1".to_string(),
        };
        let electrical = if layer.electrical {
            ""
        } else {
            " electrical='false'"
        };

        match &layer.shape {
            LayerShape::Rectangle(rect) => {
                emit!(
                    self,
                    "<nodeLayer layer='{name}' style='{}' portNum='{port_num}'{electrical}>",
                    rect.style()
                );
                self.nest();
                self.export_scaled_box(rect.extent)?;
                self.unnest();
            }
            LayerShape::Round(round) => {
                emit!(
                    self,
                    "<nodeLayer layer='{name}' style='{}' portNum='{port_num}'{electrical}>",
                    round.style()
                );
                self.nest();
                emit!(self, "<points/>");
                emit!(self, "<techPoint xm='0.0' xa='0.0' ym='0.0' ya='0.0'/>");
                emit!(
                    self,
                    "<techPoint xm='{}' xa='{}' ym='0.0' ya='0.0'/>",
                    fmt_f64(round.mult),
                    fmt_f64(round.diameter / 2.)
                );
                self.unnest();
            }
            LayerShape::MultiCut(cut) => {
                self.assert(
                    layer.port.is_none(),
                    format!("cut array on layer {name} is bound to a port"),
                )?;
                emit!(
                    self,
                    "<nodeLayer layer='{name}' style='{}'{electrical}>",
                    cut.style()
                );
                self.nest();
                emit!(
                    self,
                    "<multicutbox sizex='{}' sizey='{}' sep1d='{}' sep2d='{}'>",
                    fmt_f64(cut.cut_width),
                    fmt_f64(cut.cut_height),
                    fmt_f64(cut.sep1d),
                    fmt_f64(cut.sep2d)
                );
                self.nest();
                emit!(self, "<lambdaBox{}/>", box_attrs(cut.centroids()));
                self.unnest();
                emit!(self, "</multicutbox>");
                self.unnest();
            }
        }
        emit!(self, "</nodeLayer>");
        Ok(())
    }

    fn export_port(&mut self, primitive: &Primitive, port: &Port) -> ExportResult<()> {
        let net = self.ok(
            primitive.net(port.net),
            format!("port {} refers to a missing net", port.name),
        )?;
        emit!(self, "<primitivePort name='{}'>", escape(&port.name));
        self.nest();
        emit!(self, "<portAngle primary='0' range='180'/>");
        emit!(
            self,
            "<portTopology>{}</portTopology> <!-- {} -->",
            net.id.index() + 1,
            comment_text(&net.comment)
        );
        self.export_scaled_box(port.extent)?;
        for layer in port.layers.iter() {
            let layer = self.layer_name(*layer)?;
            emit!(self, "<portArc>{layer}</portArc>");
        }
        self.unnest();
        emit!(self, "</primitivePort>");
        Ok(())
    }

    fn export_menu(&mut self) -> ExportResult<()> {
        self.backtrace.push(ExportContext::Menu);
        let menu = self.tech.menu_palette();
        emit!(self, "<menuPalette numColumns='{}'>", menu.columns);
        self.nest();
        for menu_box in menu.boxes.iter() {
            self.export_menu_box(menu_box)?;
        }
        self.unnest();
        emit!(self, "</menuPalette>");
        self.backtrace.pop();
        Ok(())
    }

    fn export_menu_box(&mut self, menu_box: &MenuBox) -> ExportResult<()> {
        emit!(self, "<menuBox>");
        self.nest();
        for entry in menu_box.entries.iter() {
            match entry {
                MenuEntry::Text(text) => emit!(self, "<menuText>{}</menuText>", escape(text)),
                MenuEntry::Arc(arc) => emit!(self, "<menuArc>{}</menuArc>", escape(arc)),
                MenuEntry::Node(node) => emit!(self, "<menuNode>{}</menuNode>", escape(node)),
                MenuEntry::NodeInst {
                    proto,
                    function,
                    rotation,
                    text,
                } => {
                    let rotation = rotation
                        .map(|r| format!(" rotation='{r}'"))
                        .unwrap_or_default();
                    let open = format!(
                        "<menuNodeInst protoName='{}'{rotation} function='{}'",
                        escape(proto),
                        escape(function)
                    );
                    match text {
                        Some(text) => {
                            emit!(self, "{open}>");
                            self.nest();
                            emit!(self, "<menuNodeText size='4' text='{}'/>", escape(text));
                            self.unnest();
                            emit!(self, "</menuNodeInst>");
                        }
                        None => emit!(self, "{open}/>"),
                    }
                }
            }
        }
        self.unnest();
        emit!(self, "</menuBox>");
        Ok(())
    }

    fn export_foundry(&mut self, foundry: &str) -> ExportResult<()> {
        self.backtrace.push(ExportContext::Foundry);
        let tech = self.tech;
        emit!(self, "<Foundry name='{foundry}'>");
        self.nest();
        for layer in tech.layers().iter() {
            let Some(gds) = &layer.gds else {
                continue;
            };
            let mapping = std::iter::once(format!("{}/{}", gds.major, gds.minor))
                .chain(layer.pin.iter().map(|pin| format!("{}/{}p", pin.major, pin.minor)))
                .join(",");
            emit!(
                self,
                "<layerGds layer='{}' gds='{mapping}'/>",
                escape(&layer.name)
            );
        }
        for layer in tech.layers().iter() {
            self.export_rules(layer)?;
        }
        self.unnest();
        emit!(self, "</Foundry>");
        self.backtrace.pop();
        Ok(())
    }

    fn export_rules(&mut self, layer: &TechLayer) -> ExportResult<()> {
        let name = escape(&layer.name);
        if let Some(rules) = &layer.rules {
            if rules.min_width > 0. {
                emit!(
                    self,
                    "<LayerRule ruleName='{name}.MINWIDTH' layerName='{name}' type='MINWID' when='ALL' value='{}'/>",
                    fmt_f64(rules.min_width)
                );
            }
            if rules.min_space > 0. {
                emit!(
                    self,
                    "<LayersRule ruleName='{name}.SPACING' layerNames='{{{name},{name}}}' type='UCONSPA' when='ALL' value='{}'/>",
                    fmt_f64(rules.min_space)
                );
            }
        }
        for (other, distance) in layer.spacing_rules() {
            let other = self.layer_name(other)?;
            emit!(
                self,
                "<LayersRule ruleName='{name}.TO.{other}.SPACING' layerNames='{{{name},{other}}}' type='SPACING' when='ALL' value='{}'/>",
                fmt_f64(distance)
            );
        }
        for (other, distance) in layer.unconnected_spacing_rules() {
            let other = self.layer_name(other)?;
            emit!(
                self,
                "<LayersRule ruleName='{name}.TO.{other}.USPACING' layerNames='{{{name},{other}}}' type='UCONSPA' when='ALL' value='{}'/>",
                fmt_f64(distance)
            );
        }
        for other in layer.forbidden() {
            let other = self.layer_name(other)?;
            emit!(
                self,
                "<LayersRule ruleName='{name}.AND.{other}.FORBIDDEN' layerNames='{{{name},{other}}}' type='SPACING' when='ALL' value='0'/>"
            );
        }
        Ok(())
    }
}

impl ErrorHelper for TechExporter<'_> {
    type Error = ExportError;
    fn err(&self, msg: impl Into<String>) -> ExportError {
        ExportError::Export {
            message: msg.into(),
            stack: self.backtrace.clone(),
        }
    }
}
