//! Name-driven classification of technology layers.
//!
//! A layer's electrical role, its Electric `fun` attribute and its default
//! rendering style are all derived from its name by an ordered rule table.
//! Rules are evaluated top to bottom and the first match wins; names that
//! match nothing fall back to [`RenderingStyle::default`].

use std::fmt::Display;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::pattern::{self, Pattern};
use super::style::{Color, Outline, RenderingStyle};

/// The `fun` attribute of a layer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum LayerFunction {
    Unknown,
    Substrate,
    /// A routing metal, numbered from 1 at the lowest metal.
    Metal(i32),
    Contact1,
    Poly1,
    Diff,
    WellN,
    WellP,
    ImplantN,
    ImplantP,
}

impl Display for LayerFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "UNKNOWN"),
            Self::Substrate => write!(f, "SUBSTRATE"),
            Self::Metal(n) => write!(f, "METAL{n}"),
            Self::Contact1 => write!(f, "CONTACT1"),
            Self::Poly1 => write!(f, "POLY1"),
            Self::Diff => write!(f, "DIFF"),
            Self::WellN => write!(f, "WELLN"),
            Self::WellP => write!(f, "WELLP"),
            Self::ImplantN => write!(f, "IMPLANTN"),
            Self::ImplantP => write!(f, "IMPLANTP"),
        }
    }
}

/// The result of classifying a layer name.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Classification {
    pub is_poly: bool,
    pub is_diff: bool,
    pub is_metal: bool,
    /// The metal ordinal, or -1 for non-metal layers.
    pub metal_number: i32,
    pub function: LayerFunction,
    pub style: RenderingStyle,
    /// The style for this layer's dummy-fill child, if the table prescribes one.
    pub dummy_style: Option<RenderingStyle>,
}

impl Classification {
    /// Signal layers participate in nets and get arcs and pins.
    #[inline]
    pub fn is_signal(&self) -> bool {
        self.is_poly || self.is_diff || self.is_metal
    }
}

lazy_static! {
    static ref METAL_NAME: Regex = Regex::new(r"^M([0-9][0-9]?)$").expect("failed to compile metal name regex");
    static ref RULES: Vec<ClassRule> = rule_table();
}

const WELL_NAMES: [&str; 6] = ["pwell", "nwell", "dnwell", "well-n", "well-p", "nwell-deep"];

const METAL_PALETTE: [Color; 7] = [
    Color::new(72, 189, 178),
    Color::new(224, 95, 255),
    Color::new(168, 171, 14),
    Color::new(44, 222, 45),
    Color::new(0, 255, 204),
    Color::new(153, 153, 255),
    Color::new(204, 0, 204),
];

/// The highest metal index with a palette entry.
const PALETTE_LIMIT: i32 = 11;

/// Derives the metal ordinal of a layer from its name.
///
/// `Aluminum` is the topmost metal. Otherwise names of the form `M<d>` or
/// `M<d><d>` carry their ordinal, and every other name is not a metal (-1).
pub fn metal_ordinal(name: &str, num_layers_poly_or_metal: i32) -> i32 {
    if name == "Aluminum" {
        return num_layers_poly_or_metal - 1;
    }
    METAL_NAME
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(-1)
}

/// Lowercased and prefix-stripped forms of a layer name used by the matchers.
struct Subject<'a> {
    name: &'a str,
    lname: String,
    iname: &'a str,
    is_poly: bool,
    is_diff: bool,
    is_metal: bool,
}

impl<'a> Subject<'a> {
    fn new(name: &'a str, metal_number: i32) -> Self {
        let lname = name.to_lowercase();
        let is_poly = lname.starts_with("poly") && !lname.starts_with("polymide");
        let is_diff = (lname.starts_with("diff")
            && !lname.starts_with("diff-1v8")
            && !lname.starts_with("diff-2v5"))
            || lname == "tap";
        Self {
            name,
            iname: name.strip_prefix("ZZZ-").unwrap_or(name),
            lname,
            is_poly,
            is_diff,
            is_metal: metal_number > -1,
        }
    }
}

enum Matcher {
    /// Case-sensitive prefix of the name.
    Prefix(&'static str),
    Metal,
    /// Any of these lowercase prefixes.
    LowerPrefix(&'static [&'static str]),
    LowerExact(&'static str),
    /// Lowercase prefix, with at least one more character following it.
    LowerPrefixExtended(&'static str),
    Diff,
    Poly,
    /// Exact match on the name with any `ZZZ-` prefix removed.
    Implant(&'static str),
}

impl Matcher {
    fn matches(&self, s: &Subject<'_>) -> bool {
        match self {
            Self::Prefix(p) => s.name.starts_with(p),
            Self::Metal => s.is_metal,
            Self::LowerPrefix(ps) => ps.iter().any(|p| s.lname.starts_with(p)),
            Self::LowerExact(n) => s.lname == *n,
            Self::LowerPrefixExtended(p) => s.lname.starts_with(p) && s.name.len() > p.len(),
            Self::Diff => s.is_diff,
            Self::Poly => s.is_poly,
            Self::Implant(n) => s.iname == *n,
        }
    }
}

enum Outcome {
    /// A fixed style, and a function if the rule assigns one.
    Fixed {
        style: RenderingStyle,
        function: Option<LayerFunction>,
    },
    /// The per-ordinal metal palette.
    MetalPalette,
}

struct ClassRule {
    matcher: Matcher,
    outcome: Outcome,
}

fn rule(matcher: Matcher, style: RenderingStyle, function: Option<LayerFunction>) -> ClassRule {
    ClassRule {
        matcher,
        outcome: Outcome::Fixed { style, function },
    }
}

fn implant(name: &'static str, r: u8, g: u8, b: u8, function: LayerFunction) -> ClassRule {
    rule(
        Matcher::Implant(name),
        RenderingStyle::filled(pattern::VERY_SPARSE, r, g, b),
        Some(function),
    )
}

fn via_style() -> RenderingStyle {
    RenderingStyle::new(
        pattern::EMPTY,
        Outline::Named(arcstr::literal!("PAT_T2")),
        Color::new(255, 255, 255),
    )
}

fn rule_table() -> Vec<ClassRule> {
    use LayerFunction::*;

    const PINK: (u8, u8, u8) = (255, 155, 192);
    let filled = |p: Pattern, (r, g, b): (u8, u8, u8)| RenderingStyle::filled(p, r, g, b);

    vec![
        rule(Matcher::Prefix("Electric-"), filled(pattern::EMPTY, (0, 0, 0)), None),
        ClassRule {
            matcher: Matcher::Metal,
            outcome: Outcome::MetalPalette,
        },
        rule(
            Matcher::LowerPrefix(&["cont", "licon1", "mcon"]),
            filled(pattern::SOLID, (0x20, 0x20, 0x20)),
            Some(Contact1),
        ),
        // The plain via layer keeps its initial function.
        rule(Matcher::LowerExact("via"), via_style(), None),
        rule(Matcher::LowerPrefixExtended("via"), via_style(), Some(Contact1)),
        rule(Matcher::LowerExact("gate"), filled(pattern::SOLID, PINK), Some(Poly1)),
        rule(
            Matcher::LowerExact("gate-dummy"),
            RenderingStyle::outlined(pattern::DENSE, PINK.0, PINK.1, PINK.2),
            Some(Poly1),
        ),
        rule(Matcher::Diff, filled(pattern::SOLID, (0, 135, 51)), Some(Diff)),
        rule(Matcher::Poly, filled(pattern::SOLID, PINK), Some(Poly1)),
        rule(Matcher::LowerExact("nwell"), filled(pattern::SLASH, (139, 99, 46)), Some(WellN)),
        rule(Matcher::LowerExact("pwell"), filled(pattern::BACKSLASH, (139, 99, 46)), Some(WellP)),
        rule(Matcher::LowerExact("well-n"), filled(pattern::SLASH, (139, 99, 46)), Some(WellN)),
        rule(Matcher::LowerExact("well-p"), filled(pattern::BACKSLASH, (139, 99, 46)), Some(WellP)),
        rule(Matcher::Implant("Select-PAct"), filled(pattern::SLASH, (255, 153, 0)), Some(ImplantP)),
        rule(Matcher::Implant("Select-NAct"), filled(pattern::BACKSLASH, (102, 255, 51)), Some(ImplantN)),
        rule(
            Matcher::Implant("Select-PTap"),
            RenderingStyle::outlined(pattern::EMPTY, 102, 255, 51),
            Some(ImplantP),
        ),
        rule(
            Matcher::Implant("Select-NTap"),
            RenderingStyle::outlined(pattern::EMPTY, 255, 153, 0),
            Some(ImplantN),
        ),
        implant("Vt-N-CORE", 102, 255, 51, ImplantN),
        implant("Vt-P-CORE", 102, 255, 51, ImplantP),
        implant("Vt-ELVT", 102, 255, 51, ImplantP),
        implant("Vt-N-ELVT", 102, 255, 51, ImplantN),
        implant("Vt-P-ELVT", 102, 255, 51, ImplantP),
        implant("Vt-ULVT", 102, 255, 51, ImplantP),
        implant("Vt-N-ULVT", 102, 255, 51, ImplantN),
        implant("Vt-P-ULVT", 102, 255, 51, ImplantP),
        implant("Vt-LVT", 102, 255, 51, ImplantP),
        implant("Vt-N-LVT", 102, 255, 51, ImplantN),
        implant("Vt-P-LVT", 102, 255, 51, ImplantP),
        implant("Vt-N-Gate", 102, 255, 51, ImplantN),
        implant("Vt-SVT", 255, 255, 0, ImplantP),
        implant("Vt-N-SVT", 255, 255, 0, ImplantN),
        implant("Vt-P-SVT", 255, 255, 0, ImplantP),
        implant("Vt-HVT", 255, 0, 0, ImplantP),
        implant("Vt-N-HVT", 255, 0, 0, ImplantN),
        implant("Vt-P-HVT", 255, 0, 0, ImplantP),
        implant("Vt-UHVT", 255, 0, 0, ImplantP),
        implant("Vt-N-UHVT", 255, 0, 0, ImplantN),
        implant("Vt-P-UHVT", 255, 0, 0, ImplantP),
        implant("Vt-EHVT", 255, 0, 0, ImplantP),
        implant("Vt-N-EHVT", 255, 0, 0, ImplantN),
        implant("Vt-P-EHVT", 255, 0, 0, ImplantP),
    ]
}

fn metal_style(index: i32) -> RenderingStyle {
    if (1..=PALETTE_LIMIT).contains(&index) {
        let color = METAL_PALETTE[(index - 1) as usize % METAL_PALETTE.len()];
        RenderingStyle::new(pattern::SOLID, Outline::None, color)
    } else {
        RenderingStyle::default()
    }
}

/// Classifies a normalized layer name.
///
/// `metal_number` is the layer's metal ordinal (-1 if it is not a metal) and
/// `lowest_metal` the ordinal of the process's lowest metal.
pub fn classify(name: &str, metal_number: i32, lowest_metal: i32) -> Classification {
    let subject = Subject::new(name, metal_number);

    let mut function = if WELL_NAMES.contains(&subject.lname.as_str()) {
        LayerFunction::Substrate
    } else {
        LayerFunction::Unknown
    };
    let mut style = RenderingStyle::default();
    let mut dummy_style = None;

    if let Some(rule) = RULES.iter().find(|rule| rule.matcher.matches(&subject)) {
        match &rule.outcome {
            Outcome::Fixed {
                style: s,
                function: f,
            } => {
                style = s.clone();
                if let Some(f) = f {
                    function = *f;
                }
            }
            Outcome::MetalPalette => {
                let index = metal_number - lowest_metal + 1;
                function = LayerFunction::Metal(index);
                style = metal_style(index);
                dummy_style = Some(style.dummy_fill());
            }
        }
    }

    Classification {
        is_poly: subject.is_poly,
        is_diff: subject.is_diff,
        is_metal: subject.is_metal,
        metal_number,
        function,
        style,
        dummy_style,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_name(name: &str) -> Classification {
        classify(name, metal_ordinal(name, 6), 1)
    }

    #[test]
    fn metal_ordinals() {
        assert_eq!(metal_ordinal("M1", 6), 1);
        assert_eq!(metal_ordinal("M12", 6), 12);
        assert_eq!(metal_ordinal("M123", 6), -1);
        assert_eq!(metal_ordinal("Met1", 6), -1);
        assert_eq!(metal_ordinal("M", 6), -1);
        assert_eq!(metal_ordinal("Aluminum", 6), 5);
    }

    #[test]
    fn m3_is_a_signal_metal() {
        let c = classify_name("M3");
        assert!(c.is_metal);
        assert_eq!(c.metal_number, 3);
        assert!(c.is_signal());
        assert_eq!(c.function, LayerFunction::Metal(3));
        assert_eq!(c.style.color, Color::new(168, 171, 14));
        assert_eq!(c.function.to_string(), "METAL3");
    }

    #[test]
    fn nwell_is_not_a_signal() {
        let c = classify_name("nwell");
        assert!(!c.is_metal);
        assert!(!c.is_poly);
        assert!(!c.is_diff);
        assert!(!c.is_signal());
        assert_eq!(c.function, LayerFunction::WellN);
        assert_eq!(c.style.pattern, pattern::SLASH);
    }

    #[test]
    fn metal_function_is_relative_to_lowest_metal() {
        let c = classify("M0", 0, 0);
        assert_eq!(c.function, LayerFunction::Metal(1));
        assert_eq!(c.style.color, METAL_PALETTE[0]);
    }

    #[test]
    fn metal_palette_wraps_then_falls_back() {
        assert_eq!(classify_name("M8").style.color, METAL_PALETTE[0]);
        assert_eq!(classify_name("M11").style.color, METAL_PALETTE[3]);
        let c = classify_name("M12");
        assert_eq!(c.style, RenderingStyle::default());
        assert_eq!(c.dummy_style.unwrap().color, Color::new(50, 50, 50));
    }

    #[test]
    fn metal_dummy_style() {
        let c = classify_name("M1");
        let dummy = c.dummy_style.unwrap();
        assert_eq!(dummy.pattern, pattern::VERY_SPARSE);
        assert_eq!(dummy.outline, Outline::Solid);
        assert_eq!(dummy.color, Color::new(36, 94, 89));
        assert!(classify_name("poly").dummy_style.is_none());
    }

    #[test]
    fn contacts_and_vias() {
        let c = classify_name("licon1");
        assert_eq!(c.function, LayerFunction::Contact1);
        assert_eq!(c.style.color, Color::new(0x20, 0x20, 0x20));

        let via = classify_name("via");
        assert_eq!(via.function, LayerFunction::Unknown);
        assert_eq!(via.style.outline.to_string(), "PAT_T2");

        let via2 = classify_name("via2");
        assert_eq!(via2.function, LayerFunction::Contact1);
        assert_eq!(via2.style, via.style);
    }

    #[test]
    fn poly_and_diff_flags() {
        assert!(classify_name("poly").is_poly);
        assert!(!classify_name("polymide").is_poly);
        assert!(classify_name("diff").is_diff);
        assert!(classify_name("tap").is_diff);
        assert!(!classify_name("Diff-1v8").is_diff);
        assert_eq!(classify_name("diff").function, LayerFunction::Diff);
        assert_eq!(classify_name("Poly").function, LayerFunction::Poly1);
    }

    #[test]
    fn gate_precedes_other_rules() {
        let c = classify_name("gate-dummy");
        assert_eq!(c.function, LayerFunction::Poly1);
        assert_eq!(c.style.outline, Outline::Solid);
        assert_eq!(c.style.pattern, pattern::DENSE);
    }

    #[test]
    fn implants_strip_zzz_prefix() {
        let c = classify_name("ZZZ-Vt-N-HVT");
        assert_eq!(c.function, LayerFunction::ImplantN);
        assert_eq!(c.style.color, Color::new(255, 0, 0));
        assert_eq!(classify_name("Select-PTap").style.outline, Outline::Solid);
    }

    #[test]
    fn substrate_default_function() {
        let c = classify_name("dnwell");
        assert_eq!(c.function, LayerFunction::Substrate);
        assert_eq!(c.style, RenderingStyle::default());
    }

    #[test]
    fn unmatched_names_fall_back() {
        let c = classify_name("hvtp");
        assert_eq!(c.function, LayerFunction::Unknown);
        assert_eq!(c.style, RenderingStyle::default());
        assert_eq!(classify_name("Electric-Text").style.color, Color::new(0, 0, 0));
    }
}
