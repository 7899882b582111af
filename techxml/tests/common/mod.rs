#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use techgeom::Dims;
use techxml::layers::{GdsLayer, LayerKey, LayerParams, LayerRules};
use techxml::primitive::via::ContactSpec;
use techxml::tech::process::ProcessInfo;
use techxml::tech::Tech;

pub const DATA_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/tests");

/// Returns the path to the process config TOML file with the given name.
pub fn process_toml_path(name: &str) -> PathBuf {
    PathBuf::from(DATA_DIR).join(format!("{name}.toml"))
}

pub fn process(name: &str) -> ProcessInfo {
    ProcessInfo::builder()
        .name(name)
        .foundry("FX")
        .vdd(1.8)
        .grid(0.005)
        .num_layers_poly_or_metal(6)
        .build()
        .unwrap()
}

pub fn empty_tech() -> Tech {
    Tech::new(Arc::new(process("empty")))
}

pub fn register(
    tech: &mut Tech,
    name: &str,
    gds: (i16, i16),
    pin: Option<(i16, i16)>,
    rules: Option<LayerRules>,
) -> LayerKey {
    let mut params = LayerParams::builder()
        .name(name)
        .gds(GdsLayer::new(gds.0, gds.1));
    if let Some((major, minor)) = pin {
        params = params.pin(GdsLayer::new(major, minor));
    }
    if let Some(rules) = rules {
        params = params.rules(rules);
    }
    tech.register_layer(params.build().unwrap()).unwrap()
}

/// A small process: wells, diffusion, poly and two metals joined by a via.
pub struct Fixture {
    pub tech: Tech,
    pub nwell: LayerKey,
    pub diff: LayerKey,
    pub poly: LayerKey,
    pub met1: LayerKey,
    pub via: LayerKey,
    pub met2: LayerKey,
}

pub fn fixture() -> Fixture {
    let mut tech = Tech::new(Arc::new(process("fixture")));
    let nwell = register(&mut tech, "nwell", (64, 20), None, None);
    let diff = register(
        &mut tech,
        "diff",
        (65, 20),
        None,
        Some(LayerRules::ws(0.15, 0.27)),
    );
    let poly = register(
        &mut tech,
        "poly",
        (66, 20),
        Some((66, 16)),
        Some(LayerRules::ws(0.15, 0.21)),
    );
    let met1 = tech
        .register_layer(
            LayerParams::builder()
                .name("met1")
                .gds(GdsLayer::new(68, 20))
                .pin(GdsLayer::new(68, 16))
                .rules(LayerRules::wsa(0.14, 0.14, 0.083))
                .metal_number(1)
                .build()
                .unwrap(),
        )
        .unwrap();
    let via = register(
        &mut tech,
        "via",
        (68, 44),
        None,
        Some(LayerRules::ws(0.15, 0.17)),
    );
    let met2 = tech
        .register_layer(
            LayerParams::builder()
                .name("met2")
                .gds(GdsLayer::new(69, 20))
                .pin(GdsLayer::new(69, 16))
                .rules(LayerRules::wsa(0.14, 0.14, 0.083))
                .metal_number(2)
                .build()
                .unwrap(),
        )
        .unwrap();

    tech.add_spacing(poly, diff, 0.075).unwrap();
    tech.add_unconnected_spacing(met1, met2, 0.3).unwrap();
    tech.forbid(via, nwell).unwrap();
    tech.add_pure_layer_node_connection(met1, via).unwrap();

    Fixture {
        tech,
        nwell,
        diff,
        poly,
        met1,
        via,
        met2,
    }
}

/// The via between `met1` and `met2`.
pub fn via_spec(fixture: &Fixture) -> ContactSpec {
    ContactSpec::builder()
        .name("via")
        .cut(fixture.via)
        .below(fixture.met1)
        .above(fixture.met2)
        .below_enclosure(Dims::new(0.085, 0.055))
        .above_enclosure(Dims::new(0.055, 0.085))
        .build()
        .unwrap()
}
