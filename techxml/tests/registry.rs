mod common;

use common::{empty_tech, fixture, register};
use techxml::error::{ErrorContext, ErrorSource};
use techxml::layers::classify::LayerFunction;
use techxml::layers::pattern;
use techxml::layers::{GdsLayer, LayerParams, LayerRules};

#[test]
fn metals_are_signal_layers() {
    let mut tech = empty_tech();
    let m3 = register(&mut tech, "M3", (70, 20), None, Some(LayerRules::ws(0.3, 0.3)));
    let layer = tech.layers().get(m3).unwrap();
    assert!(layer.is_metal);
    assert_eq!(layer.metal_number, 3);
    assert!(layer.is_signal());
    assert_eq!(layer.function, LayerFunction::Metal(3));
}

#[test]
fn wells_are_not_signal_layers() {
    let mut tech = empty_tech();
    let nwell = register(&mut tech, "nwell", (64, 20), None, None);
    let layer = tech.layers().get(nwell).unwrap();
    assert!(!layer.is_metal);
    assert!(!layer.is_poly);
    assert!(!layer.is_diff);
    assert!(!layer.is_signal());
    assert_eq!(layer.metal_number, -1);
}

#[test]
fn gds_pairs_map_to_one_layer() {
    let mut f = fixture();
    let err = f
        .tech
        .register_layer(
            LayerParams::builder()
                .name("met1-alias")
                .gds(GdsLayer::named("met1.drawing", 68, 20))
                .build()
                .unwrap(),
        )
        .unwrap_err();
    match err.source() {
        ErrorSource::DuplicateGdsMapping {
            existing,
            requested,
            ..
        } => {
            assert_eq!(existing.as_str(), "met1");
            assert_eq!(requested.as_str(), "met1-alias");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        err.context(),
        [ErrorContext::RegisterLayer("met1-alias".into())]
    );
    assert!(f.tech.layers().get_key("met1-alias").is_none());

    // Rebinding a pair to its own layer is a no-op.
    f.tech.bind_gds(f.met1, GdsLayer::new(68, 20)).unwrap();
    f.tech.bind_gds(f.met1, GdsLayer::new(68, 5)).unwrap();
    assert_eq!(
        f.tech.layers().get_by_gds(&GdsLayer::new(68, 5)),
        Some(f.met1)
    );
    assert!(f.tech.bind_gds(f.met2, GdsLayer::new(68, 5)).is_err());
}

#[test]
fn derived_layers_follow_their_parent() {
    let mut tech = empty_tech();
    let m4 = tech
        .register_layer(
            LayerParams::builder()
                .name("M4")
                .gds(GdsLayer::new(71, 20))
                .dummy(GdsLayer::new(71, 4))
                .block(GdsLayer::new(71, 5))
                .rules(LayerRules::ws(0.3, 0.3))
                .build()
                .unwrap(),
        )
        .unwrap();
    let names: Vec<&str> = tech.layers().iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, ["M4", "M4-Dummy", "M4-Block"]);

    let parent = tech.layers().get(m4).unwrap();
    assert!(parent.derived.res.is_none());
    let dummy = tech.layers().get(parent.derived.dummy.unwrap()).unwrap();
    assert_eq!(dummy.style.pattern, pattern::VERY_SPARSE);
    assert_eq!(dummy.style.color, parent.style.color.halved());
    assert!(dummy.rules.is_none());
}

#[test]
fn names_are_normalized() {
    let mut tech = empty_tech();
    let key = register(&mut tech, "Vt.N CORE", (80, 20), None, None);
    assert_eq!(tech.layers().get(key).unwrap().name.as_str(), "Vt-N-CORE");
    assert_eq!(tech.layer("Vt:N-CORE").unwrap(), key);

    let err = tech.layer("nope").unwrap_err();
    assert!(matches!(err.source(), ErrorSource::LayerNotFound(_)));
}
