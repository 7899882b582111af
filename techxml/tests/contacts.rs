mod common;

use common::{fixture, via_spec};
use float_eq::assert_float_eq;
use techgeom::Rect;
use techxml::error::{ErrorContext, ErrorSource};
use techxml::primitive::via::{generate_contact_stack, generate_contacts, ContactSpec};
use techxml::primitive::{LayerShape, NodeShape};

#[test]
fn via_between_two_metals() {
    let mut f = fixture();
    let spec = via_spec(&f);
    let group = generate_contacts(&mut f.tech, &spec).unwrap();

    let keys = f.tech.group(group).unwrap().primitives().to_vec();
    let names: Vec<&str> = keys
        .iter()
        .map(|key| f.tech.primitive(*key).unwrap().name().as_str())
        .collect();
    assert_eq!(names, ["via-X", "via-P"]);

    for key in keys {
        let primitive = f.tech.primitive(key).unwrap();
        assert_eq!(primitive.ports().len(), 1);
        let port = &primitive.ports()[0];
        assert_eq!(
            port.layers.iter().copied().collect::<Vec<_>>(),
            [f.met1, f.met2]
        );

        let cuts: Vec<&LayerShape> = primitive
            .layers()
            .iter()
            .map(|layer| &layer.shape)
            .filter(|shape| matches!(shape, LayerShape::MultiCut(_)))
            .collect();
        assert_eq!(cuts.len(), 1);
        let bbox = cuts[0].bbox(primitive.node_base().dims());
        assert_eq!(bbox, Rect::square(0.15));

        let base = primitive.node_base();
        assert_float_eq!(base.width(), 0.15, abs <= 1e-12);
        assert_float_eq!(base.height(), 0.15, abs <= 1e-12);
    }
}

#[test]
fn parallel_variant_rotates_the_lower_enclosure() {
    let mut f = fixture();
    let spec = via_spec(&f);
    let group = generate_contacts(&mut f.tech, &spec).unwrap();
    let keys = f.tech.group(group).unwrap().primitives().to_vec();
    let x = f.tech.primitive(keys[0]).unwrap();
    let p = f.tech.primitive(keys[1]).unwrap();

    let boxes = |layers: &[techxml::primitive::NodeLayer]| -> Vec<Rect> {
        layers
            .iter()
            .filter_map(|layer| match &layer.shape {
                LayerShape::Rectangle(rect) => Some(rect.extent.add),
                _ => None,
            })
            .collect()
    };
    let (x_boxes, p_boxes) = (boxes(x.layers()), boxes(p.layers()));
    // Above first, then below.
    assert_eq!(x.layers()[0].layer, f.met2);
    assert_eq!(x.layers()[1].layer, f.met1);
    assert_eq!(p_boxes[0], x_boxes[0]);
    assert_eq!(p_boxes[1], x_boxes[1].swap_axes());
    assert_float_eq!(x_boxes[1].width(), 0.32, abs <= 1e-9);
    assert_float_eq!(x_boxes[1].height(), 0.26, abs <= 1e-9);
}

#[test]
fn stack_generates_one_group_per_transition() {
    let mut f = fixture();
    let terminal = ContactSpec::builder()
        .name("pad")
        .cut(f.via)
        .below(f.met2)
        .build()
        .unwrap();
    let specs = [via_spec(&f), terminal];
    let groups = generate_contact_stack(&mut f.tech, &specs).unwrap();
    assert_eq!(groups.len(), 2);

    // Without an enclosure the lower box is square, so only one variant exists.
    let pad = f.tech.group(groups[1]).unwrap().primitives().to_vec();
    assert_eq!(pad.len(), 1);
    let pad = f.tech.primitive(pad[0]).unwrap();
    assert_eq!(pad.name(), "pad-X");
    assert_eq!(
        pad.ports()[0].layers.iter().copied().collect::<Vec<_>>(),
        [f.met2]
    );
}

#[test]
fn contacts_need_rules_on_every_layer() {
    let mut f = fixture();
    let spec = ContactSpec::builder()
        .name("nvia")
        .cut(f.via)
        .below(f.nwell)
        .above(f.met1)
        .build()
        .unwrap();
    let err = generate_contacts(&mut f.tech, &spec).unwrap_err();
    assert!(matches!(err.source(), ErrorSource::MissingRules(name) if name.as_str() == "nwell"));
    assert_eq!(err.context(), [ErrorContext::GenerateContact("nvia".into())]);
    assert_eq!(f.tech.groups().count(), 0);
}
