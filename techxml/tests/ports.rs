mod common;

use common::{fixture, Fixture};
use techgeom::{Rect, ScaledRect};
use techxml::primitive::PrimitiveParams;

/// Builds a four-terminal transistor whose ports are created in `order`.
fn transistor(order: &[&str]) -> String {
    let Fixture {
        mut tech,
        diff,
        poly,
        ..
    } = fixture();
    let group = tech.add_group();
    let key = tech
        .add_primitive(
            group,
            PrimitiveParams::builder()
                .name("Fet-N")
                .function("TRANMOS")
                .node_base(Rect::centered(0.5, 0.25))
                .default_width(1.)
                .build()
                .unwrap(),
        )
        .unwrap();
    let fet = tech.primitive_mut(key).unwrap();
    let gate = fet.add_net("gate");
    for name in order {
        let (extent, net, layer) = match *name {
            "gate-left" => (Rect::new(-0.075, 0., -0.075, 0.), Some(gate), poly),
            "gate-right" => (Rect::new(0.075, 0., 0.075, 0.), Some(gate), poly),
            "diff-top" => (Rect::new(0., 0.25, 0., 0.25), None, diff),
            _ => (Rect::new(0., -0.25, 0., -0.25), None, diff),
        };
        let port = fet
            .add_port(*name, ScaledRect::new(extent, Rect::square(0.)), net, [layer])
            .unwrap();
        fet.add_rect(layer, Some(port), Rect::square(0.)).unwrap();
    }
    fet.set_min_dimensions(0.15, 0.42);
    tech.to_xml_string().unwrap()
}

fn port_names(xml: &str) -> Vec<String> {
    xml.lines()
        .filter_map(|line| line.trim().strip_prefix("<primitivePort name='"))
        .filter_map(|rest| rest.split('\'').next())
        .map(str::to_string)
        .collect()
}

fn topology(xml: &str) -> Vec<u32> {
    xml.lines()
        .filter_map(|line| line.trim().strip_prefix("<portTopology>"))
        .filter_map(|rest| rest.split('<').next())
        .map(|n| n.parse().unwrap())
        .collect()
}

#[test]
fn ports_are_emitted_in_construction_order() {
    let order = ["gate-left", "diff-top", "gate-right", "diff-bot"];
    let xml = transistor(&order);
    let ports = port_names(&xml);
    assert_eq!(ports, order);

    // Pin nodes report topology 0; the transistor's gate ends share net 0.
    let fet: Vec<u32> = topology(&xml).into_iter().filter(|n| *n > 0).collect();
    assert_eq!(fet, [1, 2, 1, 3]);
    assert!(xml.contains("<portTopology>2</portTopology> <!-- diff-top -->"));

    let port_nums: Vec<&str> = xml
        .lines()
        .filter(|line| line.contains("portNum='") && !line.contains("portNum='-1'"))
        .filter_map(|line| line.split("portNum='").nth(1))
        .filter_map(|rest| rest.split('\'').next())
        .collect();
    assert_eq!(port_nums, ["0", "1", "2", "3"]);
}

#[test]
fn reordering_construction_reorders_output() {
    let order = ["diff-bot", "gate-right", "diff-top", "gate-left"];
    let xml = transistor(&order);
    assert_eq!(port_names(&xml), order);
    let fet: Vec<u32> = topology(&xml).into_iter().filter(|n| *n > 0).collect();
    assert_eq!(fet, [2, 1, 3, 1]);
}

#[test]
fn primitive_sizes_are_emitted_relative_to_the_node_base() {
    let xml = transistor(&["gate-left"]);
    assert!(xml.contains("<primitiveNode name='Fet-N' fun='TRANMOS'/>"));
    assert!(xml.contains("<defaultWidth><lambda>0.5</lambda></defaultWidth>"));
    assert!(!xml.contains("<defaultHeight>"));
    assert!(xml.contains("<minSizeRule width='0.15' height='0.42' rule='Fet-N.MINSIZE'/>"));
    assert!(xml.contains("<lambdaBox klx='-0.25' kly='-0.125' khx='0.25' khy='0.125'/>"));
    // Port extents do not scale with the node.
    assert!(xml.contains("<box klx='-0.0' kly='-0.0' khx='0.0' khy='0.0'>"));
}
