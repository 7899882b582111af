mod common;

use common::{empty_tech, fixture, via_spec};
use techgeom::Rect;
use techxml::error::{ErrorContext, ErrorSource};
use techxml::primitive::via::generate_contacts;
use techxml::primitive::PrimitiveParams;
use techxml::tech::Tech;

fn fixture_with_vias() -> Tech {
    let mut f = fixture();
    let spec = via_spec(&f);
    generate_contacts(&mut f.tech, &spec).unwrap();
    f.tech
}

/// Byte offset of the first occurrence of `needle`, panicking if it is absent.
fn position(xml: &str, needle: &str) -> usize {
    xml.find(needle)
        .unwrap_or_else(|| panic!("missing `{needle}` in output"))
}

#[test]
fn empty_technology_is_well_formed() {
    let xml = empty_tech().to_xml_string().unwrap();
    assert!(xml.starts_with("<?xml version='1.0' encoding='UTF-8'?>\n<technology name='empty'\n"));
    assert!(xml.contains("    <shortName>empty</shortName>\n"));
    assert!(xml.contains("<numMetals min='5' max='5' default='5'/>"));
    assert!(xml.contains("<resolution value='0.005'/>"));
    assert!(xml.contains("<menuPalette numColumns='3'>\n    </menuPalette>"));
    assert!(xml.contains("<Foundry name='FX'>\n    </Foundry>\n"));
    assert!(xml.ends_with("</technology>\n"));
    assert!(!xml.contains("<layer "));
    assert!(!xml.contains("<primitiveNodeGroup>"));
}

#[test]
fn sections_are_emitted_in_document_order() {
    let xml = fixture_with_vias().to_xml_string().unwrap();
    let order = [
        "<shortName>fixture</shortName>",
        "<transparentLayer transparent='1'>",
        "<layer name=\"nwell\"",
        "<layer name=\"met2\"",
        "<arcProto name=\"diff\"",
        "<arcProto name=\"met2\"",
        "<primitiveNode name=\"diff-Pin\" fun=\"PIN\"/>",
        "<primitiveNode name=\"met2-Pin\" fun=\"PIN\"/>",
        "<primitiveNode name='via-X' fun='CONTACT'/>",
        "<primitiveNode name='via-P' fun='CONTACT'/>",
        "<spiceHeader level='1'>",
        "<spiceHeader level='3'>",
        "<menuPalette numColumns='3'>",
        "<Foundry name='FX'>",
        "</technology>",
    ];
    let positions: Vec<usize> = order.iter().map(|needle| position(&xml, needle)).collect();
    assert!(
        positions.windows(2).all(|w| w[0] < w[1]),
        "sections out of order: {positions:?}"
    );

    // Layers without signal function get neither arcs nor pins.
    assert!(!xml.contains("<arcProto name=\"nwell\""));
    assert!(!xml.contains("<arcProto name=\"via\""));
    assert!(!xml.contains("via-Pin"));
}

#[test]
fn rules_and_gds_mappings() {
    let xml = fixture_with_vias().to_xml_string().unwrap();
    for line in [
        "<layerGds layer='nwell' gds='64/20'/>",
        "<layerGds layer='met1' gds='68/20,68/16p'/>",
        "<LayerRule ruleName='met1.MINWIDTH' layerName='met1' type='MINWID' when='ALL' value='0.14'/>",
        "<LayersRule ruleName='met1.SPACING' layerNames='{met1,met1}' type='UCONSPA' when='ALL' value='0.14'/>",
        "<LayersRule ruleName='poly.TO.diff.SPACING' layerNames='{poly,diff}' type='SPACING' when='ALL' value='0.075'/>",
        "<LayersRule ruleName='met1.TO.met2.USPACING' layerNames='{met1,met2}' type='UCONSPA' when='ALL' value='0.3'/>",
        "<LayersRule ruleName='via.AND.nwell.FORBIDDEN' layerNames='{via,nwell}' type='SPACING' when='ALL' value='0'/>",
    ] {
        assert!(xml.contains(line), "missing `{line}`");
    }
    assert!(!xml.contains("nwell.MINWIDTH"));
    assert!(position(&xml, "met1.MINWIDTH") < position(&xml, "met1.TO.met2.USPACING"));
}

#[test]
fn pins_are_sized_by_minimum_width() {
    let xml = fixture_with_vias().to_xml_string().unwrap();
    let pin = position(&xml, "<primitiveNode name=\"met1-Pin\"");
    let section = &xml[pin..];
    let section = &section[..position(section, "</primitiveNodeGroup>")];
    assert_eq!(
        section
            .matches("<lambdaBox klx=\"-0.07\" khx=\"0.07\" kly=\"-0.07\" khy=\"0.07\"/>")
            .count(),
        2
    );
    assert!(section.contains("<nodeLayer layer=\"met1\" style=\"CROSSED\">"));
    assert!(section.contains("<portArc>met1</portArc>\n"));
    assert!(section.contains("<portArc>via</portArc>\n"));
}

#[test]
fn elements_are_nested_and_balanced() {
    let xml = fixture_with_vias().to_xml_string().unwrap();
    assert_eq!(
        xml.matches("<primitiveNodeGroup>").count(),
        xml.matches("</primitiveNodeGroup>").count()
    );
    // Four signal layer pins and the two via variants.
    assert_eq!(xml.matches("<primitiveNodeGroup>").count(), 6);
    assert!(xml.contains("\n    <primitiveNodeGroup>\n        <primitiveNode name='via-X'"));
    assert!(xml.contains("\n        <nodeLayer layer='via' style='FILLED'>\n            <multicutbox "));
    assert!(!xml.lines().any(|line| line.ends_with(' ')));
}

#[test]
fn invalid_technologies_are_not_written() {
    let mut f = fixture();
    let group = f.tech.add_group();
    f.tech
        .add_primitive(
            group,
            PrimitiveParams::builder()
                .name("met1-Pin")
                .function("PIN")
                .node_base(Rect::square(0.14))
                .build()
                .unwrap(),
        )
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixture.xml");
    let err = f.tech.write_to_file(&path).unwrap_err();
    assert!(matches!(err.source(), ErrorSource::InvalidTech(msg) if msg.contains("met1-Pin")));
    assert!(matches!(err.context(), [ErrorContext::Task(_)]));
    assert!(!path.exists());
}

#[test]
fn file_and_stream_output_match() {
    let tech = fixture_with_vias();
    let expected = tech.to_xml_string().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixture.xml");
    tech.write_to_file(&path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), expected);

    let mut buf: Vec<u8> = Vec::new();
    tech.dump(&mut buf).unwrap();
    assert_eq!(String::from_utf8(buf).unwrap(), expected);
}

#[test]
fn unwritable_paths_report_the_file() {
    let tech = empty_tech();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("empty.xml");
    let err = tech.write_to_file(&path).unwrap_err();
    assert!(matches!(err.source(), ErrorSource::Io(_)));
    assert!(matches!(err.context(), [ErrorContext::CreateFile(p)] if *p == path));
}
