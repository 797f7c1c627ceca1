use ipfreeze::{freeze_tree, DagCborValues, TreeConfig};
use ipfreeze_utils::{
    dump::{dump_tree, thaw_file},
    info::FrozenInfo,
    load::load_tree,
    params::FrozenParams,
};
use libipld::Ipld;
use std::collections::BTreeMap;

const LISTING: &str = r#"
# networks with partial records
0.0.0.0/0     {"continent": "unknown"}
10.0.0.0/8    {"country": "XX"}
10.1.0.0/16   {"city": "somewhere"}
"#;

fn map(entries: &[(&str, &str)]) -> Ipld {
    Ipld::Map(
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), Ipld::String(v.to_string())))
            .collect::<BTreeMap<_, _>>(),
    )
}

#[test]
fn merged_listing_survives_freeze() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("frozen");
    let config = TreeConfig::ipv4().with_merge(true);
    let mut tree = load_tree(LISTING, config)?;
    let params = FrozenParams::from(config).to_bytes()?;
    let stats = freeze_tree(&mut tree, &path, &params, &DagCborValues)?;

    let thawed = thaw_file(&path)?;
    assert_eq!(*thawed.config(), config);
    assert_eq!(thawed.entries(), tree.entries());
    assert_eq!(
        thawed.lookup("10.1.2.3".parse()?),
        Some(&map(&[
            ("continent", "unknown"),
            ("country", "XX"),
            ("city", "somewhere")
        ]))
    );
    assert_eq!(
        thawed.lookup("10.2.0.1".parse()?),
        Some(&map(&[("continent", "unknown"), ("country", "XX")]))
    );
    assert_eq!(
        thawed.lookup("192.168.0.1".parse()?),
        Some(&map(&[("continent", "unknown")]))
    );

    let info = FrozenInfo::read(&path)?;
    assert_eq!(info.records, stats.records);
    assert_eq!(FrozenParams::from_bytes(&info.params)?.config()?, config);

    let mut out = Vec::new();
    let lines = dump_tree(&thawed, &mut out)?;
    assert_eq!(lines, stats.records);
    assert_eq!(String::from_utf8(out)?.lines().count(), lines);
    Ok(())
}

#[test]
fn replacing_listing_keeps_only_newest_values() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("frozen");
    let config = TreeConfig::ipv6();
    let mut tree = load_tree(LISTING, config)?;
    let params = FrozenParams::from(config).to_bytes()?;
    freeze_tree(&mut tree, &path, &params, &DagCborValues)?;

    let thawed = thaw_file(&path)?;
    assert_eq!(
        thawed.lookup("10.1.2.3".parse()?),
        Some(&map(&[("city", "somewhere")]))
    );
    assert_eq!(
        thawed.lookup("192.168.0.1".parse()?),
        Some(&map(&[("continent", "unknown")]))
    );
    // 0.0.0.0/0 is ::/96 in an IPv6 tree
    assert_eq!(thawed.lookup("2001:db8::1".parse()?), None);
    Ok(())
}
