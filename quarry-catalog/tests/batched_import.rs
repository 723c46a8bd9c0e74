//! Integration tests for batched writes and reader visibility

use std::path::Path;

use pretty_assertions::assert_eq;
use quarry_catalog::Catalog;

#[test]
fn batch_commit_is_all_or_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = Catalog::create(dir.path()).unwrap();
    catalog.put_encoding("none").unwrap();
    catalog.put_source(Path::new("/tmp/x")).unwrap();

    catalog.begin_batch().unwrap();
    for i in 0..100u64 {
        catalog.append_record(i * 2, i * 2 + 1).unwrap();
    }
    catalog.rollback_batch().unwrap();
    assert_eq!(catalog.stats().unwrap().records, 0);

    catalog.begin_batch().unwrap();
    for i in 0..100u64 {
        catalog.append_record(i * 2, i * 2 + 1).unwrap();
    }
    catalog.commit_batch().unwrap();
    assert_eq!(catalog.stats().unwrap().records, 100);
}

#[test]
fn committed_prefix_is_visible_to_a_second_reader() {
    let dir = tempfile::tempdir().unwrap();
    let writer = Catalog::create(dir.path()).unwrap();
    writer.put_encoding("none").unwrap();
    writer.put_source(Path::new("/tmp/x")).unwrap();

    writer.begin_batch().unwrap();
    let r = writer.append_record(0, 5).unwrap();
    let t = writer.upsert_token("alpha").unwrap();
    writer.add_posting(t, r).unwrap();
    writer.commit_batch().unwrap();

    // Second batch left uncommitted: a reader sees only the prefix.
    writer.begin_batch().unwrap();
    let r2 = writer.append_record(6, 11).unwrap();
    let t2 = writer.upsert_token("beta").unwrap();
    writer.add_posting(t2, r2).unwrap();

    let reader = Catalog::open(dir.path()).unwrap();
    assert_eq!(reader.stats().unwrap().records, 1);
    assert_eq!(reader.postings_for("alpha").unwrap(), vec![r]);
    assert!(reader.postings_for("beta").unwrap().is_empty());

    writer.commit_batch().unwrap();
    assert_eq!(reader.stats().unwrap().records, 2);
}

#[test]
fn full_import_shape_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = Catalog::create(dir.path()).unwrap();
    catalog.reset().unwrap();
    catalog.put_encoding("gzip").unwrap();
    catalog.put_source(Path::new("/data/big.gz")).unwrap();

    // Two records sharing a token, one rare token.
    catalog.begin_batch().unwrap();
    let r1 = catalog.append_record(0, 10).unwrap();
    let r2 = catalog.append_record(11, 21).unwrap();
    for record in [r1, r2] {
        let t = catalog.upsert_token("alpha").unwrap();
        catalog.add_posting(t, record).unwrap();
    }
    let rare = catalog.upsert_token("rare").unwrap();
    catalog.add_posting(rare, r2).unwrap();
    catalog.commit_batch().unwrap();

    let stats = catalog.stats().unwrap();
    assert_eq!(stats.records, 2);
    assert_eq!(stats.tokens, 2);
    assert_eq!(stats.occurrences, 3);

    let report = catalog.apply_acuity(2).unwrap();
    assert_eq!(report.tokens_before, 2);
    assert_eq!(report.tokens_after, 1);
    assert_eq!(catalog.postings_for("alpha").unwrap(), vec![r1, r2]);
    assert!(catalog.postings_for("rare").unwrap().is_empty());
}
