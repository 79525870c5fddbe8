//! Collection lifecycle: mutation, re-indexing, configuration and the
//! equivalence of index-backed and candidate-backed evaluation.

use std::io::Write;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::NamedTempFile;
use tessera::prelude::*;

const WORDS: [&str; 8] = [
    "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta",
];

fn schema() -> Result<Schema<Document>> {
    Schema::new()
        .with_field(FieldDescriptor::path("text", FieldType::Text))?
        .with_field(FieldDescriptor::path("rank", FieldType::Integer))?
        .with_field(FieldDescriptor::path("score", FieldType::Float))?
        .with_field(FieldDescriptor::path("kind", FieldType::Keyword))
}

fn random_doc(rng: &mut StdRng, rank: i64) -> Document {
    let len = rng.random_range(1..5);
    let text: Vec<&str> = (0..len)
        .map(|_| WORDS[rng.random_range(0..WORDS.len())])
        .collect();
    Document::builder()
        .add_text("text", text.join(" "))
        .add_integer("rank", rank)
        .add_float("score", rng.random_range(0..100) as f64 / 10.0)
        .add_text("kind", if rng.random_bool(0.5) { "odd" } else { "even" })
        .build()
}

fn random_collection(seed: u64, size: i64) -> Result<Collection<Document>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut collection = Collection::new(schema()?)?;
    for rank in 0..size {
        collection.add(random_doc(&mut rng, rank))?;
    }
    Ok(collection)
}

fn sorted_ids(records: &[Document]) -> Vec<uuid::Uuid> {
    let mut ids: Vec<_> = records.iter().map(|d| d.id()).collect();
    ids.sort();
    ids
}

const QUERIES: [&str; 10] = [
    "text = alpha",
    "text = 'alpha beta'",
    "text = 'alpha gamma':3",
    "text like ep or text ~ deta ~1",
    "text != beta and rank < 20",
    "rank >= 10 and rank <= 30 or kind = odd",
    "score > 4.5 and not_present_in_or_branch = 1 or rank = 3",
    "rank in (1, 5, 9, 13) or text not in (alpha, beta)",
    "(text = eta or text = zeta) and (kind = even or score < 2)",
    "kind = odd order by score desc, rank take 7",
];

#[test]
fn test_index_and_candidate_evaluation_agree() -> Result<()> {
    let collection = random_collection(7, 60)?;
    let everything = collection.store().all();

    for wql in QUERIES {
        let statement = collection.parse(wql);
        let via_index = collection.apply(&statement)?;
        let via_candidates = collection.apply_to(&statement, everything.clone())?;
        assert_eq!(via_index, via_candidates, "results differ for `{wql}`");
    }
    Ok(())
}

#[test]
fn test_candidates_restrict_results() -> Result<()> {
    let collection = random_collection(11, 40)?;
    let everything = collection.store().all();
    let subset: Vec<Document> = everything.iter().step_by(3).cloned().collect();
    let subset_ids = sorted_ids(&subset);

    for wql in &QUERIES[..9] {
        let statement = collection.parse(wql);
        if statement.has_errors() {
            continue;
        }
        let restricted = collection.apply_to(&statement, subset.clone())?;
        let expected: Vec<_> = sorted_ids(&collection.apply(&statement)?)
            .into_iter()
            .filter(|id| subset_ids.binary_search(id).is_ok())
            .collect();
        assert_eq!(sorted_ids(&restricted), expected, "subset differs for `{wql}`");
    }
    Ok(())
}

#[test]
fn test_canonical_text_round_trips() -> Result<()> {
    let collection = random_collection(3, 30)?;

    for wql in QUERIES {
        let statement = collection.parse(wql);
        if statement.has_errors() {
            continue;
        }
        let canonical = statement.to_string();
        let reparsed = collection.parse(&canonical);
        assert!(!reparsed.has_errors(), "`{canonical}` does not reparse");
        assert_eq!(reparsed.to_string(), canonical);
        assert_eq!(
            collection.apply(&reparsed)?,
            collection.apply(&statement)?,
            "`{canonical}` selects different records than `{wql}`"
        );
    }
    Ok(())
}

#[test]
fn test_replace_and_delete() -> Result<()> {
    let mut collection = Collection::new(schema()?)?;
    let original = Document::builder()
        .add_text("text", "alpha beta")
        .add_integer("rank", 1)
        .build();
    collection.add(original.clone())?;

    let replacement = Document::builder()
        .id(original.id())
        .add_text("text", "gamma")
        .add_integer("rank", 2)
        .build();
    collection.add(replacement.clone())?;

    assert_eq!(collection.len(), 1);
    assert!(collection.query("text = alpha")?.is_empty());
    assert!(collection.query("rank = 1")?.is_empty());
    assert_eq!(collection.query("text = gamma")?, vec![replacement.clone()]);

    assert_eq!(collection.delete(&original.id())?, Some(replacement));
    assert!(collection.is_empty());
    assert!(collection.query("text = gamma")?.is_empty());
    assert_eq!(collection.delete(&original.id())?, None);
    Ok(())
}

#[test]
fn test_reindex_reports_progress_and_honours_cancellation() -> Result<()> {
    let mut collection = random_collection(5, 10)?;

    let mut seen = Vec::new();
    let indexed = collection.reindex(&CancellationToken::new(), |p| seen.push(p.processed))?;
    assert_eq!(indexed, 10);
    assert_eq!(seen, (1..=10).collect::<Vec<_>>());
    assert_eq!(collection.query("rank >= 0")?.len(), 10);

    let cancel = CancellationToken::new();
    let error = collection
        .reindex(&cancel, |p| {
            if p.processed == 4 {
                cancel.cancel();
            }
        })
        .unwrap_err();
    assert!(error.is_cancelled());

    // the records processed before cancellation stay queryable
    let prefix = collection.query("rank >= 0 order by rank")?;
    let ranks: Vec<_> = prefix
        .iter()
        .filter_map(|d| d.get_field("rank").cloned())
        .collect();
    assert_eq!(
        ranks,
        (0..4).map(FieldValue::Integer).collect::<Vec<_>>()
    );

    collection.reindex(&CancellationToken::new(), |_| {})?;
    assert_eq!(collection.query("rank >= 0")?.len(), 10);
    Ok(())
}

#[test]
fn test_existing_store_is_indexed() -> Result<()> {
    let docs: Vec<Document> = (0..3)
        .map(|rank| {
            Document::builder()
                .add_text("text", "preloaded")
                .add_integer("rank", rank)
                .build()
        })
        .collect();
    let store: MemoryStore<Document> = docs.iter().cloned().collect();

    let collection = Collection::with_store(schema()?, store, CollectionConfig::default())?;
    assert_eq!(collection.query("text = preloaded order by rank")?, docs);
    Ok(())
}

#[test]
fn test_configuration_file() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(
        file,
        r#"{{ "culture": "de-DE", "max_results": 2, "analyzer": "standard" }}"#
    )?;
    let config = CollectionConfig::from_file(file.path())?;
    assert_eq!(config.max_results, Some(2));

    let mut collection = Collection::with_config(schema()?, config)?;
    for rank in 0..5 {
        collection.add(
            Document::builder()
                .add_integer("rank", rank)
                .add_float("score", rank as f64 + 0.5)
                .build(),
        )?;
    }

    // every condition matches at most two records
    assert_eq!(collection.query("rank >= 0")?.len(), 2);
    // de-DE reads the comma as decimal separator
    assert_eq!(collection.query("score = '2,5'")?.len(), 1);

    let mut bad = NamedTempFile::new()?;
    writeln!(bad, r#"{{ "culture": "xx-XX" }}"#)?;
    assert!(matches!(
        CollectionConfig::from_file(bad.path()),
        Err(TesseraError::Config(_))
    ));
    Ok(())
}
