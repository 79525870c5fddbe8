//! End-to-end WQL scenarios over a document collection.

use tessera::prelude::*;
use tessera::wql::ErrorKind;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn schema() -> Result<Schema<Document>> {
    Schema::new()
        .with_field(FieldDescriptor::path("text", FieldType::Text))?
        .with_field(FieldDescriptor::path("rank", FieldType::Integer))?
        .with_field(FieldDescriptor::path("category", FieldType::Keyword))?
        .with_field(FieldDescriptor::path("address.city", FieldType::Text))
}

fn doc(text: &str, rank: i64, category: &str) -> Document {
    Document::builder()
        .add_text("text", text)
        .add_integer("rank", rank)
        .add_text("category", category)
        .build()
}

fn hello_collection() -> Result<(Collection<Document>, Document, Document)> {
    let mut collection = Collection::new(schema()?)?;
    let helena = doc("Hello Helena", 1, "greeting");
    let helge = doc("Hello Helge", 2, "greeting");
    collection.add(helena.clone())?;
    collection.add(helge.clone())?;
    Ok((collection, helena, helge))
}

#[test]
fn test_hello_helena() -> Result<()> {
    init_logger();
    let (collection, helena, helge) = hello_collection()?;

    assert_eq!(collection.query("text = Helena")?, vec![helena.clone()]);

    let mut both = collection.query("text = Hello")?;
    both.sort_by_key(|d| d.id());
    let mut expected = vec![helena.clone(), helge];
    expected.sort_by_key(|d| d.id());
    assert_eq!(both, expected);

    let statement = collection.parse("text = 'Helena'");
    assert!(!statement.has_errors());
    assert_eq!(collection.apply(&statement)?, vec![helena]);
    Ok(())
}

#[test]
fn test_unknown_attribute_points_at_token() -> Result<()> {
    let (collection, _, _) = hello_collection()?;
    let wql = "text = 'Helena' and not_a_field = 1";
    let statement = collection.parse(wql);

    let error = statement.error().expect("statement should carry an error");
    assert_eq!(error.kind, ErrorKind::UnknownAttribute);
    assert_eq!(error.offset, wql.find("not_a_field").unwrap());
    assert_eq!(error.length, "not_a_field".len());
    assert!(collection.apply(&statement)?.is_empty());
    Ok(())
}

#[test]
fn test_order_desc_take_one() -> Result<()> {
    let mut collection = Collection::new(schema()?)?;
    collection.add(doc("banana", 1, "fruit"))?;
    let last = doc("cherry", 2, "fruit");
    collection.add(last.clone())?;
    collection.add(doc("apple", 3, "fruit"))?;

    assert_eq!(collection.query("order by text desc take 1")?, vec![last]);
    Ok(())
}

#[test]
fn test_boolean_algebra() -> Result<()> {
    let mut collection = Collection::new(schema()?)?;
    for i in 0..20 {
        let category = if i % 3 == 0 { "red" } else { "blue" };
        collection.add(doc(&format!("item number {i}"), i, category))?;
    }

    let a = collection.query("category = red")?;
    let b = collection.query("rank >= 10")?;
    let ab = collection.query("category = red and rank >= 10")?;
    let ba = collection.query("rank >= 10 and category = red")?;
    assert_eq!(ab, ba);
    assert!(ab.iter().all(|d| a.contains(d) && b.contains(d)));
    assert_eq!(ab.len(), a.iter().filter(|d| b.contains(d)).count());

    let a_or_b = collection.query("category = red or rank >= 10")?;
    let b_or_a = collection.query("rank >= 10 or category = red")?;
    assert_eq!(a_or_b, b_or_a);
    assert!(a.iter().chain(&b).all(|d| a_or_b.contains(d)));

    let not_red = collection.query("category != red")?;
    assert_eq!(not_red.len() + a.len(), 20);
    let in_set = collection.query("category in (red, blue)")?;
    assert_eq!(in_set.len(), 20);
    assert!(collection.query("category not in (red, blue)")?.is_empty());
    Ok(())
}

#[test]
fn test_pagination_window() -> Result<()> {
    let mut collection = Collection::new(schema()?)?;
    for i in 0..30 {
        collection.add(doc("page", i, "x"))?;
    }
    let ranks = |wql: &str| -> Result<Vec<i64>> {
        Ok(collection
            .query(wql)?
            .iter()
            .filter_map(|d| match d.get_field("rank") {
                Some(FieldValue::Integer(rank)) => Some(*rank),
                _ => None,
            })
            .collect())
    };

    assert_eq!(ranks("order by rank skip 10 take 5")?, vec![10, 11, 12, 13, 14]);
    assert_eq!(ranks("order by rank skip 28 take 5")?, vec![28, 29]);
    assert_eq!(ranks("order by rank skip 5 take 5 skip 2")?, vec![7, 8, 9]);
    assert!(ranks("order by rank skip 3 take 0")?.is_empty());
    assert!(ranks("take 0")?.is_empty());
    Ok(())
}

#[test]
fn test_text_retrieval_methods() -> Result<()> {
    let mut collection = Collection::new(schema()?)?;
    let fox = doc("the quick brown fox", 1, "animal");
    let dog = doc("the quick red dog", 2, "animal");
    collection.add(fox.clone())?;
    collection.add(dog.clone())?;

    assert_eq!(collection.query("text = 'quick brown'")?, vec![fox.clone()]);
    assert!(collection.query("text = 'quick fox'")?.is_empty());
    assert_eq!(collection.query("text = 'quick fox' :2")?, vec![fox.clone()]);
    assert_eq!(collection.query("text like bro")?, vec![fox.clone()]);
    assert_eq!(collection.query("text ~ dgo ~2")?, vec![dog.clone()]);
    assert_eq!(collection.query("text ~ 'dog' ~0")?, vec![dog]);
    assert_eq!(collection.query("text > 'quick'")?.len(), 2);
    Ok(())
}

#[test]
fn test_nested_fields_and_keywords() -> Result<()> {
    let mut collection = Collection::new(schema()?)?;
    let address = Document::builder().add_text("city", "New York").build();
    let nested = Document::builder()
        .add_text("category", "Science Fiction")
        .add_object("address", address)
        .build();
    collection.add(nested.clone())?;
    collection.add(doc("other", 1, "science"))?;

    assert_eq!(collection.query("address.city = york")?, vec![nested.clone()]);
    assert_eq!(collection.query("ADDRESS.CITY = 'new york'")?, vec![nested.clone()]);
    assert_eq!(collection.query("category = 'science fiction'")?, vec![nested]);
    assert_eq!(collection.query("category = science")?.len(), 1);
    Ok(())
}

#[test]
fn test_functions_in_conditions() -> Result<()> {
    let schema = Schema::new()
        .with_field(FieldDescriptor::path("title", FieldType::Text))?
        .with_field(FieldDescriptor::path("due", FieldType::DateTime))?;
    let mut collection = Collection::new(schema)?;

    let now = chrono::Utc::now();
    let overdue = Document::builder()
        .add_text("title", "Overdue")
        .add_datetime("due", now - chrono::Duration::days(3))
        .build();
    let upcoming = Document::builder()
        .add_text("title", "Upcoming")
        .add_datetime("due", now + chrono::Duration::days(3))
        .build();
    collection.add(overdue.clone())?;
    collection.add(upcoming.clone())?;

    assert_eq!(collection.query("due < now()")?, vec![overdue.clone()]);
    assert_eq!(collection.query("due >= today()")?, vec![upcoming.clone()]);
    assert_eq!(collection.query("due < day(-1)")?, vec![overdue]);
    assert_eq!(collection.query("title = lower('UPCOMING')")?, vec![upcoming]);

    // the statement is well formed, but the date it names does not exist
    let statement = collection.parse("due < day(200000000000000)");
    assert!(!statement.has_errors());
    assert!(matches!(
        collection.apply(&statement),
        Err(TesseraError::Query(_))
    ));
    Ok(())
}

#[test]
fn test_culture_specific_numbers() -> Result<()> {
    let schema = Schema::new().with_field(FieldDescriptor::path("price", FieldType::Float))?;
    let config = CollectionConfig::new().with_culture("de-DE");
    let mut collection = Collection::with_config(schema, config)?;

    let cheap = Document::builder().add_float("price", 2.5).build();
    let pricey = Document::builder().add_float("price", 1500.0).build();
    collection.add(cheap.clone())?;
    collection.add(pricey.clone())?;

    assert_eq!(collection.query("price = '2,5'")?, vec![cheap.clone()]);
    assert_eq!(collection.query("price >= 1.000")?, vec![pricey]);

    let invariant = collection.parse_with_culture("price < 2.6", Culture::invariant());
    assert_eq!(collection.apply(&invariant)?, vec![cheap]);
    Ok(())
}

#[test]
fn test_quoted_numbers_follow_statement_culture() -> Result<()> {
    let schema = Schema::new()
        .with_field(FieldDescriptor::path("price", FieldType::Float))?
        .with_field(FieldDescriptor::path("label", FieldType::Text))?;
    let mut collection = Collection::new(schema)?;

    let cheap = Document::builder()
        .add_float("price", 1.5)
        .add_text("label", "1,5")
        .build();
    collection.add(cheap.clone())?;
    collection.add(Document::builder().add_float("price", 15.0).build())?;

    let german = Culture::from_name("de-DE")?;
    let statement = collection.parse_with_culture("price = '1,5'", german.clone());
    assert_eq!(collection.apply(&statement)?, vec![cheap.clone()]);

    let statement = collection.parse_with_culture("price in ('1,5', 2)", german.clone());
    assert_eq!(collection.apply(&statement)?, vec![cheap.clone()]);

    // text fields keep the quoted text as written
    let statement = collection.parse_with_culture("label = '1,5'", german);
    assert_eq!(collection.apply(&statement)?, vec![cheap]);
    Ok(())
}

#[test]
fn test_parse_errors_yield_nothing() -> Result<()> {
    let (collection, _, _) = hello_collection()?;
    for wql in [
        "text = 'unterminated",
        "text == a",
        "(text = a",
        "text in 1",
        "rank > 1 take many",
        "text = nothing()",
    ] {
        let statement = collection.parse(wql);
        assert!(statement.has_errors(), "'{wql}' should not parse");
        assert!(collection.apply(&statement)?.is_empty());
        assert!(collection.query(wql).is_err());
    }
    Ok(())
}
