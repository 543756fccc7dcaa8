use json_extract::{Selector, extract};

#[tokio::test]
async fn extraction_is_independent_of_read_chunk_size() {
    let doc = r#"[{"id":1,"payload":"xxxxxxxxxxxxxxxxxxxxxxxxxxxx"},
                  {"id":2,"payload":"yyyy"},
                  {"id":3,"payload":"zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz"}]"#;
    let selector = Selector::parse("*.id").unwrap();

    let mut previous = None;
    for chunk_size in [1, 2, 3, 7, 16, 64, 4096] {
        let values = extract(doc.as_bytes(), chunk_size, &selector)
            .await
            .unwrap();
        if let Some(prev) = &previous {
            assert_eq!(prev, &values, "mismatch at chunk_size={chunk_size}");
        }
        previous = Some(values);
    }
    assert_eq!(
        previous.unwrap(),
        vec![
            serde_json::json!(1),
            serde_json::json!(2),
            serde_json::json!(3)
        ]
    );
}

#[tokio::test]
async fn missing_field_yields_no_matches() {
    let doc = r#"{"a":1,"b":2}"#;
    let selector = Selector::parse("c").unwrap();
    let values = extract(doc.as_bytes(), 8, &selector).await.unwrap();
    assert!(values.is_empty());
}

#[tokio::test]
async fn syntax_error_is_reported() {
    let doc = r#"{"a": }"#;
    let selector = Selector::parse("a").unwrap();
    let err = extract(doc.as_bytes(), 8, &selector).await.unwrap_err();
    let message = err.to_string();
    assert!(!message.is_empty());
}
