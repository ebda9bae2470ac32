//! Document builder.
//!
//! Turns the raw payload rows of a job into normalized product documents
//! plus a parse-failure count. Payload shapes vary by tenant integration:
//! a bare array, an enveloped collection (`documents`/`items`/`products`),
//! a singular `document` object, a bare object, or CSV rows. Field names
//! vary too, so extraction walks ordered synonym lists per logical field.
//!
//! Policy for malformed-but-object-shaped elements: they still build a
//! placeholder document (generated id, raw-text embedding fallback). Only
//! unparsable payloads and non-object elements count as parse failures.

use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use catalog_indexer_shared::{ProductIndexDocument, ProductRaw, SourceType};

/// Envelope fields that may hold the product collection, tried in order.
const COLLECTION_FIELDS: [&str; 3] = ["documents", "items", "products"];

/// Synonyms per logical field, first present non-empty value wins.
const ID_FIELDS: [&str; 3] = ["id", "productId", "product_id"];
const NAME_FIELDS: [&str; 2] = ["name", "title"];
const DESCRIPTION_FIELDS: [&str; 2] = ["description", "summary"];
const BRAND_FIELDS: [&str; 1] = ["brand"];
const CATEGORY_FIELDS: [&str; 2] = ["category", "category_name"];
const PRICE_FIELDS: [&str; 3] = ["price", "unit_price", "amount"];
const IN_STOCK_FIELDS: [&str; 3] = ["in_stock", "inStock", "available"];
const ATTRIBUTE_FIELDS: [&str; 3] = ["attributes", "attrs", "metadata"];

/// Output of one build pass over a job's raw rows.
#[derive(Debug)]
pub struct BuiltDocuments {
    pub documents: Vec<ProductIndexDocument>,
    pub parse_failures: usize,
}

/// Build index documents from all raw rows of a job.
pub fn build_documents(
    rows: &[ProductRaw],
    source_type: SourceType,
    tenant_id: Uuid,
) -> BuiltDocuments {
    let mut documents = Vec::new();
    let mut parse_failures = 0;

    for row in rows {
        let elements = match parse_row(row, source_type) {
            Ok((elements, bad_records)) => {
                parse_failures += bad_records;
                elements
            }
            Err(()) => {
                parse_failures += 1;
                continue;
            }
        };

        for (seq, element) in elements.into_iter().enumerate() {
            match element {
                Value::Object(obj) => {
                    documents.push(build_document(&obj, row, seq, tenant_id));
                }
                _ => parse_failures += 1,
            }
        }
    }

    debug!(
        documents = documents.len(),
        parse_failures, "Built documents from raw rows"
    );

    BuiltDocuments {
        documents,
        parse_failures,
    }
}

/// Parse one raw row into product elements.
///
/// Returns the elements plus the count of malformed records found inside
/// the row (CSV only); `Err` means the whole row is unparsable.
fn parse_row(row: &ProductRaw, source_type: SourceType) -> Result<(Vec<Value>, usize), ()> {
    if source_type == SourceType::Csv {
        return parse_csv_payload(&row.payload);
    }

    let value: Value = serde_json::from_str(&row.payload).map_err(|_| ())?;
    Ok((extract_collection(value), 0))
}

/// Find the product collection inside a parsed payload.
fn extract_collection(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => {
            // Probe the shape before removing, so a non-collection value
            // under an envelope name stays on the fallback product
            for field in COLLECTION_FIELDS {
                if matches!(obj.get(field), Some(Value::Array(_))) {
                    if let Some(Value::Array(items)) = obj.remove(field) {
                        return items;
                    }
                }
            }
            if matches!(obj.get("document"), Some(Value::Object(_))) {
                if let Some(single) = obj.remove("document") {
                    return vec![single];
                }
            }
            // No envelope: the whole object is one product
            vec![Value::Object(obj)]
        }
        other => vec![other],
    }
}

/// Parse a CSV payload into one object per record, headers as keys.
fn parse_csv_payload(payload: &str) -> Result<(Vec<Value>, usize), ()> {
    let mut reader = csv::Reader::from_reader(payload.as_bytes());
    let headers = reader.headers().map_err(|_| ())?.clone();

    let mut elements = Vec::new();
    let mut bad_records = 0;

    for record in reader.records() {
        let Ok(record) = record else {
            bad_records += 1;
            continue;
        };

        let mut obj = Map::new();
        for (header, field) in headers.iter().zip(record.iter()) {
            obj.insert(header.to_string(), Value::String(field.to_string()));
        }
        elements.push(Value::Object(obj));
    }

    Ok((elements, bad_records))
}

/// Build one document from an object element.
fn build_document(
    obj: &Map<String, Value>,
    row: &ProductRaw,
    seq: usize,
    tenant_id: Uuid,
) -> ProductIndexDocument {
    let id = first_string(obj, &ID_FIELDS).unwrap_or_else(|| format!("{}-{}", row.id, seq));

    let mut doc = ProductIndexDocument::new(id, tenant_id);
    doc.name = first_string(obj, &NAME_FIELDS);
    doc.description = first_string(obj, &DESCRIPTION_FIELDS);
    doc.brand = first_string(obj, &BRAND_FIELDS);
    doc.category = first_string(obj, &CATEGORY_FIELDS);
    doc.price = first_number(obj, &PRICE_FIELDS);
    doc.in_stock = first_bool(obj, &IN_STOCK_FIELDS);
    doc.attributes = first_object(obj, &ATTRIBUTE_FIELDS);
    doc.embedding_text = embedding_text(&doc, &row.payload);
    doc
}

/// Space-joined concatenation of the searchable text fields; falls back to
/// the raw payload so no document has an empty embedding input.
fn embedding_text(doc: &ProductIndexDocument, raw_payload: &str) -> String {
    let parts: Vec<&str> = [&doc.name, &doc.description, &doc.brand, &doc.category]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .filter(|s| !s.trim().is_empty())
        .collect();

    if parts.is_empty() {
        raw_payload.to_string()
    } else {
        parts.join(" ")
    }
}

/// First present non-empty string among the candidate fields.
fn first_string(obj: &Map<String, Value>, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| {
        obj.get(*field)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    })
}

/// First present numeric (or numeric-string) value among the candidates.
fn first_number(obj: &Map<String, Value>, fields: &[&str]) -> Option<f64> {
    fields.iter().find_map(|field| match obj.get(*field) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// First present boolean (or boolean-like string) value among the
/// candidates.
fn first_bool(obj: &Map<String, Value>, fields: &[&str]) -> Option<bool> {
    fields.iter().find_map(|field| match obj.get(*field) {
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// First present object value among the candidates, passed through as is.
fn first_object(obj: &Map<String, Value>, fields: &[&str]) -> Option<Value> {
    fields.iter().find_map(|field| {
        obj.get(*field)
            .filter(|v| v.is_object())
            .cloned()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn raw_row(payload: &str) -> ProductRaw {
        ProductRaw {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            payload: payload.to_string(),
            created_at: Utc::now(),
        }
    }

    fn build(payload: &str) -> BuiltDocuments {
        build_documents(&[raw_row(payload)], SourceType::Json, Uuid::new_v4())
    }

    #[test]
    fn test_bare_array_payload() {
        let built = build(r#"[{"id":"a","name":"Shoe"},{"id":"b","name":"Hat"}]"#);
        assert_eq!(built.documents.len(), 2);
        assert_eq!(built.parse_failures, 0);
        assert_eq!(built.documents[0].id, "a");
        assert_eq!(built.documents[1].name.as_deref(), Some("Hat"));
    }

    #[test]
    fn test_enveloped_collections() {
        for envelope in ["documents", "items", "products"] {
            let payload = format!(r#"{{"{}": [{{"id":"x","name":"One"}}]}}"#, envelope);
            let built = build(&payload);
            assert_eq!(built.documents.len(), 1, "envelope {}", envelope);
            assert_eq!(built.documents[0].id, "x");
        }
    }

    #[test]
    fn test_singular_document_field() {
        let built = build(r#"{"document": {"id":"solo","name":"Only"}}"#);
        assert_eq!(built.documents.len(), 1);
        assert_eq!(built.documents[0].id, "solo");
    }

    #[test]
    fn test_bare_object_is_one_product() {
        let built = build(r#"{"id":"bare","name":"Standalone"}"#);
        assert_eq!(built.documents.len(), 1);
        assert_eq!(built.documents[0].id, "bare");
    }

    #[test]
    fn test_non_collection_envelope_values_stay_on_the_product() {
        // A scalar under an envelope name is not a collection; the whole
        // object is one product and keeps the field
        let elements = extract_collection(json!({"items": 5, "id": "keep"}));
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0]["items"], 5);
        assert_eq!(elements[0]["id"], "keep");

        // Same for a non-object under the singular document field
        let elements = extract_collection(json!({"document": "plain text", "id": "d1"}));
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0]["document"], "plain text");

        let built = build(r#"{"items": "not an array", "id": "keep", "name": "Kept"}"#);
        assert_eq!(built.documents.len(), 1);
        assert_eq!(built.documents[0].id, "keep");
        assert_eq!(built.documents[0].name.as_deref(), Some("Kept"));
    }

    #[test]
    fn test_unparsable_payload_counts_as_failure() {
        let built = build("{not json");
        assert!(built.documents.is_empty());
        assert_eq!(built.parse_failures, 1);
    }

    #[test]
    fn test_non_object_elements_count_as_failures() {
        let built = build(r#"[{"id":"ok"}, "just a string", 42]"#);
        assert_eq!(built.documents.len(), 1);
        assert_eq!(built.parse_failures, 2);
    }

    #[test]
    fn test_object_without_known_fields_builds_placeholder() {
        // Malformed-but-parseable objects still build documents; only
        // unparsable payloads and non-object elements fail
        let built = build(r#"[{"id":"a","name":"Shoe"},{"bad":1}]"#);
        assert_eq!(built.documents.len(), 2);
        assert_eq!(built.parse_failures, 0);
        // Placeholder got a generated id and the raw-text embedding fallback
        assert!(built.documents[1].name.is_none());
        assert!(built.documents[1].id.contains('-'));
        assert!(!built.documents[1].embedding_text.is_empty());
    }

    #[test]
    fn test_id_synonyms_and_fallback() {
        let built = build(r#"[{"productId":"p1"},{"product_id":"p2"},{"name":"NoId"}]"#);
        assert_eq!(built.documents[0].id, "p1");
        assert_eq!(built.documents[1].id, "p2");
        // Fallback combines the row id and the element sequence
        assert!(built.documents[2].id.ends_with("-2"));
    }

    #[test]
    fn test_field_synonym_precedence() {
        let built = build(
            r#"{"id":"s","title":"Titled","summary":"Summarized","category_name":"Cats"}"#,
        );
        let doc = &built.documents[0];
        assert_eq!(doc.name.as_deref(), Some("Titled"));
        assert_eq!(doc.description.as_deref(), Some("Summarized"));
        assert_eq!(doc.category.as_deref(), Some("Cats"));
    }

    #[test]
    fn test_price_accepts_numbers_and_numeric_strings() {
        let built = build(r#"[{"id":"a","price":9.99},{"id":"b","unit_price":"12.50"},{"id":"c","amount":"not a number"}]"#);
        assert_eq!(built.documents[0].price, Some(9.99));
        assert_eq!(built.documents[1].price, Some(12.5));
        assert_eq!(built.documents[2].price, None);
    }

    #[test]
    fn test_in_stock_accepts_booleans_and_boolean_strings() {
        let built = build(
            r#"[{"id":"a","in_stock":true},{"id":"b","inStock":"false"},{"id":"c","available":"yes"}]"#,
        );
        assert_eq!(built.documents[0].in_stock, Some(true));
        assert_eq!(built.documents[1].in_stock, Some(false));
        assert_eq!(built.documents[2].in_stock, Some(true));
    }

    #[test]
    fn test_attributes_passed_through_unmodified() {
        let built = build(r#"{"id":"a","metadata":{"color":"red","sizes":[40,41]}}"#);
        assert_eq!(
            built.documents[0].attributes,
            Some(json!({"color":"red","sizes":[40,41]}))
        );
    }

    #[test]
    fn test_embedding_text_order_and_fallback() {
        let built = build(
            r#"[{"id":"a","name":"Shoe","brand":"Acme","category":"Footwear"},{"id":"b"}]"#,
        );
        assert_eq!(built.documents[0].embedding_text, "Shoe Acme Footwear");
        // All text fields empty: fall back to the raw payload
        assert_eq!(
            built.documents[1].embedding_text,
            r#"[{"id":"a","name":"Shoe","brand":"Acme","category":"Footwear"},{"id":"b"}]"#
        );
    }

    #[test]
    fn test_csv_rows() {
        let payload = "id,name,price,in_stock\np1,Boot,49.90,true\np2,Sandal,19.90,false\n";
        let built = build_documents(
            &[raw_row(payload)],
            SourceType::Csv,
            Uuid::new_v4(),
        );

        assert_eq!(built.documents.len(), 2);
        assert_eq!(built.parse_failures, 0);
        assert_eq!(built.documents[0].id, "p1");
        assert_eq!(built.documents[0].price, Some(49.90));
        assert_eq!(built.documents[1].in_stock, Some(false));
    }

    #[test]
    fn test_multiple_rows_accumulate() {
        let rows = vec![
            raw_row(r#"{"id":"a","name":"One"}"#),
            raw_row("broken"),
            raw_row(r#"[{"id":"b"},{"id":"c"}]"#),
        ];
        let built = build_documents(&rows, SourceType::Json, Uuid::new_v4());
        assert_eq!(built.documents.len(), 3);
        assert_eq!(built.parse_failures, 1);
    }
}
