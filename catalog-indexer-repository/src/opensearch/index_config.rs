//! OpenSearch index template for product indices.
//!
//! One shared template covers every per-tenant index: it matches the
//! `products-*` pattern, so tenant indices pick up the same settings and
//! mappings at creation time.

use serde_json::{json, Value};

/// Name of the shared index template.
pub const TEMPLATE_NAME: &str = "catalog-products";

/// Dimension of the embedding vectors produced by the embedding service.
pub const EMBEDDING_DIMENSION: usize = 384;

/// Build the shared index template body.
///
/// The mapping covers:
/// - **Keyword fields** for tenant/product ids, brand and category filters
/// - **Text fields** for name and description search
/// - **knn_vector** for the embedding, enabling semantic retrieval
/// - **Dynamic attributes** object passed through from tenant payloads
pub fn product_index_template() -> Value {
    json!({
        "index_patterns": ["products-*"],
        "template": {
            "settings": {
                "number_of_shards": 1,
                "number_of_replicas": 1,
                "index.knn": true
            },
            "mappings": {
                "properties": {
                    "tenant_id": {
                        "type": "keyword"
                    },
                    "product_id": {
                        "type": "keyword"
                    },
                    "name": {
                        "type": "text",
                        "fields": {
                            "raw": {
                                "type": "keyword"
                            }
                        }
                    },
                    "description": {
                        "type": "text"
                    },
                    "brand": {
                        "type": "keyword"
                    },
                    "category": {
                        "type": "keyword"
                    },
                    "price": {
                        "type": "double"
                    },
                    "in_stock": {
                        "type": "boolean"
                    },
                    "attributes": {
                        "type": "object",
                        "enabled": true
                    },
                    "embedding": {
                        "type": "knn_vector",
                        "dimension": EMBEDDING_DIMENSION
                    },
                    "indexed_at": {
                        "type": "date"
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_structure() {
        let template = product_index_template();

        assert_eq!(template["index_patterns"][0], "products-*");
        assert!(template["template"]["settings"]["number_of_shards"].is_number());

        let props = &template["template"]["mappings"]["properties"];
        assert_eq!(props["tenant_id"]["type"], "keyword");
        assert_eq!(props["product_id"]["type"], "keyword");
        assert_eq!(props["name"]["type"], "text");
        assert_eq!(props["embedding"]["type"], "knn_vector");
        assert_eq!(
            props["embedding"]["dimension"],
            EMBEDDING_DIMENSION as u64
        );
    }

    #[test]
    fn test_knn_enabled() {
        let template = product_index_template();
        assert_eq!(template["template"]["settings"]["index.knn"], true);
    }
}
