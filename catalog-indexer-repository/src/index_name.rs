//! Per-tenant index and alias naming.
//!
//! Pure functions mapping a tenant identifier to the normalized alias name
//! and the versioned backing index behind it. Aliases stay stable across
//! reindexing; the backing index carries a numeric suffix.

/// Prefix shared by every tenant alias.
const ALIAS_PREFIX: &str = "products-";

/// Suffix of the first backing index behind an alias.
const FIRST_BACKING_SUFFIX: &str = "-000001";

/// Resolve the write alias name for a tenant.
///
/// The tenant identifier is lowercased, every run of non-alphanumeric
/// characters collapses to a single dash, and edge dashes are trimmed, so
/// any identifier the admin API hands us yields a valid index name.
pub fn alias_for_tenant(tenant_id: &str) -> String {
    let mut normalized = String::with_capacity(tenant_id.len());
    let mut pending_dash = false;

    for c in tenant_id.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !normalized.is_empty() {
                normalized.push('-');
            }
            pending_dash = false;
            normalized.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    format!("{}{}", ALIAS_PREFIX, normalized)
}

/// Name of the first backing index behind an alias.
pub fn backing_index_for_alias(alias: &str) -> String {
    format!("{}{}", alias, FIRST_BACKING_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_for_uuid_tenant() {
        assert_eq!(
            alias_for_tenant("550e8400-e29b-41d4-a716-446655440000"),
            "products-550e8400-e29b-41d4-a716-446655440000"
        );
    }

    #[test]
    fn test_alias_lowercases() {
        assert_eq!(alias_for_tenant("AcmeCorp"), "products-acmecorp");
    }

    #[test]
    fn test_alias_collapses_symbol_runs() {
        assert_eq!(alias_for_tenant("acme  corp!!v2"), "products-acme-corp-v2");
    }

    #[test]
    fn test_alias_trims_edge_dashes() {
        assert_eq!(alias_for_tenant("--acme--"), "products-acme");
    }

    #[test]
    fn test_alias_is_deterministic() {
        let a = alias_for_tenant("Tenant_42");
        let b = alias_for_tenant("Tenant_42");
        assert_eq!(a, b);
        assert_eq!(a, "products-tenant-42");
    }

    #[test]
    fn test_backing_index_name() {
        assert_eq!(
            backing_index_for_alias("products-acme"),
            "products-acme-000001"
        );
    }
}
