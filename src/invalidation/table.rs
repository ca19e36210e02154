/// Resource whose queries hold summary figures
pub const DASHBOARD_RESOURCE: &str = "dashboard";

/// Cache prefix of the dashboard aggregate
pub const DASHBOARD_KEY: &str = "dashboard";

/// Extra key built from a field of the update payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamRule {
    /// Payload field holding the identifier. `id` also falls back to the
    /// message-level `id`.
    pub field: &'static str,
    /// Prefix of the parameterized key
    pub key: &'static str,
}

/// Static mapping entry: resource name → cache prefixes to invalidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidationRule {
    pub resource: &'static str,
    pub keys: &'static [&'static str],
    pub param: Option<ParamRule>,
}

const fn rule(resource: &'static str, keys: &'static [&'static str]) -> InvalidationRule {
    InvalidationRule {
        resource,
        keys,
        param: None,
    }
}

const fn param_rule(
    resource: &'static str,
    keys: &'static [&'static str],
    field: &'static str,
    key: &'static str,
) -> InvalidationRule {
    InvalidationRule {
        resource,
        keys,
        param: Some(ParamRule { field, key }),
    }
}

pub static INVALIDATION_RULES: &[InvalidationRule] = &[
    rule("users", &["users"]),
    rule("customers", &["customers"]),
    rule("products", &["products"]),
    rule("categories", &["categories", "products"]),
    param_rule("services", &["services"], "id", "service"),
    rule("suppliers", &["suppliers"]),
    rule("transactions", &["transactions", "products"]),
    rule("warranties", &["warranties"]),
    rule("roles", &["roles", "users"]),
    rule(DASHBOARD_RESOURCE, &[DASHBOARD_KEY]),
    rule("whatsapp", &["whatsapp-status"]),
    rule("stock-movements", &["stock-movements", "products"]),
    param_rule("purchase-orders", &["purchase-orders"], "id", "purchase-order"),
    param_rule(
        "purchase-order-items",
        &["purchase-orders"],
        "purchaseOrderId",
        "purchase-order",
    ),
    rule("tenants", &["tenants"]),
    rule("plans", &["plans", "tenants"]),
];

/// Exact, case-sensitive lookup.
pub fn rule_for(resource: &str) -> Option<&'static InvalidationRule> {
    INVALIDATION_RULES.iter().find(|rule| rule.resource == resource)
}
