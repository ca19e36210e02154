// Invalidation map - which cached queries a resource change makes stale
mod cache_key;
mod table;

pub use cache_key::{CacheInvalidator, CacheKey};
pub use table::{
    DASHBOARD_KEY, DASHBOARD_RESOURCE, INVALIDATION_RULES, InvalidationRule, ParamRule, rule_for,
};

use crate::types::DataUpdate;

/// Resolves the cache keys a `data_update` invalidates.
///
/// Static keys come first, then the payload-parameterized key, then the
/// dashboard aggregate. Duplicates are dropped so each key appears once.
/// Unknown resources resolve to an empty list.
pub fn invalidation_targets(update: &DataUpdate) -> Vec<CacheKey> {
    let Some(rule) = rule_for(&update.resource) else {
        return Vec::new();
    };

    let mut targets: Vec<CacheKey> = Vec::with_capacity(rule.keys.len() + 2);
    let mut push = |key: CacheKey| {
        if !targets.contains(&key) {
            targets.push(key);
        }
    };

    for prefix in rule.keys {
        push(CacheKey::new(*prefix));
    }

    if let Some(param) = rule.param
        && let Some(value) = param_value(update, param)
    {
        push(CacheKey::with_param(param.key, value));
    }

    if rule.resource != DASHBOARD_RESOURCE {
        push(CacheKey::new(DASHBOARD_KEY));
    }

    targets
}

fn param_value(update: &DataUpdate, param: ParamRule) -> Option<String> {
    update.payload_field(param.field).or_else(|| {
        if param.field == "id" {
            update.id.clone()
        } else {
            None
        }
    })
}
