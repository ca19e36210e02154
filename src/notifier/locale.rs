use crate::messaging::DataAction;
use std::collections::HashMap;

const INDONESIAN_RESOURCES: &[(&str, &str)] = &[
    ("users", "Pengguna"),
    ("customers", "Pelanggan"),
    ("products", "Produk"),
    ("categories", "Kategori"),
    ("services", "Servis"),
    ("suppliers", "Supplier"),
    ("transactions", "Transaksi"),
    ("warranties", "Garansi"),
    ("roles", "Role"),
    ("dashboard", "Dashboard"),
    ("whatsapp", "WhatsApp"),
    ("stock-movements", "Mutasi stok"),
    ("purchase-orders", "Purchase order"),
    ("purchase-order-items", "Item purchase order"),
    ("tenants", "Tenant"),
    ("plans", "Paket langganan"),
];

const ENGLISH_RESOURCES: &[(&str, &str)] = &[
    ("users", "User"),
    ("customers", "Customer"),
    ("products", "Product"),
    ("categories", "Category"),
    ("services", "Service ticket"),
    ("suppliers", "Supplier"),
    ("transactions", "Transaction"),
    ("warranties", "Warranty claim"),
    ("roles", "Role"),
    ("dashboard", "Dashboard"),
    ("whatsapp", "WhatsApp"),
    ("stock-movements", "Stock movement"),
    ("purchase-orders", "Purchase order"),
    ("purchase-order-items", "Purchase order item"),
    ("tenants", "Tenant"),
    ("plans", "Plan"),
];

/// Display strings used by the notifier.
///
/// `template` contains `{resource}` and `{action}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    pub update_title: String,
    pub template: String,
    pub failure_title: String,
    pub failure_description: String,
    resource_labels: HashMap<String, String>,
    action_verbs: HashMap<String, String>,
}

impl Locale {
    pub fn indonesian() -> Self {
        Self {
            update_title: "Data diperbarui".to_string(),
            template: "{resource} telah {action}".to_string(),
            failure_title: "Koneksi real-time terputus".to_string(),
            failure_description:
                "Pembaruan real-time tidak tersedia. Data tetap dapat dimuat ulang secara manual."
                    .to_string(),
            resource_labels: to_map(INDONESIAN_RESOURCES),
            action_verbs: to_map(&[
                ("create", "ditambahkan"),
                ("update", "diperbarui"),
                ("delete", "dihapus"),
            ]),
        }
    }

    pub fn english() -> Self {
        Self {
            update_title: "Data updated".to_string(),
            template: "{resource} has been {action}".to_string(),
            failure_title: "Real-time connection lost".to_string(),
            failure_description:
                "Real-time updates are unavailable. Data can still be refreshed manually."
                    .to_string(),
            resource_labels: to_map(ENGLISH_RESOURCES),
            action_verbs: to_map(&[
                ("create", "created"),
                ("update", "updated"),
                ("delete", "deleted"),
            ]),
        }
    }

    pub fn with_resource_label(mut self, resource: impl Into<String>, label: impl Into<String>) -> Self {
        self.resource_labels.insert(resource.into(), label.into());
        self
    }

    pub fn with_action_verb(mut self, action: impl Into<String>, verb: impl Into<String>) -> Self {
        self.action_verbs.insert(action.into(), verb.into());
        self
    }

    /// Falls back to the raw resource name.
    pub fn resource_label<'a>(&'a self, resource: &'a str) -> &'a str {
        self.resource_labels
            .get(resource)
            .map(String::as_str)
            .unwrap_or(resource)
    }

    /// Falls back to the raw action string.
    pub fn action_verb<'a>(&'a self, action: &'a DataAction) -> &'a str {
        self.action_verbs
            .get(action.as_str())
            .map(String::as_str)
            .unwrap_or(action.as_str())
    }

    pub fn describe(&self, resource: &str, action: &DataAction) -> String {
        self.template
            .replace("{resource}", self.resource_label(resource))
            .replace("{action}", self.action_verb(action))
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::indonesian()
    }
}

fn to_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indonesian_product_update() {
        let locale = Locale::default();
        assert_eq!(
            locale.describe("products", &DataAction::Update),
            "Produk telah diperbarui"
        );
    }

    #[test]
    fn test_falls_back_to_raw_identifiers() {
        let locale = Locale::english();
        assert_eq!(
            locale.describe("invoices", &DataAction::Other("archive".into())),
            "invoices has been archive"
        );
    }

    #[test]
    fn test_overrides_take_precedence() {
        let locale = Locale::english()
            .with_resource_label("products", "Item")
            .with_action_verb("delete", "removed");
        assert_eq!(
            locale.describe("products", &DataAction::Delete),
            "Item has been removed"
        );
    }
}
