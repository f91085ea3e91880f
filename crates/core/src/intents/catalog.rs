//! The static intent catalog.
//!
//! Entries are evaluated top to bottom and the first match wins, so where two
//! entries share vocabulary the narrower one must sit above the broader one
//! (`asset_value_by_site` above `asset_count_by_site`, and the generic asset count
//! phrasings in `asset_count_summary` below every grouped asset rule). The table is
//! plain data so that ordering can be audited and tested without running a matcher.

use std::collections::HashSet;

use regex::{Captures, Regex, RegexBuilder};
use thiserror::Error;

use crate::domain::intent::{IntentId, IntentRule};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntentDefinition {
    pub id: &'static str,
    pub patterns: &'static [&'static str],
    pub sql: &'static str,
    pub description: &'static str,
    pub answer_template: &'static str,
}

/// Values substituted for `{name}` placeholders in SQL templates.
pub const TEMPLATE_DEFAULTS: &[(&str, &str)] =
    &[("disposed_status", "'Disposed'"), ("open_status", "'Open'"), ("active_flag", "1")];

const ASSET_COUNT_SQL: &str =
    "SELECT COUNT(*) AS AssetCount FROM Assets WHERE Status <> {disposed_status};";
const ASSET_COUNT_DESCRIPTION: &str = "Count of all assets that have not been disposed";
const ASSET_COUNT_ANSWER: &str = "You have {AssetCount} assets in your inventory.";

pub const BUILTIN_INTENTS: &[IntentDefinition] = &[
    // "how many assets" always means the overall count, whatever follows it.
    IntentDefinition {
        id: "asset_count_total",
        patterns: &[r"how many assets"],
        sql: ASSET_COUNT_SQL,
        description: ASSET_COUNT_DESCRIPTION,
        answer_template: ASSET_COUNT_ANSWER,
    },
    IntentDefinition {
        id: "asset_value_by_site",
        patterns: &[r"total value.*assets.*site", r"asset value.*site", r"value.*assets.*per site"],
        sql: "SELECT s.SiteName, SUM(ISNULL(a.Cost, 0)) AS TotalValue
FROM Assets a
JOIN Sites s ON s.SiteId = a.SiteId
WHERE a.Status <> {disposed_status}
GROUP BY s.SiteName
ORDER BY TotalValue DESC;",
        description: "Total cost of active assets grouped by site",
        answer_template: "Here's the total asset value by site: {results}",
    },
    IntentDefinition {
        id: "asset_count_by_site",
        patterns: &[
            r"assets.*per site",
            r"asset count.*site",
            r"breakdown.*site",
            r"show.*assets.*site",
            r"list.*assets.*by site",
            r"assets.*by site",
        ],
        sql: "SELECT s.SiteName, COUNT(*) AS AssetCount
FROM Assets a
JOIN Sites s ON s.SiteId = a.SiteId
WHERE a.Status <> {disposed_status}
GROUP BY s.SiteName
ORDER BY AssetCount DESC;",
        description: "Number of active assets at each site",
        answer_template: "Here's the asset count by site: {results}",
    },
    IntentDefinition {
        id: "assets_purchased_this_year",
        patterns: &[
            r"assets purchased.*this year",
            r"assets.*bought.*year",
            r"how many.*purchased.*current year",
        ],
        sql: "SELECT COUNT(*) AS AssetCount
FROM Assets
WHERE YEAR(PurchaseDate) = YEAR(GETDATE())
AND Status <> {disposed_status};",
        description: "Active assets purchased during the current calendar year",
        answer_template: "You purchased {AssetCount} assets this year.",
    },
    IntentDefinition {
        id: "top_vendor_by_assets",
        patterns: &[r"which vendor.*most assets", r"vendor.*supplied.*most", r"top vendor.*assets"],
        sql: "SELECT TOP 1 v.VendorName, COUNT(*) AS AssetCount
FROM Assets a
JOIN Vendors v ON v.VendorId = a.VendorId
WHERE a.Status <> {disposed_status}
GROUP BY v.VendorName
ORDER BY AssetCount DESC;",
        description: "The vendor that supplied the largest number of active assets",
        answer_template:
            "The vendor that supplied the most assets is {VendorName} with {AssetCount} assets.",
    },
    IntentDefinition {
        id: "total_billed_last_quarter",
        patterns: &[r"total billed.*last quarter", r"bills.*last quarter", r"amount billed.*quarter"],
        sql: "SELECT SUM(TotalAmount) AS TotalBilled
FROM Bills
WHERE BillDate >= DATEADD(QUARTER, DATEDIFF(QUARTER, 0, GETDATE()) - 1, 0)
AND BillDate < DATEADD(QUARTER, DATEDIFF(QUARTER, 0, GETDATE()), 0);",
        description: "Sum of bill totals dated in the previous calendar quarter",
        answer_template: "The total billed amount for the last quarter is ${TotalBilled}.",
    },
    IntentDefinition {
        id: "open_purchase_orders",
        patterns: &[
            r"how many.*open.*purchase orders",
            r"pending.*purchase orders",
            r"\bopen\b.*\bpos?\b",
        ],
        sql: "SELECT COUNT(*) AS OpenPOCount
FROM PurchaseOrders
WHERE Status = {open_status};",
        description: "Number of purchase orders still open",
        answer_template: "There are {OpenPOCount} open purchase orders currently pending.",
    },
    IntentDefinition {
        id: "assets_by_category",
        patterns: &[
            r"assets.*by category",
            r"breakdown.*category",
            r"assets.*per category",
            r"show.*assets.*category",
            r"list.*assets.*category",
        ],
        sql: "SELECT Category, COUNT(*) AS AssetCount
FROM Assets
WHERE Status <> {disposed_status}
GROUP BY Category
ORDER BY AssetCount DESC;",
        description: "Number of active assets in each category",
        answer_template: "Here's the breakdown of assets by category: {results}",
    },
    IntentDefinition {
        id: "asset_count_summary",
        patterns: &[r"total assets", r"count.*assets", r"number of assets"],
        sql: ASSET_COUNT_SQL,
        description: ASSET_COUNT_DESCRIPTION,
        answer_template: ASSET_COUNT_ANSWER,
    },
    IntentDefinition {
        id: "sales_orders_by_customer_last_month",
        patterns: &[
            r"sales orders.*customer.*last month",
            r"how many.*sales orders.*month",
            r"\bso\b.*created.*customer",
        ],
        sql: "SELECT c.CustomerName, COUNT(*) AS SOCount
FROM SalesOrders so
JOIN Customers c ON c.CustomerId = so.CustomerId
WHERE so.SODate >= DATEADD(MONTH, -1, GETDATE())
GROUP BY c.CustomerName
ORDER BY SOCount DESC;",
        description: "Sales orders created in the last month, per customer",
        answer_template: "Here are the sales orders created for customers last month: {results}",
    },
    IntentDefinition {
        id: "list_vendors",
        patterns: &[r"list.*vendors", r"show.*vendors", r"all vendors"],
        sql: "SELECT VendorCode, VendorName, Email, Phone
FROM Vendors
WHERE IsActive = {active_flag}
ORDER BY VendorName;",
        description: "All active vendors with contact details",
        answer_template: "Here are all active vendors: {results}",
    },
    IntentDefinition {
        id: "list_customers",
        patterns: &[r"list.*customers", r"show.*customers", r"all customers"],
        sql: "SELECT CustomerCode, CustomerName, Email, Phone
FROM Customers
WHERE IsActive = {active_flag}
ORDER BY CustomerName;",
        description: "All active customers with contact details",
        answer_template: "Here are all active customers: {results}",
    },
    IntentDefinition {
        id: "list_sites",
        patterns: &[r"list.*sites", r"show.*sites", r"all sites"],
        sql: "SELECT SiteCode, SiteName, City, Country
FROM Sites
WHERE IsActive = {active_flag}
ORDER BY SiteName;",
        description: "All active sites with their city and country",
        answer_template: "Here are all active sites: {results}",
    },
];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("intent `{intent}` has an invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        intent: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("intent `{0}` is defined more than once")]
    DuplicateIntent(String),
    #[error("intent `{0}` has no patterns")]
    EmptyPatterns(String),
}

/// Ordered, read-only intent rules. Built once at startup.
#[derive(Clone, Debug)]
pub struct IntentCatalog {
    rules: Vec<IntentRule>,
}

impl IntentCatalog {
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_definitions(BUILTIN_INTENTS)
    }

    pub fn from_definitions(definitions: &[IntentDefinition]) -> Result<Self, CatalogError> {
        let placeholder = placeholder_pattern()?;
        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(definitions.len());

        for definition in definitions {
            if !seen.insert(definition.id) {
                return Err(CatalogError::DuplicateIntent(definition.id.to_string()));
            }
            if definition.patterns.is_empty() {
                return Err(CatalogError::EmptyPatterns(definition.id.to_string()));
            }

            let patterns = definition
                .patterns
                .iter()
                .map(|pattern| {
                    RegexBuilder::new(pattern).case_insensitive(true).build().map_err(|source| {
                        CatalogError::InvalidPattern {
                            intent: definition.id.to_string(),
                            pattern: (*pattern).to_string(),
                            source,
                        }
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            rules.push(IntentRule {
                id: IntentId(definition.id.to_string()),
                patterns,
                sql_template: definition.sql.to_string(),
                sql: resolve_placeholders(&placeholder, definition.sql),
                description: definition.description.to_string(),
                answer_template: definition.answer_template.to_string(),
            });
        }

        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    pub fn get(&self, id: &str) -> Option<&IntentRule> {
        self.rules.iter().find(|rule| rule.id.0 == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.rules.iter().position(|rule| rule.id.0 == id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn placeholder_pattern() -> Result<Regex, CatalogError> {
    let pattern = r"\{([a-z_]+)\}";
    Regex::new(pattern).map_err(|source| CatalogError::InvalidPattern {
        intent: "<placeholder>".to_string(),
        pattern: pattern.to_string(),
        source,
    })
}

// Unknown placeholders are left as written.
fn resolve_placeholders(placeholder: &Regex, template: &str) -> String {
    placeholder
        .replace_all(template, |captures: &Captures<'_>| {
            let name = &captures[1];
            TEMPLATE_DEFAULTS
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value).to_string())
                .unwrap_or_else(|| captures[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::{
        placeholder_pattern, resolve_placeholders, CatalogError, IntentCatalog, IntentDefinition,
        BUILTIN_INTENTS,
    };

    #[test]
    fn builtin_catalog_compiles_every_pattern() {
        let catalog = IntentCatalog::builtin().expect("builtin catalog should compile");
        assert_eq!(catalog.len(), BUILTIN_INTENTS.len());
        assert!(catalog.rules().iter().all(|rule| !rule.patterns.is_empty()));
    }

    #[test]
    fn builtin_sql_has_no_unresolved_placeholders() {
        let catalog = IntentCatalog::builtin().expect("builtin catalog should compile");
        for rule in catalog.rules() {
            assert!(!rule.sql.contains('{'), "{} still has a placeholder: {}", rule.id, rule.sql);
        }

        let total = catalog.get("asset_count_total").expect("asset count intent");
        assert_eq!(total.sql, "SELECT COUNT(*) AS AssetCount FROM Assets WHERE Status <> 'Disposed';");
        assert!(total.sql_template.contains("{disposed_status}"));
    }

    #[test]
    fn narrower_site_rules_precede_broader_ones() {
        let catalog = IntentCatalog::builtin().expect("builtin catalog should compile");
        let value = catalog.position("asset_value_by_site").expect("value intent");
        let count = catalog.position("asset_count_by_site").expect("count intent");
        assert!(value < count);
    }

    #[test]
    fn generic_asset_count_follows_grouped_asset_rules() {
        let catalog = IntentCatalog::builtin().expect("builtin catalog should compile");
        let summary = catalog.position("asset_count_summary").expect("summary intent");
        for grouped in [
            "asset_value_by_site",
            "asset_count_by_site",
            "assets_purchased_this_year",
            "assets_by_category",
        ] {
            let position = catalog.position(grouped).expect("grouped intent");
            assert!(position < summary, "{grouped} must precede asset_count_summary");
        }
        assert_eq!(catalog.position("asset_count_total"), Some(0));
        assert_eq!(
            catalog.get("asset_count_summary").map(|rule| rule.sql.as_str()),
            catalog.get("asset_count_total").map(|rule| rule.sql.as_str())
        );
    }

    #[test]
    fn unknown_placeholders_are_preserved() {
        let placeholder = placeholder_pattern().expect("placeholder regex");
        let resolved =
            resolve_placeholders(&placeholder, "WHERE a = {open_status} AND b = {mystery}");
        assert_eq!(resolved, "WHERE a = 'Open' AND b = {mystery}");
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let definition = IntentDefinition {
            id: "dup",
            patterns: &["x"],
            sql: "SELECT 1;",
            description: "d",
            answer_template: "a",
        };
        let result = IntentCatalog::from_definitions(&[definition, definition]);
        assert!(matches!(result, Err(CatalogError::DuplicateIntent(ref id)) if id == "dup"));
    }

    #[test]
    fn invalid_patterns_are_rejected_with_context() {
        let definition = IntentDefinition {
            id: "broken",
            patterns: &["(unclosed"],
            sql: "SELECT 1;",
            description: "d",
            answer_template: "a",
        };
        let error = IntentCatalog::from_definitions(&[definition]).expect_err("should fail");
        assert!(error.to_string().contains("broken"));
    }

    #[test]
    fn empty_pattern_lists_are_rejected() {
        let definition = IntentDefinition {
            id: "silent",
            patterns: &[],
            sql: "SELECT 1;",
            description: "d",
            answer_template: "a",
        };
        let result = IntentCatalog::from_definitions(&[definition]);
        assert!(matches!(result, Err(CatalogError::EmptyPatterns(_))));
    }
}
