//! Calendar period registry.
//!
//! The four calendar quarters always exist. A session may add custom
//! periods on top of them; a custom period with a default's name replaces
//! that default for the lifetime of the registry only.

use crate::error::{DashboardError, Result};
use crate::models::PeriodDefinition;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Month identifiers offered by the period editor.
pub const MONTH_IDS: [&str; 12] = [
    "01", "02", "03", "04", "05", "06", "07", "08", "09", "10", "11", "12",
];

/// The built-in quarters, in display order.
pub fn default_periods() -> Vec<PeriodDefinition> {
    vec![
        PeriodDefinition::new("Q1", ["01", "02", "03"]),
        PeriodDefinition::new("Q2", ["04", "05", "06"]),
        PeriodDefinition::new("Q3", ["07", "08", "09"]),
        PeriodDefinition::new("Q4", ["10", "11", "12"]),
    ]
}

/// Default quarters plus a session-scoped overlay of custom periods.
#[derive(Debug, Clone)]
pub struct PeriodRegistry {
    defaults: Vec<PeriodDefinition>,
    /// Custom periods in first-insertion order.
    custom: Vec<PeriodDefinition>,
}

impl Default for PeriodRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PeriodRegistry {
    pub fn new() -> Self {
        Self {
            defaults: default_periods(),
            custom: Vec::new(),
        }
    }

    /// All periods: defaults first (overridden in place by custom entries of
    /// the same name), then custom-only periods in insertion order.
    pub fn all_periods(&self) -> Vec<PeriodDefinition> {
        let mut all: Vec<PeriodDefinition> = self
            .defaults
            .iter()
            .map(|d| self.custom_entry(&d.name).unwrap_or(d).clone())
            .collect();

        all.extend(
            self.custom
                .iter()
                .filter(|c| !self.is_default_name(&c.name))
                .cloned(),
        );

        all
    }

    /// Names of all periods, in the same order as `all_periods`.
    pub fn names(&self) -> Vec<String> {
        self.all_periods().into_iter().map(|p| p.name).collect()
    }

    /// Resolve a period name to its effective definition.
    pub fn resolve(&self, name: &str) -> Option<&PeriodDefinition> {
        self.custom_entry(name)
            .or_else(|| self.defaults.iter().find(|d| d.name == name))
    }

    /// Add or overwrite a custom period.
    ///
    /// Fails without touching the registry when the name is blank, the month
    /// list is empty, or a month is not in 1..=12. Months may be given as
    /// "7" or "07"; duplicates collapse.
    pub fn add_period<I, S>(&mut self, name: &str, months: I) -> Result<&PeriodDefinition>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = name.trim();
        let months: Vec<S> = months.into_iter().collect();

        if name.is_empty() || months.is_empty() {
            return Err(DashboardError::validation(
                "Please enter a name and select months for the custom period.",
            ));
        }

        let months = months
            .iter()
            .map(|m| normalize_month(m.as_ref()))
            .collect::<Result<BTreeSet<String>>>()?;

        let definition = PeriodDefinition {
            name: name.to_string(),
            months,
        };
        debug!("Adding custom period {}", definition);

        let index = match self.custom.iter().position(|c| c.name == name) {
            Some(i) => {
                self.custom[i] = definition;
                i
            }
            None => {
                self.custom.push(definition);
                self.custom.len() - 1
            }
        };

        info!("Added new period: {}", name);
        Ok(&self.custom[index])
    }

    /// Number of custom periods in the overlay.
    pub fn custom_count(&self) -> usize {
        self.custom.len()
    }

    fn custom_entry(&self, name: &str) -> Option<&PeriodDefinition> {
        self.custom.iter().find(|c| c.name == name)
    }

    fn is_default_name(&self, name: &str) -> bool {
        self.defaults.iter().any(|d| d.name == name)
    }
}

/// Normalize a month identifier to two digits, rejecting anything outside 1..=12.
pub fn normalize_month(month: &str) -> Result<String> {
    let id = month
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|m| m.checked_sub(1))
        .and_then(|i| MONTH_IDS.get(i));

    match id {
        Some(id) => Ok(id.to_string()),
        None => Err(DashboardError::validation(format!(
            "Invalid month '{}': expected 01 to 12",
            month.trim()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn months_of(registry: &PeriodRegistry, name: &str) -> Vec<String> {
        registry
            .resolve(name)
            .map(|p| p.months.iter().cloned().collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_default_quarters() {
        let registry = PeriodRegistry::new();
        assert_eq!(registry.names(), vec!["Q1", "Q2", "Q3", "Q4"]);
        assert_eq!(months_of(&registry, "Q3"), vec!["07", "08", "09"]);
        assert!(registry.resolve("H1").is_none());
    }

    #[test]
    fn test_custom_overrides_default_by_name() {
        let mut registry = PeriodRegistry::new();
        registry.add_period("Q1", ["07"]).unwrap();

        let all = registry.all_periods();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].name, "Q1");
        assert_eq!(all[0].months.iter().collect::<Vec<_>>(), vec!["07"]);
        assert_eq!(months_of(&registry, "Q2"), vec!["04", "05", "06"]);
        assert_eq!(months_of(&registry, "Q4"), vec!["10", "11", "12"]);
    }

    #[test]
    fn test_custom_periods_follow_defaults() {
        let mut registry = PeriodRegistry::new();
        registry.add_period("Summer", ["06", "07", "08"]).unwrap();
        registry.add_period("H1", ["1", "2", "3", "4", "5", "6"]).unwrap();

        assert_eq!(
            registry.names(),
            vec!["Q1", "Q2", "Q3", "Q4", "Summer", "H1"]
        );
        assert_eq!(
            months_of(&registry, "H1"),
            vec!["01", "02", "03", "04", "05", "06"]
        );
    }

    #[test]
    fn test_latest_addition_wins() {
        let mut registry = PeriodRegistry::new();
        registry.add_period("Peak", ["11"]).unwrap();
        registry.add_period("Peak", ["12"]).unwrap();

        assert_eq!(registry.custom_count(), 1);
        assert_eq!(months_of(&registry, "Peak"), vec!["12"]);
    }

    #[test]
    fn test_add_period_validation_leaves_registry_unchanged() {
        let mut registry = PeriodRegistry::new();
        let before = registry.all_periods();

        let empty_name = registry.add_period("", ["01"]);
        assert!(matches!(empty_name, Err(DashboardError::Validation(_))));

        let blank_name = registry.add_period("   ", ["01"]);
        assert!(matches!(blank_name, Err(DashboardError::Validation(_))));

        let no_months = registry.add_period("Foo", Vec::<String>::new());
        assert!(matches!(no_months, Err(DashboardError::Validation(_))));

        let bad_month = registry.add_period("Foo", ["01", "13"]);
        assert!(matches!(bad_month, Err(DashboardError::Validation(_))));

        assert_eq!(registry.all_periods(), before);
        assert_eq!(registry.custom_count(), 0);
    }

    #[test]
    fn test_normalize_month() {
        assert_eq!(normalize_month("7").unwrap(), "07");
        assert_eq!(normalize_month(" 12 ").unwrap(), "12");
        assert!(normalize_month("0").is_err());
        assert!(normalize_month("Jan").is_err());
    }
}
