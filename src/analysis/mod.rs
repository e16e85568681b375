//! Analysis catalog.
//!
//! Every analysis the dashboard offers is a variant of [`Analysis`], grouped
//! under a [`Category`]. Dispatch over these is exhaustive, so an unknown
//! selection cannot silently render nothing: parsing it fails instead.

pub mod breakdowns;
pub mod grouping;

pub use breakdowns::*;

use crate::error::{DashboardError, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Top-level analysis category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    SalesPerformance,
    ProductAnalysis,
    RegionalAnalysis,
    Demographics,
    AskQuestion,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::SalesPerformance,
        Category::ProductAnalysis,
        Category::RegionalAnalysis,
        Category::Demographics,
        Category::AskQuestion,
    ];

    /// Analyses offered under this category, in menu order.
    pub fn analyses(&self) -> Vec<Analysis> {
        Analysis::value_variants()
            .iter()
            .copied()
            .filter(|a| a.category() == *self)
            .collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::SalesPerformance => write!(f, "Sales Performance"),
            Category::ProductAnalysis => write!(f, "Product Analysis"),
            Category::RegionalAnalysis => write!(f, "Regional Analysis"),
            Category::Demographics => write!(f, "Demographics"),
            Category::AskQuestion => write!(f, "Ask a Question"),
        }
    }
}

/// A single analysis selectable from the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Analysis {
    MonthlySales,
    ComparePeriods,
    ProductSales,
    ProductCustomerAge,
    ProductSatisfaction,
    ProductGenderRatio,
    RegionalSales,
    RegionalCustomerAge,
    RegionalSatisfaction,
    RegionalGenderRatio,
    GenderAnalysis,
    AgeAnalysis,
    RegionalDemographics,
    RegionalAgeAnalysis,
    SatisfactionCorrelation,
    AgeDistribution,
    AskQuestion,
}

impl Analysis {
    pub fn category(&self) -> Category {
        match self {
            Analysis::MonthlySales | Analysis::ComparePeriods => Category::SalesPerformance,
            Analysis::ProductSales
            | Analysis::ProductCustomerAge
            | Analysis::ProductSatisfaction
            | Analysis::ProductGenderRatio => Category::ProductAnalysis,
            Analysis::RegionalSales
            | Analysis::RegionalCustomerAge
            | Analysis::RegionalSatisfaction
            | Analysis::RegionalGenderRatio => Category::RegionalAnalysis,
            Analysis::GenderAnalysis
            | Analysis::AgeAnalysis
            | Analysis::RegionalDemographics
            | Analysis::RegionalAgeAnalysis
            | Analysis::SatisfactionCorrelation
            | Analysis::AgeDistribution => Category::Demographics,
            Analysis::AskQuestion => Category::AskQuestion,
        }
    }

    /// Menu label shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            Analysis::MonthlySales => "Show me monthly sales",
            Analysis::ComparePeriods => "Compare periods",
            Analysis::ProductSales => "Show me product sales",
            Analysis::ProductCustomerAge => "Show me product customer age",
            Analysis::ProductSatisfaction => "Show me product satisfaction",
            Analysis::ProductGenderRatio => "Show me product gender ratio",
            Analysis::RegionalSales => "Show me regional sales",
            Analysis::RegionalCustomerAge => "Show me regional customer age",
            Analysis::RegionalSatisfaction => "Show me regional satisfaction",
            Analysis::RegionalGenderRatio => "Show me regional gender ratio",
            Analysis::GenderAnalysis => "Show me gender analysis",
            Analysis::AgeAnalysis => "Show me age analysis",
            Analysis::RegionalDemographics => "Show me regional demographics",
            Analysis::RegionalAgeAnalysis => "Show me regional age analysis",
            Analysis::SatisfactionCorrelation => "Show me satisfaction correlation",
            Analysis::AgeDistribution => "Show me age distribution",
            Analysis::AskQuestion => "Ask a question",
        }
    }

    /// Command-line name, e.g. `product-sales`.
    pub fn name(&self) -> String {
        self.to_possible_value()
            .map(|v| v.get_name().to_string())
            .unwrap_or_default()
    }
}

impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Analysis {
    type Err = DashboardError;

    /// Accepts the command-line name or the menu label, case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(analysis) = <Analysis as ValueEnum>::from_str(s, true) {
            return Ok(analysis);
        }

        Analysis::value_variants()
            .iter()
            .copied()
            .find(|a| a.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| DashboardError::validation(format!("Unknown analysis '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_analysis_belongs_to_one_category() {
        let total: usize = Category::ALL.iter().map(|c| c.analyses().len()).sum();
        assert_eq!(total, Analysis::value_variants().len());

        assert_eq!(
            Category::SalesPerformance.analyses(),
            vec![Analysis::MonthlySales, Analysis::ComparePeriods]
        );
        assert_eq!(Category::Demographics.analyses().len(), 6);
    }

    #[test]
    fn test_parse_by_name_and_label() {
        assert_eq!(
            "product-sales".parse::<Analysis>().unwrap(),
            Analysis::ProductSales
        );
        assert_eq!(
            "Show me regional demographics".parse::<Analysis>().unwrap(),
            Analysis::RegionalDemographics
        );
        assert_eq!(
            " COMPARE-PERIODS ".parse::<Analysis>().unwrap(),
            Analysis::ComparePeriods
        );
    }

    #[test]
    fn test_unknown_analysis_is_validation_error() {
        let result = "show me everything".parse::<Analysis>();
        assert!(matches!(result, Err(DashboardError::Validation(_))));
    }

    #[test]
    fn test_names_are_kebab_case() {
        assert_eq!(Analysis::SatisfactionCorrelation.name(), "satisfaction-correlation");
        assert_eq!(Analysis::AskQuestion.name(), "ask-question");
        assert_eq!(Category::AskQuestion.to_string(), "Ask a Question");
    }
}
