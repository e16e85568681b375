//! Dashboard session.
//!
//! A session owns its custom period overlay and shares the loaded dataset
//! and the question-answering model with any other session. Every
//! interaction is one call on `&mut self` or `&self`; nothing runs in the
//! background.

use crate::analysis::{self, Analysis};
use crate::comparison::{self, PeriodComparison};
use crate::dataset::Dataset;
use crate::error::{DashboardError, Result};
use crate::models::{Output, PeriodDefinition};
use crate::periods::PeriodRegistry;
use crate::qa::{self, AskOptions, QuestionAnswerer};
use std::sync::Arc;
use tracing::{debug, info};

/// User choices that accompany an analysis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub periods: Vec<String>,
    pub years: Vec<i32>,
    pub question: Option<String>,
}

pub struct Session {
    dataset: Arc<Dataset>,
    registry: PeriodRegistry,
    answerer: Arc<dyn QuestionAnswerer>,
    ask_options: AskOptions,
}

impl Session {
    pub fn new(
        dataset: Arc<Dataset>,
        answerer: Arc<dyn QuestionAnswerer>,
        ask_options: AskOptions,
    ) -> Self {
        debug!("New session over {} records", dataset.len());
        Self {
            dataset,
            registry: PeriodRegistry::new(),
            answerer,
            ask_options,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn all_periods(&self) -> Vec<PeriodDefinition> {
        self.registry.all_periods()
    }

    pub fn add_period<I, S>(&mut self, name: &str, months: I) -> Result<PeriodDefinition>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let period = self.registry.add_period(name, months)?.clone();
        debug!("Session has {} custom periods", self.registry.custom_count());
        Ok(period)
    }

    pub fn years(&self) -> Vec<i32> {
        self.dataset.years()
    }

    pub fn compare_periods(&self, periods: &[String], years: &[i32]) -> Result<PeriodComparison> {
        comparison::compare_periods(&self.dataset, &self.registry, periods, years)
    }

    pub async fn ask(&self, question: &str) -> Result<String> {
        qa::ask(
            self.answerer.as_ref(),
            &self.dataset,
            question,
            &self.ask_options,
        )
        .await
    }

    /// Run one analysis against the session state.
    pub async fn run(&self, analysis: Analysis, selection: &Selection) -> Result<Output> {
        info!("Running analysis: {}", analysis.label());
        let ds = self.dataset.as_ref();

        let output = match analysis {
            Analysis::MonthlySales => Output::Chart(comparison::monthly_sales(ds)),
            Analysis::ComparePeriods => Output::Comparison(
                self.compare_periods(&selection.periods, &selection.years)?,
            ),
            Analysis::ProductSales => Output::Chart(analysis::product_sales(ds)),
            Analysis::ProductCustomerAge => Output::Chart(analysis::product_customer_age(ds)),
            Analysis::ProductSatisfaction => Output::Chart(analysis::product_satisfaction(ds)),
            Analysis::ProductGenderRatio => Output::Chart(analysis::product_gender_ratio(ds)),
            Analysis::RegionalSales => Output::Chart(analysis::regional_sales(ds)),
            Analysis::RegionalCustomerAge => Output::Chart(analysis::regional_customer_age(ds)),
            Analysis::RegionalSatisfaction => Output::Chart(analysis::regional_satisfaction(ds)),
            Analysis::RegionalGenderRatio => Output::Chart(analysis::regional_gender_ratio(ds)),
            Analysis::GenderAnalysis => Output::Chart(analysis::gender_sales(ds)),
            Analysis::AgeAnalysis => Output::Chart(analysis::age_sales(ds)),
            Analysis::RegionalDemographics => Output::Chart(analysis::regional_demographics(ds)),
            Analysis::RegionalAgeAnalysis => Output::Chart(analysis::regional_age(ds)),
            Analysis::SatisfactionCorrelation => {
                Output::Chart(analysis::satisfaction_correlation(ds))
            }
            Analysis::AgeDistribution => Output::Chart(analysis::age_distribution(ds)),
            Analysis::AskQuestion => {
                let question = selection.question.as_deref().unwrap_or_default();
                let answer = self.ask(question).await?;
                Output::Answer {
                    question: question.trim().to_string(),
                    answer,
                }
            }
        };

        Ok(output)
    }
}

/// Parse a `NAME=MM,MM` period spec.
pub fn parse_period_spec(spec: &str) -> Result<(String, Vec<String>)> {
    let (name, months) = spec.split_once('=').ok_or_else(|| {
        DashboardError::validation(format!("Expected NAME=MM,MM but got '{}'", spec))
    })?;

    let months = months
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
        .collect();

    Ok((name.trim().to_string(), months))
}
