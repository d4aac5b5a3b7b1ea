// crates/harness-core/src/model.rs
// ============================================================================
// Module: Harness Suite Model
// Description: Test suite, test case, and test asset records.
// Purpose: Parse suite documents leniently and validate assets at the edge.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Suite documents are authored by hand and are frequently incomplete, so the
//! serde model tolerates missing fields and unknown keys. Validation happens
//! when an asset is selected for dispatch: [`TestAsset::check`] either yields
//! the supported [`ExpectedOutput`] or an [`AssetRejection`] that the runner
//! reports as a warning.
//!
//! The only mutation the engine performs on a loaded asset is
//! [`TestAsset::set_normalized_input`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::identifiers::TestAssetId;
use crate::identifiers::TestCaseId;

// ============================================================================
// SECTION: Objectives
// ============================================================================

/// Test case objective tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TestObjective {
    /// Acceptance test: expected outputs are graded per asset.
    AcceptanceTest,
    /// Quantitative test: not graded by this harness.
    QuantitativeTest,
    /// Any objective this harness does not recognize.
    Other(String),
}

impl TestObjective {
    /// Returns the objective label used in suite documents.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::AcceptanceTest => "AcceptanceTest",
            Self::QuantitativeTest => "QuantitativeTest",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for TestObjective {
    fn from(value: String) -> Self {
        match value.as_str() {
            "AcceptanceTest" => Self::AcceptanceTest,
            "QuantitativeTest" => Self::QuantitativeTest,
            _ => Self::Other(value),
        }
    }
}

impl From<TestObjective> for String {
    fn from(value: TestObjective) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TestObjective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Expectation Categories
// ============================================================================

/// Expectation category describing how strongly an output should appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExpectedOutput {
    /// Output must rank among the top answers.
    TopAnswer,
    /// Output should rank in the upper half of results.
    Acceptable,
    /// Output may appear low in the results or be missing.
    BadButForgivable,
    /// Output must not appear at all.
    NeverShow,
    /// Output is too generic to grade; never dispatched.
    OverlyGeneric,
}

impl ExpectedOutput {
    /// Categories graded by the harness, in report order.
    pub const SUPPORTED: [Self; 4] =
        [Self::TopAnswer, Self::Acceptable, Self::BadButForgivable, Self::NeverShow];

    /// Returns the category label used in suite documents and statistics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TopAnswer => "TopAnswer",
            Self::Acceptable => "Acceptable",
            Self::BadButForgivable => "BadButForgivable",
            Self::NeverShow => "NeverShow",
            Self::OverlyGeneric => "OverlyGeneric",
        }
    }

    /// Parses a category label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "TopAnswer" => Some(Self::TopAnswer),
            "Acceptable" => Some(Self::Acceptable),
            "BadButForgivable" => Some(Self::BadButForgivable),
            "NeverShow" => Some(Self::NeverShow),
            "OverlyGeneric" => Some(Self::OverlyGeneric),
            _ => None,
        }
    }

    /// Returns true when the category is graded by the harness.
    #[must_use]
    pub fn is_supported(self) -> bool {
        Self::SUPPORTED.contains(&self)
    }
}

impl fmt::Display for ExpectedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Suite Records
// ============================================================================

/// Test suite document.
///
/// # Invariants
/// - Test cases iterate in identifier order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestSuite {
    /// Suite identifier, when the document carries one.
    #[serde(default)]
    pub id: Option<String>,
    /// Test cases keyed by identifier.
    ///
    /// Cases run and report in ascending identifier order, not in the order
    /// they appear in the suite document.
    #[serde(default)]
    pub test_cases: BTreeMap<String, TestCase>,
}

/// One scenario under test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    /// Test case identifier.
    pub id: TestCaseId,
    /// Human-readable name.
    #[serde(default)]
    pub name: Option<String>,
    /// Objective tag; missing objectives are skipped by the runner.
    #[serde(default, rename = "test_case_objective")]
    pub objective: Option<TestObjective>,
    /// Assets in suite order.
    #[serde(default)]
    pub test_assets: Vec<TestAsset>,
}

/// One concrete input/expected-output pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestAsset {
    /// Asset identifier.
    pub id: TestAssetId,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Input CURIE; replaced by its normalized form before query construction.
    #[serde(default)]
    pub input_id: Option<String>,
    /// Biolink category of the input node.
    #[serde(default)]
    pub input_category: Option<String>,
    /// Biolink predicate connecting input and output.
    #[serde(default)]
    pub predicate_id: Option<String>,
    /// Expected output CURIE.
    #[serde(default)]
    pub output_id: Option<String>,
    /// Biolink category of the output node.
    #[serde(default)]
    pub output_category: Option<String>,
    /// Expectation category label.
    #[serde(default)]
    pub expected_output: Option<String>,
}

/// Reasons an asset is excluded from dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetRejection {
    /// A field required to build a query is absent or empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    /// Expectation category is unknown or not graded.
    #[error("unsupported expected output: {0}")]
    UnsupportedExpectation(String),
}

impl TestAsset {
    /// Returns the display name, falling back to the asset identifier.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().filter(|name| !name.is_empty()).unwrap_or_else(|| self.id.as_str())
    }

    /// Returns the parsed expectation category when it is known.
    #[must_use]
    pub fn expected_category(&self) -> Option<ExpectedOutput> {
        self.expected_output.as_deref().and_then(ExpectedOutput::parse)
    }

    /// Validates that the asset can be dispatched and graded.
    ///
    /// # Errors
    ///
    /// Returns [`AssetRejection`] when a required field is missing or the
    /// expectation category is not supported.
    pub fn check(&self) -> Result<ExpectedOutput, AssetRejection> {
        let label = self
            .expected_output
            .as_deref()
            .filter(|label| !label.is_empty())
            .ok_or(AssetRejection::MissingField("expected_output"))?;
        let category = ExpectedOutput::parse(label)
            .filter(|category| category.is_supported())
            .ok_or_else(|| AssetRejection::UnsupportedExpectation(label.to_string()))?;
        for (field, value) in [
            ("input_id", &self.input_id),
            ("predicate_id", &self.predicate_id),
            ("output_id", &self.output_id),
        ] {
            if value.as_deref().is_none_or(str::is_empty) {
                return Err(AssetRejection::MissingField(field));
            }
        }
        Ok(category)
    }

    /// Overwrites the input CURIE with its normalized form.
    pub fn set_normalized_input(&mut self, normalized: String) {
        self.input_id = Some(normalized);
    }
}
