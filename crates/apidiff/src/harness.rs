//! Comparison harness driving both servers over an endpoint suite

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::client::{ApiClient, ApiResponse};
use crate::compare::{
    diff_headers, diff_values, ComparedEndpoint, ComparisonResult, DiffKind, Difference,
    FailedEndpoint,
};
use crate::config::EndpointSpec;
use crate::error::{CompareError, CompareResult};

/// Replays endpoint specs against a reference/candidate server pair
///
/// Requests are strictly sequential: reference first, then candidate, and
/// the next endpoint only starts once the current result is built. The
/// harness holds no result state; [`Comparator::run_test_suite`] returns
/// the accumulated [`Report`].
pub struct Comparator {
    reference: ApiClient,
    candidate: ApiClient,
    verbose: bool,
}

/// Full machine-readable outcome of one comparison run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub reference_base: String,
    pub candidate_base: String,
    pub total_tests: usize,
    pub passed: usize,
    pub results: Vec<ComparisonResult>,
}

impl Comparator {
    /// Create a comparator for the two base URLs
    ///
    /// Invalid base URLs are rejected here, before any comparison runs.
    pub fn new(reference_base: &str, candidate_base: &str, verbose: bool) -> CompareResult<Self> {
        Ok(Self {
            reference: ApiClient::new("reference", reference_base)?,
            candidate: ApiClient::new("candidate", candidate_base)?,
            verbose,
        })
    }

    /// Replay one endpoint against both servers and compare the responses
    ///
    /// A failure on either call (timeout, connection error, DNS failure,
    /// or an unsendable descriptor) degrades the whole endpoint to the
    /// error variant; no partial comparison is recorded.
    pub async fn compare_endpoint(&self, spec: &EndpointSpec) -> ComparisonResult {
        let method = spec.method.to_uppercase();

        if self.verbose {
            println!("\n🔍 Testing {} {}", method, spec.path);
        }

        let result = match self.exchange(spec).await {
            Ok((reference, candidate)) => ComparisonResult::Compared(evaluate(
                method,
                spec.path.clone(),
                &reference,
                &candidate,
            )),
            Err(err) => ComparisonResult::Failed(FailedEndpoint {
                method,
                path: spec.path.clone(),
                success: false,
                error: err.to_string(),
            }),
        };

        if self.verbose {
            if result.success() {
                println!("  ✅ match");
            } else {
                println!("  ❌ mismatch");
                for line in result.failure_lines() {
                    println!("     {line}");
                }
            }
        }

        result
    }

    /// Run the full endpoint suite in order and print the summary
    ///
    /// Every spec produces exactly one result, order preserved. The run
    /// passed overall iff [`Report::all_passed`] is true on the returned
    /// report.
    pub async fn run_test_suite(&self, endpoints: &[EndpointSpec]) -> Report {
        println!("\n🚀 Running API comparison");
        println!("Reference: {}", self.reference.base());
        println!("Candidate: {}", self.candidate.base());
        println!("Endpoints: {}", endpoints.len());

        let mut results = Vec::with_capacity(endpoints.len());
        for spec in endpoints {
            results.push(self.compare_endpoint(spec).await);
        }

        let report = Report::new(
            self.reference.base().to_string(),
            self.candidate.base().to_string(),
            results,
        );
        report.print_summary();
        report
    }

    /// Issue the two requests sequentially, reference first
    async fn exchange(&self, spec: &EndpointSpec) -> CompareResult<(ApiResponse, ApiResponse)> {
        let reference = self.reference.execute(spec).await?;
        let candidate = self.candidate.execute(spec).await?;
        Ok((reference, candidate))
    }
}

/// Compare two captured responses field by field
fn evaluate(
    method: String,
    path: String,
    reference: &ApiResponse,
    candidate: &ApiResponse,
) -> ComparedEndpoint {
    let status_match = reference.status == candidate.status;

    let body_diff = match (&reference.body, &candidate.body) {
        (Some(ref_body), Some(cand_body)) => {
            let differences = diff_values(ref_body, cand_body);
            if differences.is_empty() {
                None
            } else {
                Some(differences)
            }
        }
        // At least one body is not JSON: compare the raw text
        _ => {
            if reference.raw_body == candidate.raw_body {
                None
            } else {
                Some(vec![Difference {
                    path: String::new(),
                    kind: DiffKind::TextChanged,
                    reference: Value::String(reference.raw_body.clone()),
                    candidate: Value::String(candidate.raw_body.clone()),
                }])
            }
        }
    };
    let body_match = body_diff.is_none();

    let header_diff = diff_headers(reference, candidate);
    let headers_match = header_diff.is_empty();

    debug!(
        "{method} {path}: status_match={status_match} body_match={body_match} \
         headers_match={headers_match}"
    );

    ComparedEndpoint {
        method,
        path,
        status_match,
        body_match,
        headers_match,
        reference_status: reference.status.as_u16(),
        candidate_status: candidate.status.as_u16(),
        body_diff,
        header_diff,
        success: status_match && body_match,
    }
}

impl Report {
    /// Build a report from the accumulated results
    pub fn new(reference_base: String, candidate_base: String, results: Vec<ComparisonResult>) -> Self {
        let total_tests = results.len();
        let passed = results.iter().filter(|r| r.success()).count();
        Self {
            reference_base,
            candidate_base,
            total_tests,
            passed,
            results,
        }
    }

    /// True iff every endpoint comparison succeeded
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.success())
    }

    /// Print totals, percentages, and every failing endpoint with its cause
    pub fn print_summary(&self) {
        let failed = self.total_tests - self.passed;

        println!("\n{}", "=".repeat(60));
        println!("📊 Results Summary");
        println!("{}", "=".repeat(60));
        println!("Total:  {}", self.total_tests);
        println!("Passed: {} ({:.1}%)", self.passed, self.percentage(self.passed));
        println!("Failed: {} ({:.1}%)", failed, self.percentage(failed));

        if failed > 0 {
            println!("\n❌ Failed endpoints:");
            for result in self.results.iter().filter(|r| !r.success()) {
                println!("  - {} {}", result.method(), result.path());
                for line in result.failure_lines() {
                    println!("    {line}");
                }
            }
        }
    }

    /// Serialize the full report to `path` as pretty-printed JSON
    ///
    /// Overwrites any existing file.
    pub fn export_report(&self, path: impl AsRef<Path>) -> CompareResult<()> {
        let path = path.as_ref();

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CompareError::SerializeReport { source: e })?;
        fs::write(path, json).map_err(|e| CompareError::WriteReport {
            path: path.to_path_buf(),
            source: e,
        })?;

        println!("\n📄 Detailed report saved to: {}", path.display());
        Ok(())
    }

    fn percentage(&self, count: usize) -> f64 {
        if self.total_tests == 0 {
            0.0
        } else {
            100.0 * count as f64 / self.total_tests as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn passed(path: &str) -> ComparisonResult {
        ComparisonResult::Compared(ComparedEndpoint {
            method: "GET".to_string(),
            path: path.to_string(),
            status_match: true,
            body_match: true,
            headers_match: true,
            reference_status: 200,
            candidate_status: 200,
            body_diff: None,
            header_diff: BTreeMap::new(),
            success: true,
        })
    }

    fn errored(path: &str) -> ComparisonResult {
        ComparisonResult::Failed(FailedEndpoint {
            method: "GET".to_string(),
            path: path.to_string(),
            success: false,
            error: "connection refused".to_string(),
        })
    }

    #[test]
    fn test_report_aggregation() {
        let report = Report::new(
            "http://localhost:3000".to_string(),
            "http://localhost:3001".to_string(),
            vec![passed("/a"), errored("/b"), passed("/c")],
        );

        assert_eq!(report.total_tests, 3);
        assert_eq!(report.passed, 2);
        assert!(!report.all_passed());
    }

    #[test]
    fn test_all_passed() {
        let report = Report::new(
            "http://localhost:3000".to_string(),
            "http://localhost:3001".to_string(),
            vec![passed("/a"), passed("/b")],
        );
        assert!(report.all_passed());
    }

    #[test]
    fn test_empty_suite_is_vacuously_successful() {
        let report = Report::new(
            "http://localhost:3000".to_string(),
            "http://localhost:3001".to_string(),
            Vec::new(),
        );
        assert!(report.all_passed());
        assert_eq!(report.total_tests, 0);
        // Must not divide by zero
        report.print_summary();
    }

    #[test]
    fn test_export_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        std::fs::write(&path, "stale content").unwrap();

        let report = Report::new(
            "http://localhost:3000".to_string(),
            "http://localhost:3001".to_string(),
            vec![passed("/a")],
        );
        report.export_report(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let parsed: Report = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed.total_tests, 1);
        assert_eq!(parsed.passed, 1);
        assert_eq!(parsed.reference_base, "http://localhost:3000");
    }
}
