//! Mock leak analysis
//!
//! Placeholder value generator standing in for a real image-analysis
//! pipeline. It produces a severity classification, energy loss and savings
//! figures, and 1-5 remediation suggestions. A real pipeline can replace
//! this module behind the same [`AnalysisResult`] contract.

use rand::Rng;
use uuid::Uuid;

use crate::models::{AnalysisResult, Suggestion};

/// Remediation suggestion templates, cheapest first
const SUGGESTION_TEMPLATES: [(&str, &str, &str, &str, &str, &str); 5] = [
    (
        "Weatherstripping",
        "Seal around window frame",
        "Easy",
        "$10-20",
        "50-70%",
        "3-5 years",
    ),
    (
        "Caulking",
        "Fill stationary gaps and cracks",
        "Easy",
        "$5-15",
        "10-20%",
        "5 years",
    ),
    (
        "Door sweep",
        "Block the gap under the door",
        "Easy",
        "$10-25",
        "30-50%",
        "5-8 years",
    ),
    (
        "Foam sealant",
        "Expanding foam for larger wall gaps",
        "Moderate",
        "$10-30",
        "40-60%",
        "10+ years",
    ),
    (
        "Thermal curtains",
        "Insulating window coverings",
        "Easy",
        "$30-80",
        "10-25%",
        "5-10 years",
    ),
];

/// Run the (mocked) analysis for a task
pub fn run_analysis(task_id: &str) -> AnalysisResult {
    let count = rand::thread_rng().gen_range(1..=SUGGESTION_TEMPLATES.len());

    let suggestions = SUGGESTION_TEMPLATES[..count]
        .iter()
        .map(
            |(title, subtitle, difficulty, cost_range, estimated_reduction, lifetime)| {
                Suggestion {
                    suggestion_id: Uuid::new_v4().to_string(),
                    task_id: task_id.to_string(),
                    title: title.to_string(),
                    subtitle: subtitle.to_string(),
                    difficulty: difficulty.to_string(),
                    cost_range: cost_range.to_string(),
                    estimated_reduction: estimated_reduction.to_string(),
                    lifetime: lifetime.to_string(),
                }
            },
        )
        .collect();

    AnalysisResult {
        leak_severity: "Moderate".to_string(),
        energy_loss_value: 15.8,
        energy_loss_cost: 142.0,
        savings_percent: 19.0,
        savings_cost: 31.0,
        suggestions,
    }
}
