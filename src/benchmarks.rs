//! The five PPE correctness preference benchmarks.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BenchmarkSpec {
    pub name: &'static str,
    // Hub dataset repository
    pub repo: &'static str,
    pub domain: &'static str,
    // split loaded unless the run overrides it
    pub split: &'static str,
}

pub const CORRECTNESS_BENCHMARKS: [BenchmarkSpec; 5] = [
    BenchmarkSpec {
        name: "mmlu_pro_best_of_k",
        repo: "lmarena-ai/PPE-MMLU-Pro-Best-of-K",
        domain: "mmlu_pro",
        split: "train",
    },
    BenchmarkSpec {
        name: "math_best_of_k",
        repo: "lmarena-ai/PPE-MATH-Best-of-K",
        domain: "math",
        split: "train",
    },
    BenchmarkSpec {
        name: "gpqa_best_of_k",
        repo: "lmarena-ai/PPE-GPQA-Best-of-K",
        domain: "gpqa",
        split: "train",
    },
    BenchmarkSpec {
        name: "ifeval_best_of_k",
        repo: "lmarena-ai/PPE-IFEval-Best-of-K",
        domain: "ifeval",
        split: "train",
    },
    BenchmarkSpec {
        name: "mbpp_plus_best_of_k",
        repo: "lmarena-ai/PPE-MBPP-Plus-Best-of-K",
        domain: "mbpp_plus",
        split: "train",
    },
];

/// Look a benchmark up by its name (`math_best_of_k`) or its domain (`math`).
pub fn find(key: &str) -> Option<&'static BenchmarkSpec> {
    let key = key.trim();
    CORRECTNESS_BENCHMARKS
        .iter()
        .find(|b| b.name == key || b.domain == key)
}

/// Resolve a list of names into specs, keeping the configured order.
/// Returns the first unknown key as the error.
pub fn select<S: AsRef<str>>(keys: &[S]) -> Result<Vec<BenchmarkSpec>, String> {
    let mut wanted = Vec::with_capacity(keys.len());
    for key in keys {
        let spec = find(key.as_ref()).ok_or_else(|| key.as_ref().to_string())?;
        wanted.push(spec.name);
    }
    Ok(CORRECTNESS_BENCHMARKS
        .iter()
        .filter(|b| wanted.contains(&b.name))
        .copied()
        .collect())
}
