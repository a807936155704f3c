use std::collections::HashMap;

use ppe_corr::{BenchmarkSpec, PpeError, RowSource, RowStream};
use serde_json::Value;

/// Serves canned rows per benchmark name. Unknown names fail like a bad repo id.
#[derive(Default)]
pub struct FakeSource {
    pub rows: HashMap<&'static str, Vec<Value>>,
    // benchmarks whose stream breaks after this many rows
    pub break_after: HashMap<&'static str, usize>,
}

impl FakeSource {
    pub fn with(mut self, name: &'static str, rows: Vec<Value>) -> Self {
        self.rows.insert(name, rows);
        self
    }
}

impl RowSource for FakeSource {
    fn load(&self, benchmark: &BenchmarkSpec, _split: &str) -> ppe_corr::Result<RowStream> {
        let name = benchmark.name;
        let rows = self
            .rows
            .get(name)
            .cloned()
            .ok_or_else(|| PpeError::not_found(name, "dataset"))?;

        match self.break_after.get(name) {
            None => Ok(RowStream::from_values(rows)),
            Some(&n) => {
                let good = rows.into_iter().take(n).map(|v| Ok(Ok(v)));
                let bad = std::iter::once(Err(PpeError::retrieval(name, "connection reset")));
                Ok(RowStream {
                    len_hint: None,
                    rows: Box::new(good.chain(bad)),
                })
            }
        }
    }
}

pub fn bench(domain: &str) -> BenchmarkSpec {
    *ppe_corr::benchmarks::find(domain).expect("known benchmark")
}
