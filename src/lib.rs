//! Builds the PPE correctness preference dataset.
//!
//! Rows from the five PPE "best of K" benchmarks are resolved into chosen /
//! rejected responses, merged per (domain, prompt) and written as one JSON
//! array for the accuracy consumer.

pub mod aggregator;
pub mod benchmarks;
pub mod error;
pub mod pipeline;
pub mod resolver;
pub mod row;
pub mod source;
pub mod writer;

pub use aggregator::{
    derive_id, EmptyBucketPolicy, OutputPolicy, PromptAggregator, PromptBucket, Record,
    RecordOrder,
};
pub use benchmarks::{BenchmarkSpec, CORRECTNESS_BENCHMARKS};
pub use error::{MalformedRow, PpeError, Result};
pub use pipeline::{build_dataset, BenchmarkReport, BuildOptions, BuildReport, RetrievalPolicy};
pub use resolver::{resolve, Preference, Resolution, ResolveStats};
pub use row::Row;
pub use source::{HubSource, LocalSource, RowSource, RowStream};
pub use writer::write_records;
