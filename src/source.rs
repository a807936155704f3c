//! Row sources: where raw benchmark rows come from.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use hf_hub::api::sync::{Api, ApiBuilder};
use hf_hub::{Repo, RepoType};
use log::{debug, info};
use parquet::file::reader::{FileReader, SerializedFileReader};
use serde_json::Value;

use crate::benchmarks::BenchmarkSpec;
use crate::error::{MalformedRow, PpeError, Result};

/// One source row: a JSON value, or a row that could not even be decoded.
pub type RawRow = std::result::Result<Value, MalformedRow>;

/// Raw rows of one benchmark split, in source order.
///
/// An outer `Err` means the source itself broke; an inner `Err` is a single
/// bad row and the stream goes on.
pub struct RowStream {
    pub len_hint: Option<u64>,
    pub rows: Box<dyn Iterator<Item = Result<RawRow>>>,
}

impl RowStream {
    pub fn from_values(values: Vec<Value>) -> Self {
        Self {
            len_hint: Some(values.len() as u64),
            rows: Box::new(values.into_iter().map(|v| Ok(Ok(v)))),
        }
    }
}

pub trait RowSource {
    fn load(&self, benchmark: &BenchmarkSpec, split: &str) -> Result<RowStream>;
}

// HF Hub

/// Reads the parquet shards of a Hub dataset repository.
pub struct HubSource {
    api: Api,
    revision: String,
}

impl HubSource {
    pub fn new(token: Option<String>, revision: impl Into<String>) -> Result<Self> {
        let api = ApiBuilder::new()
            .with_token(token)
            .build()
            .map_err(|e| PpeError::retrieval("hub client", e.to_string()))?;
        Ok(Self {
            api,
            revision: revision.into(),
        })
    }
}

impl RowSource for HubSource {
    fn load(&self, benchmark: &BenchmarkSpec, split: &str) -> Result<RowStream> {
        let name = benchmark.name;
        let handle = self.api.repo(Repo::with_revision(
            benchmark.repo.to_string(),
            RepoType::Dataset,
            self.revision.clone(),
        ));

        let info = handle
            .info()
            .map_err(|e| PpeError::retrieval(name, e.to_string()))?;
        let mut shards: Vec<String> = info
            .siblings
            .into_iter()
            .map(|s| s.rfilename)
            .filter(|f| is_split_shard(f, split))
            .collect();
        shards.sort();
        if shards.is_empty() {
            return Err(PpeError::not_found(
                name,
                format!("parquet shards for split '{split}' in {}", benchmark.repo),
            ));
        }

        let mut readers = Vec::with_capacity(shards.len());
        let mut total = 0u64;
        for remote in &shards {
            // cached download, reused across runs
            let local = handle
                .get(remote)
                .map_err(|e| PpeError::retrieval(name, e.to_string()))?;
            debug!("{name}: {remote} -> {}", local.display());
            let file = File::open(&local)
                .map_err(|e| PpeError::retrieval(name, e))?;
            let reader = SerializedFileReader::new(file)
                .map_err(|e| PpeError::retrieval(name, e))?;
            total += reader.metadata().file_metadata().num_rows().max(0) as u64;
            readers.push(reader);
        }
        info!("{name}: {} shard(s), {total} rows", shards.len());

        let rows = readers.into_iter().flat_map(move |reader| {
            reader.into_iter().map(move |row| {
                row.map(|r| Ok(r.to_json_value()))
                    .map_err(|e| PpeError::retrieval(name, e))
            })
        });
        Ok(RowStream {
            len_hint: Some(total),
            rows: Box::new(rows),
        })
    }
}

/// `data/train-00000-of-00001.parquet` and `default/train/0000.parquet` both count for `train`.
pub fn is_split_shard(path: &str, split: &str) -> bool {
    if !path.ends_with(".parquet") {
        return false;
    }
    let mut parts: Vec<&str> = path.split('/').collect();
    let file = parts.pop().unwrap_or_default();
    parts.contains(&split)
        || file.starts_with(&format!("{split}-"))
        || file.starts_with(&format!("{split}."))
}

// Local files

/// Reads pre-downloaded rows from a directory.
///
/// Looked up in order: `<name>/<split>.jsonl`, `<name>/<split>.json`,
/// `<name>.jsonl`, `<name>.json`. `.json` files hold a top-level array,
/// `.jsonl` files one object per line.
pub struct LocalSource {
    dir: PathBuf,
}

impl LocalSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn candidates(&self, name: &str, split: &str) -> [PathBuf; 4] {
        [
            self.dir.join(name).join(format!("{split}.jsonl")),
            self.dir.join(name).join(format!("{split}.json")),
            self.dir.join(format!("{name}.jsonl")),
            self.dir.join(format!("{name}.json")),
        ]
    }
}

impl RowSource for LocalSource {
    fn load(&self, benchmark: &BenchmarkSpec, split: &str) -> Result<RowStream> {
        let name = benchmark.name;
        let path = self
            .candidates(name, split)
            .into_iter()
            .find(|p| p.is_file())
            .ok_or_else(|| {
                PpeError::not_found(name, format!("local rows under {}", self.dir.display()))
            })?;
        info!("{name}: reading {}", path.display());

        if is_jsonl(&path) {
            let file = File::open(&path).map_err(|e| PpeError::retrieval(name, e))?;
            let rows = BufReader::new(file)
                .lines()
                .enumerate()
                .filter(|(_, line)| line.as_ref().map_or(true, |l| !l.trim().is_empty()))
                .map(move |(n, line)| {
                    let line = line.map_err(|e| PpeError::retrieval(name, e))?;
                    Ok(serde_json::from_str(&line)
                        .map_err(|e| MalformedRow::InvalidJson(format!("line {}: {e}", n + 1))))
                });
            return Ok(RowStream {
                len_hint: None,
                rows: Box::new(rows),
            });
        }

        let raw = fs::read_to_string(&path).map_err(|e| PpeError::retrieval(name, e))?;
        match serde_json::from_str::<Value>(&raw).map_err(|e| PpeError::retrieval(name, e))? {
            Value::Array(values) => Ok(RowStream::from_values(values)),
            _ => Err(PpeError::retrieval(
                name,
                format!("{} is not a JSON array", path.display()),
            )),
        }
    }
}

fn is_jsonl(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "jsonl")
}
