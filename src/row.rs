//! Typed view of one raw benchmark row.

use serde_json::{Map, Value};

use crate::error::MalformedRow;

const PAIRS_KEY: &str = "sampled_conflict_pairs";
const ID_KEYS: [&str; 3] = ["question_id", "id", "uid"];

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub prompt: String,
    pub responses: Vec<String>,
    pub scores: Vec<f64>,
    // None means the row carries no explicit pairs
    pub conflict_pairs: Option<Vec<(usize, usize)>>,
    pub question_id: Option<String>,
    // pair entries that were not two non-negative integers
    pub malformed_pairs: usize,
}

impl Row {
    pub fn from_value(value: &Value) -> Result<Self, MalformedRow> {
        let obj = value.as_object().ok_or(MalformedRow::NotAnObject)?;

        let prompt = obj
            .get("prompt")
            .and_then(Value::as_str)
            .ok_or(MalformedRow::MissingField("prompt"))?
            .to_owned();

        let scores = parse_scores(obj)?;

        let responses = discover_responses(obj);
        if responses.is_empty() {
            return Err(MalformedRow::NoResponses);
        }

        let (conflict_pairs, malformed_pairs) = match obj.get(PAIRS_KEY) {
            None | Some(Value::Null) => (None, 0),
            Some(Value::Array(raw)) => {
                let pairs: Vec<(usize, usize)> = raw.iter().filter_map(parse_pair).collect();
                let bad = raw.len() - pairs.len();
                (Some(pairs), bad)
            }
            Some(_) => return Err(MalformedRow::MissingField(PAIRS_KEY)),
        };

        let question_id = ID_KEYS
            .iter()
            .find_map(|k| obj.get(*k).and_then(id_to_string));

        Ok(Self {
            prompt,
            responses,
            scores,
            conflict_pairs,
            question_id,
            malformed_pairs,
        })
    }
}

fn parse_scores(obj: &Map<String, Value>) -> Result<Vec<f64>, MalformedRow> {
    let raw = obj
        .get("scores")
        .and_then(Value::as_array)
        .ok_or(MalformedRow::MissingField("scores"))?;
    raw.iter()
        .enumerate()
        .map(|(i, v)| match v {
            Value::Number(n) => n.as_f64().ok_or(MalformedRow::BadScore(i)),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            _ => Err(MalformedRow::BadScore(i)),
        })
        .collect()
}

// `responses` array if present, else response_1, response_2, ... until a gap
fn discover_responses(obj: &Map<String, Value>) -> Vec<String> {
    if let Some(arr) = obj.get("responses").and_then(Value::as_array) {
        return arr
            .iter()
            .map_while(|v| v.as_str().map(str::to_owned))
            .collect();
    }
    (1..)
        .map_while(|k| {
            obj.get(&format!("response_{k}"))
                .and_then(Value::as_str)
                .map(str::to_owned)
        })
        .collect()
}

fn parse_pair(v: &Value) -> Option<(usize, usize)> {
    match v.as_array()?.as_slice() {
        [i, j] => Some((index(i)?, index(j)?)),
        _ => None,
    }
}

// out of usize range is malformed, never wrapped
fn index(v: &Value) -> Option<usize> {
    usize::try_from(v.as_u64()?).ok()
}

fn id_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}
