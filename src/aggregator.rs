//! Cross-row merging of resolved responses into one record per (domain, prompt).

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::resolver::Resolution;

// hex chars of the SHA-256 kept in hash-derived ids
const HASH_ID_LEN: usize = 16;

/// One finalized output unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub domain: String,
    pub prompt: String,
    pub chosen: Vec<String>,
    pub rejected: Vec<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum EmptyBucketPolicy {
    /// Drop buckets whose chosen or rejected list is empty.
    #[default]
    Drop,
    Keep,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RecordOrder {
    #[default]
    FirstSeen,
    DomainId,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OutputPolicy {
    pub empty: EmptyBucketPolicy,
    pub order: RecordOrder,
}

/// `domain:question_id` when an id is known, else `domain:<sha256(prompt)[..16]>`.
pub fn derive_id(domain: &str, prompt: &str, question_id: Option<&str>) -> String {
    match question_id {
        Some(qid) => format!("{domain}:{qid}"),
        None => format!("{domain}:{}", content_hash(prompt)),
    }
}

pub fn content_hash(prompt: &str) -> String {
    let digest = Sha256::digest(prompt.as_bytes());
    let mut hex = format!("{digest:x}");
    hex.truncate(HASH_ID_LEN);
    hex
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PromptBucket {
    chosen: IndexSet<String>,
    rejected: IndexSet<String>,
    question_id: Option<String>,
}

impl PromptBucket {
    // contains() first so a repeated response costs no allocation
    pub fn push_chosen(&mut self, response: &str) {
        if !self.chosen.contains(response) {
            self.chosen.insert(response.to_owned());
        }
    }

    pub fn push_rejected(&mut self, response: &str) {
        if !self.rejected.contains(response) {
            self.rejected.insert(response.to_owned());
        }
    }

    // first non-null id sticks
    pub fn note_question_id(&mut self, question_id: Option<&str>) {
        if self.question_id.is_none() {
            self.question_id = question_id.map(str::to_owned);
        }
    }

    pub fn chosen(&self) -> impl Iterator<Item = &str> {
        self.chosen.iter().map(String::as_str)
    }

    pub fn rejected(&self) -> impl Iterator<Item = &str> {
        self.rejected.iter().map(String::as_str)
    }

    pub fn question_id(&self) -> Option<&str> {
        self.question_id.as_deref()
    }

    pub fn has_both_sides(&self) -> bool {
        !self.chosen.is_empty() && !self.rejected.is_empty()
    }
}

type BucketKey = (String, String);

/// Buckets keyed by (domain, prompt), in first-seen order.
#[derive(Debug, Default)]
pub struct PromptAggregator {
    buckets: IndexMap<BucketKey, PromptBucket>,
}

impl PromptAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn bucket(&self, domain: &str, prompt: &str) -> Option<&PromptBucket> {
        self.buckets.get(&(domain.to_owned(), prompt.to_owned()))
    }

    /// Fetch or create the bucket for a key, recording `question_id` if none is set yet.
    pub fn touch(
        &mut self,
        domain: &str,
        prompt: &str,
        question_id: Option<&str>,
    ) -> &mut PromptBucket {
        let bucket = self
            .buckets
            .entry((domain.to_owned(), prompt.to_owned()))
            .or_default();
        bucket.note_question_id(question_id);
        bucket
    }

    pub fn add(&mut self, domain: &str, prompt: &str, chosen: &str, rejected: &str) {
        let bucket = self.touch(domain, prompt, None);
        bucket.push_chosen(chosen);
        bucket.push_rejected(rejected);
    }

    /// Merge one row's resolution into its bucket.
    pub fn absorb(
        &mut self,
        domain: &str,
        prompt: &str,
        question_id: Option<&str>,
        resolution: &Resolution<'_>,
    ) {
        let bucket = self.touch(domain, prompt, question_id);
        match resolution {
            Resolution::Pairs(prefs) => {
                for p in prefs {
                    bucket.push_chosen(p.chosen);
                    bucket.push_rejected(p.rejected);
                }
            }
            Resolution::Labels { chosen, rejected } => {
                chosen.iter().for_each(|c| bucket.push_chosen(c));
                rejected.iter().for_each(|r| bucket.push_rejected(r));
            }
        }
    }

    /// Flatten buckets into records.
    ///
    /// A question id is only trusted while it is unique: when a later prompt
    /// of the same domain carries an id an earlier record already uses, that
    /// record falls back to the prompt hash.
    pub fn finalize(self, policy: OutputPolicy) -> Vec<Record> {
        let mut taken: HashSet<String> = HashSet::new();
        let mut records: Vec<Record> = self
            .buckets
            .into_iter()
            .filter(|(_, b)| policy.empty == EmptyBucketPolicy::Keep || b.has_both_sides())
            .map(|((domain, prompt), b)| {
                let mut id = derive_id(&domain, &prompt, b.question_id.as_deref());
                if taken.contains(&id) {
                    id = derive_id(&domain, &prompt, None);
                }
                taken.insert(id.clone());
                Record {
                    id,
                    domain,
                    prompt,
                    chosen: b.chosen.into_iter().collect(),
                    rejected: b.rejected.into_iter().collect(),
                }
            })
            .collect();

        if policy.order == RecordOrder::DomainId {
            // stable: equal (domain, id) keep first-seen order
            records.sort_by(|a, b| (&a.domain, &a.id).cmp(&(&b.domain, &b.id)));
        }
        records
    }
}
