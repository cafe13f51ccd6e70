use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::matches::MatchRecord;

/// Result of comparing a league's in-memory match list with the server's full set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub league_id: String,
    pub server_count: usize,
    pub memory_count: usize,
    /// Ids the server has that memory does not, in server order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_from_memory: Vec<String>,
    /// Ids held in memory that the server does not have, in memory order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_in_memory: Vec<String>,
    /// Ids that appear more than once in memory.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub duplicated_in_memory: Vec<String>,
}

impl ValidationReport {
    pub fn compare(league_id: &str, server: &[MatchRecord], memory: &[MatchRecord]) -> Self {
        let server_ids: HashSet<&str> = server.iter().map(|r| r.id.as_str()).collect();

        let mut memory_ids: HashSet<&str> = HashSet::with_capacity(memory.len());
        let mut duplicated_in_memory = Vec::new();
        for record in memory {
            if !memory_ids.insert(record.id.as_str()) && !duplicated_in_memory.contains(&record.id)
            {
                duplicated_in_memory.push(record.id.clone());
            }
        }

        let missing_from_memory = server
            .iter()
            .filter(|r| !memory_ids.contains(r.id.as_str()))
            .map(|r| r.id.clone())
            .collect();
        let mut seen_extra = HashSet::new();
        let extra_in_memory = memory
            .iter()
            .filter(|r| !server_ids.contains(r.id.as_str()) && seen_extra.insert(r.id.as_str()))
            .map(|r| r.id.clone())
            .collect();

        Self {
            league_id: league_id.to_string(),
            server_count: server.len(),
            memory_count: memory.len(),
            missing_from_memory,
            extra_in_memory,
            duplicated_in_memory,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.server_count == self.memory_count
            && self.missing_from_memory.is_empty()
            && self.extra_in_memory.is_empty()
            && self.duplicated_in_memory.is_empty()
    }
}
