use std::collections::BTreeMap;
use std::net::SocketAddr;

use crate::ErrorSummary;
use crate::protocols::ddp::DdpError;

use super::ts_to_rfc3339;

pub(crate) const MAX_EXAMPLES: usize = 3;

#[derive(Debug, Default)]
pub(crate) struct ErrorStats {
    by_id: BTreeMap<&'static str, ErrorEntry>,
}

#[derive(Debug)]
struct ErrorEntry {
    message: String,
    count: u64,
    examples: Vec<String>,
}

impl ErrorStats {
    pub(crate) fn record(&mut self, err: &DdpError, src: SocketAddr, ts: Option<f64>) {
        let entry = self.by_id.entry(err.id()).or_insert_with(|| ErrorEntry {
            message: err.to_string(),
            count: 0,
            examples: Vec::new(),
        });
        entry.count += 1;
        if entry.examples.len() < MAX_EXAMPLES {
            let when = ts_to_rfc3339(ts).unwrap_or_else(|| "unknown time".to_string());
            entry
                .examples
                .push(format!("source {} @ {}", src, when));
        }
    }

    pub(crate) fn into_summaries(self) -> Vec<ErrorSummary> {
        self.by_id
            .into_iter()
            .map(|(id, entry)| ErrorSummary {
                id: id.to_string(),
                message: entry.message,
                count: entry.count,
                examples: entry.examples,
            })
            .collect()
    }
}
