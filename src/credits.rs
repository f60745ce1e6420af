use std::collections::HashSet;
use std::fmt;

use crate::credentials::mask;
use crate::error::{BatchError, SpeechError};
use crate::{CreditBalance, SpeechApi};

/// Balance of one reachable key.
#[derive(Debug, Clone)]
pub struct KeyBalance {
    pub key: String,
    pub balance: CreditBalance,
}

/// A key whose balance query failed. Not counted in the totals.
#[derive(Debug)]
pub struct UnreachableKey {
    pub key: String,
    pub error: SpeechError,
}

impl fmt::Display for UnreachableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key {}: {} ({})", mask(&self.key), self.error, self.error.kind())
    }
}

/// Credit snapshot over every unique key, computed fresh on each call.
#[derive(Debug, Default)]
pub struct CreditTotal {
    /// Distinct key strings examined, reachable or not.
    pub unique_keys: usize,
    /// Repeated key strings that were skipped.
    pub duplicates: usize,
    /// Sum of the remaining credits of reachable keys.
    pub total_remaining: u64,
    /// Sum of the period limits of reachable keys.
    pub total_limit: u64,
    pub balances: Vec<KeyBalance>,
    pub unreachable: Vec<UnreachableKey>,
}

/// Query every distinct key once and sum the balances that came back.
///
/// Keys are deduplicated by exact string equality, first occurrence first.
/// A failing key is reported in [`CreditTotal::unreachable`] and never
/// aborts the others.
pub fn aggregate_credits<A, I, S>(api: &A, keys: I) -> Result<CreditTotal, BatchError>
where
    A: SpeechApi + ?Sized,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    let mut duplicates = 0;
    for key in keys {
        let key = key.as_ref();
        if seen.insert(key.to_string()) {
            unique.push(key.to_string());
        } else {
            duplicates += 1;
        }
    }

    if unique.is_empty() {
        return Err(BatchError::NoApiKeys);
    }

    let mut total = CreditTotal {
        unique_keys: unique.len(),
        duplicates,
        ..Default::default()
    };

    for key in unique {
        match api.credit_balance(&key) {
            Ok(balance) => {
                log::debug!(
                    "Key {} has {} / {} credits",
                    mask(&key),
                    balance.remaining(),
                    balance.character_limit
                );
                total.total_remaining += balance.remaining();
                total.total_limit += balance.character_limit;
                total.balances.push(KeyBalance { key, balance });
            }
            Err(error) => {
                log::warn!("Balance query failed for key {}: {error}", mask(&key));
                total.unreachable.push(UnreachableKey { key, error });
            }
        }
    }

    log::info!(
        "{} credits remaining across {} unique keys ({} duplicates, {} unreachable)",
        total.total_remaining,
        total.unique_keys,
        total.duplicates,
        total.unreachable.len()
    );
    Ok(total)
}
