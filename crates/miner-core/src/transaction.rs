use std::fmt;

use serde::Serialize;

use crate::constants::{TRANSACTION_TEMPLATE_HEAD, TRANSACTION_TEMPLATE_TAIL};
use crate::digest_hex;

/// A transaction is only its digest; there is no structure behind it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Transaction(String);

impl Transaction {
    /// Hash an arbitrary caller-supplied payload into a transaction.
    pub fn from_payload(payload: impl AsRef<[u8]>) -> Self {
        Self(digest_hex(payload))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Transaction {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Endless source of unique transactions. Each instance owns its own counter,
/// so two generators produce the same sequence independently.
#[derive(Debug, Default)]
pub struct TransactionGenerator {
    seed: u64,
}

impl TransactionGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed that the next transaction will embed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn next_transaction(&mut self) -> Transaction {
        let payload = format!(
            "{TRANSACTION_TEMPLATE_HEAD}{}{TRANSACTION_TEMPLATE_TAIL}",
            self.seed
        );
        self.seed += 1;
        Transaction::from_payload(payload)
    }
}

impl Iterator for TransactionGenerator {
    type Item = Transaction;

    fn next(&mut self) -> Option<Transaction> {
        Some(self.next_transaction())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}
