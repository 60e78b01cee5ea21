use std::collections::BTreeMap;

use quiz_core::model::Bank;

use crate::repository::StorageError;

/// Immutable, process-wide mapping from bank name to its questions.
///
/// Populated once before serving starts. Names iterate in sorted order so
/// listings are deterministic.
#[derive(Debug, Clone, Default)]
pub struct BankStore {
    banks: BTreeMap<String, Bank>,
}

impl BankStore {
    #[must_use]
    pub fn new(banks: impl IntoIterator<Item = Bank>) -> Self {
        let banks = banks
            .into_iter()
            .map(|bank| (bank.name().to_string(), bank))
            .collect();
        Self { banks }
    }

    #[must_use]
    pub fn list_bank_names(&self) -> Vec<String> {
        self.banks.keys().cloned().collect()
    }

    /// Look up a bank by name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::BankNotFound` when no bank has that name.
    pub fn get_bank(&self, name: &str) -> Result<&Bank, StorageError> {
        self.banks.get(name).ok_or_else(|| StorageError::BankNotFound {
            name: name.to_string(),
        })
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.banks.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.banks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.banks.is_empty()
    }
}
