use std::collections::BTreeMap;

use chrono::{Local, NaiveDate};
use serde::{de::DeserializeOwned, Serialize};

use crate::errors::LedgerError;
use crate::storage::{keys, StorageBackend};

use super::category::{default_categories, Category, CategoryPatch, NewCategory};
use super::transaction::{NewTransaction, Transaction};

const DEFAULT_AMOUNT: &str = "0";

/// The ledger state container: owns all transactions, categories, and session
/// state, exposes derived aggregates, and writes every persisted field back
/// to its storage key as it changes.
///
/// Construct exactly one per process with [`LedgerContainer::hydrate`] and
/// pass it by reference to whatever presentation code needs it.
pub struct LedgerContainer {
    storage: Box<dyn StorageBackend>,
    transactions: Vec<Transaction>,
    categories: Vec<Category>,
    selected_date: NaiveDate,
    current_amount: String,
    selected_category: String,
    note: String,
    is_editing_categories: bool,
    editing_category: Option<Category>,
}

impl LedgerContainer {
    /// Builds the container from whatever the backend currently holds. Each
    /// persisted field falls back to its documented default when its key is
    /// absent or unreadable; hydration itself never fails.
    pub fn hydrate(storage: Box<dyn StorageBackend>) -> Self {
        let transactions = restore(storage.as_ref(), keys::TRANSACTIONS, Vec::new);
        let categories = restore(storage.as_ref(), keys::CATEGORIES, default_categories);
        let selected_date = restore(storage.as_ref(), keys::SELECTED_DATE, || {
            Local::now().date_naive()
        });
        let current_amount = restore(storage.as_ref(), keys::CURRENT_AMOUNT, || {
            DEFAULT_AMOUNT.to_string()
        });
        let selected_category = restore(storage.as_ref(), keys::SELECTED_CATEGORY, String::new);
        let note = restore(storage.as_ref(), keys::NOTE, String::new);

        Self {
            storage,
            transactions,
            categories,
            selected_date,
            current_amount,
            selected_category,
            note,
            is_editing_categories: false,
            editing_category: None,
        }
    }

    // --- state reads ---

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.selected_date
    }

    pub fn current_amount(&self) -> &str {
        &self.current_amount
    }

    pub fn selected_category(&self) -> &str {
        &self.selected_category
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn is_editing_categories(&self) -> bool {
        self.is_editing_categories
    }

    pub fn editing_category(&self) -> Option<&Category> {
        self.editing_category.as_ref()
    }

    // --- derived aggregates, recomputed on every read ---

    pub fn total_expense(&self) -> f64 {
        self.sum_of(super::TransactionKind::Expense)
    }

    pub fn total_income(&self) -> f64 {
        self.sum_of(super::TransactionKind::Income)
    }

    pub fn balance(&self) -> f64 {
        self.total_income() - self.total_expense()
    }

    /// Transactions recorded on the selected date, in insertion order.
    pub fn transactions_by_date(&self) -> Vec<&Transaction> {
        self.transactions
            .iter()
            .filter(|txn| txn.date == self.selected_date)
            .collect()
    }

    /// Per-category sums over the selected date's transactions. Only ids
    /// that occur on that date appear as keys.
    pub fn category_totals(&self) -> BTreeMap<String, f64> {
        let mut totals = BTreeMap::new();
        for txn in self.transactions_by_date() {
            *totals.entry(txn.category.clone()).or_insert(0.0) += txn.amount;
        }
        totals
    }

    fn sum_of(&self, kind: super::TransactionKind) -> f64 {
        self.transactions
            .iter()
            .filter(|txn| txn.kind == kind)
            .map(|txn| txn.amount)
            .sum()
    }

    // --- mutation operations ---

    /// Records a new transaction and resets the in-progress entry form.
    /// Returns the assigned id.
    pub fn add_transaction(&mut self, draft: NewTransaction) -> String {
        let txn = Transaction::new(draft);
        let id = txn.id.clone();
        self.transactions.push(txn);
        self.persist(keys::TRANSACTIONS, &self.transactions);
        self.reset_form();
        id
    }

    /// Removes the transaction with the given id. No-op when absent.
    pub fn delete_transaction(&mut self, id: &str) {
        let before = self.transactions.len();
        if let Some(index) = self.transactions.iter().position(|txn| txn.id == id) {
            self.transactions.remove(index);
        }
        if self.transactions.len() != before {
            self.persist(keys::TRANSACTIONS, &self.transactions);
        }
    }

    pub fn set_selected_date(&mut self, date: NaiveDate) {
        self.selected_date = date;
        self.persist(keys::SELECTED_DATE, &self.selected_date);
    }

    pub fn set_current_amount(&mut self, amount: impl Into<String>) {
        self.current_amount = amount.into();
        self.persist(keys::CURRENT_AMOUNT, &self.current_amount);
    }

    pub fn set_selected_category(&mut self, category: impl Into<String>) {
        self.selected_category = category.into();
        self.persist(keys::SELECTED_CATEGORY, &self.selected_category);
    }

    pub fn set_note(&mut self, note: impl Into<String>) {
        self.note = note.into();
        self.persist(keys::NOTE, &self.note);
    }

    /// Resets the entry form buffer to its defaults.
    pub fn clear_form(&mut self) {
        self.reset_form();
    }

    /// Adds a user-defined category and returns the assigned id.
    pub fn add_category(&mut self, draft: NewCategory) -> String {
        let category = Category::new(draft);
        let id = category.id.clone();
        self.categories.push(category);
        self.persist(keys::CATEGORIES, &self.categories);
        id
    }

    /// Merges the given fields into the matching category. No-op when absent.
    pub fn update_category(&mut self, id: &str, patch: CategoryPatch) {
        let Some(category) = self.categories.iter_mut().find(|c| c.id == id) else {
            return;
        };
        if let Some(name) = patch.name {
            category.name = name;
        }
        if let Some(icon) = patch.icon {
            category.icon = icon;
        }
        if let Some(color) = patch.color {
            category.color = color;
        }
        self.persist(keys::CATEGORIES, &self.categories);
    }

    /// Removes a category, refusing while any transaction still references it.
    pub fn delete_category(&mut self, id: &str) -> Result<(), LedgerError> {
        if self.transactions.iter().any(|txn| txn.category == id) {
            return Err(LedgerError::CategoryInUse(id.to_string()));
        }
        let before = self.categories.len();
        self.categories.retain(|category| category.id != id);
        if self.categories.len() != before {
            self.persist(keys::CATEGORIES, &self.categories);
        }
        Ok(())
    }

    /// Toggles category-management mode. Leaving the mode always drops the
    /// edit target.
    pub fn set_editing_categories(&mut self, editing: bool) {
        self.is_editing_categories = editing;
        if !editing {
            self.editing_category = None;
        }
    }

    pub fn set_editing_category(&mut self, category: Option<Category>) {
        self.editing_category = category;
    }

    fn reset_form(&mut self) {
        self.current_amount = DEFAULT_AMOUNT.to_string();
        self.selected_category.clear();
        self.note.clear();
        self.persist(keys::CURRENT_AMOUNT, &self.current_amount);
        self.persist(keys::SELECTED_CATEGORY, &self.selected_category);
        self.persist(keys::NOTE, &self.note);
    }

    /// Write-through of one field's full value. A storage failure is logged
    /// and swallowed; the in-memory mutation already applied stands.
    fn persist<T: Serialize>(&self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(key, %err, "failed to serialize field for persistence");
                return;
            }
        };
        if let Err(err) = self.storage.put(key, &json) {
            tracing::warn!(key, %err, "failed to persist field; in-memory state kept");
        }
    }
}

/// Reads and deserializes one field during hydration, degrading to the
/// default on absence or failure.
fn restore<T: DeserializeOwned>(
    storage: &dyn StorageBackend,
    key: &str,
    default: impl FnOnce() -> T,
) -> T {
    match storage.get(key) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(key, %err, "stored value unreadable; using default");
                default()
            }
        },
        Ok(None) => default(),
        Err(err) => {
            tracing::warn!(key, %err, "storage read failed; using default");
            default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::TransactionKind;
    use crate::storage::MemoryStore;
    use chrono::NaiveDate;

    fn container() -> LedgerContainer {
        LedgerContainer::hydrate(Box::new(MemoryStore::new()))
    }

    fn expense(amount: f64, category: &str, date: &str) -> NewTransaction {
        NewTransaction {
            amount,
            category: category.into(),
            date: date.parse().unwrap(),
            note: None,
            kind: TransactionKind::Expense,
        }
    }

    fn income(amount: f64, category: &str, date: &str) -> NewTransaction {
        NewTransaction {
            kind: TransactionKind::Income,
            ..expense(amount, category, date)
        }
    }

    #[test]
    fn empty_store_hydrates_defaults() {
        let ledger = container();
        assert!(ledger.transactions().is_empty());
        assert_eq!(ledger.categories().len(), 8);
        assert_eq!(ledger.selected_date(), Local::now().date_naive());
        assert_eq!(ledger.current_amount(), "0");
        assert_eq!(ledger.selected_category(), "");
        assert_eq!(ledger.note(), "");
        assert!(!ledger.is_editing_categories());
        assert!(ledger.editing_category().is_none());
    }

    #[test]
    fn balance_invariant_holds_after_every_add() {
        let mut ledger = container();
        let drafts = [
            expense(100.0, "food", "2024-01-01"),
            income(250.0, "income", "2024-01-02"),
            expense(40.5, "drink", "2024-01-02"),
            income(9.5, "income", "2024-01-03"),
        ];
        for draft in drafts {
            ledger.add_transaction(draft);
            assert_eq!(
                ledger.total_expense() + ledger.balance(),
                ledger.total_income()
            );
        }
    }

    #[test]
    fn scenario_single_food_expense() {
        let mut ledger = container();
        ledger.add_transaction(expense(100.0, "food", "2024-01-01"));
        ledger.set_selected_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        assert_eq!(ledger.total_expense(), 100.0);
        assert_eq!(ledger.total_income(), 0.0);
        assert_eq!(ledger.balance(), -100.0);
        let by_date = ledger.transactions_by_date();
        assert_eq!(by_date.len(), 1);
        assert_eq!(by_date[0].category, "food");
        let totals = ledger.category_totals();
        assert_eq!(totals.len(), 1);
        assert_eq!(totals["food"], 100.0);
    }

    #[test]
    fn add_transaction_resets_form_buffer() {
        let mut ledger = container();
        ledger.set_current_amount("120");
        ledger.set_selected_category("food");
        ledger.set_note("lunch");

        ledger.add_transaction(expense(120.0, "food", "2024-01-01"));

        assert_eq!(ledger.current_amount(), "0");
        assert_eq!(ledger.selected_category(), "");
        assert_eq!(ledger.note(), "");
    }

    #[test]
    fn clear_form_resets_buffer_without_touching_transactions() {
        let mut ledger = container();
        ledger.add_transaction(expense(10.0, "food", "2024-01-01"));
        ledger.set_current_amount("55");
        ledger.set_note("pending");
        ledger.clear_form();
        assert_eq!(ledger.current_amount(), "0");
        assert_eq!(ledger.note(), "");
        assert_eq!(ledger.transactions().len(), 1);
    }

    #[test]
    fn delete_transaction_is_idempotent() {
        let mut ledger = container();
        let id = ledger.add_transaction(expense(5.0, "drink", "2024-01-01"));
        ledger.add_transaction(expense(7.0, "food", "2024-01-01"));

        ledger.delete_transaction(&id);
        assert_eq!(ledger.transactions().len(), 1);
        ledger.delete_transaction(&id);
        assert_eq!(ledger.transactions().len(), 1);
        assert_eq!(ledger.transactions()[0].category, "food");
    }

    #[test]
    fn transactions_by_date_follows_selected_date() {
        let mut ledger = container();
        ledger.add_transaction(expense(1.0, "food", "2024-01-01"));
        ledger.add_transaction(expense(2.0, "drink", "2024-01-02"));
        ledger.add_transaction(expense(3.0, "food", "2024-01-01"));

        ledger.set_selected_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let amounts: Vec<_> = ledger
            .transactions_by_date()
            .iter()
            .map(|txn| txn.amount)
            .collect();
        assert_eq!(amounts, [1.0, 3.0]);

        ledger.set_selected_date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(ledger.transactions_by_date().len(), 1);
        assert_eq!(ledger.transactions().len(), 3);
    }

    #[test]
    fn category_totals_only_cover_selected_date() {
        let mut ledger = container();
        ledger.add_transaction(expense(10.0, "food", "2024-01-01"));
        ledger.add_transaction(expense(5.0, "food", "2024-01-01"));
        ledger.add_transaction(income(100.0, "income", "2024-01-01"));
        ledger.add_transaction(expense(99.0, "food", "2024-02-01"));

        ledger.set_selected_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let totals = ledger.category_totals();
        assert_eq!(totals["food"], 15.0);
        assert_eq!(totals["income"], 100.0);
        assert!(!totals.contains_key("drink"));
    }

    #[test]
    fn delete_category_rejects_while_referenced() {
        let mut ledger = container();
        ledger.add_transaction(expense(100.0, "food", "2024-01-01"));

        let err = ledger.delete_category("food").unwrap_err();
        assert!(matches!(err, LedgerError::CategoryInUse(ref id) if id == "food"));
        assert_eq!(ledger.categories().len(), 8);
    }

    #[test]
    fn delete_category_succeeds_once_unreferenced() {
        let mut ledger = container();
        let id = ledger.add_transaction(expense(100.0, "food", "2024-01-01"));
        ledger.delete_transaction(&id);

        ledger.delete_category("food").unwrap();
        assert_eq!(ledger.categories().len(), 7);
        assert!(ledger.category("food").is_none());
    }

    #[test]
    fn delete_unknown_category_is_a_no_op() {
        let mut ledger = container();
        ledger.delete_category("missing").unwrap();
        assert_eq!(ledger.categories().len(), 8);
    }

    #[test]
    fn add_and_update_category() {
        let mut ledger = container();
        let id = ledger.add_category(NewCategory {
            name: "Pets".into(),
            icon: "🐈".into(),
            color: "#aabbcc".into(),
        });
        assert_eq!(ledger.categories().len(), 9);

        ledger.update_category(&id, CategoryPatch::default().name("Pets & Vets"));
        let category = ledger.category(&id).unwrap();
        assert_eq!(category.name, "Pets & Vets");
        assert_eq!(category.icon, "🐈");

        ledger.update_category("missing", CategoryPatch::default().name("ignored"));
        assert_eq!(ledger.categories().len(), 9);
    }

    #[test]
    fn leaving_edit_mode_clears_edit_target() {
        let mut ledger = container();
        let target = ledger.categories()[1].clone();
        ledger.set_editing_categories(true);
        ledger.set_editing_category(Some(target));
        assert!(ledger.editing_category().is_some());

        ledger.set_editing_categories(false);
        assert!(ledger.editing_category().is_none());
        assert!(!ledger.is_editing_categories());
    }

    #[test]
    fn hydration_reads_seeded_values() {
        let store = MemoryStore::new()
            .seed(keys::SELECTED_DATE, "\"2024-03-05\"")
            .seed(keys::CURRENT_AMOUNT, "\"42\"")
            .seed(keys::NOTE, "\"coffee\"");
        let ledger = LedgerContainer::hydrate(Box::new(store));
        assert_eq!(
            ledger.selected_date(),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
        );
        assert_eq!(ledger.current_amount(), "42");
        assert_eq!(ledger.note(), "coffee");
    }

    #[test]
    fn corrupt_stored_value_degrades_to_default() {
        let store = MemoryStore::new()
            .seed(keys::TRANSACTIONS, "not json at all")
            .seed(keys::CATEGORIES, "[{\"broken\":true}]");
        let ledger = LedgerContainer::hydrate(Box::new(store));
        assert!(ledger.transactions().is_empty());
        assert_eq!(ledger.categories().len(), 8);
        assert_eq!(ledger.categories()[0].id, "income");
    }
}
