//! Shell context, command dispatch, and handlers. Every handler goes through
//! the container's public operations; nothing here touches ledger state
//! directly.

use chrono::NaiveDate;
use strsim::levenshtein;
use thiserror::Error;

use crate::errors::LedgerError;
use crate::ledger::{CategoryPatch, LedgerContainer, NewCategory, NewTransaction, TransactionKind};

use super::output;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

#[derive(Debug, Error)]
pub(crate) enum CommandError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

pub(crate) type CommandResult = Result<LoopControl, CommandError>;

const COMMAND_NAMES: &[&str] = &[
    "add",
    "amount",
    "categories",
    "category",
    "clear",
    "confirm",
    "date",
    "delete",
    "exit",
    "form",
    "help",
    "list",
    "note",
    "pick",
    "quit",
    "summary",
];

pub struct ShellContext {
    mode: CliMode,
    ledger: LedgerContainer,
}

impl ShellContext {
    pub fn new(mode: CliMode, ledger: LedgerContainer) -> Self {
        Self { mode, ledger }
    }

    pub fn mode(&self) -> CliMode {
        self.mode
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        COMMAND_NAMES.to_vec()
    }

    pub(crate) fn dispatch(&mut self, command: &str, raw: &str, args: &[&str]) -> CommandResult {
        match command {
            "help" => self.cmd_help(),
            "exit" | "quit" => Ok(LoopControl::Exit),
            "date" => self.cmd_date(args),
            "list" => self.cmd_list(),
            "summary" => self.cmd_summary(),
            "add" => self.cmd_add(args),
            "delete" => self.cmd_delete(args),
            "amount" => self.cmd_amount(args),
            "pick" => self.cmd_pick(args),
            "note" => self.cmd_note(args),
            "form" => self.cmd_form(),
            "clear" => self.cmd_clear(),
            "confirm" => self.cmd_confirm(args),
            "categories" => self.cmd_categories(),
            "category" => self.cmd_category(args),
            _ => {
                self.suggest_command(raw);
                Ok(LoopControl::Continue)
            }
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let mut suggestions: Vec<_> = COMMAND_NAMES
            .iter()
            .map(|name| (levenshtein(name, input), *name))
            .collect();
        suggestions.sort_by_key(|(distance, _)| *distance);

        if let Some((distance, best)) = suggestions.first() {
            if *distance <= 3 {
                output::info(format!("Suggestion: `{}`?", best));
            }
        }
    }

    pub(crate) fn report_error(&self, err: CommandError) {
        output::error(err.to_string());
    }

    fn cmd_help(&self) -> CommandResult {
        output::section("Commands");
        for line in [
            "add <expense|income> <amount> <category> [note...]  record a transaction",
            "delete <id>                                         remove a transaction",
            "date [YYYY-MM-DD]                                   show or change the selected day",
            "list                                                transactions on the selected day",
            "summary                                             totals, balance, per-category sums",
            "amount <value> | pick <category> | note [text...]   fill the entry form",
            "form | clear | confirm <expense|income>             inspect, reset, or submit the form",
            "categories                                          list categories",
            "category add <name> <icon> <color>                  add a category",
            "category edit <id> [name=..] [icon=..] [color=..]   edit a category",
            "category delete <id>                                delete an unused category",
            "help | exit                                         this text / leave the shell",
        ] {
            output::info(line);
        }
        Ok(LoopControl::Continue)
    }

    fn cmd_date(&mut self, args: &[&str]) -> CommandResult {
        match args {
            [] => {
                output::info(format!("Selected date: {}", self.ledger.selected_date()));
            }
            [raw] => {
                let date = parse_date(raw)?;
                self.ledger.set_selected_date(date);
                output::success(format!("Selected date set to {date}."));
            }
            _ => return usage("date [YYYY-MM-DD]"),
        }
        Ok(LoopControl::Continue)
    }

    fn cmd_list(&self) -> CommandResult {
        let entries = self.ledger.transactions_by_date();
        output::section(format!("Transactions on {}", self.ledger.selected_date()));
        if entries.is_empty() {
            output::info("No transactions recorded for this day.");
            return Ok(LoopControl::Continue);
        }
        for txn in entries {
            let sign = match txn.kind {
                TransactionKind::Expense => "-",
                TransactionKind::Income => "+",
            };
            let label = self
                .ledger
                .category(&txn.category)
                .map(|category| format!("{} {}", category.icon, category.name))
                .unwrap_or_else(|| txn.category.clone());
            let note = txn.note.as_deref().unwrap_or("");
            output::info(format!(
                "{}  {}{:.2}  {}  {}",
                txn.id, sign, txn.amount, label, note
            ));
        }
        Ok(LoopControl::Continue)
    }

    fn cmd_summary(&self) -> CommandResult {
        output::section("Summary");
        output::info(format!("Total income:  {:.2}", self.ledger.total_income()));
        output::info(format!("Total expense: {:.2}", self.ledger.total_expense()));
        output::info(format!("Balance:       {:.2}", self.ledger.balance()));

        let totals = self.ledger.category_totals();
        if totals.is_empty() {
            return Ok(LoopControl::Continue);
        }
        output::section(format!("Per category on {}", self.ledger.selected_date()));
        for (id, total) in totals {
            let label = self
                .ledger
                .category(&id)
                .map(|category| format!("{} {}", category.icon, category.name))
                .unwrap_or(id);
            output::info(format!("{label}: {total:.2}"));
        }
        Ok(LoopControl::Continue)
    }

    fn cmd_add(&mut self, args: &[&str]) -> CommandResult {
        let [kind, amount, category, note @ ..] = args else {
            return usage("add <expense|income> <amount> <category> [note...]");
        };
        let draft = NewTransaction {
            amount: parse_amount(amount)?,
            category: self.resolve_category(category)?,
            date: self.ledger.selected_date(),
            note: join_note(note),
            kind: parse_kind(kind)?,
        };
        let id = self.ledger.add_transaction(draft);
        output::success(format!("Transaction recorded ({id})."));
        Ok(LoopControl::Continue)
    }

    fn cmd_delete(&mut self, args: &[&str]) -> CommandResult {
        let [id] = args else {
            return usage("delete <id>");
        };
        self.ledger.delete_transaction(id);
        output::success("Transaction deleted if it existed.");
        Ok(LoopControl::Continue)
    }

    fn cmd_amount(&mut self, args: &[&str]) -> CommandResult {
        let [value] = args else {
            return usage("amount <value>");
        };
        parse_amount(value)?;
        self.ledger.set_current_amount(*value);
        output::success(format!("Amount set to {value}."));
        Ok(LoopControl::Continue)
    }

    fn cmd_pick(&mut self, args: &[&str]) -> CommandResult {
        let [category] = args else {
            return usage("pick <category>");
        };
        let id = self.resolve_category(category)?;
        self.ledger.set_selected_category(id.clone());
        output::success(format!("Category `{id}` selected."));
        Ok(LoopControl::Continue)
    }

    fn cmd_note(&mut self, args: &[&str]) -> CommandResult {
        let note = args.join(" ");
        self.ledger.set_note(note);
        output::success("Note updated.");
        Ok(LoopControl::Continue)
    }

    fn cmd_form(&self) -> CommandResult {
        output::section("Entry form");
        output::info(format!("Amount:   {}", self.ledger.current_amount()));
        output::info(format!(
            "Category: {}",
            match self.ledger.selected_category() {
                "" => "(none)",
                id => id,
            }
        ));
        output::info(format!("Note:     {}", self.ledger.note()));
        output::info(format!("Date:     {}", self.ledger.selected_date()));
        Ok(LoopControl::Continue)
    }

    fn cmd_clear(&mut self) -> CommandResult {
        self.ledger.clear_form();
        output::success("Entry form cleared.");
        Ok(LoopControl::Continue)
    }

    fn cmd_confirm(&mut self, args: &[&str]) -> CommandResult {
        let [kind] = args else {
            return usage("confirm <expense|income>");
        };
        let category = self.ledger.selected_category().to_string();
        if category.is_empty() {
            return Err(CommandError::Usage(
                "no category selected; use `pick <category>` first".into(),
            ));
        }
        let note = self.ledger.note().to_string();
        let draft = NewTransaction {
            amount: parse_amount(self.ledger.current_amount())?,
            category,
            date: self.ledger.selected_date(),
            note: if note.is_empty() { None } else { Some(note) },
            kind: parse_kind(kind)?,
        };
        let id = self.ledger.add_transaction(draft);
        output::success(format!("Transaction recorded ({id})."));
        Ok(LoopControl::Continue)
    }

    fn cmd_categories(&self) -> CommandResult {
        output::section("Categories");
        for category in self.ledger.categories() {
            output::info(format!(
                "{}  {} {}  {}",
                category.id, category.icon, category.name, category.color
            ));
        }
        Ok(LoopControl::Continue)
    }

    fn cmd_category(&mut self, args: &[&str]) -> CommandResult {
        match args {
            ["add", name, icon, color] => {
                let id = self.ledger.add_category(NewCategory {
                    name: (*name).into(),
                    icon: (*icon).into(),
                    color: (*color).into(),
                });
                output::success(format!("Category `{name}` added ({id})."));
            }
            ["edit", id, fields @ ..] if !fields.is_empty() => {
                let Some(target) = self.ledger.category(id).cloned() else {
                    return Err(CommandError::Usage(format!("unknown category `{id}`")));
                };
                let patch = parse_patch(fields)?;
                self.ledger.set_editing_categories(true);
                self.ledger.set_editing_category(Some(target));
                self.ledger.update_category(id, patch);
                self.ledger.set_editing_categories(false);
                output::success(format!("Category `{id}` updated."));
            }
            ["delete", id] => {
                self.ledger.delete_category(id)?;
                output::success(format!("Category `{id}` deleted."));
            }
            _ => {
                return usage(
                    "category add <name> <icon> <color> | category edit <id> <field=value>... | category delete <id>",
                )
            }
        }
        Ok(LoopControl::Continue)
    }

    /// Accepts a category id and warns when it does not exist yet; the model
    /// allows dangling references, deletion is the enforcement point.
    fn resolve_category(&self, id: &str) -> Result<String, CommandError> {
        if self.ledger.category(id).is_none() {
            output::warning(format!("Category `{id}` does not exist (yet)."));
        }
        Ok(id.to_string())
    }
}

fn usage(text: &str) -> CommandResult {
    Err(CommandError::Usage(format!("usage: {text}")))
}

fn parse_date(raw: &str) -> Result<NaiveDate, CommandError> {
    raw.parse()
        .map_err(|_| CommandError::Usage(format!("`{raw}` is not a YYYY-MM-DD date")))
}

fn parse_amount(raw: &str) -> Result<f64, CommandError> {
    let amount: f64 = raw
        .parse()
        .map_err(|_| CommandError::Usage(format!("`{raw}` is not a number")))?;
    if amount < 0.0 || !amount.is_finite() {
        return Err(CommandError::Usage(
            "amount must be a non-negative number".into(),
        ));
    }
    Ok(amount)
}

fn parse_kind(raw: &str) -> Result<TransactionKind, CommandError> {
    match raw {
        "expense" => Ok(TransactionKind::Expense),
        "income" => Ok(TransactionKind::Income),
        other => Err(CommandError::Usage(format!(
            "`{other}` is neither `expense` nor `income`"
        ))),
    }
}

fn parse_patch(fields: &[&str]) -> Result<CategoryPatch, CommandError> {
    let mut patch = CategoryPatch::default();
    for field in fields {
        let Some((key, value)) = field.split_once('=') else {
            return Err(CommandError::Usage(format!(
                "`{field}` is not a field=value pair"
            )));
        };
        patch = match key {
            "name" => patch.name(value),
            "icon" => patch.icon(value),
            "color" => patch.color(value),
            other => {
                return Err(CommandError::Usage(format!(
                    "unknown category field `{other}`"
                )))
            }
        };
    }
    Ok(patch)
}

fn join_note(words: &[&str]) -> Option<String> {
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn context() -> ShellContext {
        let ledger = LedgerContainer::hydrate(Box::new(MemoryStore::new()));
        ShellContext::new(CliMode::Script, ledger)
    }

    fn run(context: &mut ShellContext, line: &str) -> CommandResult {
        let tokens = shell_words::split(line).unwrap();
        let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();
        context.dispatch(&tokens[0].to_lowercase(), &tokens[0], &args)
    }

    #[test]
    fn add_and_summary_flow() {
        let mut ctx = context();
        run(&mut ctx, "date 2024-01-01").unwrap();
        run(&mut ctx, "add expense 100 food lunch out").unwrap();
        assert_eq!(ctx.ledger.total_expense(), 100.0);
        assert_eq!(ctx.ledger.transactions_by_date().len(), 1);
        assert_eq!(
            ctx.ledger.transactions()[0].note.as_deref(),
            Some("lunch out")
        );
    }

    #[test]
    fn form_flow_records_from_buffer() {
        let mut ctx = context();
        run(&mut ctx, "date 2024-02-02").unwrap();
        run(&mut ctx, "amount 55.5").unwrap();
        run(&mut ctx, "pick drink").unwrap();
        run(&mut ctx, "note bubble tea").unwrap();
        run(&mut ctx, "confirm expense").unwrap();

        assert_eq!(ctx.ledger.transactions().len(), 1);
        let txn = &ctx.ledger.transactions()[0];
        assert_eq!(txn.amount, 55.5);
        assert_eq!(txn.category, "drink");
        assert_eq!(txn.note.as_deref(), Some("bubble tea"));
        // Submitting resets the buffer.
        assert_eq!(ctx.ledger.current_amount(), "0");
        assert_eq!(ctx.ledger.selected_category(), "");
    }

    #[test]
    fn confirm_without_category_is_rejected() {
        let mut ctx = context();
        run(&mut ctx, "amount 10").unwrap();
        let err = run(&mut ctx, "confirm expense").unwrap_err();
        assert!(matches!(err, CommandError::Usage(_)));
        assert!(ctx.ledger.transactions().is_empty());
    }

    #[test]
    fn category_delete_surfaces_domain_error() {
        let mut ctx = context();
        run(&mut ctx, "add expense 10 food").unwrap();
        let err = run(&mut ctx, "category delete food").unwrap_err();
        assert!(matches!(
            err,
            CommandError::Ledger(LedgerError::CategoryInUse(_))
        ));
    }

    #[test]
    fn category_edit_applies_patch_and_leaves_edit_mode() {
        let mut ctx = context();
        run(&mut ctx, "category edit food name=Groceries icon=🛒").unwrap();
        let food = ctx.ledger.category("food").unwrap();
        assert_eq!(food.name, "Groceries");
        assert_eq!(food.icon, "🛒");
        assert!(!ctx.ledger.is_editing_categories());
        assert!(ctx.ledger.editing_category().is_none());
    }

    #[test]
    fn malformed_inputs_report_usage() {
        let mut ctx = context();
        assert!(matches!(
            run(&mut ctx, "add expense ten food"),
            Err(CommandError::Usage(_))
        ));
        assert!(matches!(
            run(&mut ctx, "add expense -5 food"),
            Err(CommandError::Usage(_))
        ));
        assert!(matches!(
            run(&mut ctx, "date 2024-13-01"),
            Err(CommandError::Usage(_))
        ));
        assert!(matches!(
            run(&mut ctx, "add spend 5 food"),
            Err(CommandError::Usage(_))
        ));
    }

    #[test]
    fn exit_requests_loop_exit() {
        let mut ctx = context();
        assert_eq!(run(&mut ctx, "exit").unwrap(), LoopControl::Exit);
        assert_eq!(run(&mut ctx, "quit").unwrap(), LoopControl::Exit);
    }
}
