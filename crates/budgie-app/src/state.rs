// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{
    Bill, Chart, Debt, DraftEditor, Expense, ListEditor, ListKind, Panel, Reply, RequestPhase,
    RequestSlot, Totals, coerce_amount,
};

/// Everything an outbound advice call needs, copied out of the state so the
/// worker never borrows it.
#[derive(Debug, Clone, PartialEq)]
pub struct AdviceRequest {
    pub income: f64,
    pub total_expenses: f64,
    pub debts: Vec<Debt>,
    pub question: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanItem {
    pub category: String,
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    pub income: f64,
    pub items: Vec<PlanItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    income: f64,
    income_input: String,
    pub expenses: ListEditor<Expense>,
    pub bills: ListEditor<Bill>,
    pub debts: ListEditor<Debt>,
    pub advice_query: String,
    pub advice: RequestSlot,
    pub plan: RequestSlot,
    pub focus: Panel,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            income: 0.0,
            income_input: String::new(),
            expenses: ListEditor::default(),
            bills: ListEditor::default(),
            debts: ListEditor::default(),
            advice_query: String::new(),
            advice: RequestSlot::default(),
            plan: RequestSlot::default(),
            focus: Panel::Income,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    FocusNext,
    FocusPrev,
    /// Typed character, routed to whatever the focused panel edits.
    InsertChar(char),
    DeleteChar,
    /// Enter: advance or submit the draft, or start the focused AI action.
    Submit,
    /// Esc: clear the focused draft or question.
    ClearInput,
    SelectNext,
    SelectPrev,
    RemoveSelected,
    SetIncome(String),
    StartAdvice,
    StartPlan,
    FinishAdvice { request_id: u64, reply: Reply },
    FinishPlan { request_id: u64, reply: Reply },
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    FocusChanged(Panel),
    IncomeChanged(f64),
    DraftChanged(ListKind),
    ItemAdded(ListKind),
    ItemRemoved(ListKind),
    QuestionChanged,
    AdviceStarted { request_id: u64 },
    PlanStarted { request_id: u64 },
    AdviceFinished(RequestPhase),
    PlanFinished(RequestPhase),
    ReplyDismissed(Panel),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    /// The reference budget shown on first launch.
    pub fn sample() -> Self {
        let mut state = Self::default();
        state.set_income("5000");
        for (name, amount, category) in [("Groceries", 400.0, "Food"), ("Gas", 150.0, "Transport")]
        {
            state.expenses.insert_with(|id| Expense {
                id,
                name: name.to_owned(),
                amount,
                category: category.to_owned(),
            });
        }
        for (name, amount, category) in [("Rent", 1500.0, "Housing"), ("Internet", 60.0, "Utilities")]
        {
            state.bills.insert_with(|id| Bill {
                id,
                name: name.to_owned(),
                amount,
                category: category.to_owned(),
            });
        }
        state.debts.insert_with(|id| Debt {
            id,
            name: "Visa Card".to_owned(),
            amount: 4500.0,
            apr: 22.5,
        });
        state
    }

    pub fn income(&self) -> f64 {
        self.income
    }

    pub fn income_input(&self) -> &str {
        &self.income_input
    }

    pub fn totals(&self) -> Totals {
        Totals::compute(
            self.income,
            self.expenses.items(),
            self.bills.items(),
            self.debts.items(),
        )
    }

    pub fn chart(&self) -> Chart {
        let totals = self.totals();
        Chart::from_budget(totals.income, totals.total_expenses)
    }

    pub fn advice_request(&self) -> AdviceRequest {
        let totals = self.totals();
        AdviceRequest {
            income: totals.income,
            total_expenses: totals.total_expenses,
            debts: self.debts.items().to_vec(),
            question: self.advice_query.trim().to_owned(),
        }
    }

    /// Expenses first, then bills, in insertion order.
    pub fn plan_request(&self) -> PlanRequest {
        let expenses = self.expenses.items().iter().map(|item| PlanItem {
            category: item.category.clone(),
            name: item.name.clone(),
            amount: item.amount,
        });
        let bills = self.bills.items().iter().map(|item| PlanItem {
            category: item.category.clone(),
            name: item.name.clone(),
            amount: item.amount,
        });
        PlanRequest {
            income: self.income,
            items: expenses.chain(bills).collect(),
        }
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::FocusNext => self.rotate_focus(1),
            AppCommand::FocusPrev => self.rotate_focus(-1),
            AppCommand::InsertChar(ch) => self.insert_char(ch),
            AppCommand::DeleteChar => self.delete_char(),
            AppCommand::Submit => self.submit(),
            AppCommand::ClearInput => self.clear_input(),
            AppCommand::SelectNext => self.with_focused_list(|state, kind| {
                state.select(kind, true);
                Vec::new()
            }),
            AppCommand::SelectPrev => self.with_focused_list(|state, kind| {
                state.select(kind, false);
                Vec::new()
            }),
            AppCommand::RemoveSelected => self.with_focused_list(Self::remove_selected),
            AppCommand::SetIncome(raw) => {
                self.set_income(&raw);
                vec![AppEvent::IncomeChanged(self.income)]
            }
            AppCommand::StartAdvice => self.start_advice(),
            AppCommand::StartPlan => self.start_plan(),
            AppCommand::FinishAdvice { request_id, reply } => {
                if !self.advice.finish(request_id, reply) {
                    return Vec::new();
                }
                vec![AppEvent::AdviceFinished(self.advice.phase())]
            }
            AppCommand::FinishPlan { request_id, reply } => {
                if !self.plan.finish(request_id, reply) {
                    return Vec::new();
                }
                vec![AppEvent::PlanFinished(self.plan.phase())]
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn rotate_focus(&mut self, delta: isize) -> Vec<AppEvent> {
        let panels = Panel::ALL;
        let current = panels
            .iter()
            .position(|panel| *panel == self.focus)
            .unwrap_or(0) as isize;
        let len = panels.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.focus = panels[next];
        vec![AppEvent::FocusChanged(self.focus)]
    }

    fn set_income(&mut self, raw: &str) {
        self.income_input = raw.to_owned();
        self.income = coerce_amount(raw);
    }

    fn insert_char(&mut self, ch: char) -> Vec<AppEvent> {
        match self.focus {
            Panel::Income => {
                if !is_numeric_char(ch) {
                    return Vec::new();
                }
                let mut raw = std::mem::take(&mut self.income_input);
                raw.push(ch);
                self.set_income(&raw);
                vec![AppEvent::IncomeChanged(self.income)]
            }
            Panel::List(kind) => {
                if self.editor_mut(kind).push_char(ch) {
                    vec![AppEvent::DraftChanged(kind)]
                } else {
                    Vec::new()
                }
            }
            Panel::DebtAdvice => {
                if ch.is_control() {
                    return Vec::new();
                }
                self.advice_query.push(ch);
                vec![AppEvent::QuestionChanged]
            }
            Panel::BudgetPlan => Vec::new(),
        }
    }

    fn delete_char(&mut self) -> Vec<AppEvent> {
        match self.focus {
            Panel::Income => {
                let mut raw = std::mem::take(&mut self.income_input);
                raw.pop();
                self.set_income(&raw);
                vec![AppEvent::IncomeChanged(self.income)]
            }
            Panel::List(kind) => {
                self.editor_mut(kind).pop_char();
                vec![AppEvent::DraftChanged(kind)]
            }
            Panel::DebtAdvice => {
                self.advice_query.pop();
                vec![AppEvent::QuestionChanged]
            }
            Panel::BudgetPlan => Vec::new(),
        }
    }

    fn submit(&mut self) -> Vec<AppEvent> {
        match self.focus {
            Panel::Income => Vec::new(),
            Panel::List(kind) => self.advance_or_add(kind),
            Panel::BudgetPlan => self.start_plan(),
            Panel::DebtAdvice => self.start_advice(),
        }
    }

    fn advance_or_add(&mut self, kind: ListKind) -> Vec<AppEvent> {
        let editor = self.editor_mut(kind);
        if !editor.on_last_field() {
            editor.next_field();
            return vec![AppEvent::DraftChanged(kind)];
        }

        match editor.add_draft() {
            Ok(()) => vec![
                AppEvent::ItemAdded(kind),
                self.set_status(&format!("{} added", noun(kind))),
            ],
            Err(error) => {
                self.editor_mut(kind).next_field();
                vec![
                    AppEvent::DraftChanged(kind),
                    self.set_status(&error.to_string()),
                ]
            }
        }
    }

    fn clear_input(&mut self) -> Vec<AppEvent> {
        match self.focus {
            Panel::List(kind) => {
                self.editor_mut(kind).clear_draft();
                vec![AppEvent::DraftChanged(kind)]
            }
            Panel::DebtAdvice if !self.advice_query.is_empty() => {
                self.advice_query.clear();
                vec![AppEvent::QuestionChanged]
            }
            Panel::DebtAdvice | Panel::BudgetPlan => self.dismiss_reply(self.focus),
            Panel::Income => Vec::new(),
        }
    }

    /// Returns a settled slot to idle. The response text stays put.
    fn dismiss_reply(&mut self, panel: Panel) -> Vec<AppEvent> {
        let slot = match panel {
            Panel::DebtAdvice => &mut self.advice,
            _ => &mut self.plan,
        };
        if slot.is_busy() || slot.phase() == RequestPhase::Idle {
            return Vec::new();
        }
        slot.reset();
        vec![AppEvent::ReplyDismissed(panel)]
    }

    fn with_focused_list(
        &mut self,
        action: impl FnOnce(&mut Self, ListKind) -> Vec<AppEvent>,
    ) -> Vec<AppEvent> {
        match self.focus {
            Panel::List(kind) => action(self, kind),
            _ => Vec::new(),
        }
    }

    /// The one place a list kind maps to its editor.
    fn editor_mut(&mut self, kind: ListKind) -> &mut dyn DraftEditor {
        match kind {
            ListKind::Debts => &mut self.debts,
            ListKind::Bills => &mut self.bills,
            ListKind::Expenses => &mut self.expenses,
        }
    }

    fn select(&mut self, kind: ListKind, forward: bool) {
        let editor = self.editor_mut(kind);
        if forward {
            editor.select_next();
        } else {
            editor.select_prev();
        }
    }

    fn remove_selected(&mut self, kind: ListKind) -> Vec<AppEvent> {
        match self.editor_mut(kind).remove_selected_name() {
            Some(name) => vec![
                AppEvent::ItemRemoved(kind),
                self.set_status(&format!("removed {name}")),
            ],
            None => Vec::new(),
        }
    }

    fn start_advice(&mut self) -> Vec<AppEvent> {
        if self.advice_query.trim().is_empty() {
            return vec![self.set_status("type a question first")];
        }
        match self.advice.begin() {
            Some(request_id) => vec![AppEvent::AdviceStarted { request_id }],
            None => Vec::new(),
        }
    }

    fn start_plan(&mut self) -> Vec<AppEvent> {
        match self.plan.begin() {
            Some(request_id) => vec![AppEvent::PlanStarted { request_id }],
            None => Vec::new(),
        }
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}

fn is_numeric_char(ch: char) -> bool {
    ch.is_ascii_digit() || ch == '.' || ch == '-'
}

fn noun(kind: ListKind) -> &'static str {
    match kind {
        ListKind::Debts => "debt",
        ListKind::Bills => "bill",
        ListKind::Expenses => "expense",
    }
}

#[cfg(test)]
mod tests {
    use super::{AppCommand, AppEvent, AppState};
    use crate::{Chart, ListKind, Panel, Reply, RequestPhase};

    fn type_text(state: &mut AppState, text: &str) {
        for ch in text.chars() {
            state.dispatch(AppCommand::InsertChar(ch));
        }
    }

    #[test]
    fn sample_budget_matches_reference_totals() {
        let state = AppState::sample();
        let totals = state.totals();
        assert_eq!(totals.income, 5000.0);
        assert_eq!(totals.total_expenses, 2110.0);
        assert_eq!(totals.total_debt, 4500.0);
        assert_eq!(totals.savings, 2890.0);
        assert_eq!(state.income_input(), "5000");
    }

    #[test]
    fn focus_rotation_wraps() {
        let mut state = AppState {
            focus: Panel::DebtAdvice,
            ..AppState::default()
        };

        let events = state.dispatch(AppCommand::FocusNext);
        assert_eq!(state.focus, Panel::Income);
        assert_eq!(events, vec![AppEvent::FocusChanged(Panel::Income)]);

        state.dispatch(AppCommand::FocusPrev);
        assert_eq!(state.focus, Panel::DebtAdvice);
    }

    #[test]
    fn income_is_coerced_on_every_keystroke() {
        let mut state = AppState::default();
        type_text(&mut state, "12a.5");
        assert_eq!(state.income_input(), "12.5");
        assert_eq!(state.income(), 12.5);

        state.dispatch(AppCommand::SetIncome("oops".to_owned()));
        assert_eq!(state.income(), 0.0);
        assert_eq!(state.income_input(), "oops");

        state.dispatch(AppCommand::SetIncome("-".to_owned()));
        assert_eq!(state.income(), 0.0);
    }

    #[test]
    fn enter_walks_fields_then_adds_expense() {
        let mut state = AppState {
            focus: Panel::List(ListKind::Expenses),
            ..AppState::default()
        };
        type_text(&mut state, "Coffee");
        state.dispatch(AppCommand::Submit);
        type_text(&mut state, "4.5");
        state.dispatch(AppCommand::Submit);
        let events = state.dispatch(AppCommand::Submit);

        assert_eq!(
            events,
            vec![
                AppEvent::ItemAdded(ListKind::Expenses),
                AppEvent::StatusUpdated("expense added".to_owned()),
            ]
        );
        let item = &state.expenses.items()[0];
        assert_eq!(item.name, "Coffee");
        assert_eq!(item.amount, 4.5);
        assert_eq!(item.category, "Misc");
        assert_eq!(state.totals().total_expenses, 4.5);
    }

    #[test]
    fn blank_name_reports_status_and_keeps_draft() {
        let mut state = AppState {
            focus: Panel::List(ListKind::Bills),
            ..AppState::default()
        };
        state.dispatch(AppCommand::Submit);
        type_text(&mut state, "80");
        state.dispatch(AppCommand::Submit);
        let events = state.dispatch(AppCommand::Submit);

        assert!(events.contains(&AppEvent::StatusUpdated("name is required".to_owned())));
        assert!(state.bills.is_empty());
        assert_eq!(state.bills.draft().value("amount"), "80");
        assert_eq!(state.bills.field_index(), 0);
    }

    #[test]
    fn blank_amount_reports_status_and_keeps_name() {
        let mut state = AppState::default();
        state.focus = Panel::List(ListKind::Expenses);
        type_text(&mut state, "Coffee");
        state.dispatch(AppCommand::Submit);
        state.dispatch(AppCommand::Submit);
        let events = state.dispatch(AppCommand::Submit);

        assert!(events.contains(&AppEvent::StatusUpdated("amount is required".to_owned())));
        assert!(state.expenses.is_empty());
        assert_eq!(state.expenses.draft().value("name"), "Coffee");
    }

    #[test]
    fn remove_selected_drops_item_from_totals() {
        let mut state = AppState::sample();
        state.focus = Panel::List(ListKind::Bills);
        let events = state.dispatch(AppCommand::RemoveSelected);
        assert_eq!(
            events,
            vec![
                AppEvent::ItemRemoved(ListKind::Bills),
                AppEvent::StatusUpdated("removed Rent".to_owned()),
            ]
        );
        assert_eq!(state.totals().total_expenses, 610.0);
    }

    #[test]
    fn remove_on_empty_list_is_silent() {
        let mut state = AppState {
            focus: Panel::List(ListKind::Debts),
            ..AppState::default()
        };
        assert!(state.dispatch(AppCommand::RemoveSelected).is_empty());
    }

    #[test]
    fn advice_requires_a_question() {
        let mut state = AppState::sample();
        state.focus = Panel::DebtAdvice;
        type_text(&mut state, "   ");
        let events = state.dispatch(AppCommand::Submit);
        assert_eq!(
            events,
            vec![AppEvent::StatusUpdated("type a question first".to_owned())]
        );
        assert!(!state.advice.is_busy());
    }

    #[test]
    fn advice_round_trip_through_slot() {
        let mut state = AppState::sample();
        state.focus = Panel::DebtAdvice;
        type_text(&mut state, " Pay off faster? ");

        let events = state.dispatch(AppCommand::Submit);
        let [AppEvent::AdviceStarted { request_id }] = events.as_slice() else {
            panic!("expected advice start, got {events:?}");
        };
        let request_id = *request_id;
        assert!(state.dispatch(AppCommand::StartAdvice).is_empty());

        let request = state.advice_request();
        assert_eq!(request.question, "Pay off faster?");
        assert_eq!(request.debts.len(), 1);
        assert_eq!(request.total_expenses, 2110.0);

        let events = state.dispatch(AppCommand::FinishAdvice {
            request_id,
            reply: Reply::Fallback("sorry".to_owned()),
        });
        assert_eq!(events, vec![AppEvent::AdviceFinished(RequestPhase::Failed)]);
        assert!(!state.advice.is_busy());
        assert_eq!(state.advice.response(), "sorry");
    }

    #[test]
    fn both_requests_may_be_pending_at_once() {
        let mut state = AppState::sample();
        state.advice_query = "help".to_owned();
        assert!(!state.dispatch(AppCommand::StartPlan).is_empty());
        assert!(!state.dispatch(AppCommand::StartAdvice).is_empty());
        assert!(state.plan.is_busy());
        assert!(state.advice.is_busy());
    }

    #[test]
    fn stale_finish_is_dropped() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::StartPlan);
        let events = state.dispatch(AppCommand::FinishPlan {
            request_id: 999,
            reply: Reply::Answer("late".to_owned()),
        });
        assert!(events.is_empty());
        assert!(state.plan.is_busy());
    }

    #[test]
    fn plan_request_merges_expenses_then_bills() {
        let state = AppState::sample();
        let request = state.plan_request();
        let names = request
            .items
            .iter()
            .map(|item| item.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Groceries", "Gas", "Rent", "Internet"]);
        assert_eq!(request.items[2].category, "Housing");
    }

    #[test]
    fn chart_is_empty_for_blank_budget() {
        assert_eq!(AppState::default().chart(), Chart::Empty);
        assert!(matches!(AppState::sample().chart(), Chart::Slices(_)));
    }

    #[test]
    fn status_set_and_clear() {
        let mut state = AppState::default();
        let events = state.dispatch(AppCommand::SetStatus("saved".to_owned()));
        assert_eq!(events, vec![AppEvent::StatusUpdated("saved".to_owned())]);
        assert_eq!(state.status_line.as_deref(), Some("saved"));

        let events = state.dispatch(AppCommand::ClearStatus);
        assert_eq!(events, vec![AppEvent::StatusCleared]);
        assert_eq!(state.status_line, None);
    }

    #[test]
    fn escape_clears_question() {
        let mut state = AppState {
            focus: Panel::DebtAdvice,
            ..AppState::default()
        };
        type_text(&mut state, "abc");
        state.dispatch(AppCommand::DeleteChar);
        assert_eq!(state.advice_query, "ab");
        state.dispatch(AppCommand::ClearInput);
        assert!(state.advice_query.is_empty());
    }

    #[test]
    fn escape_returns_settled_plan_to_idle() {
        let mut state = AppState::sample();
        state.focus = Panel::BudgetPlan;
        let events = state.dispatch(AppCommand::StartPlan);
        let [AppEvent::PlanStarted { request_id }] = events.as_slice() else {
            panic!("expected plan start, got {events:?}");
        };
        let request_id = *request_id;
        assert!(state.dispatch(AppCommand::ClearInput).is_empty());
        assert!(state.plan.is_busy());

        state.dispatch(AppCommand::FinishPlan {
            request_id,
            reply: Reply::Fallback("sorry".to_owned()),
        });
        let events = state.dispatch(AppCommand::ClearInput);
        assert_eq!(events, vec![AppEvent::ReplyDismissed(Panel::BudgetPlan)]);
        assert_eq!(state.plan.phase(), RequestPhase::Idle);
        assert_eq!(state.plan.response(), "sorry");
        assert!(state.dispatch(AppCommand::ClearInput).is_empty());
    }

    #[test]
    fn escape_with_empty_question_dismisses_advice() {
        let mut state = AppState::sample();
        state.focus = Panel::DebtAdvice;
        type_text(&mut state, "why");
        let events = state.dispatch(AppCommand::Submit);
        let [AppEvent::AdviceStarted { request_id }] = events.as_slice() else {
            panic!("expected advice start, got {events:?}");
        };
        let request_id = *request_id;
        state.dispatch(AppCommand::FinishAdvice {
            request_id,
            reply: Reply::Answer("avalanche".to_owned()),
        });

        assert_eq!(
            state.dispatch(AppCommand::ClearInput),
            vec![AppEvent::QuestionChanged]
        );
        assert_eq!(state.advice.phase(), RequestPhase::Succeeded);
        assert_eq!(
            state.dispatch(AppCommand::ClearInput),
            vec![AppEvent::ReplyDismissed(Panel::DebtAdvice)]
        );
        assert_eq!(state.advice.phase(), RequestPhase::Idle);
    }
}
