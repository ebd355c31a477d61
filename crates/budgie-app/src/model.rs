// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::ids::*;

pub const DEFAULT_EXPENSE_CATEGORY: &str = "Misc";
pub const DEFAULT_BILL_CATEGORY: &str = "Other";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Numeric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub placeholder: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    const fn text(name: &'static str, placeholder: &'static str, required: bool) -> Self {
        Self {
            name,
            placeholder,
            kind: FieldKind::Text,
            required,
        }
    }

    const fn numeric(name: &'static str, placeholder: &'static str, required: bool) -> Self {
        Self {
            name,
            placeholder,
            kind: FieldKind::Numeric,
            required,
        }
    }

    /// Numeric inputs only take characters that can appear in a decimal.
    pub fn accepts(&self, ch: char) -> bool {
        match self.kind {
            FieldKind::Text => !ch.is_control(),
            FieldKind::Numeric => ch.is_ascii_digit() || ch == '.' || ch == '-',
        }
    }
}

const EXPENSE_FIELDS: [FieldSpec; 3] = [
    FieldSpec::text("name", "Expense Name", true),
    FieldSpec::numeric("amount", "Amount", true),
    FieldSpec::text("category", "Category", false),
];

const BILL_FIELDS: [FieldSpec; 3] = [
    FieldSpec::text("name", "Bill Name", true),
    FieldSpec::numeric("amount", "Amount", true),
    FieldSpec::text("category", "Category", false),
];

const DEBT_FIELDS: [FieldSpec; 3] = [
    FieldSpec::text("name", "Credit Card Name", true),
    FieldSpec::numeric("amount", "Amount", true),
    FieldSpec::numeric("apr", "APR %", false),
];

/// Raw text typed into a list editor, one value per schema field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    fields: &'static [FieldSpec],
    values: Vec<String>,
}

impl Draft {
    pub fn new(fields: &'static [FieldSpec]) -> Self {
        Self {
            fields,
            values: vec![String::new(); fields.len()],
        }
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    /// Returns the raw value for `name`, or an empty string for fields the
    /// schema does not define.
    pub fn value(&self, name: &str) -> &str {
        self.fields
            .iter()
            .position(|field| field.name == name)
            .and_then(|index| self.values.get(index))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn value_at(&self, index: usize) -> &str {
        self.values.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        let Some(index) = self.fields.iter().position(|field| field.name == name) else {
            return false;
        };
        self.values[index] = value.into();
        true
    }

    pub(crate) fn value_at_mut(&mut self, index: usize) -> Option<&mut String> {
        self.values.get_mut(index)
    }

    pub fn clear(&mut self) {
        for value in &mut self.values {
            value.clear();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(|value| value.is_empty())
    }

    pub fn text(&self, name: &str) -> String {
        self.value(name).trim().to_owned()
    }

    pub fn text_or(&self, name: &str, fallback: &str) -> String {
        let text = self.text(name);
        if text.is_empty() {
            fallback.to_owned()
        } else {
            text
        }
    }

    pub fn number(&self, name: &str) -> f64 {
        coerce_amount(self.value(name))
    }
}

/// Coerces user input to a number. Blank, unparsable and non-finite input
/// all become zero; sign and fraction pass through untouched.
pub fn coerce_amount(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Shape shared by every record a list editor can hold.
pub trait LedgerItem: Clone {
    type Id: Copy + Eq + From<u64> + std::fmt::Debug;

    const FIELDS: &'static [FieldSpec];

    fn id(&self) -> Self::Id;
    fn name(&self) -> &str;
    fn amount(&self) -> f64;
    fn from_draft(id: Self::Id, draft: &Draft) -> Self;

    fn detail(&self) -> String {
        format!("${:.2}", self.amount())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    pub id: ExpenseId,
    pub name: String,
    pub amount: f64,
    pub category: String,
}

impl LedgerItem for Expense {
    type Id = ExpenseId;

    const FIELDS: &'static [FieldSpec] = &EXPENSE_FIELDS;

    fn id(&self) -> ExpenseId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn amount(&self) -> f64 {
        self.amount
    }

    fn from_draft(id: ExpenseId, draft: &Draft) -> Self {
        Self {
            id,
            name: draft.text("name"),
            amount: draft.number("amount"),
            category: draft.text_or("category", DEFAULT_EXPENSE_CATEGORY),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bill {
    pub id: BillId,
    pub name: String,
    pub amount: f64,
    pub category: String,
}

impl LedgerItem for Bill {
    type Id = BillId;

    const FIELDS: &'static [FieldSpec] = &BILL_FIELDS;

    fn id(&self) -> BillId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn amount(&self) -> f64 {
        self.amount
    }

    fn from_draft(id: BillId, draft: &Draft) -> Self {
        Self {
            id,
            name: draft.text("name"),
            amount: draft.number("amount"),
            category: draft.text_or("category", DEFAULT_BILL_CATEGORY),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Debt {
    pub id: DebtId,
    pub name: String,
    pub amount: f64,
    pub apr: f64,
}

impl LedgerItem for Debt {
    type Id = DebtId;

    const FIELDS: &'static [FieldSpec] = &DEBT_FIELDS;

    fn id(&self) -> DebtId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn amount(&self) -> f64 {
        self.amount
    }

    fn from_draft(id: DebtId, draft: &Draft) -> Self {
        Self {
            id,
            name: draft.text("name"),
            amount: draft.number("amount"),
            apr: draft.number("apr"),
        }
    }

    fn detail(&self) -> String {
        format!("${:.2} at {}%", self.amount, self.apr)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Debts,
    Bills,
    Expenses,
}

impl ListKind {
    pub const fn title(self) -> &'static str {
        match self {
            Self::Debts => "Debts",
            Self::Bills => "Recurring Bills",
            Self::Expenses => "Monthly Expenses",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Income,
    List(ListKind),
    BudgetPlan,
    DebtAdvice,
}

impl Panel {
    pub const ALL: [Self; 6] = [
        Self::Income,
        Self::List(ListKind::Debts),
        Self::List(ListKind::Bills),
        Self::List(ListKind::Expenses),
        Self::BudgetPlan,
        Self::DebtAdvice,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::List(ListKind::Debts) => "debts",
            Self::List(ListKind::Bills) => "bills",
            Self::List(ListKind::Expenses) => "expenses",
            Self::BudgetPlan => "planner",
            Self::DebtAdvice => "advisor",
        }
    }
}
