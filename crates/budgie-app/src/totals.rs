// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Bill, Debt, Expense};

/// Aggregates derived from the current collections. Never cached.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Totals {
    pub income: f64,
    pub total_expenses: f64,
    pub total_debt: f64,
    pub savings: f64,
}

impl Totals {
    pub fn compute(income: f64, expenses: &[Expense], bills: &[Bill], debts: &[Debt]) -> Self {
        let total_expenses = total_expenses(expenses, bills);
        Self {
            income,
            total_expenses,
            total_debt: total_debt(debts),
            savings: savings(income, total_expenses),
        }
    }
}

pub fn total_expenses(expenses: &[Expense], bills: &[Bill]) -> f64 {
    let expense_total: f64 = expenses.iter().map(|item| item.amount).sum();
    let bill_total: f64 = bills.iter().map(|item| item.amount).sum();
    expense_total + bill_total
}

pub fn total_debt(debts: &[Debt]) -> f64 {
    debts.iter().map(|item| item.amount).sum()
}

pub fn savings(income: f64, total_expenses: f64) -> f64 {
    income - total_expenses
}

/// `$1,234.50` style with thousands separators, as shown on summary cards.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return format_amount(value);
    }
    let scaled = (value.abs() * 100.0).round();
    // Past u64 cents an f64 carries no cent precision, so whole dollars are exact enough.
    if scaled >= u64::MAX as f64 {
        let sign = if value < 0.0 { "-" } else { "" };
        let dollars = format!("{:.0}", value.abs().trunc());
        return format!("{sign}${}.00", group_thousands(&dollars));
    }
    let cents = scaled as u64;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    let dollars = cents / 100;
    let remainder = cents % 100;
    format!("{sign}${}.{remainder:02}", group_thousands(&dollars.to_string()))
}

/// `$4500.00` style, as used in list rows, prompts and the chart legend.
pub fn format_amount(value: f64) -> String {
    format!("${value:.2}")
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
