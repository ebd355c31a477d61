// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub const EMPTY_CHART_MESSAGE: &str = "Enter your income and expenses to see the chart.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceKind {
    Expenses,
    Savings,
}

impl SliceKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Expenses => "Expenses",
            Self::Savings => "Savings",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slice {
    pub kind: SliceKind,
    pub amount: f64,
    /// Share of the slice sum in `0.0..=1.0`.
    pub fraction: f64,
}

impl Slice {
    pub fn percent_label(&self) -> String {
        format!("{} {:.0}%", self.kind.label(), self.fraction * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Chart {
    Empty,
    Slices([Slice; 2]),
}

impl Chart {
    /// Expenses against positive savings. Negative savings clamp to zero
    /// here only; the savings card still shows the signed value.
    pub fn from_budget(income: f64, total_expenses: f64) -> Self {
        if income == 0.0 && total_expenses == 0.0 {
            return Self::Empty;
        }

        let savings = (income - total_expenses).max(0.0);
        let sum = total_expenses + savings;
        let fraction = |amount: f64| if sum > 0.0 { amount / sum } else { 0.0 };
        Self::Slices([
            Slice {
                kind: SliceKind::Expenses,
                amount: total_expenses,
                fraction: fraction(total_expenses),
            },
            Slice {
                kind: SliceKind::Savings,
                amount: savings,
                fraction: fraction(savings),
            },
        ])
    }

    pub fn slice(&self, kind: SliceKind) -> Option<&Slice> {
        match self {
            Self::Empty => None,
            Self::Slices(slices) => slices.iter().find(|slice| slice.kind == kind),
        }
    }
}
