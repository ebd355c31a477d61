// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

macro_rules! item_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

item_id!(ExpenseId);
item_id!(BillId);
item_id!(DebtId);

/// Mints ids for one collection. Ids are unique within the collection that
/// owns the sequence, never across collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdSequence {
    next: u64,
}

impl Default for IdSequence {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdSequence {
    pub fn next_id<I: From<u64>>(&mut self) -> I {
        let id = self.next;
        self.next = self.next.saturating_add(1);
        I::from(id)
    }
}
