// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};

use crate::{Draft, FieldSpec, IdSequence, LedgerItem};

pub const EMPTY_LIST_MESSAGE: &str = "No items added yet.";

/// Add/remove controller over one ordered collection plus the draft the
/// user is typing into.
#[derive(Debug, Clone, PartialEq)]
pub struct ListEditor<T: LedgerItem> {
    items: Vec<T>,
    draft: Draft,
    field_index: usize,
    selected: usize,
    ids: IdSequence,
}

impl<T: LedgerItem> Default for ListEditor<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            draft: Draft::new(T::FIELDS),
            field_index: 0,
            selected: 0,
            ids: IdSequence::default(),
        }
    }
}

impl<T: LedgerItem> ListEditor<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        T::FIELDS
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut Draft {
        &mut self.draft
    }

    pub fn field_index(&self) -> usize {
        self.field_index
    }

    pub fn active_field(&self) -> FieldSpec {
        T::FIELDS[self.field_index.min(T::FIELDS.len() - 1)]
    }

    pub fn on_last_field(&self) -> bool {
        self.field_index + 1 >= T::FIELDS.len()
    }

    pub fn selected(&self) -> Option<&T> {
        self.items.get(self.selected)
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn total(&self) -> f64 {
        self.items.iter().map(LedgerItem::amount).sum()
    }

    /// Validates the draft, appends a new item and clears the draft.
    ///
    /// `name` and `amount` must be non-blank. The amount is then coerced,
    /// so text that does not parse is stored as zero.
    pub fn add(&mut self) -> Result<T::Id> {
        self.validate_draft()?;
        let id: T::Id = self.ids.next_id();
        self.items.push(T::from_draft(id, &self.draft));
        self.clear_draft();
        Ok(id)
    }

    /// Seeds an item without going through the draft.
    pub fn insert_with(&mut self, build: impl FnOnce(T::Id) -> T) -> T::Id {
        let id: T::Id = self.ids.next_id();
        self.items.push(build(id));
        id
    }

    /// Removes the item with `id`; returns false when nothing matched.
    pub fn remove(&mut self, id: T::Id) -> bool {
        let Some(index) = self.items.iter().position(|item| item.id() == id) else {
            return false;
        };
        self.items.remove(index);
        self.clamp_selection();
        true
    }

    pub fn remove_selected(&mut self) -> Option<T> {
        let item = self.selected()?.clone();
        self.remove(item.id());
        Some(item)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.items.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn next_field(&mut self) {
        self.field_index = (self.field_index + 1) % T::FIELDS.len();
    }

    pub fn prev_field(&mut self) {
        self.field_index = (self.field_index + T::FIELDS.len() - 1) % T::FIELDS.len();
    }

    /// Appends `ch` to the active draft field. Returns false when the field
    /// kind rejects the character.
    pub fn push_char(&mut self, ch: char) -> bool {
        let field = self.active_field();
        if !field.accepts(ch) {
            return false;
        }
        match self.draft.value_at_mut(self.field_index) {
            Some(value) => {
                value.push(ch);
                true
            }
            None => false,
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(value) = self.draft.value_at_mut(self.field_index) {
            value.pop();
        }
    }

    pub fn clear_draft(&mut self) {
        self.draft.clear();
        self.field_index = 0;
    }

    fn validate_draft(&self) -> Result<()> {
        for field in T::FIELDS.iter().filter(|field| field.required) {
            if self.draft.text(field.name).is_empty() {
                bail!("{} is required", field.name);
            }
        }
        Ok(())
    }

    fn clamp_selection(&mut self) {
        if self.items.is_empty() {
            self.selected = 0;
        } else {
            self.selected = self.selected.min(self.items.len() - 1);
        }
    }
}

/// Item-type-free view of a list editor, so key handling can drive any
/// list without knowing its record type.
pub trait DraftEditor {
    fn push_char(&mut self, ch: char) -> bool;
    fn pop_char(&mut self);
    fn next_field(&mut self);
    fn on_last_field(&self) -> bool;
    fn clear_draft(&mut self);
    fn select_next(&mut self);
    fn select_prev(&mut self);
    fn add_draft(&mut self) -> Result<()>;
    fn remove_selected_name(&mut self) -> Option<String>;
}

impl<T: LedgerItem> DraftEditor for ListEditor<T> {
    fn push_char(&mut self, ch: char) -> bool {
        ListEditor::push_char(self, ch)
    }

    fn pop_char(&mut self) {
        ListEditor::pop_char(self);
    }

    fn next_field(&mut self) {
        ListEditor::next_field(self);
    }

    fn on_last_field(&self) -> bool {
        ListEditor::on_last_field(self)
    }

    fn clear_draft(&mut self) {
        ListEditor::clear_draft(self);
    }

    fn select_next(&mut self) {
        ListEditor::select_next(self);
    }

    fn select_prev(&mut self) {
        ListEditor::select_prev(self);
    }

    fn add_draft(&mut self) -> Result<()> {
        self.add().map(|_| ())
    }

    fn remove_selected_name(&mut self) -> Option<String> {
        self.remove_selected().map(|item| item.name().to_owned())
    }
}
