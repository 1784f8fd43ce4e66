//! Modal record editor.

use racedesk_core::{FieldSpec, RaceReferenceData};

const MAX_FIELD_LEN: usize = 128;

#[derive(Debug, Clone)]
pub(crate) struct FormField {
    pub label: &'static str,
    pub value: String,
    pub locked: bool,
    pub choices: Vec<String>,
    cursor: usize,
}

impl FormField {
    fn new(
        spec: &FieldSpec,
        value: String,
        locked: bool,
        reference: Option<&RaceReferenceData>,
    ) -> Self {
        let choices = match (spec.choices, reference) {
            (Some(source), Some(reference)) => reference.choices(source),
            _ => Vec::new(),
        };
        let cursor = value.chars().count();
        Self {
            label: spec.label,
            value,
            locked,
            choices,
            cursor,
        }
    }

    pub fn is_selector(&self) -> bool {
        !self.choices.is_empty()
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn byte_index(&self, cursor: usize) -> usize {
        self.value
            .char_indices()
            .nth(cursor)
            .map(|(idx, _)| idx)
            .unwrap_or(self.value.len())
    }

    fn insert(&mut self, ch: char) {
        if self.value.chars().count() >= MAX_FIELD_LEN || ch.is_control() {
            return;
        }
        let at = self.byte_index(self.cursor);
        self.value.insert(at, ch);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.value.remove(at);
    }

    fn delete(&mut self) {
        if self.cursor < self.value.chars().count() {
            let at = self.byte_index(self.cursor);
            self.value.remove(at);
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.value.chars().count() as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, len) as usize;
    }

    fn cycle(&mut self, delta: isize) {
        let len = self.choices.len() as isize;
        if len == 0 {
            return;
        }
        let next = match self.choices.iter().position(|choice| *choice == self.value) {
            Some(idx) => (idx as isize + delta).rem_euclid(len),
            None if delta < 0 => len - 1,
            None => 0,
        };
        self.value = self.choices[next as usize].clone();
        self.cursor = self.value.chars().count();
    }
}

/// Add/edit form state. Edit forms lock the key fields.
#[derive(Debug, Clone)]
pub(crate) struct RecordForm {
    pub title: String,
    pub fields: Vec<FormField>,
    pub focus: usize,
    pub error: Option<String>,
    pub pending: bool,
}

impl RecordForm {
    pub fn create(
        title: String,
        specs: &[FieldSpec],
        reference: Option<&RaceReferenceData>,
    ) -> Self {
        let fields = specs
            .iter()
            .map(|spec| FormField::new(spec, String::new(), false, reference))
            .collect();
        Self::build(title, fields)
    }

    pub fn edit(
        title: String,
        specs: &[FieldSpec],
        values: Vec<String>,
        reference: Option<&RaceReferenceData>,
    ) -> Self {
        let fields = specs
            .iter()
            .zip(values)
            .map(|(spec, value)| FormField::new(spec, value, spec.key, reference))
            .collect();
        Self::build(title, fields)
    }

    fn build(title: String, fields: Vec<FormField>) -> Self {
        let mut form = Self {
            title,
            fields,
            focus: 0,
            error: None,
            pending: false,
        };
        form.focus = form.first_unlocked().unwrap_or(0);
        form
    }

    fn first_unlocked(&self) -> Option<usize> {
        self.fields.iter().position(|field| !field.locked)
    }

    /// Move focus to the next editable field, wrapping around.
    pub fn move_focus(&mut self, delta: isize) {
        let len = self.fields.len() as isize;
        if len == 0 || self.first_unlocked().is_none() {
            return;
        }
        let mut idx = self.focus as isize;
        loop {
            idx = (idx + delta).rem_euclid(len);
            if !self.fields[idx as usize].locked {
                break;
            }
        }
        self.focus = idx as usize;
    }

    fn focused(&mut self) -> Option<&mut FormField> {
        self.fields
            .get_mut(self.focus)
            .filter(|field| !field.locked)
    }

    pub fn insert(&mut self, ch: char) {
        if let Some(field) = self.focused() {
            field.insert(ch);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.focused() {
            field.backspace();
        }
    }

    pub fn delete(&mut self) {
        if let Some(field) = self.focused() {
            field.delete();
        }
    }

    /// Left/Right: cycle selector choices, or move the text cursor.
    pub fn horizontal(&mut self, delta: isize) {
        if let Some(field) = self.focused() {
            if field.is_selector() {
                field.cycle(delta);
            } else {
                field.move_cursor(delta);
            }
        }
    }

    pub fn values(&self) -> Vec<String> {
        self.fields.iter().map(|field| field.value.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use racedesk_core::{Director, Race, Resource, Sponsor};

    fn reference() -> RaceReferenceData {
        RaceReferenceData {
            directors: vec![
                Director {
                    name: "Quang".to_string(),
                    phone_no: "0901".to_string(),
                    address: "Hue".to_string(),
                },
                Director {
                    name: "Lan".to_string(),
                    phone_no: "0902".to_string(),
                    address: "Hue".to_string(),
                },
            ],
            sponsors: vec![Sponsor {
                sp_name: "Acme".to_string(),
                contact: "0903".to_string(),
            }],
            licenses: Vec::new(),
        }
    }

    #[test]
    fn edit_form_locks_key_fields_and_skips_them() {
        let race = Race {
            rno: 3,
            lic_no: "L1".to_string(),
            dir: "Quang".to_string(),
            mal_win: None,
            fem_win: None,
            sp_name: "Acme".to_string(),
        };
        let mut form = RecordForm::edit(
            "Edit race".to_string(),
            Race::fields(),
            race.field_values(),
            None,
        );
        assert_eq!(form.focus, 2);
        form.move_focus(-1);
        assert_eq!(form.focus, 5);
        form.move_focus(1);
        assert_eq!(form.focus, 2);

        form.focus = 0;
        form.insert('9');
        assert_eq!(form.values()[0], "3");
    }

    #[test]
    fn selectors_cycle_through_reference_choices() {
        let reference = reference();
        let mut form = RecordForm::create("New race".to_string(), Race::fields(), Some(&reference));
        form.focus = 2;
        form.horizontal(1);
        assert_eq!(form.values()[2], "Quang");
        form.horizontal(1);
        assert_eq!(form.values()[2], "Lan");
        form.horizontal(1);
        assert_eq!(form.values()[2], "Quang");

        // no licenses loaded: the license field stays free text
        form.focus = 1;
        form.insert('L');
        assert_eq!(form.values()[1], "L");
    }

    #[test]
    fn text_editing_handles_multibyte_characters() {
        let mut form = RecordForm::create("New sponsor".to_string(), Sponsor::fields(), None);
        for ch in "Hà Nội".chars() {
            form.insert(ch);
        }
        form.horizontal(-1);
        form.backspace();
        assert_eq!(form.values()[0], "Hà Ni");
        form.delete();
        assert_eq!(form.values()[0], "Hà N");
    }
}
