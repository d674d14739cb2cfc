// Session creation form
//
// Five text fields and a submit row. Up/Down move between them; Enter
// advances and, on the submit row, hands the values to the context.

use super::input::TextInput;
use crate::session::SessionForm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Tls,
    Name,
    Address,
    Nick,
    Channels,
    Submit,
}

impl FormField {
    pub const ALL: [FormField; 6] = [
        FormField::Tls,
        FormField::Name,
        FormField::Address,
        FormField::Nick,
        FormField::Channels,
        FormField::Submit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FormField::Tls => "TLS",
            FormField::Name => "Name",
            FormField::Address => "Address",
            FormField::Nick => "Nick",
            FormField::Channels => "Channels",
            FormField::Submit => "Submit",
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            FormField::Tls => "true / false",
            FormField::Name => "libera",
            FormField::Address => "irc.libera.chat:6697",
            FormField::Nick => "(default nick)",
            FormField::Channels => "#rust, #zuse",
            FormField::Submit => "",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }
}

/// Outcome of a key on the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormAction {
    None,
    Submit(SessionForm),
}

#[derive(Debug, Clone)]
pub struct FormState {
    inputs: [TextInput; 5],
    selected: FormField,
    /// Last validation error, shown on the submit row
    pub error: Option<String>,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            inputs: Default::default(),
            selected: FormField::Name,
            error: None,
        }
    }
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> FormField {
        self.selected
    }

    /// Input for a text field; `None` for the submit row
    pub fn input(&self, field: FormField) -> Option<&TextInput> {
        self.inputs.get(field.index())
    }

    fn selected_input(&mut self) -> Option<&mut TextInput> {
        self.inputs.get_mut(self.selected.index())
    }

    pub fn select_prev(&mut self) {
        let index = self.selected.index();
        if index > 0 {
            self.selected = FormField::ALL[index - 1];
        }
    }

    pub fn select_next(&mut self) {
        let index = self.selected.index();
        if index + 1 < FormField::ALL.len() {
            self.selected = FormField::ALL[index + 1];
        }
    }

    /// Enter: advance, or submit from the last row
    pub fn enter(&mut self) -> FormAction {
        if self.selected == FormField::Submit {
            return FormAction::Submit(self.values());
        }
        self.select_next();
        FormAction::None
    }

    pub fn insert_char(&mut self, c: char) {
        if let Some(input) = self.selected_input() {
            input.insert_char(c);
        }
    }

    pub fn delete_back(&mut self) {
        if let Some(input) = self.selected_input() {
            input.delete_back();
        }
    }

    pub fn values(&self) -> SessionForm {
        let text = |field: FormField| {
            self.input(field)
                .map(|i| i.text().to_string())
                .unwrap_or_default()
        };
        SessionForm {
            tls: text(FormField::Tls),
            name: text(FormField::Name),
            address: text(FormField::Address),
            nick: text(FormField::Nick),
            channels: text(FormField::Channels),
        }
    }

    /// Blank every field and start over at the name
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(form: &mut FormState, s: &str) {
        s.chars().for_each(|c| form.insert_char(c));
    }

    #[test]
    fn enter_walks_to_submit() {
        let mut form = FormState::new();
        assert_eq!(form.selected(), FormField::Name);
        type_str(&mut form, "net1");
        assert_eq!(form.enter(), FormAction::None);
        type_str(&mut form, "irc.example:6697");
        form.enter();
        form.enter();
        type_str(&mut form, "#a,#b");
        form.enter();
        assert_eq!(form.selected(), FormField::Submit);

        match form.enter() {
            FormAction::Submit(values) => {
                assert_eq!(values.name, "net1");
                assert_eq!(values.address, "irc.example:6697");
                assert_eq!(values.nick, "");
                assert_eq!(values.channels, "#a,#b");
            }
            other => panic!("expected submit, got {:?}", other),
        }
    }

    #[test]
    fn navigation_is_clamped() {
        let mut form = FormState::new();
        form.select_prev();
        form.select_prev();
        assert_eq!(form.selected(), FormField::Tls);
        for _ in 0..10 {
            form.select_next();
        }
        assert_eq!(form.selected(), FormField::Submit);
    }

    #[test]
    fn typing_on_submit_is_ignored() {
        let mut form = FormState::new();
        for _ in 0..5 {
            form.select_next();
        }
        type_str(&mut form, "x");
        assert_eq!(form.values(), SessionForm::default());
        assert!(form.input(FormField::Submit).is_none());
    }

    #[test]
    fn reset_clears_error_and_values() {
        let mut form = FormState::new();
        type_str(&mut form, "net1");
        form.error = Some("name and address required".into());
        form.reset();
        assert_eq!(form.values(), SessionForm::default());
        assert!(form.error.is_none());
        assert_eq!(form.selected(), FormField::Name);
    }
}
