use heck::ToUpperCamelCase;
use model_catalog::FieldWalker;
use serde_json::Value;

/// A GraphQL enum generated for a field with declared choices.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceEnum {
    pub name: String,
    pub items: Vec<ChoiceItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceItem {
    pub name: String,
    pub value: Value,
    pub label: String,
}

impl ChoiceEnum {
    /// The enum of `field`, named after its model and itself, e.g. `IssueKind`.
    pub fn for_field(field: FieldWalker<'_>) -> Option<Self> {
        let choices = &field.definition().choices;

        if choices.is_empty() {
            return None;
        }

        let name = format!("{}_{}", field.model().name(), field.name()).to_upper_camel_case();

        let items = choices
            .iter()
            .map(|choice| ChoiceItem {
                name: choice_item_name(&choice.value),
                value: choice.value.clone(),
                label: choice.label.clone(),
            })
            .collect();

        Some(Self { name, items })
    }

    pub fn value_of(&self, item: &str) -> Option<&Value> {
        self.items.iter().find(|candidate| candidate.name == item).map(|item| &item.value)
    }

    pub fn item_for(&self, value: &Value) -> Option<&ChoiceItem> {
        self.items.iter().find(|item| &item.value == value)
    }
}

/// The enum item name of a choice value: uppercased, with every character that cannot
/// appear in a GraphQL name replaced by `_`, and prefixed with `A_` when it does not start
/// like a name.
pub fn choice_item_name(value: &Value) -> String {
    let raw = match value {
        Value::String(value) => value.clone(),
        other => other.to_string(),
    };

    let name: String = raw
        .to_uppercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    match name.chars().next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => name,
        _ => format!("A_{name}"),
    }
}
