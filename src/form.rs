use crate::core::address::FieldAddress;
use crate::core::error::FormError;
use crate::core::value::Value;
use crate::payload;
use crate::runtime::action::{FormAction, SetFieldValue, SetFieldValueBulk, ValueChanged};
use crate::runtime::normalizer::ChangeNotification;
use crate::runtime::reducer::{Reducer, Transition};
use crate::schema::{FieldDescriptor, FieldKind, Schema, StandardDescriptor};
use crate::state::field::FieldState;
use crate::state::tree::{FieldNode, FormState};
use crate::validation::{FieldLookup, validate_form};
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// Read-only render data for one (sub-)field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldView {
    pub selector: String,
    pub kind: FieldKind,
    pub value: Value,
    pub error: String,
    pub is_visible: bool,
    pub disabled: bool,
    pub label: Option<String>,
}

impl FieldView {
    fn new(address: &FieldAddress, descriptor: &StandardDescriptor, state: &FieldState) -> Self {
        let label = if state.use_second_label {
            descriptor.label2.clone()
        } else {
            descriptor.label.clone()
        };
        Self {
            selector: address.to_selector(),
            kind: descriptor.kind,
            value: state.value.clone(),
            error: state.error.clone(),
            is_visible: state.is_visible,
            disabled: state.disabled,
            label,
        }
    }
}

/// One form instance: owns the latest committed tree and routes every
/// change through the reducer.
#[derive(Debug, Clone)]
pub struct Form {
    state: FormState,
}

impl Form {
    pub fn new(
        schema: impl Into<Arc<Schema>>,
        initial_values: Option<&IndexMap<String, Value>>,
    ) -> Result<Self, FormError> {
        Ok(Self {
            state: FormState::new(schema.into(), initial_values)?,
        })
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// Applies one action to the latest tree, then runs its completion hooks.
    pub fn dispatch(&mut self, action: impl Into<FormAction>) -> Result<(), FormError> {
        let Transition { state, effects } = Reducer::reduce(&self.state, action.into())?;
        self.state = state;
        for effect in effects {
            effect.run();
        }
        Ok(())
    }

    /// Render views in schema order; dynamic items expand to one view per
    /// sub-field, addressed by selector.
    pub fn fields(&self) -> Vec<FieldView> {
        let mut views = Vec::new();
        for (name, descriptor) in self.state.schema().iter() {
            match (descriptor, self.state.get(name)) {
                (FieldDescriptor::Standard(descriptor), Some(FieldNode::Standard(field))) => {
                    views.push(FieldView::new(&FieldAddress::field(name), descriptor, field));
                }
                (FieldDescriptor::Dynamic(descriptor), Some(FieldNode::Dynamic(dynamic))) => {
                    for (index, record) in dynamic.value.iter().enumerate() {
                        for (sub_field, field) in record.iter() {
                            let Some(sub_descriptor) = descriptor.sub_field(sub_field) else {
                                continue;
                            };
                            let address = FieldAddress::item(name, index, sub_field.as_str());
                            views.push(FieldView::new(&address, sub_descriptor, field));
                        }
                    }
                }
                _ => {}
            }
        }
        views
    }

    /// Value by name or `field[index].subField` selector. A dynamic field
    /// yields its items as a list of objects.
    pub fn get_field_value(&self, selector: &str) -> Result<Value, FormError> {
        match FieldAddress::parse(selector)? {
            FieldAddress::Field(name) => match self.state.get(&name) {
                Some(FieldNode::Standard(field)) => Ok(field.value.clone()),
                Some(FieldNode::Dynamic(dynamic)) => Ok(Value::List(
                    dynamic
                        .value
                        .iter()
                        .map(|record| payload::record_values(record))
                        .collect(),
                )),
                None => Err(FormError::UnknownField(name)),
            },
            address => Ok(self.state.field_at(&address)?.value.clone()),
        }
    }

    /// Change-submission hook for the rendering layer.
    pub fn change(
        &mut self,
        address: impl Into<FieldAddress>,
        notification: ChangeNotification,
    ) -> Result<(), FormError> {
        self.dispatch(ValueChanged::new(address, notification))
    }

    pub fn set_field_value(&mut self, action: SetFieldValue) -> Result<(), FormError> {
        self.dispatch(action)
    }

    pub fn set_field_values_bulk(&mut self, action: SetFieldValueBulk) -> Result<(), FormError> {
        self.dispatch(action)
    }

    pub fn add_dynamic_item(
        &mut self,
        dynamic_field_name: impl Into<String>,
        init_data: Option<IndexMap<String, Value>>,
    ) -> Result<(), FormError> {
        self.dispatch(FormAction::DynamicItemAdded {
            field_name: dynamic_field_name.into(),
            init_data,
        })
    }

    pub fn remove_dynamic_item(
        &mut self,
        dynamic_field_name: impl Into<String>,
        index: usize,
    ) -> Result<(), FormError> {
        self.dispatch(FormAction::DynamicItemRemoved {
            field_name: dynamic_field_name.into(),
            index,
        })
    }

    pub fn set_field_visibility(
        &mut self,
        address: impl Into<FieldAddress>,
        is_visible: bool,
    ) -> Result<(), FormError> {
        self.dispatch(FormAction::FieldVisibilityChanged {
            address: address.into(),
            is_visible,
        })
    }

    /// Whole-form validation; every recomputed error is committed at once.
    pub fn validate(&mut self) -> Result<bool, FormError> {
        self.validate_against(None)
    }

    /// Like [`Form::validate`], with `extra` values taking precedence when a
    /// rule's dependency condition is checked.
    pub fn validate_with_args(&mut self, extra: &IndexMap<String, Value>) -> Result<bool, FormError> {
        self.validate_against(Some(extra as &dyn FieldLookup))
    }

    fn validate_against(&mut self, extra: Option<&dyn FieldLookup>) -> Result<bool, FormError> {
        let errors = validate_form(&self.state, extra);
        let invalid = errors
            .iter()
            .filter(|error| !error.field_error.is_empty())
            .count();
        if invalid > 0 {
            warn!(invalid, "form validation failed");
        }
        self.dispatch(FormAction::ValidationErrorsApplied(errors))?;
        Ok(invalid == 0)
    }

    pub fn prepare_for_server(&self) -> IndexMap<String, Value> {
        payload::prepare_for_server(&self.state)
    }

    pub fn clone_state_values(&self) -> IndexMap<String, Value> {
        payload::clone_state_values(&self.state)
    }
}
