use crate::core::address::FieldAddress;
use crate::core::error::FormError;
use crate::core::value::Value;
use crate::schema::{DynamicDescriptor, FieldDescriptor, Schema};
use crate::state::field::FieldState;
use crate::validation::FieldLookup;
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;

/// One item of a dynamic field: sub-field name -> state.
pub type Record = IndexMap<String, FieldState>;

impl FieldLookup for Record {
    fn field_value(&self, name: &str) -> Option<&Value> {
        self.get(name).map(|state| &state.value)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DynamicFieldState {
    pub value: Vec<Arc<Record>>,
}

impl DynamicFieldState {
    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn item(&self, index: usize) -> Option<&Record> {
        self.value.get(index).map(Arc::as_ref)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FieldNode {
    Standard(FieldState),
    Dynamic(DynamicFieldState),
}

impl FieldNode {
    pub fn as_standard(&self) -> Option<&FieldState> {
        match self {
            Self::Standard(state) => Some(state),
            Self::Dynamic(_) => None,
        }
    }

    pub fn as_dynamic(&self) -> Option<&DynamicFieldState> {
        match self {
            Self::Standard(_) => None,
            Self::Dynamic(state) => Some(state),
        }
    }
}

/// Immutable snapshot of every field. Updates return a new tree that shares
/// all untouched branches with the old one.
#[derive(Debug, Clone, Serialize)]
pub struct FormState {
    #[serde(skip)]
    schema: Arc<Schema>,
    #[serde(flatten)]
    fields: IndexMap<String, Arc<FieldNode>>,
}

impl FormState {
    pub fn new(
        schema: Arc<Schema>,
        initial_values: Option<&IndexMap<String, Value>>,
    ) -> Result<Self, FormError> {
        let mut fields = IndexMap::with_capacity(schema.len());
        for (name, descriptor) in schema.iter() {
            check_name(name)?;
            let init_value = initial_values.and_then(|values| values.get(name));
            let node = match descriptor {
                FieldDescriptor::Standard(descriptor) => {
                    FieldNode::Standard(FieldState::init(name, descriptor, init_value)?)
                }
                FieldDescriptor::Dynamic(descriptor) => {
                    for sub_field in descriptor.dynamic_schema_item.keys() {
                        check_name(sub_field)?;
                    }
                    FieldNode::Dynamic(build_items(name, descriptor, init_value)?)
                }
            };
            fields.insert(name.to_string(), Arc::new(node));
        }
        Ok(Self { schema, fields })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldNode)> {
        self.fields
            .iter()
            .map(|(name, node)| (name.as_str(), node.as_ref()))
    }

    pub fn get(&self, name: &str) -> Option<&FieldNode> {
        self.fields.get(name).map(Arc::as_ref)
    }

    /// Shared handle of a branch, for identity checks between snapshots.
    pub fn node(&self, name: &str) -> Option<&Arc<FieldNode>> {
        self.fields.get(name)
    }

    pub fn field(&self, name: &str) -> Result<&FieldState, FormError> {
        match self.require(name)? {
            FieldNode::Standard(state) => Ok(state),
            FieldNode::Dynamic(_) => Err(FormError::NotStandard(name.to_string())),
        }
    }

    pub fn dynamic(&self, name: &str) -> Result<&DynamicFieldState, FormError> {
        match self.require(name)? {
            FieldNode::Dynamic(state) => Ok(state),
            FieldNode::Standard(_) => Err(FormError::NotDynamic(name.to_string())),
        }
    }

    pub fn record(&self, name: &str, index: usize) -> Result<&Record, FormError> {
        let dynamic = self.dynamic(name)?;
        dynamic.item(index).ok_or_else(|| FormError::ItemOutOfRange {
            field: name.to_string(),
            index,
            len: dynamic.len(),
        })
    }

    pub fn sub_field(
        &self,
        name: &str,
        index: usize,
        sub_field: &str,
    ) -> Result<&FieldState, FormError> {
        self.record(name, index)?
            .get(sub_field)
            .ok_or_else(|| FormError::UnknownSubField {
                field: name.to_string(),
                sub_field: sub_field.to_string(),
            })
    }

    pub fn field_at(&self, address: &FieldAddress) -> Result<&FieldState, FormError> {
        match address {
            FieldAddress::Field(name) => self.field(name),
            FieldAddress::Item {
                field,
                index,
                sub_field,
            } => self.sub_field(field, *index, sub_field),
        }
    }

    /// Replaces one standard field; every other branch is shared.
    pub fn set(&self, name: &str, state: FieldState) -> Result<Self, FormError> {
        self.field(name)?;
        Ok(self.with_node(name, FieldNode::Standard(state)))
    }

    /// Replaces one sub-field record of one item; other items and fields are shared.
    pub fn update_dynamic_item(
        &self,
        name: &str,
        index: usize,
        sub_field: &str,
        state: FieldState,
    ) -> Result<Self, FormError> {
        self.sub_field(name, index, sub_field)?;
        let mut dynamic = self.dynamic(name)?.clone();
        let mut record = dynamic.value[index].as_ref().clone();
        record.insert(sub_field.to_string(), state);
        dynamic.value[index] = Arc::new(record);
        Ok(self.with_node(name, FieldNode::Dynamic(dynamic)))
    }

    pub fn set_at(&self, address: &FieldAddress, state: FieldState) -> Result<Self, FormError> {
        match address {
            FieldAddress::Field(name) => self.set(name, state),
            FieldAddress::Item {
                field,
                index,
                sub_field,
            } => self.update_dynamic_item(field, *index, sub_field, state),
        }
    }

    pub fn append_dynamic_item(&self, name: &str, record: Record) -> Result<Self, FormError> {
        let mut dynamic = self.dynamic(name)?.clone();
        dynamic.value.push(Arc::new(record));
        Ok(self.with_node(name, FieldNode::Dynamic(dynamic)))
    }

    pub fn remove_dynamic_item(&self, name: &str, index: usize) -> Result<Self, FormError> {
        self.record(name, index)?;
        let mut dynamic = self.dynamic(name)?.clone();
        dynamic.value.remove(index);
        Ok(self.with_node(name, FieldNode::Dynamic(dynamic)))
    }

    pub fn replace_dynamic_items(
        &self,
        name: &str,
        items: Vec<Record>,
    ) -> Result<Self, FormError> {
        self.dynamic(name)?;
        let dynamic = DynamicFieldState {
            value: items.into_iter().map(Arc::new).collect(),
        };
        Ok(self.with_node(name, FieldNode::Dynamic(dynamic)))
    }

    /// Builds one item record for `name` from optional per-sub-field init data.
    pub fn build_record(
        &self,
        name: &str,
        init_data: Option<&IndexMap<String, Value>>,
    ) -> Result<Record, FormError> {
        let descriptor = self
            .schema
            .get(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?
            .as_dynamic()
            .ok_or_else(|| FormError::NotDynamic(name.to_string()))?;
        build_record(descriptor, init_data)
    }

    /// Top-level fields whose branch is not shared with `other`.
    pub fn changed_fields<'a>(&'a self, other: &FormState) -> Vec<&'a str> {
        self.fields
            .iter()
            .filter(|(name, node)| {
                other
                    .fields
                    .get(name.as_str())
                    .is_none_or(|theirs| !Arc::ptr_eq(node, theirs))
            })
            .map(|(name, _)| name.as_str())
            .collect()
    }

    fn require(&self, name: &str) -> Result<&FieldNode, FormError> {
        if name.is_empty() {
            return Err(FormError::MissingFieldName);
        }
        self.get(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))
    }

    fn with_node(&self, name: &str, node: FieldNode) -> Self {
        let mut fields = self.fields.clone();
        fields.insert(name.to_string(), Arc::new(node));
        Self {
            schema: self.schema.clone(),
            fields,
        }
    }
}

impl FieldLookup for FormState {
    fn field_value(&self, name: &str) -> Option<&Value> {
        self.get(name)
            .and_then(FieldNode::as_standard)
            .map(|state| &state.value)
    }
}

/// Names must stay addressable by selector (`field[index].subField`).
fn check_name(name: &str) -> Result<(), FormError> {
    if name.is_empty() {
        return Err(FormError::MissingFieldName);
    }
    if name.contains(['.', '[', ']']) {
        return Err(FormError::InvalidSelector(format!(
            "field name '{name}' must not contain '.', '[' or ']'"
        )));
    }
    Ok(())
}

pub(crate) fn build_record(
    descriptor: &DynamicDescriptor,
    init_data: Option<&IndexMap<String, Value>>,
) -> Result<Record, FormError> {
    let mut record = Record::with_capacity(descriptor.dynamic_schema_item.len());
    for (sub_field, sub_descriptor) in &descriptor.dynamic_schema_item {
        let init_value = init_data.and_then(|data| data.get(sub_field));
        record.insert(
            sub_field.clone(),
            FieldState::init(sub_field, sub_descriptor, init_value)?,
        );
    }
    Ok(record)
}

/// Item records from a list of init-data objects; `Null` or nothing means no items.
pub(crate) fn build_items(
    name: &str,
    descriptor: &DynamicDescriptor,
    value: Option<&Value>,
) -> Result<DynamicFieldState, FormError> {
    let items = match value {
        None | Some(Value::Null) => return Ok(DynamicFieldState::default()),
        Some(Value::List(items)) => items,
        Some(other) => {
            return Err(FormError::InvalidDynamicValue {
                field: name.to_string(),
                value: other.clone(),
            });
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for item in items {
        let Value::Object(data) = item else {
            return Err(FormError::InvalidDynamicValue {
                field: name.to_string(),
                value: item.clone(),
            });
        };
        records.push(Arc::new(build_record(descriptor, Some(data))?));
    }
    Ok(DynamicFieldState { value: records })
}

#[cfg(test)]
mod tests {
    use super::FormState;
    use crate::core::address::FieldAddress;
    use crate::core::error::FormError;
    use crate::core::value::Value;
    use crate::schema::{DynamicDescriptor, Schema, StandardDescriptor};
    use indexmap::IndexMap;
    use std::sync::Arc;

    fn schema() -> Arc<Schema> {
        Arc::new(
            Schema::new()
                .with_field("email", StandardDescriptor::text())
                .with_field("agree", StandardDescriptor::checkbox())
                .with_field(
                    "students",
                    DynamicDescriptor::new()
                        .with_field("name", StandardDescriptor::text())
                        .with_field("gender", StandardDescriptor::select()),
                ),
        )
    }

    fn student(name: &str, gender: &str) -> IndexMap<String, Value> {
        let mut data = IndexMap::new();
        data.insert("name".to_string(), Value::text(name));
        data.insert("gender".to_string(), Value::text(gender));
        data
    }

    fn serialized(state: &FormState) -> String {
        serde_json::to_string(state).expect("state should serialize")
    }

    #[test]
    fn builds_every_field_from_schema() {
        let state = FormState::new(schema(), None).expect("state");
        assert_eq!(state.names().collect::<Vec<_>>(), vec!["email", "agree", "students"]);
        assert_eq!(state.field("email").expect("email").value, Value::text(""));
        assert_eq!(state.field("agree").expect("agree").value, Value::Bool(false));
        assert!(state.dynamic("students").expect("students").is_empty());
    }

    #[test]
    fn initial_dynamic_values_become_records() {
        let mut initial = IndexMap::new();
        initial.insert(
            "students".to_string(),
            Value::List(vec![Value::Object(student("Ana", "FEMALE"))]),
        );
        let state = FormState::new(schema(), Some(&initial)).expect("state");
        let name = state.sub_field("students", 0, "name").expect("name");
        assert_eq!(name.value, Value::text("Ana"));
    }

    #[test]
    fn rejects_non_list_dynamic_initial_value() {
        let mut initial = IndexMap::new();
        initial.insert("students".to_string(), Value::text("nope"));
        let err = FormState::new(schema(), Some(&initial)).unwrap_err();
        assert!(matches!(err, FormError::InvalidDynamicValue { .. }));
    }

    #[test]
    fn set_replaces_one_branch_and_shares_the_rest() {
        let before = FormState::new(schema(), None).expect("state");
        let snapshot = serialized(&before);
        let email = before.field("email").expect("email").with_value(Value::text("a@b.com"));

        let after = before.set("email", email).expect("set");

        assert_eq!(serialized(&before), snapshot);
        assert_eq!(after.field("email").expect("email").value, Value::text("a@b.com"));
        assert!(Arc::ptr_eq(
            before.node("agree").expect("agree"),
            after.node("agree").expect("agree")
        ));
        assert_eq!(after.changed_fields(&before), vec!["email"]);
    }

    #[test]
    fn set_rejects_dynamic_and_unknown_fields() {
        let state = FormState::new(schema(), None).expect("state");
        let email = state.field("email").expect("email").clone();
        assert_eq!(
            state.set("students", email.clone()).unwrap_err(),
            FormError::NotStandard("students".to_string())
        );
        assert_eq!(
            state.set("missing", email.clone()).unwrap_err(),
            FormError::UnknownField("missing".to_string())
        );
        assert_eq!(state.set("", email).unwrap_err(), FormError::MissingFieldName);
    }

    #[test]
    fn dynamic_item_updates_touch_only_the_addressed_record() {
        let state = FormState::new(schema(), None).expect("state");
        let first = state.build_record("students", Some(&student("A", "MALE"))).expect("record");
        let second = state.build_record("students", Some(&student("B", "FEMALE"))).expect("record");
        let state = state
            .append_dynamic_item("students", first)
            .and_then(|state| state.append_dynamic_item("students", second))
            .expect("append");
        let snapshot = serialized(&state);

        let renamed = state
            .sub_field("students", 1, "name")
            .expect("name")
            .with_value(Value::text("Bea"));
        let next = state
            .set_at(&FieldAddress::item("students", 1, "name"), renamed)
            .expect("update");

        assert_eq!(serialized(&state), snapshot);
        let before_items = &state.dynamic("students").expect("students").value;
        let after_items = &next.dynamic("students").expect("students").value;
        assert!(Arc::ptr_eq(&before_items[0], &after_items[0]));
        assert!(!Arc::ptr_eq(&before_items[1], &after_items[1]));
        assert_eq!(
            next.sub_field("students", 1, "name").expect("name").value,
            Value::text("Bea")
        );
        assert!(Arc::ptr_eq(
            state.node("email").expect("email"),
            next.node("email").expect("email")
        ));
    }

    #[test]
    fn remove_keeps_order_of_remaining_items() {
        let mut state = FormState::new(schema(), None).expect("state");
        for name in ["A", "B", "C"] {
            let record = state.build_record("students", Some(&student(name, "X"))).expect("record");
            state = state.append_dynamic_item("students", record).expect("append");
        }
        let next = state.remove_dynamic_item("students", 1).expect("remove");
        let names: Vec<_> = next
            .dynamic("students")
            .expect("students")
            .value
            .iter()
            .map(|record| record["name"].value.clone())
            .collect();
        assert_eq!(names, vec![Value::text("A"), Value::text("C")]);
        assert_eq!(state.dynamic("students").expect("students").len(), 3);
    }

    #[test]
    fn names_that_break_selectors_are_rejected() {
        let dotted = Schema::new().with_field("user.email", StandardDescriptor::text());
        assert!(matches!(
            FormState::new(Arc::new(dotted), None),
            Err(FormError::InvalidSelector(_))
        ));

        let bracketed = Schema::new().with_field(
            "students",
            DynamicDescriptor::new().with_field("name[0]", StandardDescriptor::text()),
        );
        assert!(matches!(
            FormState::new(Arc::new(bracketed), None),
            Err(FormError::InvalidSelector(_))
        ));
    }

    #[test]
    fn out_of_range_item_is_an_error() {
        let state = FormState::new(schema(), None).expect("state");
        assert_eq!(
            state.remove_dynamic_item("students", 0).unwrap_err(),
            FormError::ItemOutOfRange {
                field: "students".to_string(),
                index: 0,
                len: 0,
            }
        );
        assert!(matches!(
            state.sub_field("email", 0, "name"),
            Err(FormError::NotDynamic(_))
        ));
    }
}
