//! Property-based tests for registry bookkeeping
//!
//! Random sequences of registration, input, blur and removal must keep one
//! entry per name and leave no dirty, touched or error state behind for
//! removed fields.

use futures::executor::block_on;
use proptest::prelude::*;
use reinhardt_form_control::memory::{ManualRemovalObserver, MemoryInput};
use reinhardt_form_control::{FormBuilder, FormController, ValidationMode, ValidationRules};
use reinhardt_form_path as path;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

const NAMES: [&str; 4] = ["a", "b", "user.first", "user.last"];

#[derive(Debug, Clone)]
enum Op {
	Register(usize),
	Input(usize, String),
	Blur(usize),
	Unregister(usize),
	Detach(usize),
}

fn op() -> impl Strategy<Value = Op> {
	let name = 0..NAMES.len();
	prop_oneof![
		name.clone().prop_map(Op::Register),
		(name.clone(), "[a-z]{0,4}").prop_map(|(index, value)| Op::Input(index, value)),
		name.clone().prop_map(Op::Blur),
		name.clone().prop_map(Op::Unregister),
		name.prop_map(Op::Detach),
	]
}

struct Harness {
	form: FormController,
	observer: Rc<ManualRemovalObserver>,
	inputs: HashMap<&'static str, Rc<MemoryInput>>,
	registered: BTreeSet<&'static str>,
}

impl Harness {
	fn new() -> Self {
		let observer = ManualRemovalObserver::new();
		let form = FormBuilder::new()
			.mode(ValidationMode::OnChange)
			.removal_observer(observer.clone())
			.build();
		Self {
			form,
			observer,
			inputs: HashMap::new(),
			registered: BTreeSet::new(),
		}
	}

	async fn apply(&mut self, op: Op) {
		match op {
			Op::Register(index) => {
				let name = NAMES[index];
				let input = MemoryInput::text(name);
				let rules = ValidationRules::new().min_length(2, "Too short");
				self.form.register(input.handle(), rules).await.unwrap();
				self.inputs.insert(name, input);
				self.registered.insert(name);
			}
			Op::Input(index, value) => {
				if let Some(input) = self.inputs.get(NAMES[index]) {
					input.input(value).await;
				}
			}
			Op::Blur(index) => {
				if let Some(input) = self.inputs.get(NAMES[index]) {
					input.blur().await;
				}
			}
			Op::Unregister(index) => {
				self.form.unregister(NAMES[index]).await;
				self.registered.remove(NAMES[index]);
			}
			Op::Detach(index) => {
				if let Some(input) = self.inputs.get(NAMES[index]) {
					self.observer.remove(&input.handle()).await;
				}
				self.registered.remove(NAMES[index]);
			}
		}
	}
}

proptest! {
	/// Test: registry churn
	///
	/// Category: Property
	/// Verifies that names stay unique, match the registered set and that
	/// removed fields leave no dirty, touched or error entries.
	#[test]
	fn prop_removed_fields_leave_no_state(ops in prop::collection::vec(op(), 1..24)) {
		let mut harness = Harness::new();
		for op in ops {
			block_on(harness.apply(op));

			let names = harness.form.field_names();
			let unique: BTreeSet<&str> = names.iter().map(String::as_str).collect();
			prop_assert_eq!(unique.len(), names.len());
			prop_assert_eq!(&unique, &harness.registered);

			let state = harness.form.form_state();
			for name in NAMES.iter().filter(|name| !harness.registered.contains(*name)) {
				prop_assert!(path::get(&state.dirty_fields, name).is_none());
				prop_assert!(path::get(&state.touched, name).is_none());
				prop_assert!(!state.errors.contains(name));
			}
			if !state.errors.is_empty() {
				prop_assert!(!state.is_valid);
			}
		}
	}
}
