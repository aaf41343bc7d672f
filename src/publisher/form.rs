use crate::config::PublishTarget;

/// Input row for one publish target.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetInput {
    pub target: PublishTarget,
    pub value: String,
}

/// Editable state of the publisher page's inputs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublisherForm {
    inputs: Vec<TargetInput>,
}

impl PublisherForm {
    pub fn new(targets: &[PublishTarget]) -> Self {
        Self {
            inputs: targets
                .iter()
                .cloned()
                .map(|target| TargetInput {
                    target,
                    value: String::new(),
                })
                .collect(),
        }
    }

    pub fn inputs(&self) -> &[TargetInput] {
        &self.inputs
    }

    pub fn inputs_mut(&mut self) -> &mut [TargetInput] {
        &mut self.inputs
    }

    /// Copies a preset into the target's input field.
    pub fn set_quick_value(&mut self, index: usize, value: &str) {
        if let Some(input) = self.inputs.get_mut(index) {
            input.value = value.to_string();
        }
    }

    /// `(topic, value)` for the target at `index`, as currently typed.
    pub fn request(&self, index: usize) -> Option<(String, String)> {
        self.inputs
            .get(index)
            .map(|input| (input.target.topic.clone(), input.value.clone()))
    }
}
