//! The vehicle checklist template and its step/task types.
//!
//! Every vehicle moves through the same four steps. The template fixes the
//! step titles, their order and the task labels inside each step; a vehicle
//! only ever changes which tasks are checked and the initials/date written
//! against each step.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One checklist item within a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Task description, fixed by the template.
    pub label: String,
    /// Whether the task has been completed.
    pub checked: bool,
}

/// One stage of the vehicle workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Step title, fixed by the template.
    pub title: String,
    /// Ordered tasks for this step.
    pub tasks: Vec<Task>,
    /// Initials of whoever signed off the step.
    #[serde(default)]
    pub initials: String,
    /// Free-text sign-off date.
    #[serde(default)]
    pub date: String,
}

impl Step {
    fn unchecked(title: &str, labels: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            tasks: labels
                .iter()
                .map(|label| Task {
                    label: (*label).to_string(),
                    checked: false,
                })
                .collect(),
            initials: String::new(),
            date: String::new(),
        }
    }

    /// Number of checked tasks in this step.
    #[must_use]
    pub fn checked_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.checked).count()
    }

    /// Check if every task in this step is checked.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.tasks.iter().all(|t| t.checked)
    }
}

const INPUT_VEHICLE: (&str, &[&str]) = (
    "Step 1: Input Vehicle into Steubenville Pike Auto",
    &[
        "Give vehicle stock number.",
        "Make gray dealer jacket folder.",
        "Mark if we have valid PA title on folder, or get switched to PA.",
        "Make vehicle key tag (gray) mark on folder # of keys we have.",
        "Enter vehicle info and pricing into Lot Wizard.",
        "Upload to website.",
    ],
);

const MECHANICAL_INSPECTION: (&str, &[&str]) = (
    "Step 2: Vehicle Mechanical Inspection",
    &[
        "Look vehicle over for any major mechanical, structural, body issues.",
        "If found STOP contact Jason.",
        "If none found perform a PA State Inspection and Emission if necessary.",
        "Do functional check of all vehicle accessories not covered under PA Inspection.",
    ],
);

const BODY_SHOP: (&str, &[&str]) = (
    "Step 3: Body Shop/Detail",
    &[
        "Perform any minor body repair, any parts need over $250 contact Jason.",
        "Detail Interior (put floor mats down).",
        "Detail Exterior.",
        "Place Steubenville Pike Auto license plate on front (if possible).",
        "Place Steubenville Pike Auto sticker on front windshield lower right.",
        "Place Steubenville Pike Auto sticker on rear bumper.",
        "Put Steubenville Pike Auto frame on rear plate.",
        "Deliver to Car Lot.",
    ],
);

const CAR_LOT: (&str, &[&str]) = (
    "Step 4: Car Lot",
    &[
        "Take pictures of vehicle behind car lot for block wall background.",
        "Put pictures into Lot Wizard and upload to website.",
        "Put FTC notice and vehicle info page on rear driver side window.",
        "Park vehicle and place windshield banner in place.",
    ],
);

const TEMPLATE: [(&str, &[&str]); 4] = [INPUT_VEHICLE, MECHANICAL_INSPECTION, BODY_SHOP, CAR_LOT];

/// Number of steps in the template.
pub const STEP_COUNT: usize = TEMPLATE.len();

/// The canonical checklist: every task unchecked, no initials, no date.
#[must_use]
pub fn template() -> Vec<Step> {
    TEMPLATE
        .iter()
        .map(|(title, labels)| Step::unchecked(title, labels))
        .collect()
}

/// Check that stored steps have exactly the template's shape.
///
/// Step count, per-step task count and every task label must match. Titles
/// are compared too so that a reordered checklist is caught.
///
/// # Errors
///
/// Returns [`Error::StructuralMismatch`] describing the first divergence.
pub fn validate(steps: &[Step]) -> Result<()> {
    if steps.len() != STEP_COUNT {
        return Err(Error::mismatch(format!(
            "expected {STEP_COUNT} steps, found {}",
            steps.len()
        )));
    }

    for (index, (step, (title, labels))) in steps.iter().zip(TEMPLATE.iter()).enumerate() {
        if step.title != *title {
            return Err(Error::mismatch(format!(
                "step {index} is titled {:?}, expected {title:?}",
                step.title
            )));
        }
        if step.tasks.len() != labels.len() {
            return Err(Error::mismatch(format!(
                "step {index} has {} tasks, expected {}",
                step.tasks.len(),
                labels.len()
            )));
        }
        for (task_index, (task, label)) in step.tasks.iter().zip(labels.iter()).enumerate() {
            if task.label != *label {
                return Err(Error::mismatch(format!(
                    "step {index} task {task_index} is labelled {:?}, expected {label:?}",
                    task.label
                )));
            }
        }
    }

    Ok(())
}
