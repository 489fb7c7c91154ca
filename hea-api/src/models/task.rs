//! Leakage task model and descriptor normalization
//!
//! Clients submit a loose JSON descriptor alongside their media. The
//! descriptor is normalized into a [`LeakageTask`] with an explicit coercion
//! table: unknown `type` values become `NULL`, unknown `state` values fall
//! back to `draft`, missing `decision` falls back to `no_decision`, and
//! missing media lists become empty. A submission never fails because of a
//! stray enum value; it only fails when no task id can be extracted.

use serde::{Deserialize, Serialize};

/// Kind of building element reported as leaking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Window,
    Door,
    Wall,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Window => "window",
            TaskType::Door => "door",
            TaskType::Wall => "wall",
        }
    }

    /// Coerce a raw descriptor value; anything unrecognized maps to `None`
    pub fn coerce(raw: Option<&str>) -> Option<TaskType> {
        match raw {
            Some("window") => Some(TaskType::Window),
            Some("door") => Some(TaskType::Door),
            Some("wall") => Some(TaskType::Wall),
            _ => None,
        }
    }
}

/// Task lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Draft,
    Open,
    Closed,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Draft => "draft",
            TaskState::Open => "open",
            TaskState::Closed => "closed",
        }
    }

    /// Coerce a raw descriptor value; anything unrecognized maps to `draft`
    pub fn coerce(raw: Option<&str>) -> TaskState {
        match raw {
            Some("open") => TaskState::Open,
            Some("closed") => TaskState::Closed,
            Some("draft") => TaskState::Draft,
            _ => TaskState::Draft,
        }
    }
}

/// User decision recorded against a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskDecision {
    NoDecision,
    Archived,
    Todo,
}

impl TaskDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskDecision::NoDecision => "no_decision",
            TaskDecision::Archived => "archived",
            TaskDecision::Todo => "todo",
        }
    }

    /// Coerce a raw descriptor value; anything unrecognized maps to
    /// `no_decision`
    pub fn coerce(raw: Option<&str>) -> TaskDecision {
        match raw {
            Some("archived") => TaskDecision::Archived,
            Some("todo") => TaskDecision::Todo,
            _ => TaskDecision::NoDecision,
        }
    }
}

/// Raw task descriptor as submitted by the client
///
/// Field names follow the mobile client's JSON convention. The task id is
/// accepted under any of three aliases; everything else is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TaskDescriptor {
    #[serde(rename = "taskID", alias = "taskId", alias = "id")]
    pub task_id: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub task_type: Option<String>,
    pub state: Option<String>,
    pub decision: Option<String>,
    #[serde(rename = "closedResult")]
    pub closed_result: Option<String>,
    #[serde(rename = "insideTemp")]
    pub inside_temp: Option<f64>,
    #[serde(rename = "outsideTemp")]
    pub outside_temp: Option<f64>,
    #[serde(rename = "RGBphotoIDs")]
    pub rgb_photo_ids: Option<Vec<String>>,
    #[serde(rename = "thermalPhotoIDs")]
    pub thermal_photo_ids: Option<Vec<String>>,
}

impl TaskDescriptor {
    /// Extract the task id from whichever alias the client used
    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref().filter(|s| !s.is_empty())
    }
}

/// Normalized leakage task as persisted in the task store
///
/// The five analysis result fields and `report_photo_id` are always `None`
/// at submission time; only the analysis worker fills them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeakageTask {
    pub task_id: String,
    pub user_id: String,
    pub title: String,
    pub task_type: Option<TaskType>,
    pub state: TaskState,
    pub decision: TaskDecision,
    pub closed_result: Option<String>,
    pub inside_temp: Option<f64>,
    pub outside_temp: Option<f64>,
    pub rgb_photo_ids: Vec<String>,
    pub thermal_photo_ids: Vec<String>,
    pub leak_severity: Option<String>,
    pub energy_loss_value: Option<f64>,
    pub energy_loss_cost: Option<f64>,
    pub savings_percent: Option<f64>,
    pub savings_cost: Option<f64>,
    pub report_photo_id: Option<String>,
}

impl LeakageTask {
    /// Normalize a descriptor into the persisted task shape
    ///
    /// Media references declared in the descriptor come first; references
    /// minted while storing the uploaded attachments are appended after
    /// them, preserving upload order.
    pub fn from_descriptor(
        task_id: String,
        user_id: String,
        descriptor: &TaskDescriptor,
        rgb_uploads: Vec<String>,
        thermal_uploads: Vec<String>,
    ) -> Self {
        let mut rgb_photo_ids = descriptor.rgb_photo_ids.clone().unwrap_or_default();
        rgb_photo_ids.extend(rgb_uploads);

        let mut thermal_photo_ids = descriptor.thermal_photo_ids.clone().unwrap_or_default();
        thermal_photo_ids.extend(thermal_uploads);

        Self {
            task_id,
            user_id,
            title: descriptor.title.clone().unwrap_or_default(),
            task_type: TaskType::coerce(descriptor.task_type.as_deref()),
            state: TaskState::coerce(descriptor.state.as_deref()),
            decision: TaskDecision::coerce(descriptor.decision.as_deref()),
            closed_result: descriptor.closed_result.clone(),
            inside_temp: descriptor.inside_temp,
            outside_temp: descriptor.outside_temp,
            rgb_photo_ids,
            thermal_photo_ids,
            leak_severity: None,
            energy_loss_value: None,
            energy_loss_cost: None,
            savings_percent: None,
            savings_cost: None,
            report_photo_id: None,
        }
    }
}

/// Output of one analysis run, ready to be committed onto a task row
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub leak_severity: String,
    pub energy_loss_value: f64,
    pub energy_loss_cost: f64,
    pub savings_percent: f64,
    pub savings_cost: f64,
    pub suggestions: Vec<Suggestion>,
}

/// One remediation suggestion attached to a completed analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub suggestion_id: String,
    pub task_id: String,
    pub title: String,
    pub subtitle: String,
    pub difficulty: String,
    pub cost_range: String,
    pub estimated_reduction: String,
    pub lifetime: String,
}
