//! Typed entity wrappers.
//!
//! Each entity is a thin struct over an [`EntityRef`], its fields composed
//! declaratively from the descriptor kinds in [`crate::descriptor`]. All
//! accessors are lazy: the first one touched fetches the backing document.
//! Setters mutate the in-memory tree only; call
//! [`EntityRef::put`](crate::EntityRef::put) on the handle to persist.

use benchtop_xml::Element;

use crate::descriptor::{
    AttrField, BoolField, EntityLink, IntField, StringDictField, StringField, StringListField,
};
use crate::entity::{EntityRef, Resource};
use crate::error::Result;
use crate::udf::UdfMap;
use crate::uri::BaseUri;
use std::collections::HashMap;

macro_rules! resource {
    ($type:ident, $category:literal) => {
        impl Resource for $type {
            const CATEGORY: &'static str = $category;

            fn from_entity(entity: EntityRef) -> Self {
                $type { entity }
            }

            fn entity(&self) -> &EntityRef {
                &self.entity
            }
        }
    };
}

/// A researcher (user account) registered in the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Researcher {
    entity: EntityRef,
}

resource!(Researcher, "researchers");

impl Researcher {
    pub fn first_name(&self) -> Result<Option<String>> {
        self.entity.get(&StringField::new("first-name"))
    }

    pub fn set_first_name(&self, value: &str) -> Result<()> {
        self.entity
            .set(&StringField::new("first-name"), value.to_string())
    }

    pub fn last_name(&self) -> Result<Option<String>> {
        self.entity.get(&StringField::new("last-name"))
    }

    pub fn set_last_name(&self, value: &str) -> Result<()> {
        self.entity
            .set(&StringField::new("last-name"), value.to_string())
    }

    pub fn email(&self) -> Result<Option<String>> {
        self.entity.get(&StringField::new("email"))
    }

    pub fn initials(&self) -> Result<Option<String>> {
        self.entity.get(&StringField::new("initials"))
    }

    pub fn lab(&self) -> Result<Option<Lab>> {
        EntityLink::new("lab").resolve(&self.entity)
    }

    /// Whether the account is locked out of the UI.
    pub fn account_locked(&self) -> Result<Option<bool>> {
        self.entity
            .get(&BoolField::nested("credentials", "account-locked"))
    }

    pub fn udfs(&self) -> UdfMap {
        UdfMap::new(self.entity.clone())
    }
}

/// A lab (account grouping for researchers).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lab {
    entity: EntityRef,
}

resource!(Lab, "labs");

impl Lab {
    pub fn name(&self) -> Result<Option<String>> {
        self.entity.get(&StringField::new("name"))
    }

    pub fn set_name(&self, value: &str) -> Result<()> {
        self.entity.set(&StringField::new("name"), value.to_string())
    }

    pub fn website(&self) -> Result<Option<String>> {
        self.entity.get(&StringField::new("website"))
    }

    /// The flat key/value shipping address block.
    pub fn shipping_address(&self) -> Result<HashMap<String, Option<String>>> {
        self.entity.get(&StringDictField::new("shipping-address"))
    }

    /// The flat key/value billing address block.
    pub fn billing_address(&self) -> Result<HashMap<String, Option<String>>> {
        self.entity.get(&StringDictField::new("billing-address"))
    }

    pub fn udfs(&self) -> UdfMap {
        UdfMap::new(self.entity.clone())
    }
}

/// A project grouping samples for one researcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    entity: EntityRef,
}

resource!(Project, "projects");

impl Project {
    pub fn name(&self) -> Result<Option<String>> {
        self.entity.get(&StringField::new("name"))
    }

    pub fn set_name(&self, value: &str) -> Result<()> {
        self.entity.set(&StringField::new("name"), value.to_string())
    }

    pub fn open_date(&self) -> Result<Option<String>> {
        self.entity.get(&StringField::new("open-date"))
    }

    pub fn close_date(&self) -> Result<Option<String>> {
        self.entity.get(&StringField::new("close-date"))
    }

    pub fn invoice_date(&self) -> Result<Option<String>> {
        self.entity.get(&StringField::new("invoice-date"))
    }

    pub fn researcher(&self) -> Result<Option<Researcher>> {
        EntityLink::new("researcher").resolve(&self.entity)
    }

    pub fn udfs(&self) -> UdfMap {
        UdfMap::new(self.entity.clone())
    }
}

/// A physical sample submitted to the lab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    entity: EntityRef,
}

resource!(Sample, "samples");

impl Sample {
    pub fn name(&self) -> Result<Option<String>> {
        self.entity.get(&StringField::new("name"))
    }

    pub fn set_name(&self, value: &str) -> Result<()> {
        self.entity.set(&StringField::new("name"), value.to_string())
    }

    pub fn date_received(&self) -> Result<Option<String>> {
        self.entity.get(&StringField::new("date-received"))
    }

    pub fn date_completed(&self) -> Result<Option<String>> {
        self.entity.get(&StringField::new("date-completed"))
    }

    pub fn project(&self) -> Result<Option<Project>> {
        EntityLink::new("project").resolve(&self.entity)
    }

    /// The sample's original analyte artifact.
    pub fn artifact(&self) -> Result<Option<Artifact>> {
        EntityLink::new("artifact").resolve(&self.entity)
    }

    pub fn udfs(&self) -> UdfMap {
        UdfMap::new(self.entity.clone())
    }
}

/// An artifact: any input or output of a process step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    entity: EntityRef,
}

resource!(Artifact, "artifacts");

impl Artifact {
    pub fn name(&self) -> Result<Option<String>> {
        self.entity.get(&StringField::new("name"))
    }

    pub fn output_type(&self) -> Result<Option<String>> {
        self.entity.get(&StringField::new("output-type"))
    }

    pub fn qc_flag(&self) -> Result<Option<String>> {
        self.entity.get(&StringField::new("qc-flag"))
    }

    pub fn set_qc_flag(&self, value: &str) -> Result<()> {
        self.entity
            .set(&StringField::new("qc-flag"), value.to_string())
    }

    pub fn working_flag(&self) -> Result<Option<bool>> {
        self.entity.get(&BoolField::new("working-flag"))
    }

    /// Reagent labels applied to this artifact, in document order.
    pub fn reagent_labels(&self) -> Result<Vec<String>> {
        self.entity.get(&StringListField::new("reagent-label"))
    }

    pub fn parent_process(&self) -> Result<Option<Process>> {
        EntityLink::new("parent-process").resolve(&self.entity)
    }

    pub fn sample(&self) -> Result<Option<Sample>> {
        EntityLink::new("sample").resolve(&self.entity)
    }

    /// The container this artifact sits in, if placed.
    pub fn container(&self) -> Result<Option<Container>> {
        EntityLink::nested("location", "container").resolve(&self.entity)
    }

    /// The well position within the container, e.g. `A:1`.
    pub fn well(&self) -> Result<Option<String>> {
        self.entity.get(&StringField::nested("location", "value"))
    }

    pub fn udfs(&self) -> UdfMap {
        UdfMap::new(self.entity.clone())
    }
}

/// A container holding artifacts in wells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    entity: EntityRef,
}

resource!(Container, "containers");

impl Container {
    pub fn name(&self) -> Result<Option<String>> {
        self.entity.get(&StringField::new("name"))
    }

    pub fn set_name(&self, value: &str) -> Result<()> {
        self.entity.set(&StringField::new("name"), value.to_string())
    }

    pub fn container_type(&self) -> Result<Option<ContainerType>> {
        EntityLink::new("type").resolve(&self.entity)
    }

    pub fn occupied_wells(&self) -> Result<Option<i64>> {
        self.entity.get(&IntField::new("occupied-wells"))
    }

    pub fn state(&self) -> Result<Option<String>> {
        self.entity.get(&StringField::new("state"))
    }

    pub fn udfs(&self) -> UdfMap {
        UdfMap::new(self.entity.clone())
    }
}

/// A container type (96-well plate, tube, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerType {
    entity: EntityRef,
}

resource!(ContainerType, "containertypes");

impl ContainerType {
    /// Container type names are carried as a root attribute, not a child
    /// element.
    pub fn name(&self) -> Result<Option<String>> {
        self.entity.get(&AttrField::new("name"))
    }

    pub fn is_tube(&self) -> Result<Option<bool>> {
        self.entity.get(&BoolField::new("is-tube"))
    }

    pub fn x_dimension_size(&self) -> Result<Option<i64>> {
        self.entity.get(&IntField::nested("x-dimension", "size"))
    }

    pub fn y_dimension_size(&self) -> Result<Option<i64>> {
        self.entity.get(&IntField::nested("y-dimension", "size"))
    }
}

/// A completed or running process (one execution of a protocol step).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Process {
    entity: EntityRef,
}

resource!(Process, "processes");

impl Process {
    pub fn process_type(&self) -> Result<Option<String>> {
        self.entity.get(&StringField::new("type"))
    }

    pub fn date_run(&self) -> Result<Option<String>> {
        self.entity.get(&StringField::new("date-run"))
    }

    pub fn technician(&self) -> Result<Option<Researcher>> {
        EntityLink::new("technician").resolve(&self.entity)
    }

    pub fn instrument(&self) -> Result<Option<Instrument>> {
        EntityLink::new("instrument").resolve(&self.entity)
    }

    pub fn udfs(&self) -> UdfMap {
        UdfMap::new(self.entity.clone())
    }

    /// The process's user-defined type block, coexisting with its UDFs.
    pub fn udt(&self) -> UdfMap {
        UdfMap::udt(self.entity.clone())
    }
}

/// An instrument a process ran on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrument {
    entity: EntityRef,
}

resource!(Instrument, "instruments");

impl Instrument {
    pub fn name(&self) -> Result<Option<String>> {
        self.entity.get(&StringField::new("name"))
    }

    pub fn instrument_type(&self) -> Result<Option<String>> {
        self.entity.get(&StringField::new("type"))
    }

    pub fn serial_number(&self) -> Result<Option<String>> {
        self.entity.get(&StringField::new("serial-number"))
    }
}

/// A protocol step execution, the workflow-facing view of a process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    entity: EntityRef,
}

resource!(Step, "steps");

impl Step {
    /// Step state (`Queued`, `In Progress`, ...) carried as a root
    /// attribute.
    pub fn current_state(&self) -> Result<Option<String>> {
        self.entity.get(&AttrField::new("current-state"))
    }

    pub fn configuration_uri(&self) -> Result<Option<String>> {
        self.entity.with_root(|root| {
            root.child(None, "configuration")
                .and_then(|e| e.attr("uri").map(str::to_string))
        })
    }

    /// The step's actions subresource.
    pub fn actions(&self) -> StepActions {
        let uri = format!("{}/actions", self.entity.uri());
        self.entity.client().from_uri(&uri)
    }
}

/// What happens to each artifact when a step completes.
#[derive(Debug, Clone, PartialEq)]
pub struct NextAction {
    /// The artifact the action applies to.
    pub artifact: Option<Artifact>,
    /// Action verb, e.g. `complete`, `requeue`, `rework`.
    pub action: Option<String>,
    /// The step the artifact moves to.
    pub step: Option<Step>,
    /// For rework actions, the step to redo.
    pub rework_step: Option<Step>,
}

/// Review state of an escalation, derived from the structure of the
/// response: a `<review>` block means reviewed, its absence means pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationStatus {
    Pending,
    Reviewed,
}

impl std::fmt::Display for EscalationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            EscalationStatus::Pending => "Pending",
            EscalationStatus::Reviewed => "Reviewed",
        })
    }
}

/// A review request/response cycle raised on a step.
#[derive(Debug, Clone, PartialEq)]
pub struct Escalation {
    pub status: EscalationStatus,
    /// Who requested the review.
    pub author: Option<Researcher>,
    /// Who the review was assigned to.
    pub reviewer: Option<Researcher>,
    /// The artifacts escalated for review.
    pub artifacts: Vec<Artifact>,
    /// Free-text comment on the request.
    pub request: Option<String>,
    /// Free-text answer from the review, once reviewed.
    pub answer: Option<String>,
}

/// The actions document of a step: next actions per artifact plus an
/// optional escalation record. Reached via [`Step::actions`], a step id,
/// or the actions URI itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepActions {
    entity: EntityRef,
}

impl Resource for StepActions {
    const CATEGORY: &'static str = "steps";

    fn from_entity(entity: EntityRef) -> Self {
        StepActions { entity }
    }

    fn entity(&self) -> &EntityRef {
        &self.entity
    }

    // Actions live under the owning step, not in a category of their own.
    fn uri_for(base: &BaseUri, id: &str) -> String {
        base.uri("steps", &[id, "actions"])
    }
}

// Reference resolution happens after the read closure returns and the
// document lock is released; a fragment may point back at this document.

impl StepActions {
    /// The owning step. The embedded `<step>` fragment seeds the cached
    /// entity, so fields present in the fragment read without a fetch.
    pub fn step(&self) -> Result<Option<Step>> {
        let fragment = self
            .entity
            .with_root(|root| root.child(None, "step").cloned())?;
        Ok(fragment.and_then(|frag| self.entity.client().resolve_embedded(&frag)))
    }

    /// Ordered next-action records. Each URI-bearing attribute resolves to
    /// a cached entity; absent attributes stay `None`.
    pub fn next_actions(&self) -> Result<Vec<NextAction>> {
        let rows = self.entity.with_root(|root| {
            let mut rows = Vec::new();
            if let Some(block) = root.child(None, "next-actions") {
                for action in block.children_named(None, "next-action") {
                    rows.push((
                        action.attr("artifact-uri").map(str::to_string),
                        action.attr("action").map(str::to_string),
                        action.attr("step-uri").map(str::to_string),
                        action.attr("rework-step-uri").map(str::to_string),
                    ));
                }
            }
            rows
        })?;
        let client = self.entity.client();
        Ok(rows
            .into_iter()
            .map(|(artifact, action, step, rework)| NextAction {
                artifact: artifact.map(|u| client.from_uri(&u)),
                action,
                step: step.map(|u| client.from_uri(&u)),
                rework_step: rework.map(|u| client.from_uri(&u)),
            })
            .collect())
    }

    /// The escalation record, or `None` when the step has no escalation
    /// block.
    pub fn escalation(&self) -> Result<Option<Escalation>> {
        let Some(esc) = self
            .entity
            .with_root(|root| root.child(None, "escalation").cloned())?
        else {
            return Ok(None);
        };
        let client = self.entity.client();
        let request = esc.child(None, "request");
        let review = esc.child(None, "review");
        let status = if review.is_some() {
            EscalationStatus::Reviewed
        } else {
            EscalationStatus::Pending
        };
        let artifacts = esc
            .child(None, "escalated-artifacts")
            .map(|block| {
                block
                    .children_named(None, "escalated-artifact")
                    .filter_map(|e| client.resolve_embedded(e))
                    .collect()
            })
            .unwrap_or_default();
        Ok(Some(Escalation {
            status,
            author: request
                .and_then(|r| r.child(None, "author"))
                .and_then(|frag| client.resolve_embedded(frag)),
            reviewer: request
                .and_then(|r| r.child(None, "reviewer"))
                .and_then(|frag| client.resolve_embedded(frag)),
            artifacts,
            request: request
                .and_then(|r| r.child(None, "comment"))
                .and_then(Element::text),
            answer: review
                .and_then(|r| r.child(None, "comment"))
                .and_then(Element::text),
        }))
    }

    /// Persists edited next actions back to the server.
    pub fn put(&self) -> Result<()> {
        self.entity.put()
    }
}
