//! The role state machine's transition table.

use crate::domain::Message;
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::roles::{AgentRole, RoleSpec, Stage};

/// Holds one [`RoleSpec`] per [`AgentRole`] and decides where a run goes next.
#[derive(Debug, Clone)]
pub struct RoleGraph {
    /// Indexed by `AgentRole::index`.
    specs: Vec<RoleSpec>,
}

impl RoleGraph {
    /// Build a graph from `specs`, which must name every role exactly once.
    pub fn new(specs: Vec<RoleSpec>) -> PipelineResult<Self> {
        let mut slots: Vec<Option<RoleSpec>> = vec![None; AgentRole::ALL.len()];
        for spec in specs {
            let slot = &mut slots[spec.role().index()];
            if slot.is_some() {
                return Err(PipelineError::DuplicateRole { role: spec.role() });
            }
            *slot = Some(spec);
        }

        let mut ordered = Vec::with_capacity(slots.len());
        for (role, slot) in AgentRole::ALL.into_iter().zip(slots) {
            ordered.push(slot.ok_or(PipelineError::MissingRole { role })?);
        }
        Ok(Self { specs: ordered })
    }

    /// Graph over [`RoleSpec::standard_pipeline`].
    pub fn standard() -> Self {
        Self {
            specs: RoleSpec::standard_pipeline(),
        }
    }

    pub fn spec(&self, role: AgentRole) -> &RoleSpec {
        &self.specs[role.index()]
    }

    pub fn specs(&self) -> &[RoleSpec] {
        &self.specs
    }

    /// Next stage after `role` produced `response`.
    ///
    /// Tool-call requests detour through [`Stage::Tools`]; anything else
    /// follows the backbone.
    pub fn transition(&self, role: AgentRole, response: &Message) -> Stage {
        if response.has_tool_calls() {
            Stage::Tools
        } else {
            self.spec(role).backbone_successor()
        }
    }
}

impl Default for RoleGraph {
    fn default() -> Self {
        Self::standard()
    }
}
