//! Role vocabulary: `AgentRole`, `Stage`, `RoleSpec`.

use serde::{Deserialize, Serialize};

/// The five pipeline roles, in backbone order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Client,
    Analyst,
    Architect,
    Programmer,
    Tester,
}

impl AgentRole {
    pub const ALL: [AgentRole; 5] = [
        AgentRole::Client,
        AgentRole::Analyst,
        AgentRole::Architect,
        AgentRole::Programmer,
        AgentRole::Tester,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AgentRole::Client => "client",
            AgentRole::Analyst => "analyst",
            AgentRole::Architect => "architect",
            AgentRole::Programmer => "programmer",
            AgentRole::Tester => "tester",
        }
    }

    /// Where the backbone goes after this role when no tools were requested.
    pub fn backbone_successor(self) -> Stage {
        match self {
            AgentRole::Client => Stage::Role(AgentRole::Analyst),
            AgentRole::Analyst => Stage::Role(AgentRole::Architect),
            AgentRole::Architect => Stage::Role(AgentRole::Programmer),
            AgentRole::Programmer => Stage::Role(AgentRole::Tester),
            AgentRole::Tester => Stage::Done,
        }
    }

    /// `false` for the client, whose handler collects input instead of
    /// calling the model.
    pub fn calls_model(self) -> bool {
        self != AgentRole::Client
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of the pipeline state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Role(AgentRole),
    /// Tool detour; returns to the role that requested the tools.
    Tools,
    Done,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Role(role) => f.write_str(role.as_str()),
            Stage::Tools => f.write_str("tools"),
            Stage::Done => f.write_str("done"),
        }
    }
}

/// Static per-role configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSpec {
    role: AgentRole,
    system_prompt: String,
}

impl RoleSpec {
    pub fn new(role: AgentRole, system_prompt: impl Into<String>) -> Self {
        Self {
            role,
            system_prompt: system_prompt.into(),
        }
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn backbone_successor(&self) -> Stage {
        self.role.backbone_successor()
    }

    /// The five roles with their standard prompts.
    pub fn standard_pipeline() -> Vec<RoleSpec> {
        vec![
            RoleSpec::new(AgentRole::Client, ""),
            RoleSpec::new(AgentRole::Analyst, ANALYST_PROMPT),
            RoleSpec::new(AgentRole::Architect, ARCHITECT_PROMPT),
            RoleSpec::new(AgentRole::Programmer, PROGRAMMER_PROMPT),
            RoleSpec::new(AgentRole::Tester, TESTER_PROMPT),
        ]
    }
}

const ANALYST_PROMPT: &str = "\
Role: Analyst.
Goal: Turn the client's request into concrete technical requirements and constraints.
Inputs: the client message, plus any issue or repository content returned by earlier tool calls.
Rules:
- If you do not know the user's GitHub username, call get_me.
- Only exploratory (read-only) tools are allowed. Never call a tool that changes the repository.
- Do not ask the client to confirm obvious next steps; decide and continue.
Output:
- A short bullet list of requirements.
- Open uncertainties, each with the assumption you recommend.
- Hand off to the architect.";

const ARCHITECT_PROMPT: &str = "\
Role: Architect.
Goal: Turn the requirements into an execution plan with file-level changes.
Rules:
- Never call a tool that changes the repository.
- Repository changes are carried out later by the programmer and the tester.
Output:
- A numbered task list for the programmer: files to edit or create, the feature branch to use, test files to add.
- A numbered task list for the tester: what to verify and which CI workflow to expect.
- Hand off to the programmer.";

const PROGRAMMER_PROMPT: &str = "\
Role: Programmer.
Goal: Apply the architect's code changes using the repository tools.
Rules:
- If the requested feature branch does not exist, create it from 'main'.
- Commit every edit to the feature branch. Never touch 'main'.
- Write files idempotently (create_or_update_file with an explicit 'branch').
- If a path is unknown, list the repository contents first.
- Do not ask the client for confirmation.
- Do not trigger GitHub Actions workflows.
- Do not write tests; that is the tester's job.
Output:
- A short summary of the edits and commits made.
- If more edits are needed, make them with tools before handing off.
- When no more code changes are needed, hand off to the tester.";

const TESTER_PROMPT: &str = "\
Role: Tester.
Goal: Make sure automated tests exist and run in CI, then report pass or fail.
Rules (carry these out with tools):
1) Every affected file has tests under 'tests/'. Create missing ones there and move any test file found at the repository root into 'tests/'.
2) A CI workflow exists at '.github/workflows/python-tests.yml' running 'pytest -q' on push and pull request.
   If list_workflow_runs returns 404 for it, create the workflow with create_or_update_file (include a 'message'), skip listing runs this turn and finish.
3) Commit on the current feature branch, never on 'main'.
4) Do not ask the client for confirmation.
5) Explain your plan before acting.
Output:
- Files created or updated, and on which branch.
- CI run status if available; for a new workflow, how to check its first run.
- On failure, the failing tests (read them with get_workflow_run_logs) and proposed fixes.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backbone_ends_in_done() {
        let mut stage = Stage::Role(AgentRole::Client);
        let mut visited = Vec::new();
        while let Stage::Role(role) = stage {
            visited.push(role);
            stage = role.backbone_successor();
        }
        assert_eq!(visited, AgentRole::ALL.to_vec());
        assert_eq!(stage, Stage::Done);
    }

    #[test]
    fn test_standard_pipeline_covers_every_role_once() {
        let specs = RoleSpec::standard_pipeline();
        let roles: Vec<AgentRole> = specs.iter().map(RoleSpec::role).collect();
        assert_eq!(roles, AgentRole::ALL.to_vec());
        assert!(specs[0].system_prompt().is_empty());
        assert!(specs[1..].iter().all(|s| s.system_prompt().starts_with("Role: ")));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Role(AgentRole::Programmer).to_string(), "programmer");
        assert_eq!(Stage::Tools.to_string(), "tools");
        assert_eq!(Stage::Done.to_string(), "done");
    }

    #[test]
    fn test_only_client_skips_model() {
        assert!(!AgentRole::Client.calls_model());
        assert!(AgentRole::Tester.calls_model());
    }
}
