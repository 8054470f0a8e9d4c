//! Typed parameters for the GitHub tools reached through the MCP gateway.
//!
//! Each tool is a struct whose fields are the tool's arguments under their
//! wire names. The struct carries the tool name, description and capability,
//! and its JSON schema is derived from the field types: `Option<_>` fields are
//! optional, everything else is required.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use waterfall_core::{ToolCapability, ToolCatalog, ToolSpec};

use crate::error::{GatewayError, Result};

/// Maps an argument type to its JSON schema.
pub trait SchemaType {
    const REQUIRED: bool = true;
    fn schema() -> Value;
}

impl SchemaType for String {
    fn schema() -> Value {
        json!({"type": "string"})
    }
}

impl SchemaType for u64 {
    fn schema() -> Value {
        json!({"type": "integer", "minimum": 0})
    }
}

impl SchemaType for bool {
    fn schema() -> Value {
        json!({"type": "boolean"})
    }
}

impl SchemaType for Vec<String> {
    fn schema() -> Value {
        json!({"type": "array", "items": {"type": "string"}})
    }
}

impl SchemaType for Vec<FileEntry> {
    fn schema() -> Value {
        json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "path": {"type": "string"},
                    "content": {"type": "string"},
                },
                "required": ["path", "content"],
            },
        })
    }
}

impl SchemaType for Map<String, Value> {
    fn schema() -> Value {
        json!({"type": "object"})
    }
}

impl<T: SchemaType> SchemaType for Option<T> {
    const REQUIRED: bool = false;
    fn schema() -> Value {
        T::schema()
    }
}

/// One file of a multi-file push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileEntry {
    pub path: String,
    pub content: String,
}

/// Verdict of a submitted pull request review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewEvent {
    Approve,
    RequestChanges,
    Comment,
}

impl SchemaType for ReviewEvent {
    fn schema() -> Value {
        json!({"type": "string", "enum": ["APPROVE", "REQUEST_CHANGES", "COMMENT"]})
    }
}

/// A GitHub tool with typed arguments.
pub trait GithubTool: DeserializeOwned {
    const NAME: &'static str;
    const DESCRIPTION: &'static str;
    const CAPABILITY: ToolCapability;

    /// JSON schema of the arguments object.
    fn parameters() -> Value;

    fn spec() -> ToolSpec {
        ToolSpec {
            name: Self::NAME.to_string(),
            description: Self::DESCRIPTION.to_string(),
            capability: Self::CAPABILITY,
            parameters: Self::parameters(),
        }
    }

    fn parse(arguments: &Value) -> Result<Self> {
        serde_json::from_value(arguments.clone()).map_err(|e| GatewayError::InvalidArguments {
            tool: Self::NAME.to_string(),
            reason: e.to_string(),
        })
    }
}

macro_rules! github_tools {
    ($(
        $(#[$meta:meta])*
        $ty:ident = $tool:literal, $cap:ident, $desc:literal {
            $( $wire:literal $field:ident : $fty:ty => $fdesc:literal ),* $(,)?
        }
    )*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, PartialEq, Deserialize)]
            #[serde(deny_unknown_fields)]
            pub struct $ty {
                $(
                    #[serde(rename = $wire)]
                    pub $field: $fty,
                )*
            }

            impl GithubTool for $ty {
                const NAME: &'static str = $tool;
                const DESCRIPTION: &'static str = $desc;
                const CAPABILITY: ToolCapability = ToolCapability::$cap;

                fn parameters() -> Value {
                    #[allow(unused_mut)]
                    let mut properties = Map::new();
                    #[allow(unused_mut)]
                    let mut required: Vec<&str> = Vec::new();
                    $(
                        let mut schema = <$fty as SchemaType>::schema();
                        schema["description"] = json!($fdesc);
                        properties.insert($wire.to_string(), schema);
                        if <$fty as SchemaType>::REQUIRED {
                            required.push($wire);
                        }
                    )*
                    json!({
                        "type": "object",
                        "properties": properties,
                        "required": required,
                        "additionalProperties": false,
                    })
                }
            }
        )*

        /// Names of every GitHub tool, in declaration order.
        pub const TOOL_NAMES: &[&str] = &[$($tool),*];

        /// Catalog of every GitHub tool.
        pub fn github_catalog() -> ToolCatalog {
            let mut catalog = ToolCatalog::new();
            $(
                let registered = catalog.register(<$ty as GithubTool>::spec());
                debug_assert!(registered.is_ok(), "duplicate GitHub tool {}", $tool);
            )*
            catalog
        }

        /// Check `arguments` against the typed parameters of `tool`.
        pub fn validate_arguments(tool: &str, arguments: &Value) -> Result<()> {
            match tool {
                $( $tool => <$ty as GithubTool>::parse(arguments).map(|_| ()), )*
                other => Err(GatewayError::UnknownTool(other.to_string())),
            }
        }
    };
}

github_tools! {
    // Issues

    GetIssue = "get_issue", Read, "Get details of a specific issue in a GitHub repository." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "issue_number" issue_number: u64 => "Issue number",
    }

    ListIssues = "list_issues", Read, "List issues in a GitHub repository." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "state" state: Option<String> => "Filter by state: open, closed or all",
        "labels" labels: Option<Vec<String>> => "Only issues carrying all of these labels",
        "page" page: Option<u64> => "Page number",
        "perPage" per_page: Option<u64> => "Results per page",
    }

    CreateIssue = "create_issue", Write, "Create a new issue in a GitHub repository." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "title" title: String => "Issue title",
        "body" body: Option<String> => "Issue body",
        "labels" labels: Option<Vec<String>> => "Labels to apply",
        "assignees" assignees: Option<Vec<String>> => "Usernames to assign",
    }

    UpdateIssue = "update_issue", Write, "Update the title, body, state or labels of an existing issue." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "issue_number" issue_number: u64 => "Issue number",
        "title" title: Option<String> => "New title",
        "body" body: Option<String> => "New body",
        "state" state: Option<String> => "New state: open or closed",
        "labels" labels: Option<Vec<String>> => "Replacement label set",
    }

    AddIssueComment = "add_issue_comment", Write, "Add a comment to an issue." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "issue_number" issue_number: u64 => "Issue number",
        "body" body: String => "Comment text",
    }

    SearchIssues = "search_issues", Read, "Search issues and pull requests with GitHub search syntax." {
        "query" query: String => "Search query",
        "sort" sort: Option<String> => "Sort field",
        "order" order: Option<String> => "asc or desc",
        "page" page: Option<u64> => "Page number",
        "perPage" per_page: Option<u64> => "Results per page",
    }

    GetIssueComments = "get_issue_comments", Read, "Get the comments on an issue." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "issue_number" issue_number: u64 => "Issue number",
    }

    // Pull requests

    CreatePullRequest = "create_pull_request", Write, "Open a pull request from a feature branch." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "title" title: String => "Pull request title",
        "head" head: String => "Branch containing the changes",
        "base" base: String => "Branch to merge into",
        "body" body: Option<String> => "Pull request description",
        "draft" draft: Option<bool> => "Open as a draft",
    }

    ListPullRequests = "list_pull_requests", Read, "List pull requests in a repository." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "state" state: Option<String> => "Filter by state: open, closed or all",
        "head" head: Option<String> => "Filter by head branch",
        "base" base: Option<String> => "Filter by base branch",
        "page" page: Option<u64> => "Page number",
        "perPage" per_page: Option<u64> => "Results per page",
    }

    GetPullRequestDiff = "get_pull_request_diff", Read, "Get the unified diff of a pull request." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "pullNumber" pull_number: u64 => "Pull request number",
    }

    GetPullRequestFiles = "get_pull_request_files", Read, "List the files changed by a pull request." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "pullNumber" pull_number: u64 => "Pull request number",
    }

    UpdatePullRequest = "update_pull_request", Write, "Update the title, body, state or base of a pull request." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "pullNumber" pull_number: u64 => "Pull request number",
        "title" title: Option<String> => "New title",
        "body" body: Option<String> => "New description",
        "state" state: Option<String> => "New state: open or closed",
        "base" base: Option<String> => "New base branch",
    }

    MergePullRequest = "merge_pull_request", Write, "Merge a pull request." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "pullNumber" pull_number: u64 => "Pull request number",
        "commit_title" commit_title: Option<String> => "Title of the merge commit",
        "merge_method" merge_method: Option<String> => "merge, squash or rebase",
    }

    SearchPullRequests = "search_pull_requests", Read, "Search pull requests with GitHub search syntax." {
        "query" query: String => "Search query",
        "owner" owner: Option<String> => "Restrict to this owner",
        "repo" repo: Option<String> => "Restrict to this repository",
        "sort" sort: Option<String> => "Sort field",
        "order" order: Option<String> => "asc or desc",
        "page" page: Option<u64> => "Page number",
        "perPage" per_page: Option<u64> => "Results per page",
    }

    GetPullRequest = "get_pull_request", Read, "Get details of a pull request." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "pullNumber" pull_number: u64 => "Pull request number",
    }

    GetPullRequestStatus = "get_pull_request_status", Read, "Get the combined status checks of a pull request's head commit." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "pullNumber" pull_number: u64 => "Pull request number",
    }

    // Pull request reviews

    GetPullRequestReviews = "get_pull_request_reviews", Read, "List the reviews of a pull request." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "pullNumber" pull_number: u64 => "Pull request number",
    }

    CreatePendingPullRequestReview = "create_pending_pull_request_review", Write, "Start a pending review on a pull request; comments are added to it before submitting." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "pullNumber" pull_number: u64 => "Pull request number",
        "commitID" commit_id: Option<String> => "SHA of the commit to review, head if omitted",
    }

    AddPullRequestReviewCommentToPendingReview = "add_pull_request_review_comment_to_pending_review", Write, "Add a comment to the caller's pending review." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "pullNumber" pull_number: u64 => "Pull request number",
        "path" path: String => "File the comment applies to",
        "body" body: String => "Comment text",
        "subjectType" subject_type: String => "LINE or FILE",
        "side" side: Option<String> => "LEFT or RIGHT side of the diff",
        "line" line: Option<u64> => "Line the comment applies to (last line of a range)",
        "startSide" start_side: Option<String> => "Side of the first line of a multi-line range",
        "startLine" start_line: Option<u64> => "First line of a multi-line range",
    }

    SubmitPendingPullRequestReview = "submit_pending_pull_request_review", Write, "Submit the caller's pending review." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "pullNumber" pull_number: u64 => "Pull request number",
        "event" event: ReviewEvent => "APPROVE, REQUEST_CHANGES or COMMENT",
        "body" body: Option<String> => "Review summary",
    }

    DeletePendingPullRequestReview = "delete_pending_pull_request_review", Write, "Discard the caller's pending review." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "pullNumber" pull_number: u64 => "Pull request number",
    }

    CreateAndSubmitPullRequestReview = "create_and_submit_pull_request_review", Write, "Create and submit a review without line comments." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "pullNumber" pull_number: u64 => "Pull request number",
        "event" event: ReviewEvent => "APPROVE, REQUEST_CHANGES or COMMENT",
        "body" body: String => "Review text",
        "commitID" commit_id: Option<String> => "SHA of the commit to review, head if omitted",
    }

    // Repository content

    GetFileContents = "get_file_contents", Read, "Get the contents of a file or directory." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "path" path: String => "Path in the repository",
        "ref" git_ref: Option<String> => "Git ref, e.g. refs/heads/feature",
    }

    CreateOrUpdateFile = "create_or_update_file", Write, "Create or update a single file on a branch." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "path" path: String => "Path in the repository",
        "content" content: String => "New file content",
        "message" message: String => "Commit message",
        "branch" branch: String => "Branch to commit to",
        "sha" sha: Option<String> => "Blob SHA of the file being replaced",
    }

    DeleteFile = "delete_file", Write, "Delete a file from a branch." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "path" path: String => "Path in the repository",
        "message" message: String => "Commit message",
        "branch" branch: String => "Branch to commit to",
    }

    PushFiles = "push_files", Write, "Push several files to a branch in one commit." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "branch" branch: String => "Branch to commit to",
        "message" message: String => "Commit message",
        "files" files: Vec<FileEntry> => "Files to write",
    }

    ListBranches = "list_branches", Read, "List branches in a repository." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
    }

    CreateBranch = "create_branch", Write, "Create a branch from an existing branch." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "branch" branch: String => "Name of the new branch",
        "from_branch" from_branch: Option<String> => "Source branch, default branch if omitted",
    }

    ListCommits = "list_commits", Read, "List commits on a branch." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "sha" sha: Option<String> => "Branch name or commit SHA to start from",
        "page" page: Option<u64> => "Page number",
        "perPage" per_page: Option<u64> => "Results per page",
    }

    GetCommit = "get_commit", Read, "Get details of one commit." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "sha" sha: String => "Commit SHA, branch or tag",
    }

    SearchRepositories = "search_repositories", Read, "Search repositories with GitHub search syntax." {
        "query" query: String => "Search query",
        "page" page: Option<u64> => "Page number",
        "perPage" per_page: Option<u64> => "Results per page",
    }

    CreateRepository = "create_repository", Write, "Create a repository for the authenticated user." {
        "name" name: String => "Repository name",
        "description" description: Option<String> => "Repository description",
        "private" private: Option<bool> => "Create as private",
        "autoInit" auto_init: Option<bool> => "Initialise with a README",
    }

    // Workflows

    ListWorkflowRuns = "list_workflow_runs", Read, "List runs of a GitHub Actions workflow." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "workflow_id" workflow_id: String => "Workflow file name (e.g. ci.yml) or ID",
        "branch" branch: Option<String> => "Only runs on this branch",
        "status" status: Option<String> => "Only runs with this status",
        "page" page: Option<u64> => "Page number",
        "perPage" per_page: Option<u64> => "Results per page",
    }

    RunWorkflow = "run_workflow", Write, "Trigger a GitHub Actions workflow run." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "workflow_id" workflow_id: String => "Workflow file name (e.g. ci.yml) or ID",
        "ref" git_ref: String => "Branch or tag to run on",
        "inputs" inputs: Option<Map<String, Value>> => "Workflow inputs",
    }

    RerunWorkflowRun = "rerun_workflow_run", Write, "Re-run a workflow run." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "run_id" run_id: u64 => "Workflow run ID",
    }

    CancelWorkflowRun = "cancel_workflow_run", Write, "Cancel a workflow run in progress." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "run_id" run_id: u64 => "Workflow run ID",
    }

    GetWorkflowRunLogs = "get_workflow_run_logs", Read, "Get the logs of a workflow run, e.g. to find failing tests." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "run_id" run_id: u64 => "Workflow run ID",
        "return_content" return_content: Option<bool> => "Return the log text instead of a download URL",
        "tail_lines" tail_lines: Option<u64> => "Only the last N lines of the log",
    }

    GetWorkflowRunUsage = "get_workflow_run_usage", Read, "Get billable time and usage of a workflow run." {
        "owner" owner: String => "Repository owner",
        "repo" repo: String => "Repository name",
        "run_id" run_id: u64 => "Workflow run ID",
    }

    // Users

    GetMe = "get_me", Read, "Get the authenticated GitHub user. Use when the username is unknown." {}

    SearchUsers = "search_users", Read, "Search GitHub users." {
        "query" query: String => "Search query",
        "page" page: Option<u64> => "Page number",
        "perPage" per_page: Option<u64> => "Results per page",
    }

    ListNotifications = "list_notifications", Read, "List notifications for the authenticated user." {
        "filter" filter: Option<String> => "default, include_read_notifications or only_participating",
        "owner" owner: Option<String> => "Restrict to this owner",
        "repo" repo: Option<String> => "Restrict to this repository",
        "page" page: Option<u64> => "Page number",
        "perPage" per_page: Option<u64> => "Results per page",
    }
}
