use super::schema::is_known_tool;
use crate::error::AssemblyIssue;
use crate::types::WireToolCall;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReadFileArgs {
    pub file_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReadMultipleFilesArgs {
    pub file_paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateFileArgs {
    pub file_path: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileSpec {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateMultipleFilesArgs {
    pub files: Vec<FileSpec>,
}

/// A snippet replacement requested for one file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileEditRequest {
    #[serde(rename = "file_path")]
    pub path: String,
    pub original_snippet: String,
    pub new_snippet: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitAddArgs {
    pub file_paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitCommitArgs {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitCreateBranchArgs {
    pub branch_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NoArgs {}

/// A tool call with arguments already checked against its operation's schema.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "name", content = "arguments", rename_all = "snake_case")]
pub enum ToolRequest {
    ReadFile(ReadFileArgs),
    ReadMultipleFiles(ReadMultipleFilesArgs),
    CreateFile(CreateFileArgs),
    CreateMultipleFiles(CreateMultipleFilesArgs),
    EditFile(FileEditRequest),
    GitInit(NoArgs),
    GitAdd(GitAddArgs),
    GitCommit(GitCommitArgs),
    GitCreateBranch(GitCreateBranchArgs),
    GitStatus(NoArgs),
    #[serde(skip_deserializing)]
    Unknown { name: String },
}

impl ToolRequest {
    pub fn parse(name: &str, arguments: Value) -> Result<Self, AssemblyIssue> {
        if !is_known_tool(name) {
            return Ok(ToolRequest::Unknown {
                name: name.to_string(),
            });
        }

        let tagged = serde_json::json!({ "name": name, "arguments": arguments });
        serde_json::from_value(tagged).map_err(|e| AssemblyIssue::MalformedArguments {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    /// Raw JSON argument text as it will be echoed back to the model.
    pub arguments: String,
    pub request: ToolRequest,
}

impl ToolInvocation {
    /// Validate an assembled call. Empty argument text means "no arguments".
    pub fn from_parts(id: &str, name: &str, arguments: &str) -> Result<Self, AssemblyIssue> {
        if id.trim().is_empty() {
            return Err(AssemblyIssue::MissingId);
        }
        if name.trim().is_empty() {
            return Err(AssemblyIssue::MissingName);
        }

        let raw = if arguments.trim().is_empty() {
            "{}"
        } else {
            arguments
        };
        let value: Value =
            serde_json::from_str(raw).map_err(|e| AssemblyIssue::MalformedArguments {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        if !value.is_object() {
            return Err(AssemblyIssue::MalformedArguments {
                name: name.to_string(),
                reason: "arguments must be a JSON object".to_string(),
            });
        }

        let request = ToolRequest::parse(name, value)?;
        Ok(Self {
            id: id.to_string(),
            name: name.to_string(),
            arguments: raw.to_string(),
            request,
        })
    }

    pub fn to_wire(&self) -> WireToolCall {
        WireToolCall::function(&self.id, &self.name, &self.arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_typed_arguments() {
        let invocation = ToolInvocation::from_parts(
            "call_1",
            "edit_file",
            r#"{"file_path":"a.rs","original_snippet":"x","new_snippet":"y"}"#,
        )
        .expect("valid edit call");

        assert_eq!(
            invocation.request,
            ToolRequest::EditFile(FileEditRequest {
                path: "a.rs".to_string(),
                original_snippet: "x".to_string(),
                new_snippet: "y".to_string(),
            })
        );
    }

    #[test]
    fn test_empty_arguments_mean_no_arguments() {
        let invocation =
            ToolInvocation::from_parts("call_2", "git_status", "").expect("valid status call");
        assert_eq!(invocation.arguments, "{}");
        assert_eq!(invocation.request, ToolRequest::GitStatus(NoArgs {}));
    }

    #[test]
    fn test_missing_required_key_is_malformed() {
        let issue = ToolInvocation::from_parts("call_3", "create_file", r#"{"file_path":"a"}"#)
            .expect_err("content is required");
        assert!(matches!(issue, AssemblyIssue::MalformedArguments { .. }));
    }

    #[test]
    fn test_non_object_arguments_are_malformed() {
        let issue = ToolInvocation::from_parts("call_4", "git_status", "[1,2]")
            .expect_err("arrays are not argument objects");
        assert!(matches!(issue, AssemblyIssue::MalformedArguments { .. }));
    }

    #[test]
    fn test_unknown_name_survives_parsing() {
        let invocation = ToolInvocation::from_parts("call_5", "delete_everything", "{}")
            .expect("unknown names are kept");
        assert_eq!(
            invocation.request,
            ToolRequest::Unknown {
                name: "delete_everything".to_string()
            }
        );
    }

    #[test]
    fn test_wire_form_echoes_raw_arguments() {
        let invocation =
            ToolInvocation::from_parts("call_6", "git_commit", r#"{"message":"m"}"#).expect("ok");
        let wire = invocation.to_wire();
        assert_eq!(wire.id, "call_6");
        assert_eq!(wire.call_type, "function");
        assert_eq!(wire.function.arguments, r#"{"message":"m"}"#);
    }
}
