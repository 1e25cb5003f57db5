use serde_json::{json, Value};

/// Operation names the model may call, in schema order.
pub const TOOL_NAMES: [&str; 10] = [
    "read_file",
    "read_multiple_files",
    "create_file",
    "create_multiple_files",
    "edit_file",
    "git_init",
    "git_commit",
    "git_create_branch",
    "git_status",
    "git_add",
];

pub fn is_known_tool(name: &str) -> bool {
    TOOL_NAMES.contains(&name)
}

/// The `tools` array sent with every chat-completions request.
pub fn tool_definitions() -> Value {
    json!([
        {
            "type": "function",
            "function": {
                "name": "read_file",
                "description": "Read the content of a single file from the filesystem",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "file_path": { "type": "string", "description": "The path to the file to read" }
                    },
                    "required": ["file_path"]
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "read_multiple_files",
                "description": "Read the content of multiple files",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "file_paths": {
                            "type": "array",
                            "items": { "type": "string" },
                            "description": "Array of file paths to read"
                        }
                    },
                    "required": ["file_paths"]
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "create_file",
                "description": "Create or overwrite a file",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "file_path": { "type": "string", "description": "Path for the file" },
                        "content": { "type": "string", "description": "Content for the file" }
                    },
                    "required": ["file_path", "content"]
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "create_multiple_files",
                "description": "Create multiple files",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "files": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "path": { "type": "string" },
                                    "content": { "type": "string" }
                                },
                                "required": ["path", "content"]
                            },
                            "description": "Array of files to create (path, content)"
                        }
                    },
                    "required": ["files"]
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "edit_file",
                "description": "Edit a file by replacing a snippet",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "file_path": { "type": "string", "description": "Path to the file" },
                        "original_snippet": { "type": "string", "description": "Snippet to replace" },
                        "new_snippet": { "type": "string", "description": "Replacement snippet" }
                    },
                    "required": ["file_path", "original_snippet", "new_snippet"]
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "git_init",
                "description": "Initialize a new Git repository.",
                "parameters": { "type": "object", "properties": {}, "required": [] }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "git_commit",
                "description": "Commit staged changes with a message.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "message": { "type": "string", "description": "Commit message" }
                    },
                    "required": ["message"]
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "git_create_branch",
                "description": "Create and switch to a new Git branch.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "branch_name": { "type": "string", "description": "Name of the new branch" }
                    },
                    "required": ["branch_name"]
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "git_status",
                "description": "Show current Git status.",
                "parameters": { "type": "object", "properties": {}, "required": [] }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "git_add",
                "description": "Stage files for commit.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "file_paths": {
                            "type": "array",
                            "items": { "type": "string" },
                            "description": "Paths of files to stage"
                        }
                    },
                    "required": ["file_paths"]
                }
            }
        }
    ])
}
