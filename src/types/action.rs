//! Operation - the five kinds of replica mutation

use std::fmt;

/// A single kind of filesystem operation applied to the replica
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Create a directory present in source, missing in replica
    CreateDirectory,

    /// Copy a file present in source, missing in replica
    CopyFile,

    /// Overwrite a replica file whose content differs from source
    UpdateFile,

    /// Delete a file present only in replica
    DeleteFile,

    /// Delete a directory present only in replica
    DeleteDirectory,
}

impl Operation {
    /// Human label used in log lines
    pub fn label(self) -> &'static str {
        match self {
            Operation::CreateDirectory => "Create directory",
            Operation::CopyFile => "Copy file",
            Operation::UpdateFile => "Update file",
            Operation::DeleteFile => "Delete file",
            Operation::DeleteDirectory => "Delete directory",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
