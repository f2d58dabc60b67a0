/// Non-fatal parse-time diagnostics accumulated on a [`crate::Notebook`].
///
/// Issues never abort parsing; a malformed fence still becomes a
/// `CodeCell`, just one with an empty `attrs` map and an `Issue`
/// describing why.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IssueKind {
    /// The fence's trailing `{...}` attribute object failed to parse as JSON5.
    FenceIssue,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Issue {
    pub kind: IssueKind,
    pub start_line: usize,
    pub end_line: usize,
    pub message: String,
}

impl Issue {
    pub fn fence(start_line: usize, end_line: usize, message: impl Into<String>) -> Self {
        Issue { kind: IssueKind::FenceIssue, start_line, end_line, message: message.into() }
    }
}
