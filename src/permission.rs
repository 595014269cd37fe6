use crate::engine::Decision;
use crate::operation::Operation;
use crate::role::ProjectRole;

/// Operation classes the permission matrix distinguishes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum OperationClass {
    Write,
    Read,
    Describe,
    Unlisted,
}

fn classify(operation: Operation) -> OperationClass {
    match operation {
        Operation::Write | Operation::IdempotentWrite | Operation::Create => OperationClass::Write,
        Operation::Read => OperationClass::Read,
        Operation::Describe => OperationClass::Describe,
        _ => OperationClass::Unlisted,
    }
}

/// Evaluates the project permission matrix.
///
/// `role` is the caller's own role for same-project access, or the role a
/// share grant confers for cross-project access (`None` when the grant
/// confers nothing). The matrix is an allow-list: anything not listed denies.
pub fn evaluate(operation: Operation, role: Option<&ProjectRole>) -> Decision {
    let allowed = match (classify(operation), role) {
        (OperationClass::Write, Some(ProjectRole::DataOwner)) => true,
        (
            OperationClass::Read | OperationClass::Describe,
            Some(ProjectRole::DataOwner | ProjectRole::DataScientist),
        ) => true,
        _ => false,
    };

    if allowed {
        Decision::Allow
    } else {
        Decision::Deny
    }
}
