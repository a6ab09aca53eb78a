use std::fmt::Display;

/// Which point inside a node's structure a callback was issued from.
///
/// Leaves are visited once with `None`. Composite nodes bracket their
/// children with `Enter`/`Exit`, and branching nodes additionally bracket
/// the guard, then and else parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    None,
    Enter,
    Exit,
    GuardEnter,
    GuardExit,
    ThenEnter,
    ThenExit,
    ElseEnter,
    ElseExit,
}

impl Phase {
    pub fn is_enter(self) -> bool {
        matches!(
            self,
            Phase::Enter | Phase::GuardEnter | Phase::ThenEnter | Phase::ElseEnter
        )
    }

    pub fn is_exit(self) -> bool {
        matches!(
            self,
            Phase::Exit | Phase::GuardExit | Phase::ThenExit | Phase::ElseExit
        )
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Phase::None => "None",
            Phase::Enter => "Enter",
            Phase::Exit => "Exit",
            Phase::GuardEnter => "Guard|Enter",
            Phase::GuardExit => "Guard|Exit",
            Phase::ThenEnter => "Then|Enter",
            Phase::ThenExit => "Then|Exit",
            Phase::ElseEnter => "Else|Enter",
            Phase::ElseExit => "Else|Exit",
        };
        write!(f, "{}", text)
    }
}
