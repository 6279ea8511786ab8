use super::{TermId, TermKind, TermManager};
use crate::sort::SortKind;
use std::fmt;

/// SMT-LIB style rendering of a term, borrowed from its manager
pub struct TermDisplay<'a> {
    tm: &'a TermManager,
    id: TermId,
}

impl TermManager {
    /// Render a term for logs and diagnostics
    pub fn display(&self, id: TermId) -> TermDisplay<'_> {
        TermDisplay { tm: self, id }
    }
}

impl fmt::Display for TermDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_term(self.tm, self.id, f)
    }
}

fn write_term(tm: &TermManager, id: TermId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let Some(term) = tm.get(id) else {
        return write!(f, "<unknown {}>", id.0);
    };
    match &term.kind {
        TermKind::True => write!(f, "true"),
        TermKind::False => write!(f, "false"),
        TermKind::IntConst(n) if n.sign() == num_bigint::Sign::Minus => write!(f, "(- {})", -n),
        TermKind::IntConst(n) => write!(f, "{n}"),
        TermKind::BitVecConst { value, width } => write!(f, "(_ bv{value} {width})"),
        TermKind::UninterpretedValue { sort, index } => match tm.sorts.kind(*sort) {
            Some(SortKind::Uninterpreted(name)) => {
                write!(f, "{}!val!{index}", tm.resolve_str(*name))
            }
            _ => write!(f, "val!{index}"),
        },
        TermKind::Var(name) => write!(f, "{}", tm.resolve_str(*name)),
        TermKind::BoundVar(i) => write!(f, "(:var {i})"),
        TermKind::Apply { func, args } => {
            write!(f, "({}", tm.resolve_str(*func))?;
            for &arg in args {
                write!(f, " ")?;
                write_term(tm, arg, f)?;
            }
            write!(f, ")")
        }
        TermKind::Forall { vars, body } => {
            write!(f, "(forall (")?;
            for (i, (name, _)) in vars.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", tm.resolve_str(*name))?;
            }
            write!(f, ") ")?;
            write_term(tm, *body, f)?;
            write!(f, ")")
        }
        kind => {
            let name = kind.op().map(|op| op.name()).unwrap_or("?");
            write!(f, "({name}")?;
            for arg in kind.children() {
                write!(f, " ")?;
                write_term(tm, arg, f)?;
            }
            write!(f, ")")
        }
    }
}
