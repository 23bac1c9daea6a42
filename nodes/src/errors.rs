use super::types::Child;
use failure::{Backtrace, Context, Fail};
use std::fmt;
use std::result::Result as StdResult;

pub type Result<T> = StdResult<T, Error>;

#[derive(Debug)]
pub struct Error {
    inner: Context<ErrorKind>,
}

#[derive(Clone, Eq, PartialEq, Debug, Fail)]
pub enum ErrorKind {
    #[fail(display = "Unclosed subsector: {}", 0)]
    UnclosedSubsector(String),

    #[fail(display = "Bad partner link: {}", 0)]
    BadPartnerLink(String),

    #[fail(display = "Bad node child: {}", 0)]
    BadNodeChild(String),
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.inner.get_context()
    }

    pub(crate) fn subsector_run_out_of_range(
        subsector: usize,
        first_line: usize,
        num_lines: usize,
        num_segs: usize,
    ) -> Self {
        Self::from(ErrorKind::UnclosedSubsector(format!(
            "subsector {} runs [{}, {}) outside the {} emitted segs",
            subsector,
            first_line,
            first_line + num_lines,
            num_segs
        )))
    }

    pub(crate) fn unclosed_subsector(subsector: usize, seg: usize) -> Self {
        Self::from(ErrorKind::UnclosedSubsector(format!(
            "subsector {} breaks at seg {}",
            subsector, seg
        )))
    }

    pub(crate) fn asymmetric_partner(seg: usize, partner: usize) -> Self {
        Self::from(ErrorKind::BadPartnerLink(format!(
            "seg {} names partner {}, which does not point back",
            seg, partner
        )))
    }

    pub(crate) fn child_out_of_range(node: usize, child: Child) -> Self {
        Self::from(ErrorKind::BadNodeChild(format!(
            "node {} references {:?}, which was never built",
            node, child
        )))
    }
}

impl Fail for Error {
    fn cause(&self) -> Option<&Fail> {
        self.inner.cause()
    }

    fn backtrace(&self) -> Option<&Backtrace> {
        self.inner.backtrace()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::from(Context::new(kind))
    }
}

impl From<Context<ErrorKind>> for Error {
    fn from(inner: Context<ErrorKind>) -> Self {
        Error { inner }
    }
}
