//! Domain primitives: NegotiationId, InstallmentId, InstallmentKind.

use serde::{Deserialize, Serialize};

/// Primary key of a negotiation row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NegotiationId(pub i64);

impl NegotiationId {
    pub fn new(id: i64) -> Self {
        NegotiationId(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for NegotiationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Primary key of an installment row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstallmentId(pub i64);

impl InstallmentId {
    pub fn new(id: i64) -> Self {
        InstallmentId(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for InstallmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which schedule an installment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentKind {
    /// Amortized contract installment.
    Contract,
    /// Down-payment (entry) installment.
    DownPayment,
}

impl InstallmentKind {
    /// Integer code stored in the `kind` column.
    pub fn code(&self) -> i64 {
        match self {
            InstallmentKind::Contract => 1,
            InstallmentKind::DownPayment => 2,
        }
    }

    /// Parse a stored `kind` code.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(InstallmentKind::Contract),
            2 => Some(InstallmentKind::DownPayment),
            _ => None,
        }
    }
}

impl std::fmt::Display for InstallmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstallmentKind::Contract => write!(f, "contract"),
            InstallmentKind::DownPayment => write!(f, "down_payment"),
        }
    }
}
