//! Trait mutation operators for identify calls.

use crate::primitive::Primitive;
use serde::{Deserialize, Serialize};

/// Mutation operator applied to a user trait.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TraitOp {
    Set,
    SetOnce,
    SetOnInsert,
    Unset,
    Rename,
    CurrentDate,
    Inc,
    Mul,
    Min,
    Max,
    Add,
}

impl TraitOp {
    /// Returns the wire name of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            TraitOp::Set => "set",
            TraitOp::SetOnce => "setOnce",
            TraitOp::SetOnInsert => "setOnInsert",
            TraitOp::Unset => "unset",
            TraitOp::Rename => "rename",
            TraitOp::CurrentDate => "currentDate",
            TraitOp::Inc => "inc",
            TraitOp::Mul => "mul",
            TraitOp::Min => "min",
            TraitOp::Max => "max",
            TraitOp::Add => "add",
        }
    }

    /// Parses a wire name into an operator.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "set" => Some(TraitOp::Set),
            "setOnce" => Some(TraitOp::SetOnce),
            "setOnInsert" => Some(TraitOp::SetOnInsert),
            "unset" => Some(TraitOp::Unset),
            "rename" => Some(TraitOp::Rename),
            "currentDate" => Some(TraitOp::CurrentDate),
            "inc" => Some(TraitOp::Inc),
            "mul" => Some(TraitOp::Mul),
            "min" => Some(TraitOp::Min),
            "max" => Some(TraitOp::Max),
            "add" => Some(TraitOp::Add),
            _ => None,
        }
    }
}

/// A single trait mutation: the operator plus an optional operand.
///
/// Operators like `unset` and `currentDate` carry no operand.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraitUpdate {
    pub op: TraitOp,
    pub value: Option<Primitive>,
}

impl TraitUpdate {
    /// Creates an update with an operand.
    pub fn new(op: TraitOp, value: impl Into<Primitive>) -> Self {
        Self {
            op,
            value: Some(value.into()),
        }
    }

    /// Creates an operand-less update (`unset`, `currentDate`).
    pub fn bare(op: TraitOp) -> Self {
        Self { op, value: None }
    }
}
