//! Types exposed to JavaScript via wasm-bindgen.

use lexcms_editor_core::{CommandOutcome, Messages, SetupOutcome};
use serde::{Deserialize, Serialize};
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;

/// Result of binding a toolbar/editor pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub enum JsSetupOutcome {
    Bound,
    AlreadyBound,
    Missing,
}

impl From<SetupOutcome> for JsSetupOutcome {
    fn from(outcome: SetupOutcome) -> Self {
        match outcome {
            SetupOutcome::Bound(_) => Self::Bound,
            SetupOutcome::AlreadyBound => Self::AlreadyBound,
            SetupOutcome::Missing => Self::Missing,
        }
    }
}

/// What a toolbar command did. A rejection carries the notice already shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum JsCommandOutcome {
    Applied,
    NoOp,
    Rejected { notice: String },
}

impl JsCommandOutcome {
    pub fn from_outcome(outcome: CommandOutcome, messages: &Messages) -> Self {
        match outcome {
            CommandOutcome::Applied => Self::Applied,
            CommandOutcome::NoOp => Self::NoOp,
            CommandOutcome::Rejected(notice) => Self::Rejected {
                notice: notice.message(messages).to_string(),
            },
        }
    }
}
