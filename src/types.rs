//! Type definitions shared by the dispatcher and the agent adapters.

use crate::error::Result;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

// ============ Response Units ============

/// One unit of agent output.
///
/// The adapter decides the variant once while parsing; consumers never
/// inspect the raw protocol message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseUnit {
    /// Incremental assistant content.
    Partial { text: String },
    /// Terminal result of the request.
    Final {
        text: String,
        is_error: bool,
        session_id: Option<String>,
        total_cost_usd: Option<f64>,
    },
}

impl ResponseUnit {
    pub fn partial(text: impl Into<String>) -> Self {
        Self::Partial { text: text.into() }
    }

    /// A successful final unit with no session metadata.
    pub fn final_text(text: impl Into<String>) -> Self {
        Self::Final {
            text: text.into(),
            is_error: false,
            session_id: None,
            total_cost_usd: None,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Partial { text } | Self::Final { text, .. } => text,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Self::Final { .. })
    }
}

/// Lazy, finite stream of response units. Not restartable.
pub type ResponseStream<'a> = Pin<Box<dyn Stream<Item = Result<ResponseUnit>> + Send + 'a>>;
