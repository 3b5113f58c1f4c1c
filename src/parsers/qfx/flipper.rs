use super::types::{BalanceField, SignedAmount};
use crate::errors::{FlipError, FlipResult};
use crate::types::Mode;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlipSummary {
    pub content: String,
    pub found: usize,
    pub changed: usize,
    /// Balances after the flip, in document order. `None` where the value
    /// does not fit a `Decimal`.
    pub balances: Vec<Option<Decimal>>,
}

impl FlipSummary {
    pub fn is_changed(&self) -> bool {
        self.changed > 0
    }
}

/// Rewrites the sign of every field in `fields` according to `mode`.
///
/// Every value is parsed before anything is spliced, so a single malformed
/// value leaves the caller with no new content at all. Splices run in reverse
/// document order so earlier offsets stay valid.
pub fn apply(content: &str, fields: &[BalanceField], mode: Mode) -> FlipResult<FlipSummary> {
    let mut planned = Vec::with_capacity(fields.len());
    for field in fields {
        check_span(content, field)?;
        let current = SignedAmount::try_from(field)?;
        let target = current.with_mode(mode);
        planned.push((field, current, target));
    }

    let balances = planned.iter().map(|(_, _, target)| target.value()).collect();

    planned.sort_by_key(|(field, _, _)| std::cmp::Reverse(field.start));

    let mut output = content.to_string();
    let mut changed = 0;
    for (field, current, target) in &planned {
        let replacement = target.to_string();
        if replacement == field.raw {
            continue;
        }

        tracing::debug!(from = %current, to = %replacement, offset = field.start, "rewriting balance");
        output.replace_range(field.span(), &replacement);
        changed += 1;
    }

    Ok(FlipSummary {
        content: output,
        found: fields.len(),
        changed,
        balances,
    })
}

fn check_span(content: &str, field: &BalanceField) -> FlipResult<()> {
    let out_of_bounds = || FlipError::SpanOutOfBounds {
        start: field.start,
        end: field.end,
        len: content.len(),
    };

    match content.get(field.span()) {
        Some(text) if text == field.raw => Ok(()),
        _ => Err(out_of_bounds()),
    }
}
