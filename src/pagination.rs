use crate::config::PagingPolicy;
use crate::errors::QueryError;
use crate::models::{DataTablesRequest, Param};

const DEFAULT_DRAW: u64 = 1;
const DEFAULT_START: u64 = 0;
const DEFAULT_LENGTH: u64 = 0;

/// `length` value DataTables sends when the user picks "All".
const LENGTH_ALL: i64 = -1;

/// Resolved paging parameters of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub draw: u64,
    /// Rows to skip.
    pub start: u64,
    /// Rows to return; `0` means no limit.
    pub length: u64,
}

fn resolve_length(param: Option<&Param>) -> Option<u64> {
    let length = param?.as_integer()?;
    if length == LENGTH_ALL {
        return Some(0);
    }
    u64::try_from(length).ok()
}

/// Read `draw`, `start` and `length` from a request.
///
/// Under [`PagingPolicy::Strict`] every parameter must be present and be a
/// non-negative integer (`length` may also be `-1`, meaning all rows). Under
/// [`PagingPolicy::Lenient`] unusable values fall back to `draw = 1`,
/// `start = 0` and `length = 0`.
///
/// # Errors
///
/// Returns [`QueryError::InvalidParameters`] naming the offending parameters
/// when the policy is strict.
pub fn resolve_page_window(
    request: &DataTablesRequest,
    policy: PagingPolicy,
) -> Result<PageWindow, QueryError> {
    let draw = request.draw.as_ref().and_then(Param::as_index);
    let start = request.start.as_ref().and_then(Param::as_index);
    let length = resolve_length(request.length.as_ref());

    match policy {
        PagingPolicy::Lenient => Ok(PageWindow {
            draw: draw.unwrap_or(DEFAULT_DRAW),
            start: start.unwrap_or(DEFAULT_START),
            length: length.unwrap_or(DEFAULT_LENGTH),
        }),
        PagingPolicy::Strict => match (draw, start, length) {
            (Some(draw), Some(start), Some(length)) => Ok(PageWindow {
                draw,
                start,
                length,
            }),
            _ => {
                let invalid: Vec<&str> = [("draw", draw), ("start", start), ("length", length)]
                    .into_iter()
                    .filter(|(_, value)| value.is_none())
                    .map(|(name, _)| name)
                    .collect();
                Err(QueryError::invalid_parameters(format!(
                    "Some parameters are missing or in a wrong state: {}",
                    invalid.join(", ")
                )))
            }
        },
    }
}
