use crate::error::MarkerError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionUpdate {
    pub content: String,
    pub changed: bool,
}

/// Byte range strictly between the two markers.
fn locate(document: &str, start: &str, end: &str) -> Result<(usize, usize), MarkerError> {
    if start.is_empty() || end.is_empty() {
        return Err(MarkerError::EmptyMarker);
    }

    let starts: Vec<usize> = document.match_indices(start).map(|(i, _)| i).collect();
    let ends: Vec<usize> = document.match_indices(end).map(|(i, _)| i).collect();

    let start_at = match starts.as_slice() {
        [] => return Err(MarkerError::MissingStart(start.to_string())),
        [only] => *only,
        many => return Err(MarkerError::DuplicateStart(many.len())),
    };
    let end_at = match ends.as_slice() {
        [] => return Err(MarkerError::MissingEnd(end.to_string())),
        [only] => *only,
        many => return Err(MarkerError::DuplicateEnd(many.len())),
    };

    let inner_start = start_at + start.len();
    // Also rejects markers that overlap each other
    if end_at < inner_start {
        return Err(MarkerError::Misordered);
    }

    Ok((inner_start, end_at))
}

/// Replaces the text strictly between `start` and `end` with `block`.
///
/// Both markers must occur exactly once, start first. Every byte outside
/// the interior, the markers included, is kept as is. When the interior
/// already equals `block` the input is returned with `changed == false`.
/// A block that contains either marker is refused, since writing it would
/// leave a document the next run cannot locate a region in.
pub fn replace_region(
    document: &str,
    start: &str,
    end: &str,
    block: &str,
) -> Result<RegionUpdate, MarkerError> {
    let (from, to) = locate(document, start, end)?;
    if block.contains(start) || block.contains(end) {
        return Err(MarkerError::MarkerInBlock);
    }

    if &document[from..to] == block {
        return Ok(RegionUpdate {
            content: document.to_string(),
            changed: false,
        });
    }

    let mut content = String::with_capacity(document.len() - (to - from) + block.len());
    content.push_str(&document[..from]);
    content.push_str(block);
    content.push_str(&document[to..]);

    Ok(RegionUpdate {
        content,
        changed: true,
    })
}
