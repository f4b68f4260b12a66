//! ANSI fallback dialect

use super::Dialect;

/// Double-quoted identifiers, `?` placeholders and `LIMIT`/`OFFSET`.
///
/// Used for any driver name the registry does not recognise.
#[derive(Debug, Clone, Copy, Default)]
pub struct Standard;

impl Dialect for Standard {}
