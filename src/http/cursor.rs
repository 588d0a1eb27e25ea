//! Byte cursor used to tokenize request heads.

/// A forward-only cursor over an immutable byte slice.
///
/// Every operation returns sub-slices of the input; nothing is copied and no
/// terminators are written.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Unconsumed input.
    pub fn rest(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == self.input.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Consume and return bytes up to, not including, the first byte matching `stop`.
    ///
    /// Consumes the rest of the input when nothing matches.
    pub fn take_until(&mut self, stop: impl Fn(u8) -> bool) -> &'a [u8] {
        let rest = self.rest();
        let len = rest.iter().position(|&b| stop(b)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    /// Consume bytes while `keep` holds.
    pub fn skip_while(&mut self, keep: impl Fn(u8) -> bool) -> usize {
        self.take_until(|b| !keep(b)).len()
    }

    pub fn skip_whitespace(&mut self) -> usize {
        self.skip_while(|b| b.is_ascii_whitespace())
    }

    /// Consume `prefix` if the input continues with it exactly.
    pub fn match_prefix(&mut self, prefix: &[u8]) -> bool {
        if self.rest().starts_with(prefix) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }

    /// Consume `prefix` if the input continues with it, ignoring ASCII case.
    pub fn match_prefix_ignore_case(&mut self, prefix: &[u8]) -> bool {
        let rest = self.rest();
        if rest.len() >= prefix.len() && rest[..prefix.len()].eq_ignore_ascii_case(prefix) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }

    /// Consume a single byte if it equals `byte`.
    pub fn match_byte(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume one line including its `\n`, or the rest of the input if there is none.
    pub fn take_line(&mut self) -> &'a [u8] {
        let rest = self.rest();
        let len = rest
            .iter()
            .position(|&b| b == b'\n')
            .map_or(rest.len(), |i| i + 1);
        self.pos += len;
        &rest[..len]
    }
}
