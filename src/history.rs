//! Conversation history threaded through dispatch calls
//!
//! Two representations exist: a text transcript of exchanges, used by the
//! remote inference path, and an encoded token continuation buffer, used by
//! local models that carry their own context. Callers treat both as one
//! opaque value; the representation decides how a turn updates it.

/// One user utterance and the reply it produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub utterance: String,
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Repr {
    Transcript(Vec<Exchange>),
    Continuation(Vec<u32>),
}

/// Opaque accumulated conversation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    repr: Repr,
}

impl Default for History {
    fn default() -> Self {
        Self::transcript()
    }
}

impl History {
    /// Empty text transcript
    pub fn transcript() -> Self {
        Self {
            repr: Repr::Transcript(Vec::new()),
        }
    }

    /// Token continuation buffer
    ///
    /// Produced by [`Generator`](crate::inference::Generator) implementations
    /// that keep their own encoded context, such as a local model. The remote
    /// inference client only ever works with transcripts.
    pub fn continuation(tokens: Vec<u32>) -> Self {
        Self {
            repr: Repr::Continuation(tokens),
        }
    }

    pub fn is_empty(&self) -> bool {
        match &self.repr {
            Repr::Transcript(exchanges) => exchanges.is_empty(),
            Repr::Continuation(tokens) => tokens.is_empty(),
        }
    }

    /// Number of recorded exchanges or buffered tokens
    pub fn len(&self) -> usize {
        match &self.repr {
            Repr::Transcript(exchanges) => exchanges.len(),
            Repr::Continuation(tokens) => tokens.len(),
        }
    }

    /// Recorded exchanges; empty for a continuation buffer.
    pub fn exchanges(&self) -> &[Exchange] {
        match &self.repr {
            Repr::Transcript(exchanges) => exchanges,
            Repr::Continuation(_) => &[],
        }
    }

    /// Buffered tokens, if this is a continuation buffer.
    pub fn tokens(&self) -> Option<&[u32]> {
        match &self.repr {
            Repr::Transcript(_) => None,
            Repr::Continuation(tokens) => Some(tokens),
        }
    }

    /// History after a completed turn. A transcript gains the exchange; a
    /// continuation buffer is only ever replaced by the model that owns it,
    /// so it comes back unchanged.
    #[must_use]
    pub fn with_exchange(&self, utterance: &str, response: &str) -> Self {
        match &self.repr {
            Repr::Transcript(exchanges) => {
                let mut exchanges = exchanges.clone();
                exchanges.push(Exchange {
                    utterance: utterance.to_string(),
                    response: response.to_string(),
                });
                Self {
                    repr: Repr::Transcript(exchanges),
                }
            }
            Repr::Continuation(_) => self.clone(),
        }
    }

    /// Replace the whole context with a new token buffer. Local-model
    /// generators call this after each turn; the dispatcher never does.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn replace_continuation(&self, tokens: Vec<u32>) -> Self {
        Self::continuation(tokens)
    }

    /// Empty history of the same representation
    #[must_use]
    pub fn reset(&self) -> Self {
        match &self.repr {
            Repr::Transcript(_) => Self::transcript(),
            Repr::Continuation(_) => Self::continuation(Vec::new()),
        }
    }
}
