use std::collections::BTreeMap;

/// How an observed string relates to a symbolic key in a [`BindingTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// The key is already bound to exactly this string.
    Existing,
    /// The key is unbound and the string is free; binding would succeed.
    Fresh,
}

/// Why an observed string cannot be bound to a symbolic key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingConflict {
    /// The key is bound to a different string.
    #[error("${id} is bound to {bound:?}, observed {observed:?}")]
    Mismatch {
        /// Symbolic key.
        id: String,
        /// String the key is bound to.
        bound: String,
        /// String that was observed.
        observed: String,
    },
    /// The string is already bound to a different key.
    #[error("{observed:?} is already bound to ${other}, cannot bind ${id}")]
    Taken {
        /// Symbolic key that was being bound.
        id: String,
        /// String that was observed.
        observed: String,
        /// Key that already owns the string.
        other: String,
    },
}

/// Bijective map from symbolic keys to the concrete strings observed for
/// them during one matching run.
///
/// A key binds to the first string it is resolved against and keeps it;
/// two different keys never share a string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingTable {
    by_id: BTreeMap<String, String>,
}

impl BindingTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the string bound to `id`, if any.
    pub fn lookup(&self, id: &str) -> Option<&str> {
        self.by_id.get(id).map(String::as_str)
    }

    /// Checks whether `observed` is consistent with `id` without binding.
    ///
    /// # Errors
    ///
    /// Returns [`BindingConflict`] if `id` is bound elsewhere or `observed`
    /// belongs to another key.
    pub fn resolve(&self, id: &str, observed: &str) -> Result<Binding, BindingConflict> {
        if let Some(bound) = self.by_id.get(id) {
            return if bound == observed {
                Ok(Binding::Existing)
            } else {
                Err(BindingConflict::Mismatch {
                    id: id.to_owned(),
                    bound: bound.clone(),
                    observed: observed.to_owned(),
                })
            };
        }
        match self.by_id.iter().find(|(_, v)| v.as_str() == observed) {
            Some((other, _)) => Err(BindingConflict::Taken {
                id: id.to_owned(),
                observed: observed.to_owned(),
                other: other.clone(),
            }),
            None => Ok(Binding::Fresh),
        }
    }

    /// Binds `id` to `observed`. Callers resolve first; binding an already
    /// bound key overwrites it.
    pub fn bind(&mut self, id: &str, observed: &str) {
        self.by_id.insert(id.to_owned(), observed.to_owned());
    }

    /// Number of bound keys.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns `true` if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
