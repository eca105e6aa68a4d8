/// Per-entity reconciliation state
///
/// ```text
/// Reconciled ──apply_plan──▶ Local ──canonical update──▶ Reconciled
/// ```
///
/// A canonical update always wins, whatever the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityState<T> {
    /// Optimistically changed, not yet confirmed by a broadcast
    Local(T),
    /// Equal to the last canonical value received
    Reconciled(T),
}

impl<T> EntityState<T> {
    pub fn value(&self) -> &T {
        match self {
            Self::Local(v) | Self::Reconciled(v) => v,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Self::Local(v) | Self::Reconciled(v) => v,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }

    /// Replace with a canonical value
    pub fn reconcile(&mut self, canonical: T) {
        *self = Self::Reconciled(canonical);
    }

    /// Replace with an optimistic value
    pub fn set_local(&mut self, value: T) {
        *self = Self::Local(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        let mut state = EntityState::Reconciled(1);
        state.set_local(2);
        assert!(state.is_local());
        assert_eq!(*state.value(), 2);

        // canonical value wins even when it differs from the local one
        state.reconcile(3);
        assert_eq!(state, EntityState::Reconciled(3));

        state.reconcile(3);
        assert_eq!(state.into_inner(), 3);
    }
}
