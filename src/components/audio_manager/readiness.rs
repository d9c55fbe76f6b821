// One-slot holder for a request issued before a backend can take it.

/// Holds at most one request until a readiness signal opens the gate.
///
/// A newer request replaces an older pending one. Opening hands the pending
/// request back exactly once; afterwards requests pass straight through.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadinessGate<T> {
    Waiting(Option<T>),
    Open,
}

impl<T> Default for ReadinessGate<T> {
    fn default() -> Self {
        ReadinessGate::Waiting(None)
    }
}

impl<T> ReadinessGate<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        matches!(self, ReadinessGate::Open)
    }

    /// Returns the request when it may run now, otherwise parks it.
    pub fn submit(&mut self, request: T) -> Option<T> {
        match self {
            ReadinessGate::Open => Some(request),
            ReadinessGate::Waiting(slot) => {
                *slot = Some(request);
                None
            }
        }
    }

    /// Opens the gate and returns whatever was parked. Later calls return `None`.
    pub fn open(&mut self) -> Option<T> {
        match std::mem::replace(self, ReadinessGate::Open) {
            ReadinessGate::Waiting(slot) => slot,
            ReadinessGate::Open => None,
        }
    }

    pub fn pending(&self) -> Option<&T> {
        match self {
            ReadinessGate::Waiting(slot) => slot.as_ref(),
            ReadinessGate::Open => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parks_until_open() {
        let mut gate = ReadinessGate::new();
        assert_eq!(gate.submit(42.0), None);
        assert_eq!(gate.pending(), Some(&42.0));
        assert!(!gate.is_open());

        assert_eq!(gate.open(), Some(42.0));
        assert!(gate.is_open());
        assert_eq!(gate.pending(), None);
    }

    #[test]
    fn latest_request_wins() {
        let mut gate = ReadinessGate::new();
        gate.submit(10.0);
        gate.submit(20.0);
        assert_eq!(gate.open(), Some(20.0));
    }

    #[test]
    fn flushes_exactly_once() {
        let mut gate = ReadinessGate::new();
        gate.submit("seek");
        assert_eq!(gate.open(), Some("seek"));
        assert_eq!(gate.open(), None);
        assert_eq!(gate.submit("again"), Some("again"));
    }

    #[test]
    fn open_with_nothing_parked() {
        let mut gate: ReadinessGate<u8> = ReadinessGate::new();
        assert_eq!(gate.open(), None);
        assert!(gate.is_open());
    }
}
