//! Two-click connection drawing.

use crate::graph::{
    connection::{ConnectRejection, ConnectionId, Endpoint},
    node::NodeId,
};

/// `Idle` ⇄ `PendingFrom(endpoint)`. `Idle` is both initial and terminal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionDraw {
    #[default]
    Idle,
    PendingFrom(Endpoint),
}

/// What a single endpoint click did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawOutcome {
    /// First click: drawing started from this endpoint.
    Started(Endpoint),
    /// Same endpoint clicked again, or an explicit cancel.
    Cancelled,
    Created(ConnectionId),
    Rejected(ConnectRejection),
}

impl ConnectionDraw {
    pub fn is_idle(&self) -> bool {
        matches!(self, ConnectionDraw::Idle)
    }

    pub fn pending(&self) -> Option<&Endpoint> {
        match self {
            ConnectionDraw::Idle => None,
            ConnectionDraw::PendingFrom(endpoint) => Some(endpoint),
        }
    }

    /// Feed one click. Returns the pair to try when a second, different endpoint
    /// was clicked; the machine is back in `Idle` whenever a pair is returned.
    pub fn click(
        &mut self,
        endpoint: Endpoint,
    ) -> Result<(Endpoint, Endpoint), DrawOutcome> {
        match std::mem::take(self) {
            ConnectionDraw::Idle => {
                *self = ConnectionDraw::PendingFrom(endpoint.clone());
                Err(DrawOutcome::Started(endpoint))
            }
            ConnectionDraw::PendingFrom(start) if start == endpoint => Err(DrawOutcome::Cancelled),
            ConnectionDraw::PendingFrom(start) => Ok((start, endpoint)),
        }
    }

    pub fn cancel(&mut self) -> bool {
        !std::mem::take(self).is_idle()
    }

    /// Drop a pending start that belongs to a node that no longer exists.
    pub fn forget_node(
        &mut self,
        id: &NodeId,
    ) {
        if self.pending().is_some_and(|e| &e.node_id == id) {
            *self = ConnectionDraw::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_click_starts() {
        let mut draw = ConnectionDraw::default();
        let outcome = draw.click(Endpoint::output("node_1")).unwrap_err();
        assert_eq!(outcome, DrawOutcome::Started(Endpoint::output("node_1")));
        assert_eq!(draw.pending(), Some(&Endpoint::output("node_1")));
    }

    #[test]
    fn test_reclick_same_endpoint_cancels() {
        let mut draw = ConnectionDraw::default();
        let _ = draw.click(Endpoint::output("node_1"));
        assert_eq!(draw.click(Endpoint::output("node_1")).unwrap_err(), DrawOutcome::Cancelled);
        assert!(draw.is_idle());
    }

    #[test]
    fn test_second_click_yields_pair_and_returns_to_idle() {
        let mut draw = ConnectionDraw::default();
        let _ = draw.click(Endpoint::input("node_2"));
        let (start, end) = draw.click(Endpoint::output("node_1")).unwrap();
        assert_eq!(start, Endpoint::input("node_2"));
        assert_eq!(end, Endpoint::output("node_1"));
        assert!(draw.is_idle());
    }

    #[test]
    fn test_explicit_cancel() {
        let mut draw = ConnectionDraw::default();
        assert!(!draw.cancel());
        let _ = draw.click(Endpoint::output("node_1"));
        assert!(draw.cancel());
        assert!(draw.is_idle());
    }

    #[test]
    fn test_forget_node() {
        let mut draw = ConnectionDraw::default();
        let _ = draw.click(Endpoint::output("node_1"));
        draw.forget_node(&"node_2".to_string());
        assert!(!draw.is_idle());
        draw.forget_node(&"node_1".to_string());
        assert!(draw.is_idle());
    }
}
