use crate::common::DomainEvent;

/// Common shape of every floor agent: a stable id, a version bumped on each
/// recorded event, and a queue of events not yet seen by the floor.
pub trait AgentAggregate {
    type Event: DomainEvent;

    fn agent_id(&self) -> &str;
    fn version(&self) -> u64;

    /// Get uncommitted events
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Mark events as committed
    fn mark_events_as_committed(&mut self);

    /// Add a new event to the uncommitted events list
    fn add_event(&mut self, event: Self::Event);

    /// Drain the queue, returning the events in the order they were recorded.
    fn take_events(&mut self) -> Vec<Self::Event> {
        let events = self.uncommitted_events().to_vec();
        self.mark_events_as_committed();
        events
    }
}
