/// Something that happened to a single floor agent during a tick.
///
/// Agents queue their events as uncommitted; the floor drains them once per
/// tick and routes them to the scheduler.
pub trait DomainEvent: Send + Sync + Clone {
    fn event_type(&self) -> &'static str;
    fn agent_id(&self) -> &str;
}
