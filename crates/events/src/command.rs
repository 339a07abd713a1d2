use dealflow_core::OpportunityId;

/// A command targets exactly one opportunity (command abstraction).
///
/// Commands represent **intent** ("accept offer X"); they are transient and
/// are either rejected (validation / invariant failure) or turned into events.
/// Each command operates on a single opportunity, which is the atomic write
/// boundary for every transition in the deal pipeline.
///
/// Consultant and client scoping is not part of the command: the service
/// receives it as explicit context and resolves the document path from it.
pub trait Command: Clone + core::fmt::Debug + Send + Sync + 'static {
    fn target_opportunity_id(&self) -> OpportunityId;
}
