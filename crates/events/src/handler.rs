/// Execute an aggregate command deterministically (no IO, no clock).
///
/// 1. **Decide**: `aggregate.handle(command)` (pure, no mutation)
/// 2. **Evolve**: `aggregate.apply(event)` for each decided event
///
/// If `handle` fails the aggregate is untouched. Mostly useful in tests and
/// for previews; `DealService` adds loading, compare-and-set persistence and
/// publication around the same two steps.
pub fn execute<A>(
    aggregate: &mut A,
    command: &A::Command,
) -> Result<Vec<A::Event>, A::Error>
where
    A: dealflow_core::Aggregate,
{
    let events = A::handle(aggregate, command)?;
    for ev in &events {
        A::apply(aggregate, ev);
    }
    Ok(events)
}
