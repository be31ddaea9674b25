use std::future::Future;
use tracing::warn;

/// Errors that can signal a lost optimistic-concurrency race.
pub trait Conflict {
    fn is_conflict(&self) -> bool;
}

/// Result of applying a mutation to a freshly read value.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation<R> {
    /// The value changed and must be written back
    Write(R),
    /// Nothing changed; skip the write
    Skip(R),
}

/// Read-mutate-write with a bounded number of conflict retries.
///
/// Each attempt re-reads the current value and version, re-applies `mutate`
/// to that fresh value and writes conditionally on the version it read. A
/// conflict after `max_retries` retries, or any other error, propagates.
pub async fn with_optimistic_update<V, Ver, R, E, Rd, RdFut, M, Wr, WrFut>(
    mut read: Rd,
    mut mutate: M,
    mut write: Wr,
    max_retries: u32,
) -> Result<R, E>
where
    E: Conflict + std::fmt::Display,
    Rd: FnMut() -> RdFut,
    RdFut: Future<Output = Result<(V, Ver), E>>,
    M: FnMut(&mut V) -> Mutation<R>,
    Wr: FnMut(V, Ver) -> WrFut,
    WrFut: Future<Output = Result<Ver, E>>,
{
    let mut attempt = 0;
    loop {
        let (mut value, version) = read().await?;

        let output = match mutate(&mut value) {
            Mutation::Skip(output) => return Ok(output),
            Mutation::Write(output) => output,
        };

        match write(value, version).await {
            Ok(_) => return Ok(output),
            Err(e) if e.is_conflict() && attempt < max_retries => {
                attempt += 1;
                warn!(attempt, error = %e, "Write lost a version race, retrying");
            }
            Err(e) => return Err(e),
        }
    }
}
