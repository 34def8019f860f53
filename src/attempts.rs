//! Best-of-N runner for "try increasingly permissive strategies" loops.
//!
//! An attempt is a named parameter set. A probe turns one attempt into a
//! `Result`; failures are expected outcomes, not exceptions. Two selection
//! policies are provided: keep the smallest successful output, or stop at the
//! first success.

use std::fmt::Display;

/// One named parameter set to try
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt<P> {
    pub name: &'static str,
    pub params: P,
}

impl<P> Attempt<P> {
    pub const fn new(name: &'static str, params: P) -> Self {
        Self { name, params }
    }
}

/// What happened when an attempt was probed
#[derive(Debug)]
pub struct AttemptOutcome<T, E> {
    pub name: &'static str,
    pub result: Result<T, E>,
}

/// Probe every attempt in order, collecting all outcomes.
///
/// Never short-circuits: a later attempt may do better than an earlier
/// success.
pub fn run_attempts<P, T, E, F>(attempts: &[Attempt<P>], mut probe: F) -> Vec<AttemptOutcome<T, E>>
where
    F: FnMut(&Attempt<P>) -> Result<T, E>,
    E: Display,
{
    attempts
        .iter()
        .map(|attempt| {
            log::debug!("Trying {}", attempt.name);
            let result = probe(attempt);
            if let Err(ref e) = result {
                log::warn!("{} failed: {}", attempt.name, e);
            }
            AttemptOutcome {
                name: attempt.name,
                result,
            }
        })
        .collect()
}

/// The smallest successful output. Ties keep the earliest attempt.
pub fn smallest_success<T, E>(outcomes: Vec<AttemptOutcome<T, E>>) -> Option<(&'static str, T)>
where
    T: AsRef<[u8]>,
{
    let mut best: Option<(&'static str, T)> = None;
    for outcome in outcomes {
        if let Ok(output) = outcome.result {
            let better = match &best {
                Some((_, current)) => output.as_ref().len() < current.as_ref().len(),
                None => true,
            };
            if better {
                best = Some((outcome.name, output));
            }
        }
    }
    best
}

/// Probe attempts in order and return the first success.
///
/// When every attempt fails, the failures are returned in order.
pub fn first_success<P, T, E, F>(
    attempts: &[Attempt<P>],
    mut probe: F,
) -> Result<(&'static str, T), Vec<(&'static str, E)>>
where
    F: FnMut(&Attempt<P>) -> Result<T, E>,
    E: Display,
{
    let mut failures = Vec::new();
    for attempt in attempts {
        log::debug!("Trying {}", attempt.name);
        match probe(attempt) {
            Ok(output) => return Ok((attempt.name, output)),
            Err(e) => {
                log::warn!("{} failed: {}", attempt.name, e);
                failures.push((attempt.name, e));
            }
        }
    }
    Err(failures)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATTEMPTS: [Attempt<usize>; 3] = [
        Attempt::new("a", 30),
        Attempt::new("b", 10),
        Attempt::new("c", 20),
    ];

    #[test]
    fn test_runs_every_attempt() {
        let mut seen = Vec::new();
        let outcomes = run_attempts(&ATTEMPTS, |a| {
            seen.push(a.name);
            Ok::<_, String>(vec![0u8; a.params])
        });
        assert_eq!(seen, vec!["a", "b", "c"]);
        assert_eq!(outcomes.len(), 3);
    }

    #[test]
    fn test_smallest_success_wins() {
        let outcomes = run_attempts(&ATTEMPTS, |a| Ok::<_, String>(vec![0u8; a.params]));
        let (name, bytes) = smallest_success(outcomes).unwrap();
        assert_eq!(name, "b");
        assert_eq!(bytes.len(), 10);
    }

    #[test]
    fn test_failures_are_skipped() {
        let outcomes = run_attempts(&ATTEMPTS, |a| {
            if a.name == "b" {
                Err("boom".to_string())
            } else {
                Ok(vec![0u8; a.params])
            }
        });
        let (name, _) = smallest_success(outcomes).unwrap();
        assert_eq!(name, "c");
    }

    #[test]
    fn test_tie_keeps_earliest() {
        let outcomes = run_attempts(&ATTEMPTS, |_| Ok::<_, String>(vec![1u8; 5]));
        assert_eq!(smallest_success(outcomes).unwrap().0, "a");
    }

    #[test]
    fn test_all_failed_yields_none() {
        let outcomes = run_attempts(&ATTEMPTS, |_| Err::<Vec<u8>, _>("nope"));
        assert!(smallest_success(outcomes).is_none());
    }

    #[test]
    fn test_first_success_stops_early() {
        let mut calls = 0;
        let winner = first_success(&ATTEMPTS, |a| {
            calls += 1;
            if a.name == "a" {
                Err("down")
            } else {
                Ok(a.params)
            }
        });
        assert_eq!(winner.unwrap(), ("b", 10));
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_first_success_reports_all_failures() {
        let failures = first_success(&ATTEMPTS, |a| Err::<(), _>(a.name)).unwrap_err();
        let names: Vec<_> = failures.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
