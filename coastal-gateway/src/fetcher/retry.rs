use std::time::Duration;

use super::policy::RetryPolicy;

/// Retry lifecycle of one logical request.
///
/// `Attempting -> Success`, `Attempting -> Backoff -> Attempting`, or
/// `Attempting -> Exhausted` once the attempt budget is spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// Attempt `attempt` (0-based) is in flight
    Attempting { attempt: u32 },
    /// Attempt `attempt` failed; the next one starts after `delay`
    Backoff { attempt: u32, delay: Duration },
    Success { attempts: u32 },
    Exhausted { attempts: u32 },
}

/// What the caller should do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Sleep, then call [`RetryMachine::resume`]
    Retry(Duration),
    GiveUp { attempts: u32 },
}

/// State machine driving attempt counting and backoff.
///
/// Holds no timers itself; the caller sleeps between [`RetryMachine::fail`]
/// and [`RetryMachine::resume`], which keeps cancellation and timeouts in
/// the caller's hands.
#[derive(Debug, Clone)]
pub struct RetryMachine {
    policy: RetryPolicy,
    state: RetryState,
}

impl RetryMachine {
    pub fn new(policy: &RetryPolicy) -> Self {
        Self {
            policy: policy.clone(),
            state: RetryState::Attempting { attempt: 0 },
        }
    }

    pub fn state(&self) -> RetryState {
        self.state
    }

    /// 1-based number of the current or last attempt
    pub fn attempt_number(&self) -> u32 {
        match self.state {
            RetryState::Attempting { attempt } | RetryState::Backoff { attempt, .. } => attempt + 1,
            RetryState::Success { attempts } | RetryState::Exhausted { attempts } => attempts,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.policy.max_attempts
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            RetryState::Success { .. } | RetryState::Exhausted { .. }
        )
    }

    /// The in-flight attempt succeeded.
    pub fn succeed(&mut self) {
        if let RetryState::Attempting { attempt } = self.state {
            self.state = RetryState::Success {
                attempts: attempt + 1,
            };
        }
    }

    /// The in-flight attempt failed.
    ///
    /// `min_delay` raises the scheduled delay when the failure itself asks
    /// for a longer pause.
    pub fn fail(&mut self, min_delay: Option<Duration>) -> Transition {
        let attempt = match self.state {
            RetryState::Attempting { attempt } => attempt,
            RetryState::Backoff { .. } | RetryState::Success { .. } | RetryState::Exhausted { .. } => {
                let attempts = self.attempt_number();
                self.state = RetryState::Exhausted { attempts };
                return Transition::GiveUp { attempts };
            }
        };

        let attempts = attempt + 1;
        if attempts >= self.policy.max_attempts {
            self.state = RetryState::Exhausted { attempts };
            return Transition::GiveUp { attempts };
        }

        let scheduled = self.policy.delay_for(attempt);
        let delay = min_delay.map_or(scheduled, |min| scheduled.max(min));
        self.state = RetryState::Backoff { attempt, delay };
        Transition::Retry(delay)
    }

    /// Backoff elapsed; start the next attempt. Returns false outside `Backoff`.
    pub fn resume(&mut self) -> bool {
        match self.state {
            RetryState::Backoff { attempt, .. } => {
                self.state = RetryState::Attempting {
                    attempt: attempt + 1,
                };
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(600), Duration::from_secs(8))
    }

    #[test]
    fn test_success_first_try() {
        let mut machine = RetryMachine::new(&policy(5));
        assert_eq!(machine.state(), RetryState::Attempting { attempt: 0 });
        machine.succeed();
        assert_eq!(machine.state(), RetryState::Success { attempts: 1 });
        assert!(machine.is_terminal());
    }

    #[test]
    fn test_backoff_schedule_until_exhausted() {
        let mut machine = RetryMachine::new(&policy(5));
        let mut delays = Vec::new();

        loop {
            match machine.fail(None) {
                Transition::Retry(delay) => {
                    delays.push(delay.as_millis());
                    assert!(machine.resume());
                }
                Transition::GiveUp { attempts } => {
                    assert_eq!(attempts, 5);
                    break;
                }
            }
        }

        assert_eq!(delays, [600, 1200, 2400, 4800]);
        assert_eq!(machine.state(), RetryState::Exhausted { attempts: 5 });
    }

    #[test]
    fn test_success_after_retries() {
        let mut machine = RetryMachine::new(&policy(5));
        for _ in 0..4 {
            assert!(matches!(machine.fail(None), Transition::Retry(_)));
            machine.resume();
        }
        assert_eq!(machine.attempt_number(), 5);
        machine.succeed();
        assert_eq!(machine.state(), RetryState::Success { attempts: 5 });
    }

    #[test]
    fn test_single_attempt_gives_up_immediately() {
        let mut machine = RetryMachine::new(&RetryPolicy::single_attempt(Duration::from_secs(4)));
        assert_eq!(machine.fail(None), Transition::GiveUp { attempts: 1 });
    }

    #[test]
    fn test_min_delay_raises_schedule() {
        let mut machine = RetryMachine::new(&policy(3));
        assert_eq!(
            machine.fail(Some(Duration::from_secs(1))),
            Transition::Retry(Duration::from_secs(1))
        );
        machine.resume();
        assert_eq!(
            machine.fail(Some(Duration::from_millis(10))),
            Transition::Retry(Duration::from_millis(1200))
        );
    }

    #[test]
    fn test_resume_outside_backoff_is_noop() {
        let mut machine = RetryMachine::new(&policy(3));
        assert!(!machine.resume());
        assert_eq!(machine.state(), RetryState::Attempting { attempt: 0 });
    }
}
