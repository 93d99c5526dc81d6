use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Duration of one supervision tick.
pub const TICK: Duration = Duration::from_millis(100);

/// Ticks per second of timeout budget.
pub const TICKS_PER_SEC: u64 = 1000 / TICK.as_millis() as u64;

/// What to do with logs of older passing runs.
///
/// - `None`: logs accumulate indefinitely.
/// - `KeepLast(n)`: after each run, the passing log of the run `n` ids
///   earlier is deleted. Failing logs are never deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RotationPolicy {
    #[default]
    None,
    KeepLast(u64),
}

impl RotationPolicy {
    /// Run id whose passing log expires once `run_id` has finished.
    ///
    /// Returns `None` while fewer than `count` earlier runs exist.
    pub fn expired_run(&self, run_id: u64) -> Option<u64> {
        match *self {
            RotationPolicy::None => None,
            RotationPolicy::KeepLast(count) => run_id.checked_sub(count).filter(|id| *id >= 1),
        }
    }
}

/// How many ticks a run may take before it is timed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickBudget {
    /// No timeout configured; supervision waits for the child forever.
    Unbounded,
    Ticks(u64),
}

impl TickBudget {
    pub fn from_timeout_secs(timeout_sec: Option<u64>) -> Self {
        match timeout_sec {
            Some(secs) => TickBudget::Ticks(secs.saturating_mul(TICKS_PER_SEC)),
            None => TickBudget::Unbounded,
        }
    }

    pub fn is_bounded(&self) -> bool {
        matches!(self, TickBudget::Ticks(_))
    }

    pub fn is_exhausted(&self, ticks: u64) -> bool {
        match *self {
            TickBudget::Unbounded => false,
            TickBudget::Ticks(max) => ticks >= max,
        }
    }
}

/// Set of exit codes that do not count as failures.
///
/// Covers the closed range of process exit codes (0-255). Code 0 is
/// always a member.
#[derive(Clone, PartialEq, Eq)]
pub struct IgnoredExitCodes {
    codes: [bool; 256],
}

impl Default for IgnoredExitCodes {
    fn default() -> Self {
        let mut codes = [false; 256];
        codes[0] = true;
        Self { codes }
    }
}

impl IgnoredExitCodes {
    pub fn insert(&mut self, code: u8) {
        self.codes[code as usize] = true;
    }

    pub fn contains(&self, code: u8) -> bool {
        self.codes[code as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX).filter(|code| self.contains(*code))
    }
}

impl FromIterator<u8> for IgnoredExitCodes {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut set = IgnoredExitCodes::default();
        for code in iter {
            set.insert(code);
        }
        set
    }
}

impl fmt::Debug for IgnoredExitCodes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Parses a comma-separated list such as `"1,3,42"`.
impl FromStr for IgnoredExitCodes {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = IgnoredExitCodes::default();
        for entry in s.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                return Err(format!("empty entry in ignored exit code list: {s:?}"));
            }
            let code: u8 = entry
                .parse()
                .map_err(|_| format!("invalid exit code {entry:?} (expected 0-255)"))?;
            set.insert(code);
        }
        Ok(set)
    }
}
