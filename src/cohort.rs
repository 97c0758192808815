use std::collections::HashSet;
use std::sync::LazyLock;

use anyhow::{bail, Result};
use regex::Regex;

// Long form checked before short form: a season-qualified batch in the text
// must decide membership before any bare two-digit code that could also match.
static LONG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(Winter|Spring|Summer|Fall)\s+(20\d{2})").unwrap());
static SHORT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b([WXSF])(\d{2})\b").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    fn from_long(s: &str) -> Option<Self> {
        match s {
            "Winter" => Some(Season::Winter),
            "Spring" => Some(Season::Spring),
            "Summer" => Some(Season::Summer),
            "Fall" => Some(Season::Fall),
            _ => None,
        }
    }

    // YC short codes: W=Winter, X=Spring, S=Summer, F=Fall.
    fn from_code(c: char) -> Option<Self> {
        match c {
            'W' => Some(Season::Winter),
            'X' => Some(Season::Spring),
            'S' => Some(Season::Summer),
            'F' => Some(Season::Fall),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            Season::Winter => 'W',
            Season::Spring => 'X',
            Season::Summer => 'S',
            Season::Fall => 'F',
        }
    }

    pub fn long_name(self) -> &'static str {
        match self {
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Batch {
    pub season: Season,
    pub year: u16,
}

impl Batch {
    /// Accepts both forms: "Winter 2025" and "W25".
    pub fn parse(s: &str) -> Option<Batch> {
        let trimmed = s.trim();
        if let Some(caps) = LONG_RE.captures(trimmed) {
            let season = Season::from_long(&caps[1])?;
            let year = caps[2].parse().ok()?;
            return Some(Batch { season, year });
        }
        if let Some(caps) = SHORT_RE.captures(trimmed) {
            let season = Season::from_code(caps[1].chars().next()?)?;
            let year: u16 = caps[2].parse().ok()?;
            return Some(Batch { season, year: 2000 + year });
        }
        None
    }

    pub fn label(&self) -> String {
        format!("{} {}", self.season.long_name(), self.year)
    }

    pub fn code(&self) -> String {
        format!("{}{:02}", self.season.code(), self.year % 100)
    }
}

/// Membership verdict for one piece of text. `Undetermined` is threaded
/// explicitly; only the caller's lenient policy turns it into inclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Included,
    Excluded,
    Undetermined,
}

pub struct BatchFilter {
    targets: HashSet<Batch>,
}

impl BatchFilter {
    pub fn new(targets: impl IntoIterator<Item = Batch>) -> Self {
        BatchFilter {
            targets: targets.into_iter().collect(),
        }
    }

    /// Parse `--batch` arguments; falls back to the default target set when
    /// none are given.
    pub fn from_args(args: &[String]) -> Result<Self> {
        if args.is_empty() {
            return Ok(Self::default_targets());
        }
        let mut targets = HashSet::new();
        for arg in args {
            match Batch::parse(arg) {
                Some(b) => {
                    targets.insert(b);
                }
                None => bail!("unrecognized batch '{}' (try \"Winter 2025\" or \"W25\")", arg),
            }
        }
        Ok(BatchFilter { targets })
    }

    /// The batches the original crawl targeted: Winter 2024 through Winter 2026.
    pub fn default_targets() -> Self {
        let batches = [
            (Season::Winter, 2024),
            (Season::Summer, 2024),
            (Season::Fall, 2024),
            (Season::Winter, 2025),
            (Season::Spring, 2025),
            (Season::Summer, 2025),
            (Season::Fall, 2025),
            (Season::Winter, 2026),
        ];
        Self::new(batches.map(|(season, year)| Batch { season, year }))
    }

    /// First parseable batch signal in the text, long form taking priority.
    pub fn first_signal(text: &str) -> Option<Batch> {
        if let Some(caps) = LONG_RE.captures(text) {
            if let (Some(season), Ok(year)) = (Season::from_long(&caps[1]), caps[2].parse()) {
                return Some(Batch { season, year });
            }
        }
        if let Some(caps) = SHORT_RE.captures(text) {
            if let (Some(season), Ok(year)) = (
                Season::from_code(caps[1].chars().next()?),
                caps[2].parse::<u16>(),
            ) {
                return Some(Batch { season, year: 2000 + year });
            }
        }
        None
    }

    pub fn classify(&self, text: &str) -> Membership {
        match Self::first_signal(text) {
            Some(batch) if self.targets.contains(&batch) => Membership::Included,
            Some(_) => Membership::Excluded,
            None => Membership::Undetermined,
        }
    }

    /// Lenient gate: only a definite exclusion signal drops an entity.
    pub fn admits(&self, text: &str) -> bool {
        self.classify(text) != Membership::Excluded
    }

    pub fn target_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.targets.iter().map(Batch::label).collect();
        labels.sort();
        labels
    }
}
