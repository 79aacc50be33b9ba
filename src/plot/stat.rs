use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A statistic category, one chart panel each.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stat {
    Cpu,
    Mem,
    Disk,
}

impl Stat {
    pub const ALL: [Stat; 3] = [Stat::Cpu, Stat::Mem, Stat::Disk];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stat::Cpu => "cpu",
            Stat::Mem => "mem",
            Stat::Disk => "disk",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpu" => Ok(Stat::Cpu),
            "mem" => Ok(Stat::Mem),
            "disk" => Ok(Stat::Disk),
            other => Err(Error::UnsupportedStat(other.to_string())),
        }
    }
}

/// Parse a list of statistic names, failing on the first unknown one.
pub fn parse_stats<S: AsRef<str>>(names: &[S]) -> Result<Vec<Stat>, Error> {
    names.iter().map(|n| n.as_ref().parse()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for stat in Stat::ALL {
            assert_eq!(stat.as_str().parse::<Stat>().unwrap(), stat);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = parse_stats(&["cpu", "foo", "disk"]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedStat(ref s) if s == "foo"));
        assert_eq!(err.to_string(), "Unsupported statistic 'foo' !");
    }

    #[test]
    fn names_are_case_sensitive() {
        assert!("CPU".parse::<Stat>().is_err());
    }
}
