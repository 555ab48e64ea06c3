//! Typed decoding of `df -Pk` and `du -sk` output.

use crate::errors::{GhostError, GhostResult};

/// One filesystem row of `df -Pk`. Block counts are in KiB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesystemUsage {
    pub filesystem: String,
    pub total_blocks: u64,
    pub used_blocks: u64,
    pub available_blocks: u64,
    /// `None` when the tool reports `-`
    pub use_percent: Option<u8>,
    pub mount_point: String,
}

/// Summary line of `du -sk`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeUsage {
    /// KiB in use by the tree
    pub blocks: u64,
    pub path: String,
}

fn number(field: &str, name: &str) -> GhostResult<u64> {
    field
        .parse()
        .map_err(|e| GhostError::Decode(format!("df: invalid {} field {:?}: {}", name, field, e)))
}

impl FilesystemUsage {
    /// Decode `df -Pk <path>` output: a header line followed by one data row.
    ///
    /// The header wording follows the locale and is skipped unread. The mount
    /// point is the remainder of the row and may contain spaces.
    pub fn parse_df(output: &str) -> GhostResult<Self> {
        let mut lines = output.lines().filter(|line| !line.trim().is_empty());

        lines
            .next()
            .ok_or_else(|| GhostError::Decode("df: empty output".into()))?;

        let row = lines
            .next()
            .ok_or_else(|| GhostError::Decode("df: missing data row".into()))?;
        let fields: Vec<&str> = row.split_whitespace().collect();
        if fields.len() < 6 {
            return Err(GhostError::Decode(format!(
                "df: expected 6 fields, got {} in {:?}",
                fields.len(),
                row
            )));
        }

        let use_percent = match fields[4] {
            "-" => None,
            capacity => {
                let digits = capacity.strip_suffix('%').ok_or_else(|| {
                    GhostError::Decode(format!("df: invalid capacity field {:?}", capacity))
                })?;
                Some(digits.parse().map_err(|e| {
                    GhostError::Decode(format!("df: invalid capacity field {:?}: {}", capacity, e))
                })?)
            }
        };

        Ok(Self {
            filesystem: fields[0].to_string(),
            total_blocks: number(fields[1], "blocks")?,
            used_blocks: number(fields[2], "used")?,
            available_blocks: number(fields[3], "available")?,
            use_percent,
            mount_point: fields[5..].join(" "),
        })
    }
}

impl TreeUsage {
    /// Decode `du -sk <path>` output: `<KiB>\t<path>`.
    pub fn parse_du(output: &str) -> GhostResult<Self> {
        let line = output
            .lines()
            .find(|line| !line.trim().is_empty())
            .ok_or_else(|| GhostError::Decode("du: empty output".into()))?;

        let (size, path) = line
            .trim()
            .split_once(char::is_whitespace)
            .ok_or_else(|| GhostError::Decode(format!("du: missing path in {:?}", line)))?;

        let blocks = size
            .parse()
            .map_err(|e| GhostError::Decode(format!("du: invalid size {:?}: {}", size, e)))?;

        Ok(Self {
            blocks,
            path: path.trim().to_string(),
        })
    }
}
